//! The root of the placement topology and its scale operations.

use serde::{Deserialize, Serialize};

use crate::bucket::Bucket;
use crate::error::{Result, TopologyError};
use crate::mg::Mg;

/// The device: an ordered set of migration groups plus the straw2 bucket
/// mirroring them.
///
/// Placement is a pure function of the topology: [`Device::select`] runs
/// one straw2 draw across the MG bucket and a second, MG-salted draw
/// across the winner's PE bucket. The four scale operations clone the
/// device, mutate the clone, re-select every key stored on the affected
/// PEs and migrate exactly the keys whose destination changed; the
/// original device is never touched.
///
/// The MG bucket holds each group's weight as provisioned at add time.
/// Intra-group mutation (scale-up/down, PE re-weighting) deliberately does
/// not reach the MG bucket: keys only re-draw within their group, so no
/// key can leave a group whose membership did not change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    weight: u32,
    total: u32,
    mgs: Vec<Mg>,
    mg_bucket: Bucket,
}

impl Device {
    /// Build a device of `mg_num` groups with ids `1..=mg_num`, each with
    /// `pe_num` elements of weight `pe_weight`.
    #[must_use]
    pub fn new(mg_num: u32, pe_num: u32, pe_weight: u32) -> Self {
        let mut device = Self {
            weight: 0,
            total: 0,
            mgs: Vec::with_capacity(mg_num as usize),
            mg_bucket: Bucket::new(),
        };
        for mg_id in 1..=mg_num {
            device.add_mg(Mg::new(mg_id, pe_num, pe_weight));
        }
        device
    }

    /// Sum of all MG weights.
    #[must_use]
    pub fn weight(&self) -> u32 {
        self.weight
    }

    /// Number of keys stored across the whole device.
    #[must_use]
    pub fn total(&self) -> u32 {
        self.total
    }

    /// Number of migration groups.
    #[must_use]
    pub fn size(&self) -> u32 {
        self.mgs.len() as u32
    }

    /// The migration groups in insertion order.
    #[must_use]
    pub fn mgs(&self) -> &[Mg] {
        &self.mgs
    }

    /// The straw2 bucket mirroring [`Self::mgs`].
    #[must_use]
    pub fn mg_bucket(&self) -> &Bucket {
        &self.mg_bucket
    }

    /// Whether an MG with `mg_id` exists.
    #[must_use]
    pub fn find_mg(&self, mg_id: u32) -> bool {
        self.mgs.iter().any(|mg| mg.id() == mg_id)
    }

    /// Position of the MG with `mg_id`.
    ///
    /// # Panics
    ///
    /// Panics if no such MG exists; callers resolve ids the topology
    /// guarantees to be present, so a miss is a structural violation.
    #[must_use]
    pub fn mg_index(&self, mg_id: u32) -> usize {
        self.mgs
            .iter()
            .position(|mg| mg.id() == mg_id)
            .unwrap_or_else(|| panic!("no MG with id {mg_id}"))
    }

    /// The MG with `mg_id`.
    ///
    /// # Panics
    ///
    /// Panics if no such MG exists.
    #[must_use]
    pub fn mg(&self, mg_id: u32) -> &Mg {
        &self.mgs[self.mg_index(mg_id)]
    }

    /// Compute the placement of `key` under the current topology.
    ///
    /// # Panics
    ///
    /// Panics when the MG draw comes back empty (a device with no
    /// selectable group), which no valid topology produces.
    #[must_use]
    pub fn select(&self, key: u32) -> (u32, u32) {
        let mg_id = self.mg_bucket.select(key);
        let mg = &self.mgs[self.mg_index(mg_id)];
        (mg_id, mg.select(key))
    }

    /// Find the PE currently storing `key`, if any.
    #[must_use]
    pub fn locate(&self, key: u32) -> Option<(u32, u32)> {
        for mg in &self.mgs {
            for pe in mg.pes() {
                if pe.contains(key) {
                    return Some((mg.id(), pe.id()));
                }
            }
        }
        None
    }

    /// Store `key` on the PE identified by `(mg_id, pe_id)`.
    ///
    /// # Panics
    ///
    /// Panics if either id is unknown or the key is already present there.
    pub fn add_data_by_id(&mut self, mg_id: u32, pe_id: u32, key: u32) {
        let mg_index = self.mg_index(mg_id);
        let pe_index = self.mgs[mg_index].pe_index(pe_id);
        self.total += 1;
        self.mgs[mg_index].add_data(pe_index, key);
    }

    /// Move `key` between PEs, updating migration counters.
    ///
    /// Cross-MG moves bump both groups' migration counters; intra-MG moves
    /// touch only the PE counters. The device total is unchanged either
    /// way.
    ///
    /// # Panics
    ///
    /// Panics if any id is unknown, the key is absent at the source, or
    /// the key is already present at the destination.
    pub fn migrate(&mut self, from_mg: u32, from_pe: u32, to_mg: u32, to_pe: u32, key: u32) {
        let from_mg_index = self.mg_index(from_mg);
        let to_mg_index = self.mg_index(to_mg);
        let from_pe_index = self.mgs[from_mg_index].pe_index(from_pe);
        let to_pe_index = self.mgs[to_mg_index].pe_index(to_pe);

        if from_mg == to_mg {
            self.mgs[from_mg_index].pe_migrate_out(from_pe_index, key);
            self.mgs[to_mg_index].pe_migrate_in(to_pe_index, key);
        } else {
            self.mgs[from_mg_index].migrate_out(from_pe_index, key);
            self.mgs[to_mg_index].migrate_in(to_pe_index, key);
        }
    }

    /// Re-weight one PE, keeping the MG's weight and the device weight in
    /// step. The MG bucket keeps the group's provisioned weight.
    ///
    /// # Panics
    ///
    /// Panics if either id is unknown.
    pub fn set_pe_weight(&mut self, mg_id: u32, pe_id: u32, weight: u32) {
        let mg_index = self.mg_index(mg_id);
        let pe_index = self.mgs[mg_index].pe_index(pe_id);
        let old = self.mgs[mg_index].pes()[pe_index].weight();
        self.weight = self.weight.wrapping_sub(old).wrapping_add(weight);
        self.mgs[mg_index].set_pe_weight(pe_index, weight);
    }

    /// Add a whole migration group: clone the device, insert a fresh MG of
    /// `pe_num` elements at `pe_weight` each, then re-select every key on
    /// every pre-existing PE and migrate those the new group wins.
    ///
    /// # Errors
    ///
    /// [`TopologyError::ReservedId`] for `mg_id == 0`,
    /// [`TopologyError::MgExists`] when the id is already present. The
    /// original device is untouched on error.
    pub fn scale_out_mg(&self, mg_id: u32, pe_num: u32, pe_weight: u32) -> Result<Device> {
        if mg_id == 0 {
            return Err(TopologyError::ReservedId);
        }
        if self.find_mg(mg_id) {
            return Err(TopologyError::MgExists(mg_id));
        }

        let mut device = self.clone();
        device.add_mg(Mg::new(mg_id, pe_num, pe_weight));

        for (own_mg, own_pe, keys) in device.snapshot_keys(|mg| mg.id() != mg_id) {
            for key in keys {
                let (to_mg, to_pe) = device.select(key);
                if to_mg != own_mg {
                    device.migrate(own_mg, own_pe, to_mg, to_pe, key);
                }
            }
        }

        Ok(device)
    }

    /// Remove a whole migration group: clone the device, drop the group
    /// from the MG bucket first (so re-selection cannot pick it), migrate
    /// every key it held to its new home, then drop the group itself.
    ///
    /// # Errors
    ///
    /// [`TopologyError::MgNotFound`] when the id is absent,
    /// [`TopologyError::LastMg`] when it is the only group left. The
    /// original device is untouched on error.
    ///
    /// # Panics
    ///
    /// Panics if a key re-selects the removed group, which the bucket
    /// removal makes impossible in a consistent topology.
    pub fn scale_in_mg(&self, mg_id: u32) -> Result<Device> {
        if !self.find_mg(mg_id) {
            return Err(TopologyError::MgNotFound(mg_id));
        }
        if self.mgs.len() == 1 {
            return Err(TopologyError::LastMg(mg_id));
        }

        let mut device = self.clone();
        let mg_index = device.mg_index(mg_id);
        device.mg_bucket.del_item(mg_index);

        for (own_mg, own_pe, keys) in device.snapshot_keys(|mg| mg.id() == mg_id) {
            for key in keys {
                let (to_mg, to_pe) = device.select(key);
                assert_ne!(to_mg, mg_id, "key {key} re-selected the removed MG {mg_id}");
                device.migrate(own_mg, own_pe, to_mg, to_pe, key);
            }
        }

        device.del_mg(mg_index);
        Ok(device)
    }

    /// Add one PE to a group: clone the device, append the element, then
    /// re-select every key on the group's other PEs and migrate those the
    /// new element wins. The MG bucket is unchanged, so every key stays in
    /// the group.
    ///
    /// # Errors
    ///
    /// [`TopologyError::ReservedId`] for `pe_id == 0`,
    /// [`TopologyError::MgNotFound`] when the group is absent,
    /// [`TopologyError::PeExists`] when the element id is taken. The
    /// original device is untouched on error.
    ///
    /// # Panics
    ///
    /// Panics if a key re-selects a foreign MG, which an unchanged MG
    /// bucket makes impossible.
    pub fn scale_up_mg(&self, mg_id: u32, pe_id: u32, pe_weight: u32) -> Result<Device> {
        if pe_id == 0 {
            return Err(TopologyError::ReservedId);
        }
        if !self.find_mg(mg_id) {
            return Err(TopologyError::MgNotFound(mg_id));
        }
        if self.mg(mg_id).find_pe(pe_id) {
            return Err(TopologyError::PeExists { mg_id, pe_id });
        }

        let mut device = self.clone();
        let mg_index = device.mg_index(mg_id);
        device.mgs[mg_index].add_pe(pe_id, pe_weight);
        device.weight = device.weight.wrapping_add(pe_weight);

        device.reassign_within_mg(mg_id, |own_pe| own_pe != pe_id);
        Ok(device)
    }

    /// Remove one PE from a group: clone the device, drop the element from
    /// the PE bucket first (so re-selection cannot pick it), migrate every
    /// key it held to a sibling, then drop the element itself. The MG
    /// bucket is unchanged.
    ///
    /// # Errors
    ///
    /// [`TopologyError::MgNotFound`] when the group is absent. The
    /// original device is untouched on error.
    ///
    /// # Panics
    ///
    /// Panics if the element id is unknown, if a key re-selects a foreign
    /// MG, or if a key re-selects the removed element (including the case
    /// where it was the group's only element and the draw comes back
    /// empty).
    pub fn scale_down_mg(&self, mg_id: u32, pe_id: u32) -> Result<Device> {
        if !self.find_mg(mg_id) {
            return Err(TopologyError::MgNotFound(mg_id));
        }

        let mut device = self.clone();
        let mg_index = device.mg_index(mg_id);
        let pe_index = device.mgs[mg_index].pe_index(pe_id);
        device.mgs[mg_index].remove_pe_from_bucket(pe_index);

        device.reassign_within_mg(mg_id, |own_pe| own_pe == pe_id);

        let removed_weight = device.mgs[mg_index].del_pe(pe_index);
        device.weight = device.weight.wrapping_sub(removed_weight);
        Ok(device)
    }

    /// Drop every key everywhere, keeping the topology.
    pub fn clear_data(&mut self) {
        for mg in &mut self.mgs {
            mg.clear_data();
        }
        self.total = 0;
    }

    /// Reset every migration counter in the device.
    pub fn clear_migrate(&mut self) {
        for mg in &mut self.mgs {
            mg.clear_migrate();
        }
    }

    fn add_mg(&mut self, mg: Mg) {
        self.weight = self.weight.wrapping_add(mg.weight());
        self.total += mg.total();
        self.mg_bucket.add_item(mg.id(), mg.weight());
        self.mgs.push(mg);
    }

    /// Drop the MG at `mg_index` from the structural sequence. The bucket
    /// entry must already be gone.
    fn del_mg(&mut self, mg_index: usize) {
        let mg = self.mgs.remove(mg_index);
        self.weight = self.weight.wrapping_sub(mg.weight());
        self.total -= mg.total();
    }

    /// Snapshot `(mg_id, pe_id, keys)` for every PE of every MG matching
    /// the filter. Reassignment sweeps work off this snapshot because the
    /// migrations they emit mutate the very key sets being walked.
    fn snapshot_keys(&self, take_mg: impl Fn(&Mg) -> bool) -> Vec<(u32, u32, Vec<u32>)> {
        self.mgs
            .iter()
            .filter(|&mg| take_mg(mg))
            .flat_map(|mg| {
                let mg_id = mg.id();
                mg.pes().iter().map(move |pe| (mg_id, pe.id(), pe.keys().collect()))
            })
            .collect()
    }

    /// Re-select every key on the matching PEs of one group after its PE
    /// set changed; the destination must stay inside the group.
    fn reassign_within_mg(&mut self, mg_id: u32, take_pe: impl Fn(u32) -> bool) {
        let snapshot: Vec<(u32, Vec<u32>)> = self
            .mg(mg_id)
            .pes()
            .iter()
            .filter(|pe| take_pe(pe.id()))
            .map(|pe| (pe.id(), pe.keys().collect()))
            .collect();

        for (own_pe, keys) in snapshot {
            for key in keys {
                let (to_mg, to_pe) = self.select(key);
                assert_eq!(to_mg, mg_id, "key {key} left MG {mg_id} while its PE set changed");
                if to_pe != own_pe {
                    self.migrate(mg_id, own_pe, mg_id, to_pe, key);
                }
            }
        }
    }
}
