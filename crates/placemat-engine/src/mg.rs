//! Migration groups: ordered PE sets with a mirrored straw2 bucket.

use serde::{Deserialize, Serialize};

use crate::bucket::Bucket;
use crate::pe::{MigrateStats, Pe};

/// A migration group.
///
/// The group maintains two parallel representations of its elements: `pes`,
/// the structural sequence addressed by index, and `pe_bucket`, the straw2
/// bucket the selection hot path runs over. Every mutation updates both, so
/// the bucket always holds exactly one item per PE with matching id and
/// weight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mg {
    id: u32,
    weight: u32,
    total: u32,
    pes: Vec<Pe>,
    pe_bucket: Bucket,
    migrate: MigrateStats,
}

impl Mg {
    /// Build a group of `pe_num` elements with ids `1..=pe_num`, all at
    /// `pe_weight`.
    pub(crate) fn new(mg_id: u32, pe_num: u32, pe_weight: u32) -> Self {
        let mut mg = Self {
            id: mg_id,
            weight: 0,
            total: 0,
            pes: Vec::with_capacity(pe_num as usize),
            pe_bucket: Bucket::new(),
            migrate: MigrateStats::default(),
        };
        for pe_id in 1..=pe_num {
            mg.add_pe(pe_id, pe_weight);
        }
        mg
    }

    /// Group id, unique within the device.
    #[must_use]
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Sum of the group's PE weights.
    #[must_use]
    pub fn weight(&self) -> u32 {
        self.weight
    }

    /// Number of keys stored across the group's PEs.
    #[must_use]
    pub fn total(&self) -> u32 {
        self.total
    }

    /// Number of PEs in the group.
    #[must_use]
    pub fn size(&self) -> u32 {
        self.pes.len() as u32
    }

    /// The group's PEs in insertion order.
    #[must_use]
    pub fn pes(&self) -> &[Pe] {
        &self.pes
    }

    /// The straw2 bucket mirroring [`Self::pes`].
    #[must_use]
    pub fn pe_bucket(&self) -> &Bucket {
        &self.pe_bucket
    }

    /// The group's cumulative cross-MG migration counters.
    #[must_use]
    pub fn migrate_stats(&self) -> MigrateStats {
        self.migrate
    }

    /// Whether a PE with `pe_id` exists in the group.
    #[must_use]
    pub fn find_pe(&self, pe_id: u32) -> bool {
        self.pes.iter().any(|pe| pe.id() == pe_id)
    }

    /// Position of the PE with `pe_id`.
    ///
    /// # Panics
    ///
    /// Panics if no such PE exists; callers resolve ids that the topology
    /// guarantees to be present, so a miss is a structural violation.
    #[must_use]
    pub fn pe_index(&self, pe_id: u32) -> usize {
        self.pes
            .iter()
            .position(|pe| pe.id() == pe_id)
            .unwrap_or_else(|| panic!("no PE with id {pe_id} in MG {}", self.id))
    }

    /// Pick the PE for `key`: a two-salt draw salted with the group id.
    #[must_use]
    pub fn select(&self, key: u32) -> u32 {
        self.pe_bucket.select2(self.id, key)
    }

    /// Append a PE and its bucket mirror entry.
    pub(crate) fn add_pe(&mut self, pe_id: u32, weight: u32) {
        self.weight = self.weight.wrapping_add(weight);
        self.pes.push(Pe::new(pe_id, weight));
        self.pe_bucket.add_item(pe_id, weight);
    }

    /// Drop the PE at `pe_index` from the structural sequence, settling the
    /// group's weight and total. The bucket entry must already be gone (the
    /// scale-down path removes it first so re-selection cannot pick it).
    ///
    /// Returns the removed element's weight.
    pub(crate) fn del_pe(&mut self, pe_index: usize) -> u32 {
        let pe = self.pes.remove(pe_index);
        self.weight = self.weight.wrapping_sub(pe.weight());
        self.total -= pe.key_count() as u32;
        pe.weight()
    }

    /// Remove the bucket mirror entry for the PE at `pe_index`.
    pub(crate) fn remove_pe_from_bucket(&mut self, pe_index: usize) {
        self.pe_bucket.del_item(pe_index);
    }

    /// Re-weight the PE at `pe_index` in both representations.
    pub(crate) fn set_pe_weight(&mut self, pe_index: usize, weight: u32) {
        let old = self.pes[pe_index].weight();
        self.weight = self.weight.wrapping_sub(old).wrapping_add(weight);
        self.pes[pe_index].set_weight(weight);
        self.pe_bucket.set_weight(pe_index, weight);
    }

    pub(crate) fn add_data(&mut self, pe_index: usize, key: u32) {
        self.total += 1;
        self.pes[pe_index].add_data(key);
    }

    /// Cross-MG inbound migration: bumps the group counter.
    pub(crate) fn migrate_in(&mut self, pe_index: usize, key: u32) {
        self.pes[pe_index].migrate_in(key);
        self.migrate.inbound += 1;
        self.total += 1;
    }

    /// Cross-MG outbound migration: bumps the group counter.
    pub(crate) fn migrate_out(&mut self, pe_index: usize, key: u32) {
        self.pes[pe_index].migrate_out(key);
        self.migrate.outbound += 1;
        self.total -= 1;
    }

    /// Intra-MG inbound migration: the key stays in the group, so only the
    /// PE counter moves.
    pub(crate) fn pe_migrate_in(&mut self, pe_index: usize, key: u32) {
        self.pes[pe_index].migrate_in(key);
        self.total += 1;
    }

    /// Intra-MG outbound migration.
    pub(crate) fn pe_migrate_out(&mut self, pe_index: usize, key: u32) {
        self.pes[pe_index].migrate_out(key);
        self.total -= 1;
    }

    /// Drop every key in the group and reset its total.
    pub fn clear_data(&mut self) {
        for pe in &mut self.pes {
            pe.clear_data();
        }
        self.total = 0;
    }

    /// Reset the group's and every PE's migration counters.
    pub fn clear_migrate(&mut self) {
        self.migrate.clear();
        for pe in &mut self.pes {
            pe.clear_migrate();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_mirror(mg: &Mg) {
        assert_eq!(mg.pe_bucket().len(), mg.pes().len());
        for (item, pe) in mg.pe_bucket().items().iter().zip(mg.pes()) {
            assert_eq!(item.id, pe.id());
            assert_eq!(item.weight, pe.weight());
        }
        assert_eq!(mg.weight(), mg.pes().iter().map(Pe::weight).sum::<u32>());
    }

    #[test]
    fn test_new_builds_sequential_pe_ids() {
        let mg = Mg::new(3, 4, 8);
        assert_eq!(mg.size(), 4);
        assert_eq!(mg.weight(), 32);
        let ids: Vec<u32> = mg.pes().iter().map(Pe::id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
        assert_mirror(&mg);
    }

    #[test]
    fn test_add_and_set_weight_keep_mirror() {
        let mut mg = Mg::new(1, 2, 4);
        mg.add_pe(7, 6);
        assert_mirror(&mg);

        mg.set_pe_weight(0, 10);
        assert_eq!(mg.weight(), 20);
        assert_mirror(&mg);
    }

    #[test]
    fn test_select_stays_within_group() {
        let mg = Mg::new(1, 8, 4);
        for key in 0..1000 {
            let pe_id = mg.select(key);
            assert!(mg.find_pe(pe_id), "selected unknown PE {pe_id}");
        }
    }

    #[test]
    fn test_groups_draw_independently() {
        // The same key must not fall on the same PE index in every group.
        let a = Mg::new(1, 8, 4);
        let b = Mg::new(2, 8, 4);
        let differs = (0..100).any(|key| a.select(key) != b.select(key));
        assert!(differs, "PE draw ignores the MG salt");
    }

    #[test]
    fn test_data_totals() {
        let mut mg = Mg::new(1, 2, 4);
        mg.add_data(0, 11);
        mg.add_data(1, 22);
        assert_eq!(mg.total(), 2);

        mg.pe_migrate_out(0, 11);
        mg.pe_migrate_in(1, 11);
        assert_eq!(mg.total(), 2);
        assert_eq!(mg.migrate_stats(), MigrateStats::default());

        mg.migrate_out(1, 11);
        assert_eq!(mg.total(), 1);
        assert_eq!(mg.migrate_stats().outbound, 1);
    }

    #[test]
    fn test_clear_data_resets_total() {
        let mut mg = Mg::new(1, 2, 4);
        mg.add_data(0, 11);
        mg.add_data(0, 12);
        mg.clear_data();
        assert_eq!(mg.total(), 0);
        assert_eq!(mg.pes()[0].key_count(), 0);
    }

    #[test]
    #[should_panic(expected = "no PE with id 9")]
    fn test_unknown_pe_index_is_fatal() {
        let mg = Mg::new(1, 2, 4);
        let _ = mg.pe_index(9);
    }
}
