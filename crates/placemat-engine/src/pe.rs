//! Placement elements: the leaves that own keys.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Cumulative in/out migration counters.
///
/// Counters only ever grow until explicitly cleared; they survive across
/// any number of scale operations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrateStats {
    /// Keys migrated onto this element or group.
    pub inbound: u32,
    /// Keys migrated off this element or group.
    pub outbound: u32,
}

impl MigrateStats {
    /// Reset both counters to zero.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// A leaf placement element: a weighted owner of a set of keys.
///
/// `weight` always equals the weight of the element's entry in the owning
/// MG's PE bucket; the MG keeps the two in lockstep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pe {
    id: u32,
    weight: u32,
    data: HashSet<u32>,
    migrate: MigrateStats,
}

impl Pe {
    pub(crate) fn new(id: u32, weight: u32) -> Self {
        Self { id, weight, data: HashSet::new(), migrate: MigrateStats::default() }
    }

    /// Element id, unique within the owning MG.
    #[must_use]
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Placement weight.
    #[must_use]
    pub fn weight(&self) -> u32 {
        self.weight
    }

    /// Number of keys currently stored here.
    #[must_use]
    pub fn key_count(&self) -> usize {
        self.data.len()
    }

    /// Whether `key` is stored here.
    #[must_use]
    pub fn contains(&self, key: u32) -> bool {
        self.data.contains(&key)
    }

    /// Iterate over the stored keys, in no particular order.
    pub fn keys(&self) -> impl Iterator<Item = u32> + '_ {
        self.data.iter().copied()
    }

    /// The element's cumulative migration counters.
    #[must_use]
    pub fn migrate_stats(&self) -> MigrateStats {
        self.migrate
    }

    pub(crate) fn set_weight(&mut self, weight: u32) {
        self.weight = weight;
    }

    /// Store `key`. Inserting a key already present is a programming error.
    pub(crate) fn add_data(&mut self, key: u32) {
        assert!(self.data.insert(key), "key {key} already present on PE {}", self.id);
    }

    /// Drop `key`. Deleting an absent key is a programming error.
    pub(crate) fn del_data(&mut self, key: u32) {
        assert!(self.data.remove(&key), "key {key} not present on PE {}", self.id);
    }

    pub(crate) fn migrate_in(&mut self, key: u32) {
        self.add_data(key);
        self.migrate.inbound += 1;
    }

    pub(crate) fn migrate_out(&mut self, key: u32) {
        self.del_data(key);
        self.migrate.outbound += 1;
    }

    pub(crate) fn clear_data(&mut self) {
        self.data.clear();
    }

    /// Reset the element's migration counters.
    pub fn clear_migrate(&mut self) {
        self.migrate.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_membership() {
        let mut pe = Pe::new(1, 4);
        pe.add_data(10);
        pe.add_data(20);
        assert_eq!(pe.key_count(), 2);
        assert!(pe.contains(10));

        pe.del_data(10);
        assert_eq!(pe.key_count(), 1);
        assert!(!pe.contains(10));
    }

    #[test]
    #[should_panic(expected = "already present")]
    fn test_duplicate_insert_is_fatal() {
        let mut pe = Pe::new(1, 4);
        pe.add_data(10);
        pe.add_data(10);
    }

    #[test]
    #[should_panic(expected = "not present")]
    fn test_absent_delete_is_fatal() {
        let mut pe = Pe::new(1, 4);
        pe.del_data(10);
    }

    #[test]
    fn test_migrate_counters_accumulate() {
        let mut pe = Pe::new(1, 4);
        pe.migrate_in(10);
        pe.migrate_in(20);
        pe.migrate_out(10);

        let stats = pe.migrate_stats();
        assert_eq!(stats.inbound, 2);
        assert_eq!(stats.outbound, 1);

        pe.clear_migrate();
        assert_eq!(pe.migrate_stats(), MigrateStats::default());
        // Clearing counters does not touch the data.
        assert!(pe.contains(20));
    }

    #[test]
    fn test_clone_is_deep() {
        let mut pe = Pe::new(1, 4);
        pe.add_data(10);

        let mut copy = pe.clone();
        copy.add_data(20);
        assert!(!pe.contains(20));
    }
}
