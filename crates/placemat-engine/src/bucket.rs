//! Weighted item sets with straw2 selection.
//!
//! A [`Bucket`] holds an ordered sequence of `(id, weight)` items and picks
//! one per key with the straw2 algorithm: every item draws a "straw" whose
//! length is a log-transformed uniform hash divided by the item's weight,
//! and the longest straw wins. The arg-max is distributed in proportion to
//! weight, and adding or removing an item only re-homes the keys whose
//! winning draw involved that item, which is the stability property every
//! scale operation relies on.

use serde::{Deserialize, Serialize};

use crate::hash::{hash2, hash3};

/// Sentinel id returned by selection when no item is eligible.
///
/// Id 0 is reserved for this purpose and never names an MG or a PE.
pub const NO_SELECTION: u32 = 0;

/// `2^32` as a double, the divisor turning a 32-bit hash into a uniform
/// draw in `[0, 1)`.
const HASH_RANGE: f64 = 4_294_967_296.0;

/// One weighted entry in a [`Bucket`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Id of the MG or PE this entry stands for.
    pub id: u32,
    /// Placement weight; 0 makes the entry unselectable but still a member.
    pub weight: u32,
}

/// An ordered, weighted set of items supporting straw2 draws.
///
/// `weight` is always the exact sum of item weights. Items are addressed by
/// position for mutation and by id for selection results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
    weight: u32,
    items: Vec<Item>,
}

impl Bucket {
    /// Create an empty bucket.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an item.
    pub fn add_item(&mut self, id: u32, weight: u32) {
        self.weight = self.weight.wrapping_add(weight);
        self.items.push(Item { id, weight });
    }

    /// Remove the item at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn del_item(&mut self, index: usize) {
        let item = self.items.remove(index);
        self.weight = self.weight.wrapping_sub(item.weight);
    }

    /// Re-weight the item at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn set_weight(&mut self, index: usize, weight: u32) {
        let old = self.items[index].weight;
        self.weight = self.weight.wrapping_sub(old).wrapping_add(weight);
        self.items[index].weight = weight;
    }

    /// Sum of all item weights.
    #[must_use]
    pub fn total_weight(&self) -> u32 {
        self.weight
    }

    /// Number of items, including zero-weight ones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the bucket holds no items at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// One-salt straw2 draw: pick the item id for key `x`.
    ///
    /// Returns [`NO_SELECTION`] when the bucket is empty or every item has
    /// weight 0.
    #[must_use]
    pub fn select(&self, x: u32) -> u32 {
        self.arg_max(|item| hash2(x, item.id))
    }

    /// Two-salt straw2 draw: pick the item id for key `x` under `salt`.
    ///
    /// Used at the PE level with the owning MG's id as the salt, so the
    /// same key draws independently in every group.
    #[must_use]
    pub fn select2(&self, salt: u32, x: u32) -> u32 {
        self.arg_max(|item| hash3(x, salt, item.id))
    }

    fn arg_max(&self, hash: impl Fn(&Item) -> u32) -> u32 {
        let mut best_id = NO_SELECTION;
        let mut best_draw = f64::MIN;
        for item in &self.items {
            if item.weight == 0 {
                continue;
            }
            let draw = straw2_draw(hash(item), item.weight);
            if draw > best_draw {
                best_draw = draw;
                best_id = item.id;
            }
        }
        best_id
    }
}

/// Straw length for one item: `ln(h / 2^32) / weight`.
///
/// `h == 0` yields `ln(0) = -inf`, which never beats the running maximum,
/// so a zero hash simply cannot win the draw.
fn straw2_draw(h: u32, weight: u32) -> f64 {
    (f64::from(h) / HASH_RANGE).ln() / f64::from(weight)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_deterministic() {
        let mut bucket = Bucket::new();
        bucket.add_item(1, 4);
        bucket.add_item(2, 4);
        bucket.add_item(3, 4);

        for key in 0..100 {
            assert_eq!(bucket.select(key), bucket.select(key));
            assert_eq!(bucket.select2(7, key), bucket.select2(7, key));
        }
    }

    #[test]
    fn test_select_empty_bucket() {
        let bucket = Bucket::new();
        assert_eq!(bucket.select(42), NO_SELECTION);
        assert_eq!(bucket.select2(1, 42), NO_SELECTION);
    }

    #[test]
    fn test_select_skips_zero_weight() {
        let mut bucket = Bucket::new();
        bucket.add_item(1, 0);
        bucket.add_item(2, 5);

        for key in 0..1000 {
            assert_eq!(bucket.select(key), 2);
        }
    }

    #[test]
    fn test_select_all_zero_weight() {
        let mut bucket = Bucket::new();
        bucket.add_item(1, 0);
        bucket.add_item(2, 0);
        assert_eq!(bucket.select(42), NO_SELECTION);
    }

    #[test]
    fn test_select_weighted_distribution() {
        let mut bucket = Bucket::new();
        bucket.add_item(1, 1);
        bucket.add_item(2, 2);
        bucket.add_item(3, 1);

        let mut counts = [0u32; 3];
        for key in 0..10_000 {
            counts[(bucket.select(key) - 1) as usize] += 1;
        }

        // Item 2 carries half the total weight; expect roughly 2x the wins.
        let ratio = f64::from(counts[1]) / f64::from(counts[0]);
        assert!((1.5..2.5).contains(&ratio), "weight ratio not respected: {ratio}");
    }

    #[test]
    fn test_select2_salt_changes_draw() {
        let mut bucket = Bucket::new();
        for id in 1..=8 {
            bucket.add_item(id, 4);
        }

        let differs = (0..100u32).any(|key| bucket.select2(1, key) != bucket.select2(2, key));
        assert!(differs, "salt has no effect on the draw");
    }

    #[test]
    fn test_weight_bookkeeping() {
        let mut bucket = Bucket::new();
        bucket.add_item(1, 3);
        bucket.add_item(2, 5);
        bucket.add_item(3, 2);
        assert_eq!(bucket.total_weight(), 10);

        bucket.set_weight(1, 9);
        assert_eq!(bucket.total_weight(), 14);
        assert_eq!(bucket.items()[1], Item { id: 2, weight: 9 });

        bucket.del_item(0);
        assert_eq!(bucket.total_weight(), 11);
        assert_eq!(bucket.len(), 2);
        assert_eq!(bucket.items()[0].id, 2);
    }

    #[test]
    fn test_add_item_stability() {
        // Adding an item must only re-home keys the new item wins.
        let mut bucket = Bucket::new();
        for id in 1..=4 {
            bucket.add_item(id, 4);
        }
        let before: Vec<u32> = (0..5_000).map(|key| bucket.select(key)).collect();

        bucket.add_item(5, 4);
        for (key, old) in (0..5_000u32).zip(before) {
            let now = bucket.select(key);
            assert!(now == old || now == 5, "key {key} moved from {old} to {now}");
        }
    }
}
