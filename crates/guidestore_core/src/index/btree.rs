//! BTree index implementation.

use crate::entity::EntityId;
use crate::error::CoreResult;
use crate::index::traits::{Index, IndexKey, IndexSpec};
use crate::types::ScanOrder;
use std::collections::{BTreeMap, BTreeSet};
use std::ops::RangeBounds;

/// BTree-based index for ordered traversal and range queries.
///
/// Backs every query that needs ordering: guides by title or by
/// modification time, progress by last access, categories by name.
///
/// # Example
///
/// ```rust,ignore
/// let mut index: BTreeIndex<i64> = BTreeIndex::new(IndexSpec::new("guides", "updated_at"));
/// index.insert(updated_at_ms, guide_id)?;
///
/// // Five most recently modified guides
/// let recent = index.scan(ScanOrder::Descending, Some(5));
/// ```
pub struct BTreeIndex<K: IndexKey> {
    spec: IndexSpec,
    entries: BTreeMap<K, BTreeSet<EntityId>>,
    count: usize,
}

impl<K: IndexKey> BTreeIndex<K> {
    /// Creates a new BTree index.
    pub fn new(spec: IndexSpec) -> Self {
        Self {
            spec,
            entries: BTreeMap::new(),
            count: 0,
        }
    }

    /// Returns entities with keys in the given range, in key order.
    pub fn range<R>(&self, range: R) -> Vec<EntityId>
    where
        R: RangeBounds<K>,
    {
        self.entries
            .range(range)
            .flat_map(|(_, ids)| ids.iter().copied())
            .collect()
    }

    /// Walks the index in the given order, stopping after `limit` entries.
    ///
    /// Entities sharing a key come out in id order (reversed when
    /// descending) so the traversal is deterministic.
    pub fn scan(&self, order: ScanOrder, limit: Option<usize>) -> Vec<(K, EntityId)> {
        let limit = limit.unwrap_or(usize::MAX);
        let flatten = |(key, ids): (&K, &BTreeSet<EntityId>)| {
            let key = key.clone();
            let ids: Vec<EntityId> = match order {
                ScanOrder::Ascending => ids.iter().copied().collect(),
                ScanOrder::Descending => ids.iter().rev().copied().collect(),
            };
            ids.into_iter().map(move |id| (key.clone(), id))
        };

        match order {
            ScanOrder::Ascending => self.entries.iter().flat_map(flatten).take(limit).collect(),
            ScanOrder::Descending => self
                .entries
                .iter()
                .rev()
                .flat_map(flatten)
                .take(limit)
                .collect(),
        }
    }

    /// Returns the distinct keys in ascending order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.keys()
    }

    /// Returns the minimum key.
    pub fn min_key(&self) -> Option<&K> {
        self.entries.keys().next()
    }

    /// Returns the maximum key.
    pub fn max_key(&self) -> Option<&K> {
        self.entries.keys().next_back()
    }
}

impl<K: IndexKey> Index<K> for BTreeIndex<K> {
    fn spec(&self) -> &IndexSpec {
        &self.spec
    }

    fn insert(&mut self, key: K, entity_id: EntityId) -> CoreResult<()> {
        self.check_unique(&key, entity_id)?;

        if self.entries.entry(key).or_default().insert(entity_id) {
            self.count += 1;
        }
        Ok(())
    }

    fn remove(&mut self, key: &K, entity_id: EntityId) -> bool {
        let Some(set) = self.entries.get_mut(key) else {
            return false;
        };
        if !set.remove(&entity_id) {
            return false;
        }
        self.count -= 1;
        if set.is_empty() {
            self.entries.remove(key);
        }
        true
    }

    fn lookup(&self, key: &K) -> Vec<EntityId> {
        self.entries
            .get(key)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    fn len(&self) -> usize {
        self.count
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_spec() -> IndexSpec {
        IndexSpec::new("guides", "updated_at")
    }

    #[test]
    fn insert_and_lookup() {
        let mut index = BTreeIndex::new(test_spec());
        let entity_id = EntityId::new();

        index.insert(25, entity_id).unwrap();

        assert_eq!(index.lookup(&25), vec![entity_id]);
    }

    #[test]
    fn range_query() {
        let mut index = BTreeIndex::new(test_spec());
        for ts in [10, 20, 30, 40, 50] {
            index.insert(ts, EntityId::new()).unwrap();
        }

        assert_eq!(index.range(20..40).len(), 2);
        assert_eq!(index.range(20..=40).len(), 3);
        assert_eq!(index.range(..30).len(), 2);
    }

    #[test]
    fn scan_ascending_and_descending() {
        let mut index = BTreeIndex::new(test_spec());
        for ts in [30, 10, 50, 20, 40] {
            index.insert(ts, EntityId::new()).unwrap();
        }

        let asc: Vec<i64> = index
            .scan(ScanOrder::Ascending, None)
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(asc, vec![10, 20, 30, 40, 50]);

        let desc: Vec<i64> = index
            .scan(ScanOrder::Descending, Some(2))
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(desc, vec![50, 40]);
    }

    #[test]
    fn scan_limit_counts_entities_not_keys() {
        let mut index = BTreeIndex::new(test_spec());
        for _ in 0..3 {
            index.insert(7, EntityId::new()).unwrap();
        }
        index.insert(9, EntityId::new()).unwrap();

        let first_two = index.scan(ScanOrder::Ascending, Some(2));
        assert_eq!(first_two.len(), 2);
        assert!(first_two.iter().all(|(k, _)| *k == 7));
    }

    #[test]
    fn min_max_key() {
        let mut index = BTreeIndex::new(test_spec());
        for ts in [30, 10, 50] {
            index.insert(ts, EntityId::new()).unwrap();
        }

        assert_eq!(index.min_key(), Some(&10));
        assert_eq!(index.max_key(), Some(&50));
        assert_eq!(index.keys().count(), 3);
    }

    #[test]
    fn remove_entry() {
        let mut index = BTreeIndex::new(test_spec());
        let entity_id = EntityId::new();

        index.insert(25, entity_id).unwrap();
        assert!(index.remove(&25, entity_id));
        assert!(!index.contains(&25));
        assert!(index.is_empty());
    }

    #[test]
    fn string_keys_sort_lexicographically() {
        let mut index = BTreeIndex::new(IndexSpec::new("guides", "title"));
        index.insert("installing a router".to_string(), EntityId::new()).unwrap();
        index.insert("backup procedure".to_string(), EntityId::new()).unwrap();
        index.insert("configuring vlans".to_string(), EntityId::new()).unwrap();

        let titles: Vec<String> = index
            .scan(ScanOrder::Ascending, None)
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(
            titles,
            vec!["backup procedure", "configuring vlans", "installing a router"]
        );
    }

    #[test]
    fn unique_constraint() {
        let mut index = BTreeIndex::new(IndexSpec::new("categories", "name").unique());

        index.insert("networking".to_string(), EntityId::new()).unwrap();
        assert!(index
            .insert("networking".to_string(), EntityId::new())
            .is_err());
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn scan_is_sorted_and_complete(keys in prop::collection::vec(any::<i64>(), 0..64)) {
                let mut index = BTreeIndex::new(test_spec());
                for key in &keys {
                    index.insert(*key, EntityId::new()).unwrap();
                }

                let asc: Vec<i64> = index
                    .scan(ScanOrder::Ascending, None)
                    .into_iter()
                    .map(|(k, _)| k)
                    .collect();
                let mut expected = keys.clone();
                expected.sort_unstable();
                prop_assert_eq!(&asc, &expected);

                let desc: Vec<i64> = index
                    .scan(ScanOrder::Descending, None)
                    .into_iter()
                    .map(|(k, _)| k)
                    .collect();
                expected.reverse();
                prop_assert_eq!(desc, expected);
            }

            #[test]
            fn unique_index_never_holds_two_ids_per_key(
                keys in prop::collection::vec("[a-c]{1,2}", 1..32)
            ) {
                let mut index = BTreeIndex::new(IndexSpec::new("categories", "name").unique());
                for key in keys {
                    let _ = index.insert(key, EntityId::new());
                }
                for key in index.keys() {
                    prop_assert_eq!(index.lookup(key).len(), 1);
                }
            }
        }
    }
}
