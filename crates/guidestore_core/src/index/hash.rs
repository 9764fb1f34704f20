//! Hash index implementation.

use crate::entity::EntityId;
use crate::error::CoreResult;
use crate::index::traits::{Index, IndexKey, IndexSpec};
use std::collections::{BTreeSet, HashMap};

/// Hash-based index for equality lookups.
///
/// Maps each key to the set of entities holding it. Used for lookups
/// that never need ordering, like a user's role or a settings key.
///
/// # Example
///
/// ```rust,ignore
/// let mut index: HashIndex<String> = HashIndex::new(IndexSpec::new("settings", "key").unique());
/// index.insert("theme".to_string(), setting_id)?;
/// let found = index.lookup(&"theme".to_string());
/// ```
pub struct HashIndex<K: IndexKey> {
    spec: IndexSpec,
    entries: HashMap<K, BTreeSet<EntityId>>,
    count: usize,
}

impl<K: IndexKey> HashIndex<K> {
    /// Creates a new hash index.
    pub fn new(spec: IndexSpec) -> Self {
        Self {
            spec,
            entries: HashMap::new(),
            count: 0,
        }
    }
}

impl<K: IndexKey> Index<K> for HashIndex<K> {
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
    use crate::error::CoreError;

    fn test_spec() -> IndexSpec {
        IndexSpec::new("users", "role")
    }

    fn unique_spec() -> IndexSpec {
        IndexSpec::new("settings", "key").unique()
    }

    #[test]
    fn insert_and_lookup() {
        let mut index = HashIndex::new(test_spec());
        let entity_id = EntityId::new();

        index.insert("admin".to_string(), entity_id).unwrap();

        assert_eq!(index.lookup(&"admin".to_string()), vec![entity_id]);
        assert!(index.lookup(&"technician".to_string()).is_empty());
    }

    #[test]
    fn multiple_entities_same_key() {
        let mut index = HashIndex::new(test_spec());
        let id1 = EntityId::new();
        let id2 = EntityId::new();

        index.insert("technician".to_string(), id1).unwrap();
        index.insert("technician".to_string(), id2).unwrap();

        let found = index.lookup(&"technician".to_string());
        assert_eq!(found.len(), 2);
        assert!(found.contains(&id1));
        assert!(found.contains(&id2));
    }

    #[test]
    fn remove_one_of_many() {
        let mut index = HashIndex::new(test_spec());
        let id1 = EntityId::new();
        let id2 = EntityId::new();

        index.insert("admin".to_string(), id1).unwrap();
        index.insert("admin".to_string(), id2).unwrap();

        assert!(index.remove(&"admin".to_string(), id1));
        assert!(!index.remove(&"admin".to_string(), id1));
        assert_eq!(index.lookup(&"admin".to_string()), vec![id2]);
    }

    #[test]
    fn removing_last_entry_drops_key() {
        let mut index = HashIndex::new(test_spec());
        let entity_id = EntityId::new();

        index.insert("admin".to_string(), entity_id).unwrap();
        index.remove(&"admin".to_string(), entity_id);

        assert!(!index.contains(&"admin".to_string()));
        assert!(index.is_empty());
    }

    #[test]
    fn unique_index_prevents_duplicates() {
        let mut index = HashIndex::new(unique_spec());

        index.insert("theme".to_string(), EntityId::new()).unwrap();
        let result = index.insert("theme".to_string(), EntityId::new());

        assert!(matches!(result, Err(CoreError::UniqueViolation { .. })));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn unique_index_allows_same_entity() {
        let mut index = HashIndex::new(unique_spec());
        let entity_id = EntityId::new();

        index.insert("theme".to_string(), entity_id).unwrap();
        index.insert("theme".to_string(), entity_id).unwrap();

        assert_eq!(index.len(), 1);
        assert!(index.check_unique(&"theme".to_string(), entity_id).is_ok());
    }

    #[test]
    fn clear_empties_index() {
        let mut index = HashIndex::new(test_spec());
        for i in 0..5 {
            index.insert(format!("key{i}"), EntityId::new()).unwrap();
        }
        assert_eq!(index.len(), 5);

        index.clear();
        assert!(index.is_empty());
    }
}
