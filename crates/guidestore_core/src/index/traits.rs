//! Index traits and key types.

use crate::entity::EntityId;
use crate::error::{CoreError, CoreResult};
use std::hash::Hash;

/// A key that can be indexed.
///
/// Keys must be hashable for [`super::HashIndex`] and totally ordered for
/// [`super::BTreeIndex`].
pub trait IndexKey: Clone + Eq + Hash + Ord + Send + Sync + 'static {
    /// Renders the key for error messages.
    fn describe(&self) -> String;
}

impl IndexKey for i64 {
    fn describe(&self) -> String {
        self.to_string()
    }
}

impl IndexKey for String {
    fn describe(&self) -> String {
        format!("{self:?}")
    }
}

/// Identity of an index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSpec {
    /// Collection this index belongs to.
    pub collection: String,
    /// Name of the index.
    pub name: String,
    /// Whether the index enforces uniqueness.
    pub unique: bool,
}

impl IndexSpec {
    /// Creates a non-unique index specification.
    pub fn new(collection: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            name: name.into(),
            unique: false,
        }
    }

    /// Makes this a unique index.
    #[must_use]
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Builds the error raised when `key` is already taken.
    pub(crate) fn violation<K: IndexKey>(&self, key: &K) -> CoreError {
        CoreError::UniqueViolation {
            collection: self.collection.clone(),
            index: self.name.clone(),
            key: key.describe(),
        }
    }
}

/// Core index trait.
pub trait Index<K: IndexKey>: Send + Sync {
    /// Returns the index specification.
    fn spec(&self) -> &IndexSpec;

    /// Inserts a key-entity mapping.
    ///
    /// # Errors
    ///
    /// Returns `UniqueViolation` if the index is unique and the key is
    /// held by a different entity.
    fn insert(&mut self, key: K, entity_id: EntityId) -> CoreResult<()>;

    /// Removes a key-entity mapping. Returns true if it was present.
    fn remove(&mut self, key: &K, entity_id: EntityId) -> bool;

    /// Looks up entities by exact key, in id order.
    fn lookup(&self, key: &K) -> Vec<EntityId>;

    /// Checks if the index contains a key.
    fn contains(&self, key: &K) -> bool;

    /// Returns the number of entries in the index.
    fn len(&self) -> usize;

    /// Returns true if the index is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clears the index.
    fn clear(&mut self);

    /// Fails if inserting `key` for `entity_id` would break uniqueness.
    fn check_unique(&self, key: &K, entity_id: EntityId) -> CoreResult<()> {
        if self.spec().unique && self.lookup(key).iter().any(|id| *id != entity_id) {
            return Err(self.spec().violation(key));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_spec_builder() {
        let spec = IndexSpec::new("categories", "name").unique();

        assert_eq!(spec.collection, "categories");
        assert_eq!(spec.name, "name");
        assert!(spec.unique);
    }

    #[test]
    fn violation_names_index_and_key() {
        let spec = IndexSpec::new("settings", "key").unique();
        let err = spec.violation(&"theme".to_string());

        assert!(err.is_constraint_violation());
        assert_eq!(
            err.to_string(),
            "unique index settings.key already contains key \"theme\""
        );
    }
}
