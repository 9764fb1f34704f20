//! Collection and index declarations.
//!
//! A [`Schema`] is handed to the engine at construction time. When the
//! database is materialized every collection is declared in the file (if
//! it is not already) and every index is built from the replayed log, so
//! applying the same schema to an initialized file is a no-op.

/// Physical structure of a secondary index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    /// Equality lookups only.
    Hash,
    /// Equality lookups plus ordered scans.
    BTree,
}

/// A secondary index over one or more document fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDefinition {
    /// Index name, used by lookups.
    pub name: String,
    /// Field paths the key is built from, in order.
    pub fields: Vec<String>,
    /// Whether two documents may share a key.
    pub unique: bool,
    /// Physical structure.
    pub kind: IndexKind,
}

impl IndexDefinition {
    /// Hash index over a single field, named after the field.
    pub fn hash(field: impl Into<String>) -> Self {
        let field = field.into();
        Self {
            name: field.clone(),
            fields: vec![field],
            unique: false,
            kind: IndexKind::Hash,
        }
    }

    /// BTree index over a single field, named after the field.
    pub fn btree(field: impl Into<String>) -> Self {
        let field = field.into();
        Self {
            name: field.clone(),
            fields: vec![field],
            unique: false,
            kind: IndexKind::BTree,
        }
    }

    /// Hash index over several fields.
    pub fn composite<I, S>(name: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            fields: fields.into_iter().map(Into::into).collect(),
            unique: false,
            kind: IndexKind::Hash,
        }
    }

    /// Makes the index unique.
    #[must_use]
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
}

/// A named collection and its indexes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionSchema {
    /// Collection name.
    pub name: String,
    /// Secondary indexes.
    pub indexes: Vec<IndexDefinition>,
}

impl CollectionSchema {
    /// Creates a collection with no indexes.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            indexes: Vec::new(),
        }
    }

    /// Adds an index.
    #[must_use]
    pub fn index(mut self, index: IndexDefinition) -> Self {
        self.indexes.push(index);
        self
    }

    /// Looks up an index by name.
    #[must_use]
    pub fn find_index(&self, name: &str) -> Option<&IndexDefinition> {
        self.indexes.iter().find(|i| i.name == name)
    }
}

/// Every collection a database holds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    collections: Vec<CollectionSchema>,
}

impl Schema {
    /// Creates an empty schema.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a collection. A later declaration with the same name
    /// replaces the earlier one.
    #[must_use]
    pub fn collection(mut self, collection: CollectionSchema) -> Self {
        self.collections.retain(|c| c.name != collection.name);
        self.collections.push(collection);
        self
    }

    /// Returns the declared collections in declaration order.
    #[must_use]
    pub fn collections(&self) -> &[CollectionSchema] {
        &self.collections
    }

    /// Looks up a collection by name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&CollectionSchema> {
        self.collections.iter().find(|c| c.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders_name_single_field_indexes() {
        let idx = IndexDefinition::btree("updated_at");
        assert_eq!(idx.name, "updated_at");
        assert_eq!(idx.fields, vec!["updated_at"]);
        assert_eq!(idx.kind, IndexKind::BTree);
        assert!(!idx.unique);

        assert!(IndexDefinition::hash("key").unique().unique);
    }

    #[test]
    fn composite_keeps_field_order() {
        let idx = IndexDefinition::composite("user_guide", ["user_id", "guide_id"]).unique();
        assert_eq!(idx.fields, vec!["user_id", "guide_id"]);
        assert!(idx.unique);
    }

    #[test]
    fn redeclaring_collection_replaces_it() {
        let schema = Schema::new()
            .collection(CollectionSchema::new("guides"))
            .collection(CollectionSchema::new("guides").index(IndexDefinition::btree("title")));

        assert_eq!(schema.collections().len(), 1);
        let guides = schema.find("guides").unwrap();
        assert!(guides.find_index("title").is_some());
        assert!(schema.find("missing").is_none());
    }
}
