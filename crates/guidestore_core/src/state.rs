//! In-memory view of the log.
//!
//! Replaying the log builds, per collection, a primary index (id → offset
//! of the latest `Put`) and every secondary index declared in the schema.
//! Each collection also remembers the keys it indexed per document so an
//! update or delete can remove exactly the entries it added.

use crate::entity::EntityId;
use crate::error::{CoreError, CoreResult};
use crate::index::{BTreeIndex, HashIndex, Index, IndexSpec, IndexValue};
use crate::record::{Record, RecordKind};
use crate::schema::{IndexDefinition, IndexKind, Schema};
use crate::types::{CollectionId, ScanOrder};
use ciborium::Value;
use std::collections::{BTreeMap, HashMap};

/// Decodes a document payload into a CBOR value.
pub(crate) fn decode_value(payload: &[u8]) -> CoreResult<Value> {
    ciborium::from_reader(payload).map_err(|e| CoreError::codec(e.to_string()))
}

enum IndexStorage {
    Hash(HashIndex<IndexValue>),
    BTree(BTreeIndex<IndexValue>),
}

pub(crate) struct SecondaryIndex {
    definition: IndexDefinition,
    storage: IndexStorage,
}

impl SecondaryIndex {
    fn new(collection: &str, definition: IndexDefinition) -> Self {
        let mut spec = IndexSpec::new(collection, definition.name.clone());
        if definition.unique {
            spec = spec.unique();
        }
        let storage = match definition.kind {
            IndexKind::Hash => IndexStorage::Hash(HashIndex::new(spec)),
            IndexKind::BTree => IndexStorage::BTree(BTreeIndex::new(spec)),
        };
        Self {
            definition,
            storage,
        }
    }

    pub(crate) fn definition(&self) -> &IndexDefinition {
        &self.definition
    }

    fn key_for(&self, document: &Value) -> IndexValue {
        IndexValue::extract(document, &self.definition.fields)
    }

    fn index(&self) -> &dyn Index<IndexValue> {
        match &self.storage {
            IndexStorage::Hash(index) => index,
            IndexStorage::BTree(index) => index,
        }
    }

    fn index_mut(&mut self) -> &mut dyn Index<IndexValue> {
        match &mut self.storage {
            IndexStorage::Hash(index) => index,
            IndexStorage::BTree(index) => index,
        }
    }

    pub(crate) fn lookup(&self, key: &IndexValue) -> Vec<EntityId> {
        self.index().lookup(key)
    }

    pub(crate) fn scan(
        &self,
        order: ScanOrder,
        limit: Option<usize>,
    ) -> CoreResult<Vec<(IndexValue, EntityId)>> {
        match &self.storage {
            IndexStorage::BTree(index) => Ok(index.scan(order, limit)),
            IndexStorage::Hash(_) => Err(CoreError::invalid_operation(format!(
                "index {} is a hash index and cannot be scanned in order",
                self.definition.name
            ))),
        }
    }
}

pub(crate) struct CollectionState {
    id: CollectionId,
    name: String,
    documents: BTreeMap<EntityId, u64>,
    indexes: Vec<SecondaryIndex>,
    keys: HashMap<EntityId, Vec<IndexValue>>,
}

impl CollectionState {
    fn new(id: CollectionId, name: String, definitions: &[IndexDefinition]) -> Self {
        let indexes = definitions
            .iter()
            .map(|d| SecondaryIndex::new(&name, d.clone()))
            .collect();
        Self {
            id,
            name,
            documents: BTreeMap::new(),
            indexes,
            keys: HashMap::new(),
        }
    }

    pub(crate) fn id(&self) -> CollectionId {
        self.id
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn len(&self) -> usize {
        self.documents.len()
    }

    pub(crate) fn index_count(&self) -> usize {
        self.indexes.len()
    }

    pub(crate) fn offset_of(&self, id: EntityId) -> Option<u64> {
        self.documents.get(&id).copied()
    }

    pub(crate) fn contains(&self, id: EntityId) -> bool {
        self.documents.contains_key(&id)
    }

    /// Live documents in id order.
    pub(crate) fn documents(&self) -> impl Iterator<Item = (EntityId, u64)> + '_ {
        self.documents.iter().map(|(id, offset)| (*id, *offset))
    }

    pub(crate) fn indexes(&self) -> impl Iterator<Item = &SecondaryIndex> {
        self.indexes.iter()
    }

    pub(crate) fn index(&self, name: &str) -> CoreResult<&SecondaryIndex> {
        self.indexes
            .iter()
            .find(|i| i.definition.name == name)
            .ok_or_else(|| CoreError::IndexNotFound {
                collection: self.name.clone(),
                index: name.to_string(),
            })
    }

    pub(crate) fn keys_for(&self, document: &Value) -> Vec<IndexValue> {
        self.indexes.iter().map(|i| i.key_for(document)).collect()
    }

    /// Fails if storing `keys` for `id` would break a unique index.
    pub(crate) fn check_unique(&self, keys: &[IndexValue], id: EntityId) -> CoreResult<()> {
        for (index, key) in self.indexes.iter().zip(keys) {
            index.index().check_unique(key, id)?;
        }
        Ok(())
    }

    /// Points `id` at a new version and re-indexes it.
    pub(crate) fn put(&mut self, id: EntityId, offset: u64, keys: Vec<IndexValue>) -> CoreResult<()> {
        self.unindex(id);
        for (index, key) in self.indexes.iter_mut().zip(&keys) {
            index.index_mut().insert(key.clone(), id)?;
        }
        self.keys.insert(id, keys);
        self.documents.insert(id, offset);
        Ok(())
    }

    /// Drops `id` from every index. Returns true if it was live.
    pub(crate) fn remove(&mut self, id: EntityId) -> bool {
        self.unindex(id);
        self.documents.remove(&id).is_some()
    }

    pub(crate) fn relocate(&mut self, id: EntityId, offset: u64) {
        if let Some(slot) = self.documents.get_mut(&id) {
            *slot = offset;
        }
    }

    fn unindex(&mut self, id: EntityId) {
        if let Some(old_keys) = self.keys.remove(&id) {
            for (index, key) in self.indexes.iter_mut().zip(&old_keys) {
                index.index_mut().remove(key, id);
            }
        }
    }
}

/// Everything replayed from the log so far.
pub(crate) struct State {
    collections: HashMap<CollectionId, CollectionState>,
    names: HashMap<String, CollectionId>,
    definitions: HashMap<String, Vec<IndexDefinition>>,
    /// Offset just past the last applied record.
    pub(crate) applied_to: u64,
}

impl State {
    pub(crate) fn new(schema: &Schema, applied_to: u64) -> Self {
        let definitions = schema
            .collections()
            .iter()
            .map(|c| (c.name.clone(), c.indexes.clone()))
            .collect();
        Self {
            collections: HashMap::new(),
            names: HashMap::new(),
            definitions,
            applied_to,
        }
    }

    /// Applies one log record.
    pub(crate) fn apply(&mut self, offset: u64, record: &Record) -> CoreResult<()> {
        match record.kind {
            RecordKind::Collection => {
                let name = String::from_utf8(record.payload.clone())
                    .map_err(|_| CoreError::invalid_format("collection name is not UTF-8"))?;
                self.declare(record.collection_id, name);
            }
            RecordKind::Put => {
                let document = decode_value(&record.payload)?;
                let collection = self.by_id_mut(record.collection_id)?;
                let keys = collection.keys_for(&document);
                collection.put(record.entity_id, offset, keys)?;
            }
            RecordKind::Tombstone => {
                self.by_id_mut(record.collection_id)?.remove(record.entity_id);
            }
        }
        Ok(())
    }

    fn declare(&mut self, id: CollectionId, name: String) {
        if self.names.contains_key(&name) || self.collections.contains_key(&id) {
            return;
        }
        let definitions = self.definitions.get(&name).cloned().unwrap_or_default();
        self.names.insert(name.clone(), id);
        self.collections
            .insert(id, CollectionState::new(id, name, &definitions));
    }

    fn by_id_mut(&mut self, id: CollectionId) -> CoreResult<&mut CollectionState> {
        self.collections
            .get_mut(&id)
            .ok_or_else(|| CoreError::invalid_format(format!("record for undeclared {id}")))
    }

    pub(crate) fn collection(&self, name: &str) -> CoreResult<&CollectionState> {
        self.names
            .get(name)
            .and_then(|id| self.collections.get(id))
            .ok_or_else(|| CoreError::collection_not_found(name))
    }

    pub(crate) fn collection_mut(&mut self, name: &str) -> CoreResult<&mut CollectionState> {
        self.names
            .get(name)
            .and_then(|id| self.collections.get_mut(id))
            .ok_or_else(|| CoreError::collection_not_found(name))
    }

    /// Schema collections that have not been declared in the file yet,
    /// in schema order.
    pub(crate) fn undeclared<'a>(&self, schema: &'a Schema) -> Vec<&'a str> {
        schema
            .collections()
            .iter()
            .map(|c| c.name.as_str())
            .filter(|name| !self.names.contains_key(*name))
            .collect()
    }

    pub(crate) fn next_collection_id(&self) -> CollectionId {
        let max = self.collections.keys().map(|id| id.as_u32()).max().unwrap_or(0);
        CollectionId::new(max + 1)
    }

    /// Collections ordered by id.
    pub(crate) fn collections(&self) -> Vec<&CollectionState> {
        let mut all: Vec<&CollectionState> = self.collections.values().collect();
        all.sort_by_key(|c| c.id);
        all
    }

    pub(crate) fn relocate(&mut self, collection: CollectionId, id: EntityId, offset: u64) {
        if let Some(state) = self.collections.get_mut(&collection) {
            state.relocate(id, offset);
        }
    }
}
