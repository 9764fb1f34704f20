//! Typed collection implementation.

use crate::collection::codec::{decode_document, encode_document, Document};
use crate::collection::cursor::Cursor;
use crate::engine::Engine;
use crate::entity::EntityId;
use crate::error::CoreResult;
use crate::index::IndexValue;
use crate::types::ScanOrder;
use std::marker::PhantomData;
use std::sync::Arc;

/// A typed collection of documents.
///
/// `Collection<T>` provides CRUD and query access to documents of type
/// `T` over a shared [`Engine`]. It holds no state of its own, so
/// creating one is free and never opens the database; every call goes
/// to the engine.
///
/// # Querying
///
/// There is no query language. Filtering uses plain closures over the
/// decoded document, and ordered or keyed access goes through the
/// collection's declared indexes:
///
/// ```rust,ignore
/// // Predicate query
/// let drafts = guides.find(|g| g.steps.is_empty())?.collect::<CoreResult<Vec<_>>>()?;
///
/// // Index lookup (text keys are case-insensitive)
/// let theme = settings.find_one_by_index("key", IndexValue::text("theme"))?;
///
/// // Ordered index scan
/// let newest = guides.scan_index("updated_at", ScanOrder::Descending, Some(5))?;
/// ```
pub struct Collection<T: Document> {
    engine: Arc<Engine>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Document> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Self::new(Arc::clone(&self.engine))
    }
}

impl<T: Document> Collection<T> {
    /// Creates a collection handle over `engine`.
    pub fn new(engine: Arc<Engine>) -> Self {
        Self {
            engine,
            _marker: PhantomData,
        }
    }

    /// Returns the collection name.
    pub fn name(&self) -> &'static str {
        T::COLLECTION
    }

    /// Returns the engine this collection uses.
    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    /// Gets a document by id.
    ///
    /// Returns `None` if the document doesn't exist.
    pub fn get(&self, id: EntityId) -> CoreResult<Option<T>> {
        match self.engine.database()?.get(T::COLLECTION, id)? {
            Some(bytes) => Ok(Some(decode_document(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Returns every document, in no particular order.
    pub fn all(&self) -> CoreResult<Vec<T>> {
        self.engine
            .database()?
            .list(T::COLLECTION)?
            .into_iter()
            .map(|(_, bytes)| decode_document(&bytes))
            .collect()
    }

    /// Returns a lazy cursor over documents matching `predicate`.
    pub fn find<F>(&self, predicate: F) -> CoreResult<Cursor<T, F>>
    where
        F: FnMut(&T) -> bool,
    {
        let db = self.engine.database()?;
        let ids = db.ids(T::COLLECTION)?;
        Ok(Cursor::new(db, ids, predicate))
    }

    /// Returns the first document matching `predicate`.
    pub fn find_one<F>(&self, predicate: F) -> CoreResult<Option<T>>
    where
        F: FnMut(&T) -> bool,
    {
        self.find(predicate)?.next().transpose()
    }

    /// Counts documents matching `predicate`.
    pub fn count<F>(&self, predicate: F) -> CoreResult<usize>
    where
        F: FnMut(&T) -> bool,
    {
        let mut count = 0;
        for document in self.find(predicate)? {
            document?;
            count += 1;
        }
        Ok(count)
    }

    /// Counts all documents without decoding them.
    pub fn len(&self) -> CoreResult<usize> {
        self.engine.database()?.count(T::COLLECTION)
    }

    /// Returns true if the collection holds no documents.
    pub fn is_empty(&self) -> CoreResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Returns true if any document matches `predicate`.
    pub fn exists<F>(&self, predicate: F) -> CoreResult<bool>
    where
        F: FnMut(&T) -> bool,
    {
        Ok(self.find_one(predicate)?.is_some())
    }

    /// Inserts a document and returns its id.
    ///
    /// A nil id is replaced with a fresh one, written back into
    /// `document`.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateId` if the id is taken and `UniqueViolation` if a
    /// unique index already holds one of the document's keys.
    pub fn insert(&self, document: &mut T) -> CoreResult<EntityId> {
        if document.id().is_nil() {
            document.set_id(EntityId::new());
        }
        let id = document.id();
        let bytes = encode_document(document)?;
        self.engine.database()?.insert(T::COLLECTION, id, bytes)?;
        Ok(id)
    }

    /// Replaces the stored version of `document`.
    ///
    /// Returns false if no document with its id exists.
    pub fn update(&self, document: &T) -> CoreResult<bool> {
        let bytes = encode_document(document)?;
        self.engine
            .database()?
            .update(T::COLLECTION, document.id(), bytes)
    }

    /// Deletes a document by id. Returns false if it did not exist.
    pub fn delete(&self, id: EntityId) -> CoreResult<bool> {
        self.engine.database()?.delete(T::COLLECTION, id)
    }

    /// Deletes every document matching `predicate` and returns how many
    /// were removed.
    pub fn delete_many<F>(&self, predicate: F) -> CoreResult<usize>
    where
        F: FnMut(&T) -> bool,
    {
        let ids = self
            .find(predicate)?
            .map(|document| document.map(|d| d.id()))
            .collect::<CoreResult<Vec<_>>>()?;

        let db = self.engine.database()?;
        let mut removed = 0;
        for id in ids {
            if db.delete(T::COLLECTION, id)? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Returns documents whose `index` key equals `key`, in id order.
    pub fn find_by_index(&self, index: &str, key: impl Into<IndexValue>) -> CoreResult<Vec<T>> {
        let db = self.engine.database()?;
        let ids = db.index_lookup(T::COLLECTION, index, &key.into())?;
        self.load(ids)
    }

    /// Returns the first document whose `index` key equals `key`.
    pub fn find_one_by_index(
        &self,
        index: &str,
        key: impl Into<IndexValue>,
    ) -> CoreResult<Option<T>> {
        let db = self.engine.database()?;
        let ids = db.index_lookup(T::COLLECTION, index, &key.into())?;
        match ids.first() {
            Some(id) => self.get(*id),
            None => Ok(None),
        }
    }

    /// Counts documents whose `index` key equals `key` without loading them.
    pub fn count_by_index(&self, index: &str, key: impl Into<IndexValue>) -> CoreResult<usize> {
        let db = self.engine.database()?;
        Ok(db.index_lookup(T::COLLECTION, index, &key.into())?.len())
    }

    /// Returns documents in `index` key order, up to `limit`.
    ///
    /// Only BTree indexes can be scanned.
    pub fn scan_index(
        &self,
        index: &str,
        order: ScanOrder,
        limit: Option<usize>,
    ) -> CoreResult<Vec<T>> {
        let db = self.engine.database()?;
        let ids = db
            .index_scan(T::COLLECTION, index, order, limit)?
            .into_iter()
            .map(|(_, id)| id)
            .collect();
        self.load(ids)
    }

    fn load(&self, ids: Vec<EntityId>) -> CoreResult<Vec<T>> {
        let mut documents = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(document) = self.get(id)? {
                documents.push(document);
            }
        }
        Ok(documents)
    }
}
