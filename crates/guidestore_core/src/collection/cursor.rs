//! Lazy query results.

use crate::collection::codec::{decode_document, Document};
use crate::database::Database;
use crate::entity::EntityId;
use crate::error::CoreResult;
use std::marker::PhantomData;
use std::sync::Arc;
use std::vec;

/// Lazily evaluated matches of a predicate.
///
/// The cursor snapshots the collection's ids when created and loads each
/// document only when iteration reaches it. Documents deleted in the
/// meantime are skipped; documents inserted in the meantime are not seen.
///
/// ```rust,ignore
/// let mut overdue = progress.find(|p| p.completed_at.is_none())?;
/// if let Some(first) = overdue.next() {
///     let first = first?;
/// }
/// ```
pub struct Cursor<T, F> {
    db: Arc<Database>,
    ids: vec::IntoIter<EntityId>,
    predicate: F,
    _marker: PhantomData<fn() -> T>,
}

impl<T, F> Cursor<T, F>
where
    T: Document,
    F: FnMut(&T) -> bool,
{
    pub(crate) fn new(db: Arc<Database>, ids: Vec<EntityId>, predicate: F) -> Self {
        Self {
            db,
            ids: ids.into_iter(),
            predicate,
            _marker: PhantomData,
        }
    }
}

impl<T, F> Iterator for Cursor<T, F>
where
    T: Document,
    F: FnMut(&T) -> bool,
{
    type Item = CoreResult<T>;

    fn next(&mut self) -> Option<Self::Item> {
        for id in self.ids.by_ref() {
            let bytes = match self.db.get(T::COLLECTION, id) {
                Ok(Some(bytes)) => bytes,
                Ok(None) => continue,
                Err(e) => return Some(Err(e)),
            };
            let document: T = match decode_document(&bytes) {
                Ok(document) => document,
                Err(e) => return Some(Err(e)),
            };
            if (self.predicate)(&document) {
                return Some(Ok(document));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.ids.len()))
    }
}
