//! Document trait and CBOR codec.

use crate::entity::EntityId;
use crate::error::{CoreError, CoreResult};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Trait for types stored in a [`Collection`](crate::Collection).
///
/// Documents are encoded with serde into CBOR. Field names become the
/// paths secondary indexes refer to.
///
/// # Example
///
/// ```rust
/// use guidestore_core::{Document, EntityId};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// struct Setting {
///     id: EntityId,
///     key: String,
///     value: String,
/// }
///
/// impl Document for Setting {
///     const COLLECTION: &'static str = "settings";
///
///     fn id(&self) -> EntityId {
///         self.id
///     }
///
///     fn set_id(&mut self, id: EntityId) {
///         self.id = id;
///     }
/// }
/// ```
pub trait Document: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Name of the collection this type lives in.
    const COLLECTION: &'static str;

    /// Returns the document's identity. Nil means not yet assigned.
    fn id(&self) -> EntityId;

    /// Assigns the identity. Called by insert for nil ids.
    fn set_id(&mut self, id: EntityId);
}

/// Encodes a document to CBOR bytes.
pub fn encode_document<T: Serialize>(document: &T) -> CoreResult<Vec<u8>> {
    let mut bytes = Vec::new();
    ciborium::into_writer(document, &mut bytes).map_err(|e| CoreError::codec(e.to_string()))?;
    Ok(bytes)
}

/// Decodes a document from CBOR bytes.
pub fn decode_document<T: DeserializeOwned>(bytes: &[u8]) -> CoreResult<T> {
    ciborium::from_reader(bytes).map_err(|e| CoreError::codec(e.to_string()))
}
