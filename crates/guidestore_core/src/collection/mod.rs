//! Typed collection API.
//!
//! Provides `Collection<T>` for type-safe document storage with automatic
//! CBOR encoding/decoding via the `Document` trait.

mod codec;
mod cursor;
mod typed;

pub use codec::{decode_document, encode_document, Document};
pub use cursor::Cursor;
pub use typed::Collection;
