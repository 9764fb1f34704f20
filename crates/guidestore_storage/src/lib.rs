//! # GuideStore Storage
//!
//! Byte-level storage backends for the GuideStore document file.
//!
//! Backends are **opaque byte stores**: they append, read and flush bytes
//! and know nothing about records, collections or indexes. The engine in
//! `guidestore_core` owns all interpretation of the file contents.
//!
//! ## Available Backends
//!
//! - [`FileBackend`] - the single on-disk database file
//! - [`InMemoryBackend`] - ephemeral storage for tests
//!
//! ## Example
//!
//! ```rust
//! use guidestore_storage::{StorageBackend, InMemoryBackend};
//!
//! let mut backend = InMemoryBackend::new();
//! let offset = backend.append(b"step image index").unwrap();
//! let data = backend.read_at(offset, 4).unwrap();
//! assert_eq!(&data, b"step");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;

pub use backend::StorageBackend;
pub use error::{StorageError, StorageResult};
pub use file::FileBackend;
pub use memory::InMemoryBackend;
