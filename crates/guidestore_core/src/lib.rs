//! # GuideStore Core
//!
//! Single-file document engine behind GuideStore.
//!
//! This crate provides:
//! - An append-only, CRC-checked record log replayed on open
//! - Hash and BTree secondary indexes with case-insensitive text keys
//! - A lazily opened, process-wide [`Engine`] handle
//! - Typed [`Collection`]s with closure-based queries
//! - Checkpoint, backup, compaction and verification
//!
//! ## Example
//!
//! ```rust
//! use guidestore_core::{
//!     Collection, CollectionSchema, Config, Document, Engine, EntityId, IndexDefinition, Schema,
//! };
//! use serde::{Deserialize, Serialize};
//! use std::sync::Arc;
//!
//! #[derive(Serialize, Deserialize)]
//! struct Setting {
//!     id: EntityId,
//!     key: String,
//!     value: String,
//! }
//!
//! impl Document for Setting {
//!     const COLLECTION: &'static str = "settings";
//!     fn id(&self) -> EntityId { self.id }
//!     fn set_id(&mut self, id: EntityId) { self.id = id; }
//! }
//!
//! let schema = Schema::new().collection(
//!     CollectionSchema::new("settings").index(IndexDefinition::hash("key").unique()),
//! );
//! let engine = Arc::new(Engine::in_memory(schema));
//! let settings: Collection<Setting> = Collection::new(engine);
//!
//! let mut theme = Setting { id: EntityId::nil(), key: "theme".into(), value: "Dark".into() };
//! settings.insert(&mut theme).unwrap();
//!
//! let found = settings.find_one_by_index("key", "THEME").unwrap().unwrap();
//! assert_eq!(found.value, "Dark");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backup;
mod collection;
mod compaction;
mod config;
mod database;
mod engine;
mod entity;
mod error;
mod index;
mod lock;
mod log;
mod record;
mod schema;
mod state;
mod stats;
mod types;
mod verify;

pub use backup::{copy_database_file, default_backup_path, validate_backup, BACKUP_PREFIX};
pub use collection::{decode_document, encode_document, Collection, Cursor, Document};
pub use compaction::CompactionResult;
pub use config::{Config, OpenMode};
pub use database::Database;
pub use engine::Engine;
pub use entity::EntityId;
pub use error::{CoreError, CoreResult};
pub use index::{BTreeIndex, HashIndex, Index, IndexKey, IndexSpec, IndexValue};
pub use lock::{lock_path, FileLock, WriteGuard};
pub use log::{FILE_HEADER_SIZE, FILE_MAGIC};
pub use record::{Record, RecordKind};
pub use schema::{CollectionSchema, IndexDefinition, IndexKind, Schema};
pub use stats::{CollectionStats, DatabaseStats, StatsSnapshot};
pub use types::{CollectionId, ScanOrder};
pub use verify::{verify_backend, verify_file, CollectionReport, VerifyReport};

/// Crate version, recorded by exports and shown by the CLI.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
