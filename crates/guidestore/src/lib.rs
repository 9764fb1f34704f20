//! # GuideStore
//!
//! Persistence for a guided-procedure catalog: categories, multi-step
//! guides, per-user progress, users and settings, with step images kept
//! in a separate blob store.
//!
//! Everything lives in one local file opened through
//! [`guidestore_core::Engine`]. Repositories are obtained from a
//! [`GuideStore`] and share its engine.
//!
//! ```rust
//! use guidestore::{Guide, GuideStore, Step};
//!
//! let store = GuideStore::in_memory();
//! let guides = store.guides();
//!
//! let mut guide = Guide::new("Installing a Cisco Router", "Networking");
//! guide.steps.push(Step::new(1, "Unbox", "Check the contents"));
//! guides.insert(&mut guide).unwrap();
//!
//! let hits = guides.search(Some("ROUTER")).unwrap();
//! assert_eq!(hits.len(), 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod blob;
mod clock;
mod error;
mod export;
mod models;
mod repository;
pub mod schema;
mod stats;
mod store;

pub use blob::{BlobError, BlobResult, BlobStore, FileBlobStore, InMemoryBlobStore};
pub use error::{StoreError, StoreResult};
pub use export::{ExportBundle, ExportedImage, GuideExport, StepExport, EXPORT_VERSION};
pub use models::{
    AppSetting, Category, Guide, ParseRoleError, Progress, ProgressState, Step, User, UserRole,
    MAX_NOTES_LEN,
};
pub use repository::{
    BlobDeletion, BlobOutcome, CategoryRepository, GuideDeletion, GuideRepository,
    ProgressRepository, SettingsRepository, UserRepository,
};
pub use schema::catalog_schema;
pub use stats::ProgressStatistics;
pub use store::{GuideStore, DATABASE_FILE, IMAGES_DIR};

pub use guidestore_core::{Config, CoreError, EntityId, OpenMode};
