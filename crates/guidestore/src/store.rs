//! The catalog store: one engine, one blob store, every repository.

use crate::blob::{BlobStore, FileBlobStore, InMemoryBlobStore};
use crate::error::StoreResult;
use crate::repository::{
    CategoryRepository, GuideRepository, ProgressRepository, SettingsRepository, UserRepository,
};
use crate::schema::catalog_schema;
use guidestore_core::{Config, Engine};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// File name of the catalog database inside a data directory.
pub const DATABASE_FILE: &str = "guides.db";
/// Directory holding step images inside a data directory.
pub const IMAGES_DIR: &str = "images";

/// Entry point to a guide catalog.
///
/// Created once at startup. Repositories are cheap handles sharing the
/// same engine; the database file is opened on first use.
///
/// # Example
///
/// ```rust
/// use guidestore::{Category, GuideStore};
///
/// let store = GuideStore::in_memory();
/// let categories = store.categories();
///
/// let mut networking = Category::new("Networking");
/// categories.insert(&mut networking).unwrap();
/// assert!(categories.exists_name("NETWORKING").unwrap());
/// ```
#[derive(Clone)]
pub struct GuideStore {
    engine: Arc<Engine>,
    blobs: Arc<dyn BlobStore>,
}

impl GuideStore {
    /// Opens a catalog at `path` with default configuration.
    pub fn open(path: impl Into<PathBuf>, blobs: Arc<dyn BlobStore>) -> Self {
        Self::with_config(path, Config::default(), blobs)
    }

    /// Opens a catalog at `path` with `config`.
    ///
    /// Nothing is read until the first repository call.
    pub fn with_config(path: impl Into<PathBuf>, config: Config, blobs: Arc<dyn BlobStore>) -> Self {
        let engine = Engine::new(path, config, catalog_schema());
        Self::from_engine(Arc::new(engine), blobs)
    }

    /// Opens the catalog of a data directory: `guides.db` plus an
    /// `images/` blob directory.
    pub fn open_dir(dir: &Path, config: Config) -> StoreResult<Self> {
        let blobs = FileBlobStore::open(dir.join(IMAGES_DIR))?;
        Ok(Self::with_config(
            dir.join(DATABASE_FILE),
            config,
            Arc::new(blobs),
        ))
    }

    /// A catalog that lives only in memory.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_engine(
            Arc::new(Engine::in_memory(catalog_schema())),
            Arc::new(InMemoryBlobStore::new()),
        )
    }

    /// Wraps an existing engine. The engine must use [`catalog_schema`].
    pub fn from_engine(engine: Arc<Engine>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { engine, blobs }
    }

    /// The shared engine.
    #[must_use]
    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    /// The blob store holding step images.
    #[must_use]
    pub fn blobs(&self) -> &Arc<dyn BlobStore> {
        &self.blobs
    }

    /// Path of the database file, if on disk.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.engine.path()
    }

    /// Category repository.
    #[must_use]
    pub fn categories(&self) -> CategoryRepository {
        CategoryRepository::new(Arc::clone(&self.engine))
    }

    /// Guide repository.
    #[must_use]
    pub fn guides(&self) -> GuideRepository {
        GuideRepository::new(Arc::clone(&self.engine), Arc::clone(&self.blobs))
    }

    /// Progress repository.
    #[must_use]
    pub fn progress(&self) -> ProgressRepository {
        ProgressRepository::new(Arc::clone(&self.engine))
    }

    /// Settings repository.
    #[must_use]
    pub fn settings(&self) -> SettingsRepository {
        SettingsRepository::new(Arc::clone(&self.engine))
    }

    /// User repository.
    #[must_use]
    pub fn users(&self) -> UserRepository {
        UserRepository::new(Arc::clone(&self.engine))
    }

    /// Forces buffered writes to the file.
    pub fn checkpoint(&self) -> StoreResult<()> {
        Ok(self.engine.checkpoint()?)
    }

    /// Copies the database file, returning the backup path.
    ///
    /// Without `destination` the copy goes to a timestamped file in the
    /// backup directory next to the database. The checkpoint and the copy
    /// are separate steps; a write landing between them is not in the
    /// copy.
    pub fn backup(&self, destination: Option<&Path>) -> StoreResult<PathBuf> {
        Ok(self.engine.backup(destination)?)
    }

    /// Closes the database. Later calls fail with `DatabaseClosed`.
    pub fn close(&self) -> StoreResult<()> {
        Ok(self.engine.close()?)
    }
}
