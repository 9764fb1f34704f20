//! Temporary stores.

use crate::blobs::RecordingBlobStore;
use guidestore::{Config, GuideStore, DATABASE_FILE};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// A store with automatic cleanup.
///
/// Blob deletes are recorded in [`TestStore::blobs`].
pub struct TestStore {
    /// The store.
    pub store: GuideStore,
    /// The blob store the guide repository deletes from.
    pub blobs: Arc<RecordingBlobStore>,
    temp_dir: Option<TempDir>,
}

impl TestStore {
    /// A store that lives in memory.
    pub fn memory() -> Self {
        let blobs = Arc::new(RecordingBlobStore::new());
        let engine = Arc::new(guidestore_core::Engine::in_memory(guidestore::catalog_schema()));
        Self {
            store: GuideStore::from_engine(engine, blobs.clone()),
            blobs,
            temp_dir: None,
        }
    }

    /// A store backed by a database file in a fresh temp directory.
    pub fn file() -> Self {
        Self::file_with_config(Config::default())
    }

    /// Like [`TestStore::file`] with a custom configuration.
    pub fn file_with_config(config: Config) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let blobs = Arc::new(RecordingBlobStore::new());
        let store = GuideStore::with_config(
            temp_dir.path().join(DATABASE_FILE),
            config,
            blobs.clone(),
        );
        Self {
            store,
            blobs,
            temp_dir: Some(temp_dir),
        }
    }

    /// The temp directory, if file-based.
    pub fn dir(&self) -> Option<&Path> {
        self.temp_dir.as_ref().map(TempDir::path)
    }

    /// The database file path, if file-based.
    pub fn path(&self) -> Option<PathBuf> {
        self.store.path().map(Path::to_path_buf)
    }

    /// Closes the store and opens a new one on the same file.
    ///
    /// The blob store carries over.
    pub fn reopen(self) -> Self {
        self.store.close().expect("Failed to close store");
        let path = self.path().expect("Only file stores can be reopened");
        let config = self.store.engine().config().clone();
        let store = GuideStore::with_config(path, config, self.blobs.clone());
        Self {
            store,
            blobs: self.blobs,
            temp_dir: self.temp_dir,
        }
    }
}

impl std::ops::Deref for TestStore {
    type Target = GuideStore;

    fn deref(&self) -> &Self::Target {
        &self.store
    }
}

/// Runs `f` with a temporary in-memory store.
pub fn with_temp_store<F, R>(f: F) -> R
where
    F: FnOnce(&TestStore) -> R,
{
    let store = TestStore::memory();
    f(&store)
}

/// Runs `f` with a temporary file-based store.
pub fn with_file_store<F, R>(f: F) -> R
where
    F: FnOnce(&TestStore) -> R,
{
    let store = TestStore::file();
    f(&store)
}

/// Pre-populated stores.
pub mod scenarios {
    use super::*;
    use crate::builders::{progress_record, GuideBuilder};
    use guidestore::{Category, EntityId, Guide};

    /// Inserts one guide per `(title, category)` pair, returning them in
    /// insertion order.
    pub fn guides(store: &GuideStore, entries: &[(&str, &str)]) -> Vec<Guide> {
        let repo = store.guides();
        entries
            .iter()
            .map(|(title, category)| {
                let mut guide = GuideBuilder::new(*title).category(*category).build();
                repo.insert(&mut guide).expect("Failed to insert guide");
                guide
            })
            .collect()
    }

    /// Inserts categories with the given names.
    pub fn categories(store: &GuideStore, names: &[&str]) -> Vec<Category> {
        let repo = store.categories();
        names
            .iter()
            .map(|name| {
                let mut category = Category::new(*name);
                repo.insert(&mut category).expect("Failed to insert category");
                category
            })
            .collect()
    }

    /// Inserts one progress record per entry for `user`, each on its own
    /// guide. `Some(m)` records a completion `m` minutes after start.
    pub fn progress_history(store: &GuideStore, user: EntityId, durations: &[Option<u32>]) {
        let repo = store.progress();
        for minutes in durations {
            let mut record = progress_record(user, EntityId::new(), *minutes);
            repo.insert(&mut record).expect("Failed to insert progress");
        }
    }
}
