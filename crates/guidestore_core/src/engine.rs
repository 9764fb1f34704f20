//! Lazily opened, shared database handle.
//!
//! An [`Engine`] is created once at startup and passed by `Arc` to every
//! repository. Constructing it touches nothing on disk; the file is opened
//! on first use, exactly once, even when several threads race for it.

use crate::config::Config;
use crate::database::Database;
use crate::error::{CoreError, CoreResult};
use crate::schema::Schema;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

enum Location {
    File(PathBuf),
    Memory,
}

enum HandleState {
    Pending,
    Open(Arc<Database>),
    Closed,
}

/// Owner of the single database handle of a process.
///
/// # Example
///
/// ```rust,ignore
/// use guidestore_core::{Config, Engine};
/// use std::sync::Arc;
///
/// let engine = Arc::new(Engine::new("data/guides.db", Config::default(), schema));
/// // Nothing has been opened yet; this is free.
/// engine.checkpoint()?;
/// // First real use opens the file.
/// let db = engine.database()?;
/// ```
pub struct Engine {
    location: Location,
    config: Config,
    schema: Schema,
    handle: Mutex<HandleState>,
}

impl Engine {
    /// Records where the database lives. Performs no I/O.
    pub fn new(path: impl Into<PathBuf>, config: Config, schema: Schema) -> Self {
        Self {
            location: Location::File(path.into()),
            config,
            schema,
            handle: Mutex::new(HandleState::Pending),
        }
    }

    /// An engine whose database lives in memory.
    #[must_use]
    pub fn in_memory(schema: Schema) -> Self {
        Self {
            location: Location::Memory,
            config: Config::default(),
            schema,
            handle: Mutex::new(HandleState::Pending),
        }
    }

    /// Returns the database path, if file-backed.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match &self.location {
            Location::File(path) => Some(path),
            Location::Memory => None,
        }
    }

    /// Returns the schema applied on open.
    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Returns the configuration used on open.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns true once the database has been opened and not closed.
    #[must_use]
    pub fn is_materialized(&self) -> bool {
        matches!(*self.handle.lock(), HandleState::Open(_))
    }

    /// Returns the open database, opening it on first call.
    ///
    /// If opening fails the engine stays unopened and the next call
    /// tries again.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseClosed` after [`Engine::close`], or whatever
    /// opening the file failed with.
    pub fn database(&self) -> CoreResult<Arc<Database>> {
        let mut handle = self.handle.lock();
        match &*handle {
            HandleState::Open(db) => Ok(Arc::clone(db)),
            HandleState::Closed => Err(CoreError::DatabaseClosed),
            HandleState::Pending => {
                let db = Arc::new(match &self.location {
                    Location::File(path) => Database::open(path, self.config.clone(), &self.schema)?,
                    Location::Memory => Database::open_in_memory(&self.schema)?,
                });
                *handle = HandleState::Open(Arc::clone(&db));
                Ok(db)
            }
        }
    }

    /// Forces buffered writes to disk.
    ///
    /// Does nothing if the database was never opened.
    pub fn checkpoint(&self) -> CoreResult<()> {
        let db = match &*self.handle.lock() {
            HandleState::Pending => {
                debug!("checkpoint skipped, database not opened");
                return Ok(());
            }
            HandleState::Open(db) => Arc::clone(db),
            HandleState::Closed => return Err(CoreError::DatabaseClosed),
        };
        db.checkpoint()
    }

    /// Checkpoints and copies the database file. See [`Database::backup`].
    ///
    /// Opens the database if needed.
    pub fn backup(&self, destination: Option<&Path>) -> CoreResult<PathBuf> {
        self.database()?.backup(destination)
    }

    /// Closes the database. Idempotent, and safe if it was never opened.
    ///
    /// The engine cannot be reopened; later calls fail with
    /// `DatabaseClosed`.
    pub fn close(&self) -> CoreResult<()> {
        let previous = std::mem::replace(&mut *self.handle.lock(), HandleState::Closed);
        match previous {
            HandleState::Open(db) => db.close(),
            HandleState::Pending | HandleState::Closed => Ok(()),
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
