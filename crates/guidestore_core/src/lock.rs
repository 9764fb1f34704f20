//! Advisory file locking for the database file.
//!
//! The lock lives in a sidecar file next to the database
//! (`guides.db` → `guides.db.lock`) so that compaction can replace the
//! database file without dropping the lock.

use crate::config::OpenMode;
use crate::error::{CoreError, CoreResult};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

/// Attempts made to take the write lock in shared mode before giving up.
const LOCK_ATTEMPTS: u32 = 200;
/// Pause between attempts.
const LOCK_RETRY_DELAY: Duration = Duration::from_millis(10);

/// Lock on a database file.
///
/// In [`OpenMode::Exclusive`] the lock is taken once and held until the
/// handle is dropped. In [`OpenMode::Shared`] nothing is held between
/// operations; [`FileLock::write_guard`] takes the lock around each write.
#[derive(Debug)]
pub struct FileLock {
    path: PathBuf,
    file: File,
    mode: OpenMode,
    released: AtomicBool,
}

impl FileLock {
    /// Acquires the lock for `db_path` in the given mode.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseLocked` if another handle holds the file
    /// exclusively.
    pub fn acquire(db_path: &Path, mode: OpenMode) -> CoreResult<Self> {
        let path = lock_path(db_path);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        match mode {
            OpenMode::Exclusive => {
                if file.try_lock_exclusive().is_err() {
                    return Err(CoreError::DatabaseLocked);
                }
            }
            OpenMode::Shared => {
                // Fail fast when an exclusive holder exists.
                lock_with_retry(&file)?;
                FileExt::unlock(&file)?;
            }
        }

        Ok(Self {
            path,
            file,
            mode,
            released: AtomicBool::new(false),
        })
    }

    /// Returns the lock file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the mode the lock was taken in.
    #[must_use]
    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    /// Takes the write lock for the lifetime of the returned guard.
    ///
    /// A no-op in exclusive mode, where the lock is already held.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseLocked` if the lock stays contended.
    pub fn write_guard(&self) -> CoreResult<WriteGuard<'_>> {
        if self.released.load(Ordering::Acquire) {
            return Err(CoreError::DatabaseClosed);
        }
        match self.mode {
            OpenMode::Exclusive => Ok(WriteGuard { file: None }),
            OpenMode::Shared => {
                lock_with_retry(&self.file)?;
                Ok(WriteGuard {
                    file: Some(&self.file),
                })
            }
        }
    }

    /// Gives up the lock. Idempotent; later write guards fail.
    pub fn release(&self) -> CoreResult<()> {
        if self.released.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        if self.mode == OpenMode::Exclusive {
            FileExt::unlock(&self.file)?;
        }
        Ok(())
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = self.release();
    }
}

/// Releases the shared-mode write lock on drop.
#[derive(Debug)]
pub struct WriteGuard<'a> {
    file: Option<&'a File>,
}

impl Drop for WriteGuard<'_> {
    fn drop(&mut self) {
        if let Some(file) = self.file {
            let _ = FileExt::unlock(file);
        }
    }
}

/// Returns the sidecar lock path for a database file.
#[must_use]
pub fn lock_path(db_path: &Path) -> PathBuf {
    let mut name = db_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".lock");
    db_path.with_file_name(name)
}

fn lock_with_retry(file: &File) -> CoreResult<()> {
    for attempt in 0..LOCK_ATTEMPTS {
        if file.try_lock_exclusive().is_ok() {
            return Ok(());
        }
        if attempt + 1 < LOCK_ATTEMPTS {
            thread::sleep(LOCK_RETRY_DELAY);
        }
    }
    Err(CoreError::DatabaseLocked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn lock_path_appends_suffix() {
        assert_eq!(
            lock_path(Path::new("/data/guides.db")),
            PathBuf::from("/data/guides.db.lock")
        );
    }

    #[test]
    fn exclusive_rejects_second_holder() {
        let dir = tempdir().unwrap();
        let db = dir.path().join("guides.db");

        let first = FileLock::acquire(&db, OpenMode::Exclusive).unwrap();
        let second = FileLock::acquire(&db, OpenMode::Exclusive);
        assert!(matches!(second, Err(CoreError::DatabaseLocked)));

        drop(first);
        assert!(FileLock::acquire(&db, OpenMode::Exclusive).is_ok());
    }

    #[test]
    fn release_is_idempotent() {
        let dir = tempdir().unwrap();
        let db = dir.path().join("guides.db");

        let lock = FileLock::acquire(&db, OpenMode::Exclusive).unwrap();
        lock.release().unwrap();
        lock.release().unwrap();
        assert!(matches!(lock.write_guard(), Err(CoreError::DatabaseClosed)));
        assert!(FileLock::acquire(&db, OpenMode::Exclusive).is_ok());
    }

    #[test]
    fn shared_handles_coexist() {
        let dir = tempdir().unwrap();
        let db = dir.path().join("guides.db");

        let a = FileLock::acquire(&db, OpenMode::Shared).unwrap();
        let b = FileLock::acquire(&db, OpenMode::Shared).unwrap();

        {
            let _guard = a.write_guard().unwrap();
        }
        let _guard = b.write_guard().unwrap();
        assert!(a.path().ends_with("guides.db.lock"));
    }
}
