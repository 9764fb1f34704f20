//! Whole-file backups.
//!
//! A backup is a byte-for-byte copy of the database file taken right
//! after a checkpoint. Restoring means copying it back over the primary
//! file while no handle has it open; there is no partial restore.

use crate::error::CoreResult;
use crate::verify::{verify_file, VerifyReport};
use chrono::{DateTime, TimeZone};
use std::fs;
use std::path::{Path, PathBuf};

/// File name prefix of default backups.
pub const BACKUP_PREFIX: &str = "data_backup_";

/// Returns the default backup location for `db_path`.
///
/// `<db dir>/<dir_name>/data_backup_<yyyyMMdd_HHmmss>.<ext>`, where
/// `ext` is the database file's extension (`db` if it has none).
pub fn default_backup_path<Tz>(db_path: &Path, dir_name: &str, at: &DateTime<Tz>) -> PathBuf
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let dir = match db_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.join(dir_name),
        _ => PathBuf::from(dir_name),
    };
    let ext = db_path
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
        .unwrap_or("db");
    dir.join(format!(
        "{BACKUP_PREFIX}{}.{ext}",
        at.format("%Y%m%d_%H%M%S")
    ))
}

/// Copies `source` to `destination`, creating parent directories and
/// overwriting any existing file. Returns the bytes copied.
pub fn copy_database_file(source: &Path, destination: &Path) -> CoreResult<u64> {
    if let Some(parent) = destination.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(fs::copy(source, destination)?)
}

/// Writes raw database bytes to `destination`, creating parent directories.
pub(crate) fn write_database_bytes(bytes: &[u8], destination: &Path) -> CoreResult<u64> {
    if let Some(parent) = destination.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(destination, bytes)?;
    Ok(bytes.len() as u64)
}

/// Checks that a backup file is a complete, undamaged database file.
///
/// # Errors
///
/// Fails like [`verify_file`] on a foreign or damaged file.
pub fn validate_backup(path: &Path) -> CoreResult<VerifyReport> {
    verify_file(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::tempdir;

    #[test]
    fn default_path_uses_timestamp_and_extension() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();

        let path = default_backup_path(Path::new("/data/guides.db"), "backups", &at);
        assert_eq!(
            path,
            PathBuf::from("/data/backups/data_backup_20240309_140507.db")
        );

        let path = default_backup_path(Path::new("/data/catalog.store"), "snapshots", &at);
        assert_eq!(
            path,
            PathBuf::from("/data/snapshots/data_backup_20240309_140507.store")
        );
    }

    #[test]
    fn default_path_without_extension_or_parent() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let path = default_backup_path(Path::new("guides"), "backups", &at);
        assert_eq!(path, PathBuf::from("backups/data_backup_20240101_000000.db"));
    }

    #[test]
    fn copy_creates_dirs_and_overwrites() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("guides.db");
        let dest = dir.path().join("nested").join("copy.db");

        fs::write(&source, b"first").unwrap();
        assert_eq!(copy_database_file(&source, &dest).unwrap(), 5);

        fs::write(&source, b"second").unwrap();
        copy_database_file(&source, &dest).unwrap();
        assert_eq!(fs::read(&dest).unwrap(), b"second");
    }
}
