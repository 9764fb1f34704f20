//! Backup commands.

use guidestore::{catalog_schema, Config};
use guidestore_core::{validate_backup, Engine};
use std::path::Path;
use tracing::info;

/// Copies the database at `db_path`.
///
/// Without `output` the copy is a timestamped file in the `backups`
/// directory next to the database.
pub fn create(db_path: &Path, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    if !db_path.is_file() {
        return Err(format!("No database found at {}", db_path.display()).into());
    }

    info!("Creating backup of {:?}", db_path);
    let engine = Engine::new(db_path, Config::default().create_if_missing(false), catalog_schema());
    let backup_path = engine.backup(output)?;
    engine.close()?;

    let report = validate_backup(&backup_path)?;
    println!("✓ Backup created successfully");
    println!("  Path: {}", backup_path.display());
    println!("  Size: {} bytes", report.file_size);
    println!("  Documents: {}", report.live_documents);

    Ok(())
}

/// Checks that `path` is a readable, complete catalog file.
pub fn validate(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let report = validate_backup(path)?;
    if !report.is_clean() {
        return Err(format!("Backup ends in {} incomplete bytes", report.torn_bytes).into());
    }

    println!("✓ Backup is valid");
    println!("  Records: {}", report.records);
    for collection in &report.collections {
        println!("  {:<12} {}", collection.name, collection.live_documents);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use guidestore_testkit::{scenarios, TestStore};

    #[test]
    fn create_then_validate() {
        let store = TestStore::file();
        scenarios::guides(&store, &[("Backed up", "General")]);
        let path = store.path().unwrap();
        store.close().unwrap();

        let output = store.dir().unwrap().join("copy.db");
        create(&path, Some(&output)).unwrap();
        validate(&output).unwrap();
        assert_eq!(std::fs::read(&output).unwrap(), std::fs::read(&path).unwrap());
    }

    #[test]
    fn validate_rejects_foreign_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"just some text").unwrap();
        assert!(validate(&path).is_err());
    }
}
