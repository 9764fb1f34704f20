//! Compact command implementation.

use super::open_existing;
use std::path::Path;
use tracing::info;

/// Runs the compact command.
pub fn run(path: &Path, dry_run: bool) -> Result<(), Box<dyn std::error::Error>> {
    let db = open_existing(path)?;

    println!("Compacting {}", path.display());
    if dry_run {
        let report = db.verify()?;
        db.close()?;
        println!("(dry run - no changes will be made)");
        println!("  Records:             {}", report.records);
        println!("  Live documents:      {}", report.live_documents);
        println!("  Reclaimable records: {}", report.reclaimable_records());
        return Ok(());
    }

    let result = db.compact()?;
    db.close()?;
    info!(bytes_saved = result.bytes_saved(), "compaction finished");

    println!("  Input records:  {}", result.input_records);
    println!("  Output records: {}", result.output_records);
    println!("  Size before:    {} bytes", result.bytes_before);
    println!("  Size after:     {} bytes", result.bytes_after);
    println!(
        "  Space saved:    {} bytes ({:.1}%)",
        result.bytes_saved(),
        if result.bytes_before > 0 {
            result.bytes_saved() as f64 / result.bytes_before as f64 * 100.0
        } else {
            0.0
        }
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use guidestore_core::verify_file;
    use guidestore_testkit::{scenarios, TestStore};

    #[test]
    fn compaction_drops_old_versions() {
        let store = TestStore::file();
        for _ in 0..3 {
            store.settings().set_value("theme", "Dark").unwrap();
        }
        let mut guides = scenarios::guides(&store, &[("gone", "x")]);
        store.guides().delete(guides.remove(0).id).unwrap();
        let path = store.path().unwrap();
        store.close().unwrap();

        let before = verify_file(&path).unwrap();
        run(&path, true).unwrap();
        assert_eq!(verify_file(&path).unwrap(), before);

        run(&path, false).unwrap();
        let after = verify_file(&path).unwrap();
        assert_eq!(after.live_documents, 1);
        assert_eq!(after.reclaimable_records(), 0);
        assert!(after.file_size < before.file_size);
    }
}
