//! Verify command implementation.

use guidestore_core::{verify_file, VerifyReport};
use std::path::Path;

/// Runs the verify command.
///
/// Fails if the file cannot be read, a record is damaged, or the file
/// ends in an incomplete record.
pub fn run(path: &Path, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let report = verify_file(path)?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        _ => print_text_output(path, &report),
    }

    if !report.is_clean() {
        return Err(format!("{} trailing bytes do not form a record", report.torn_bytes).into());
    }
    Ok(())
}

fn print_text_output(path: &Path, report: &VerifyReport) {
    println!("Verifying {}", path.display());
    println!(
        "  Format version: {}.{}",
        report.format_version.0, report.format_version.1
    );
    println!("  File size:      {} bytes", report.file_size);
    println!("  Records:        {}", report.records);
    println!("  Puts:           {}", report.puts);
    println!("  Tombstones:     {}", report.tombstones);
    println!("  Live documents: {}", report.live_documents);
    for collection in &report.collections {
        println!("    {:<12} {}", collection.name, collection.live_documents);
    }
    if report.is_clean() {
        println!("✓ All records intact");
    } else {
        println!("✗ Torn tail: {} bytes", report.torn_bytes);
    }
}
