//! Inspect command implementation.

use super::open_existing;
use serde::Serialize;
use std::path::Path;

/// Database inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Database path.
    pub path: String,
    /// Format version from the header.
    pub format_version: String,
    /// File size in bytes.
    pub file_size: u64,
    /// Records in the log.
    pub record_count: usize,
    /// Records no longer part of the logical state.
    pub reclaimable_records: usize,
    /// Live documents across all collections.
    pub document_count: usize,
    /// Per-collection details.
    pub collections: Vec<CollectionInfo>,
}

/// Details of one collection.
#[derive(Debug, Serialize)]
pub struct CollectionInfo {
    /// Collection name.
    pub name: String,
    /// Live documents.
    pub documents: usize,
    /// Declared indexes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indexes: Option<Vec<String>>,
}

/// Collects inspection data for the catalog at `path`.
pub fn inspect(path: &Path, show_indexes: bool) -> Result<InspectResult, Box<dyn std::error::Error>> {
    let db = open_existing(path)?;
    let report = db.verify()?;
    let stats = db.stats()?;

    let mut collections = Vec::with_capacity(stats.collections.len());
    for collection in &stats.collections {
        let indexes = if show_indexes {
            Some(
                db.indexes(&collection.name)?
                    .into_iter()
                    .map(|def| {
                        let unique = if def.unique { " unique" } else { "" };
                        format!("{} {:?}({}){unique}", def.name, def.kind, def.fields.join(", "))
                    })
                    .collect(),
            )
        } else {
            None
        };
        collections.push(CollectionInfo {
            name: collection.name.clone(),
            documents: collection.documents,
            indexes,
        });
    }
    db.close()?;

    Ok(InspectResult {
        path: path.display().to_string(),
        format_version: format!("{}.{}", report.format_version.0, report.format_version.1),
        file_size: report.file_size,
        record_count: report.records,
        reclaimable_records: report.reclaimable_records(),
        document_count: stats.total_documents(),
        collections,
    })
}

/// Runs the inspect command.
pub fn run(path: &Path, show_indexes: bool, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let result = inspect(path, show_indexes)?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&result)?),
        _ => print_text_output(&result),
    }

    Ok(())
}

fn print_text_output(result: &InspectResult) {
    println!("GuideStore Database: {}", result.path);
    println!("  Format version:      {}", result.format_version);
    println!("  File size:           {} bytes", result.file_size);
    println!("  Records:             {}", result.record_count);
    println!("  Reclaimable records: {}", result.reclaimable_records);
    println!("  Documents:           {}", result.document_count);
    println!();
    println!("Collections:");
    for collection in &result.collections {
        println!("  {:<12} {:>8} documents", collection.name, collection.documents);
        if let Some(indexes) = &collection.indexes {
            for index in indexes {
                println!("    - {index}");
            }
        }
    }
}
