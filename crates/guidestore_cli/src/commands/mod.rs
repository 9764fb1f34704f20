//! CLI command implementations.

pub mod backup;
pub mod compact;
pub mod export;
pub mod inspect;
pub mod stats;
pub mod verify;

use guidestore::catalog_schema;
use guidestore_core::{Config, Database};
use std::path::Path;

/// Opens an existing catalog file for maintenance.
pub(crate) fn open_existing(path: &Path) -> Result<Database, Box<dyn std::error::Error>> {
    if !path.is_file() {
        return Err(format!("No database found at {}", path.display()).into());
    }
    let config = Config::default().create_if_missing(false);
    Ok(Database::open(path, config, &catalog_schema())?)
}
