//! Export command implementation.

use guidestore::{
    BlobStore, Config, ExportBundle, FileBlobStore, GuideExport, GuideStore, InMemoryBlobStore,
    OpenMode,
};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Builds an export bundle of the guides at `path`.
///
/// With `images`, image bytes are embedded from that blob directory.
pub fn bundle(
    path: &Path,
    images: Option<&Path>,
    category: Option<&str>,
) -> Result<ExportBundle, Box<dyn std::error::Error>> {
    let blobs: Arc<dyn BlobStore> = match images {
        Some(dir) => Arc::new(FileBlobStore::open(dir)?),
        None => Arc::new(InMemoryBlobStore::new()),
    };
    let config = Config::default()
        .create_if_missing(false)
        .open_mode(OpenMode::Shared);
    let store = GuideStore::with_config(path, config, Arc::clone(&blobs));

    let guides = match category {
        Some(name) => store.guides().get_by_category(name)?,
        None => store.guides().all()?,
    };
    store.close()?;

    let embed = images.map(|_| blobs.as_ref());
    let exports = guides
        .iter()
        .map(|guide| GuideExport::from_guide(guide, embed))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ExportBundle::new(exports))
}

/// Runs the export command.
pub fn run(
    path: &Path,
    output: Option<&Path>,
    images: Option<&Path>,
    category: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let bundle = bundle(path, images, category)?;
    let json = bundle.to_json()?;

    match output {
        Some(file) => {
            std::fs::write(file, json)?;
            info!(guides = bundle.guides.len(), "wrote export to {:?}", file);
        }
        None => println!("{json}"),
    }
    Ok(())
}
