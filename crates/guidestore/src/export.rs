//! Portable guide exports.
//!
//! Exports are plain serde shapes for moving guides between
//! installations. Images are referenced by file name and may carry their
//! bytes inline as base64. Importing always produces fresh ids.

use crate::blob::BlobStore;
use crate::clock;
use crate::error::{StoreError, StoreResult};
use crate::models::{Guide, Step};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use guidestore_core::EntityId;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;

/// Format version written into every export.
pub const EXPORT_VERSION: &str = "1.0";

/// An image attached to an exported step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportedImage {
    /// Name of the image; the blob id it was exported from.
    pub file_name: String,
    /// Base64 image bytes, if embedded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

/// An exported step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepExport {
    /// 1-based position.
    pub order: u32,
    /// Title.
    pub title: String,
    /// Body text.
    pub content: String,
    /// Images in display order.
    #[serde(default)]
    pub images: Vec<ExportedImage>,
}

/// An exported guide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuideExport {
    /// Export format version.
    pub version: String,
    /// When the export was made.
    pub exported_at: DateTime<Utc>,
    /// Guide title.
    pub title: String,
    /// Guide description.
    pub description: String,
    /// Category name.
    pub category: String,
    /// Expected duration.
    pub estimated_minutes: u32,
    /// Original author.
    pub created_by: String,
    /// Steps in order.
    pub steps: Vec<StepExport>,
}

/// Several exported guides in one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportBundle {
    /// Export format version.
    pub version: String,
    /// When the bundle was made.
    pub exported_at: DateTime<Utc>,
    /// The guides.
    pub guides: Vec<GuideExport>,
}

impl GuideExport {
    /// Projects `guide` into an export.
    ///
    /// With `blobs`, images found in the store are embedded; missing ones
    /// are exported by name only.
    pub fn from_guide(guide: &Guide, blobs: Option<&dyn BlobStore>) -> StoreResult<Self> {
        let mut ordered = guide.clone();
        ordered.sort_steps();

        let mut steps = Vec::with_capacity(ordered.steps.len());
        for step in &ordered.steps {
            let mut images = Vec::with_capacity(step.image_ids.len());
            for id in &step.image_ids {
                let data = match blobs {
                    Some(store) => store.retrieve(id)?.map(|bytes| STANDARD.encode(bytes)),
                    None => None,
                };
                images.push(ExportedImage {
                    file_name: id.clone(),
                    data,
                });
            }
            steps.push(StepExport {
                order: step.order,
                title: step.title.clone(),
                content: step.content.clone(),
                images,
            });
        }

        Ok(Self {
            version: EXPORT_VERSION.to_string(),
            exported_at: clock::now(),
            title: ordered.title,
            description: ordered.description,
            category: ordered.category,
            estimated_minutes: ordered.estimated_minutes,
            created_by: ordered.created_by,
            steps,
        })
    }

    /// Builds an unsaved guide with fresh ids.
    ///
    /// Image references keep their file names; embedded bytes are
    /// dropped. Use [`import_with_blobs`](Self::import_with_blobs) to
    /// restore them.
    #[must_use]
    pub fn into_guide(self) -> Guide {
        match self.build(|image| Ok::<_, Infallible>(image.file_name)) {
            Ok(guide) => guide,
            Err(never) => match never {},
        }
    }

    /// Builds an unsaved guide with fresh ids, storing embedded images in
    /// `blobs` and referencing them by their new blob ids.
    ///
    /// Images without data keep their file names.
    pub fn import_with_blobs(self, blobs: &dyn BlobStore) -> StoreResult<Guide> {
        self.build(|image| -> StoreResult<String> {
            match image.data {
                Some(encoded) => {
                    let bytes = STANDARD.decode(encoded.as_bytes()).map_err(|e| {
                        StoreError::validation(format!("image {}: {e}", image.file_name))
                    })?;
                    Ok(blobs.store(&bytes)?)
                }
                None => Ok(image.file_name),
            }
        })
    }

    fn build<F, E>(self, mut image_id: F) -> Result<Guide, E>
    where
        F: FnMut(ExportedImage) -> Result<String, E>,
    {
        let mut guide = Guide::new(self.title, self.category);
        guide.id = EntityId::nil();
        guide.description = self.description;
        guide.estimated_minutes = self.estimated_minutes;
        guide.created_by = self.created_by;

        for exported in self.steps {
            let mut step = Step::new(exported.order, exported.title, exported.content);
            for image in exported.images {
                step.image_ids.push(image_id(image)?);
            }
            guide.steps.push(step);
        }
        guide.sort_steps();
        Ok(guide)
    }
}

impl ExportBundle {
    /// Bundles `guides`.
    #[must_use]
    pub fn new(guides: Vec<GuideExport>) -> Self {
        Self {
            version: EXPORT_VERSION.to_string(),
            exported_at: clock::now(),
            guides,
        }
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> StoreResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses a bundle, rejecting other major versions.
    pub fn from_json(json: &str) -> StoreResult<Self> {
        let bundle: Self = serde_json::from_str(json)?;
        check_version(&bundle.version)?;
        Ok(bundle)
    }
}

fn check_version(version: &str) -> StoreResult<()> {
    let major = |v: &str| v.split('.').next().map(str::to_string);
    if major(version) != major(EXPORT_VERSION) {
        return Err(StoreError::validation(format!(
            "unsupported export version {version}"
        )));
    }
    Ok(())
}
