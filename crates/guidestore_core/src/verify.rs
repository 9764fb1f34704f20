//! Offline and online integrity checks.
//!
//! Verification rescans the whole file, checks every record's CRC and
//! recomputes the logical state from scratch, independent of the indexes
//! an open handle holds.

use crate::entity::EntityId;
use crate::error::{CoreError, CoreResult};
use crate::log::{read_header, scan_backend, LogScan};
use crate::record::RecordKind;
use crate::types::CollectionId;
use guidestore_storage::{FileBackend, StorageBackend};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Live document count of one collection, as found on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionReport {
    /// Collection name.
    pub name: String,
    /// Live documents.
    pub live_documents: usize,
}

/// Result of scanning a database file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VerifyReport {
    /// Format version from the header.
    pub format_version: (u16, u16),
    /// File size in bytes.
    pub file_size: u64,
    /// Complete records found.
    pub records: usize,
    /// Document versions written.
    pub puts: usize,
    /// Deletions written.
    pub tombstones: usize,
    /// Documents whose latest record is a put.
    pub live_documents: usize,
    /// Trailing bytes that do not form a complete record.
    pub torn_bytes: u64,
    /// Per-collection live counts, ordered by name.
    pub collections: Vec<CollectionReport>,
}

impl VerifyReport {
    /// Builds a report from a completed scan.
    pub(crate) fn from_scan(
        format_version: (u16, u16),
        file_size: u64,
        scan: &LogScan,
    ) -> CoreResult<Self> {
        let mut names: HashMap<CollectionId, String> = HashMap::new();
        let mut latest: HashMap<(CollectionId, EntityId), bool> = HashMap::new();
        let mut report = Self {
            format_version,
            file_size,
            records: scan.records.len(),
            torn_bytes: scan.torn_bytes,
            ..Self::default()
        };

        for (offset, record) in &scan.records {
            match record.kind {
                RecordKind::Collection => {
                    let name = String::from_utf8_lossy(&record.payload).into_owned();
                    names.entry(record.collection_id).or_insert(name);
                }
                RecordKind::Put | RecordKind::Tombstone => {
                    if !names.contains_key(&record.collection_id) {
                        return Err(CoreError::invalid_format(format!(
                            "record at {offset} belongs to undeclared {}",
                            record.collection_id
                        )));
                    }
                    let live = record.kind == RecordKind::Put;
                    if live {
                        report.puts += 1;
                    } else {
                        report.tombstones += 1;
                    }
                    latest.insert((record.collection_id, record.entity_id), live);
                }
            }
        }

        let mut per_collection: BTreeMap<String, usize> =
            names.values().map(|n| (n.clone(), 0)).collect();
        for ((collection_id, _), live) in latest {
            if live {
                report.live_documents += 1;
                if let Some(name) = names.get(&collection_id) {
                    *per_collection.entry(name.clone()).or_default() += 1;
                }
            }
        }
        report.collections = per_collection
            .into_iter()
            .map(|(name, live_documents)| CollectionReport {
                name,
                live_documents,
            })
            .collect();

        Ok(report)
    }

    /// Returns true if the file ends on a record boundary.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.torn_bytes == 0
    }

    /// Records that no longer contribute to the logical state.
    #[must_use]
    pub fn reclaimable_records(&self) -> usize {
        self.puts + self.tombstones - self.live_documents
    }
}

/// Verifies a database file without opening it as a database.
///
/// Takes no lock and never modifies the file, so it is safe to run
/// against a backup or a file another process has open.
///
/// # Errors
///
/// Returns `InvalidFormat` for a foreign or malformed file and
/// `ChecksumMismatch` for a damaged record.
pub fn verify_file(path: &Path) -> CoreResult<VerifyReport> {
    let backend = FileBackend::open_existing(path)?;
    verify_backend(&backend)
}

/// Verifies any storage backend holding a database file.
pub fn verify_backend(backend: &dyn StorageBackend) -> CoreResult<VerifyReport> {
    let version = read_header(backend)?;
    let scan = scan_backend(backend, 0)?;
    VerifyReport::from_scan(version, backend.size()?, &scan)
}
