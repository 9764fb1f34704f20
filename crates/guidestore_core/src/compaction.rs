//! Log compaction.
//!
//! Compaction rewrites the file so it holds only what replay needs: one
//! `Collection` record per collection followed by the latest `Put` of
//! every live document. Superseded versions and tombstones are dropped.
//!
//! ## Invariants
//!
//! - Compaction **MUST NOT** change logical state
//! - The rewritten file is complete before it replaces the original
//!   (write to a temporary file, then rename)

use crate::entity::EntityId;
use crate::error::{CoreError, CoreResult};
use crate::log::DocumentLog;
use crate::record::Record;
use crate::state::State;
use crate::types::CollectionId;
use guidestore_storage::StorageBackend;
use serde::Serialize;

/// Result of a compaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompactionResult {
    /// Records in the file before compaction.
    pub input_records: usize,
    /// Records in the rewritten file.
    pub output_records: usize,
    /// File size before compaction.
    pub bytes_before: u64,
    /// File size after compaction.
    pub bytes_after: u64,
}

impl CompactionResult {
    /// Bytes reclaimed.
    #[must_use]
    pub fn bytes_saved(&self) -> u64 {
        self.bytes_before.saturating_sub(self.bytes_after)
    }
}

/// New offset of a live document after compaction.
pub(crate) type Relocation = (CollectionId, EntityId, u64);

/// A rewritten log, not yet swapped in.
pub(crate) struct Compacted {
    pub backend: Box<dyn StorageBackend>,
    pub relocations: Vec<Relocation>,
    pub records: usize,
    pub end: u64,
}

/// Writes the live contents of `source` into the empty `target`.
pub(crate) fn rewrite(
    state: &State,
    source: &DocumentLog,
    target: Box<dyn StorageBackend>,
) -> CoreResult<Compacted> {
    let out = DocumentLog::open(target, source.format_version(), false)?;
    let mut relocations = Vec::new();
    let mut records = 0;

    for collection in state.collections() {
        out.append(&Record::collection(collection.id(), collection.name()))?;
        records += 1;

        for (id, offset) in collection.documents() {
            let record = source.read_at(offset)?;
            let new_offset = out.append(&record)?;
            relocations.push((collection.id(), id, new_offset));
            records += 1;
        }
    }

    out.sync()?;
    let end = out.size()?;
    let backend = out.into_backend().ok_or(CoreError::DatabaseClosed)?;

    Ok(Compacted {
        backend,
        relocations,
        records,
        end,
    })
}
