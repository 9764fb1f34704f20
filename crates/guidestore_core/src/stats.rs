//! Database statistics.
//!
//! Operation counters are atomic and can be read while operations are in
//! progress. [`Database::stats`](crate::Database::stats) combines them with
//! per-collection document counts into a [`StatsSnapshot`].

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Operation counters for one open database.
#[derive(Debug, Default)]
pub struct DatabaseStats {
    reads: AtomicU64,
    writes: AtomicU64,
    deletes: AtomicU64,
    scans: AtomicU64,
    index_lookups: AtomicU64,
    bytes_written: AtomicU64,
    bytes_read: AtomicU64,
    checkpoints: AtomicU64,
}

impl DatabaseStats {
    /// Creates a zeroed counter set.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_read(&self, bytes: u64) {
        self.reads.fetch_add(1, Ordering::Relaxed);
        self.bytes_read.fetch_add(bytes, Ordering::Relaxed);
    }

    pub(crate) fn record_write(&self, bytes: u64) {
        self.writes.fetch_add(1, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes, Ordering::Relaxed);
    }

    pub(crate) fn record_delete(&self) {
        self.deletes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_scan(&self) {
        self.scans.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_index_lookup(&self) {
        self.index_lookups.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_checkpoint(&self) {
        self.checkpoints.fetch_add(1, Ordering::Relaxed);
    }

    /// Total document reads.
    pub fn reads(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
    }

    /// Total inserts and updates.
    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    /// Total deletes.
    pub fn deletes(&self) -> u64 {
        self.deletes.load(Ordering::Relaxed)
    }

    /// Total full collection scans.
    pub fn scans(&self) -> u64 {
        self.scans.load(Ordering::Relaxed)
    }

    /// Total index lookups and index scans.
    pub fn index_lookups(&self) -> u64 {
        self.index_lookups.load(Ordering::Relaxed)
    }

    /// Total checkpoints.
    pub fn checkpoints(&self) -> u64 {
        self.checkpoints.load(Ordering::Relaxed)
    }

    /// Bytes appended to the log.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written.load(Ordering::Relaxed)
    }

    /// Bytes read back from the log.
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read.load(Ordering::Relaxed)
    }
}

/// Document count of a single collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionStats {
    /// Collection name.
    pub name: String,
    /// Live documents.
    pub documents: usize,
    /// Secondary indexes maintained for the collection.
    pub indexes: usize,
}

/// A point-in-time view of a database.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct StatsSnapshot {
    /// Total document reads.
    pub reads: u64,
    /// Total inserts and updates.
    pub writes: u64,
    /// Total deletes.
    pub deletes: u64,
    /// Total full collection scans.
    pub scans: u64,
    /// Total index lookups and scans.
    pub index_lookups: u64,
    /// Total checkpoints.
    pub checkpoints: u64,
    /// Bytes appended to the log.
    pub bytes_written: u64,
    /// Bytes read back from the log.
    pub bytes_read: u64,
    /// Size of the database file.
    pub file_size: u64,
    /// Per-collection counts, ordered by name.
    pub collections: Vec<CollectionStats>,
}

impl StatsSnapshot {
    /// Total live documents across all collections.
    #[must_use]
    pub fn total_documents(&self) -> usize {
        self.collections.iter().map(|c| c.documents).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let stats = DatabaseStats::new();
        stats.record_read(100);
        stats.record_read(50);
        stats.record_write(30);
        stats.record_delete();
        stats.record_scan();
        stats.record_index_lookup();
        stats.record_checkpoint();

        assert_eq!(stats.reads(), 2);
        assert_eq!(stats.bytes_read(), 150);
        assert_eq!(stats.writes(), 1);
        assert_eq!(stats.bytes_written(), 30);
        assert_eq!(stats.deletes(), 1);
        assert_eq!(stats.scans(), 1);
        assert_eq!(stats.index_lookups(), 1);
        assert_eq!(stats.checkpoints(), 1);
    }

    #[test]
    fn snapshot_totals_documents() {
        let snapshot = StatsSnapshot {
            collections: vec![
                CollectionStats {
                    name: "guides".into(),
                    documents: 3,
                    indexes: 3,
                },
                CollectionStats {
                    name: "users".into(),
                    documents: 1,
                    indexes: 1,
                },
            ],
            ..StatsSnapshot::default()
        };
        assert_eq!(snapshot.total_documents(), 4);
    }
}
