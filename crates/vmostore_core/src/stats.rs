//! Store statistics.
//!
//! # Usage
//!
//! ```rust
//! use vmostore_core::{FieldDescriptor, StoreConfig, ValueKind, VmoStore};
//!
//! let store = VmoStore::new(
//!     StoreConfig::new().field("name", FieldDescriptor::new(ValueKind::String)),
//! )
//! .unwrap();
//! store.set_data("name", "John").unwrap();
//! store.get_data("name");
//!
//! let stats = store.stats();
//! assert_eq!(stats.writes, 1);
//! assert_eq!(stats.reads, 1);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters updated by every store operation.
///
/// All counters are atomic and monotonically increasing.
#[derive(Debug, Default)]
pub struct StoreStats {
    reads: AtomicU64,
    writes: AtomicU64,
    rejected_writes: AtomicU64,
    defaults_served: AtomicU64,
    expirations: AtomicU64,
    persists: AtomicU64,
    bytes_persisted: AtomicU64,
    read_errors: AtomicU64,
}

impl StoreStats {
    /// Creates zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_read(&self) {
        self.reads.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_rejected_write(&self) {
        self.rejected_writes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_default(&self) {
        self.defaults_served.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_expiration(&self) {
        self.expirations.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_persist(&self, bytes: u64) {
        self.persists.fetch_add(1, Ordering::Relaxed);
        self.bytes_persisted.fetch_add(bytes, Ordering::Relaxed);
    }

    pub(crate) fn record_read_error(&self) {
        self.read_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the number of reads.
    pub fn reads(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
    }

    /// Returns the number of accepted writes.
    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    /// Returns the number of writes rejected by the schema or capacity guard.
    pub fn rejected_writes(&self) -> u64 {
        self.rejected_writes.load(Ordering::Relaxed)
    }

    /// Returns how many reads were answered with a field default.
    pub fn defaults_served(&self) -> u64 {
        self.defaults_served.load(Ordering::Relaxed)
    }

    /// Returns how many expired entries reads have evicted.
    pub fn expirations(&self) -> u64 {
        self.expirations.load(Ordering::Relaxed)
    }

    /// Returns the number of blob writes to the backend.
    pub fn persists(&self) -> u64 {
        self.persists.load(Ordering::Relaxed)
    }

    /// Returns the total size of blobs written to the backend.
    pub fn bytes_persisted(&self) -> u64 {
        self.bytes_persisted.load(Ordering::Relaxed)
    }

    /// Returns the number of reads that failed and were reported as absent.
    pub fn read_errors(&self) -> u64 {
        self.read_errors.load(Ordering::Relaxed)
    }

    /// Returns a snapshot of all counters.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            reads: self.reads(),
            writes: self.writes(),
            rejected_writes: self.rejected_writes(),
            defaults_served: self.defaults_served(),
            expirations: self.expirations(),
            persists: self.persists(),
            bytes_persisted: self.bytes_persisted(),
            read_errors: self.read_errors(),
        }
    }
}

/// A point-in-time copy of [`StoreStats`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    /// Reads through `get_data`, `try_get_data` or a field accessor.
    pub reads: u64,
    /// Accepted writes.
    pub writes: u64,
    /// Writes rejected by the schema or capacity guard.
    pub rejected_writes: u64,
    /// Reads answered with a default.
    pub defaults_served: u64,
    /// Expired entries evicted by reads.
    pub expirations: u64,
    /// Blob writes to the backend.
    pub persists: u64,
    /// Bytes handed to the backend.
    pub bytes_persisted: u64,
    /// Failed reads reported as absent.
    pub read_errors: u64,
}
