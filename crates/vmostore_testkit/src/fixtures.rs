//! Test fixtures and store helpers.
//!
//! Provides a recording backend and convenience constructors for stores
//! with deterministic time.

use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tempfile::TempDir;
use vmostore_core::{
    CallableRegistry, FieldDescriptor, ManualClock, StoreConfig, StoreResult, VmoStore,
};
use vmostore_storage::{
    BackendClass, FileBackend, InMemoryBackend, StorageBackend, StorageError, StorageResult,
};

/// The instant fixture clocks start at: 2024-09-13 02:15:17 UTC.
pub const START_MILLIS: i64 = 1_726_193_717_000;

/// A backend call observed by [`RecordingBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendOp {
    /// `get_item`.
    Get {
        /// The key read.
        key: String,
        /// The class read.
        class: BackendClass,
    },
    /// `set_item`.
    Set {
        /// The key written.
        key: String,
        /// The class written.
        class: BackendClass,
        /// Length of the written text.
        bytes: usize,
    },
    /// `remove_item`.
    Remove {
        /// The key removed.
        key: String,
        /// The class removed from.
        class: BackendClass,
    },
    /// `clear`.
    Clear(Option<BackendClass>),
    /// `keys`.
    Keys(Option<BackendClass>),
}

/// An in-memory backend that records every call.
///
/// Writes can be made to fail, to exercise backend failure paths.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    inner: InMemoryBackend,
    ops: Mutex<Vec<BackendOp>>,
    fail_writes: AtomicBool,
}

impl RecordingBackend {
    /// Creates an empty recording backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a recording backend with pre-existing entries.
    pub fn with_items<I, K, V>(items: I) -> Self
    where
        I: IntoIterator<Item = (BackendClass, K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            inner: InMemoryBackend::with_items(items),
            ..Self::default()
        }
    }

    /// Makes subsequent `set_item` calls fail (or succeed again).
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Returns every recorded call.
    pub fn ops(&self) -> Vec<BackendOp> {
        self.ops.lock().clone()
    }

    /// Forgets recorded calls.
    pub fn reset_ops(&self) {
        self.ops.lock().clear();
    }

    /// Returns the number of successful `set_item` calls recorded.
    pub fn write_count(&self) -> usize {
        self.ops
            .lock()
            .iter()
            .filter(|op| matches!(op, BackendOp::Set { .. }))
            .count()
    }

    /// Reads an item without recording the call.
    pub fn peek(&self, key: &str, class: BackendClass) -> Option<String> {
        self.inner.get_item(key, class).ok().flatten()
    }

    fn record(&self, op: BackendOp) {
        self.ops.lock().push(op);
    }
}

impl StorageBackend for RecordingBackend {
    fn get_item(&self, key: &str, class: BackendClass) -> StorageResult<Option<String>> {
        self.record(BackendOp::Get {
            key: key.to_string(),
            class,
        });
        self.inner.get_item(key, class)
    }

    fn set_item(&self, key: &str, value: &str, class: BackendClass) -> StorageResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Io(std::io::Error::other("injected write failure")));
        }
        self.record(BackendOp::Set {
            key: key.to_string(),
            class,
            bytes: value.len(),
        });
        self.inner.set_item(key, value, class)
    }

    fn remove_item(&self, key: &str, class: BackendClass) -> StorageResult<()> {
        self.record(BackendOp::Remove {
            key: key.to_string(),
            class,
        });
        self.inner.remove_item(key, class)
    }

    fn clear(&self, class: Option<BackendClass>) -> StorageResult<()> {
        self.record(BackendOp::Clear(class));
        self.inner.clear(class)
    }

    fn keys(&self, class: Option<BackendClass>) -> StorageResult<Vec<String>> {
        self.record(BackendOp::Keys(class));
        self.inner.keys(class)
    }
}

/// A store wired to a recording backend, a manual clock and a private
/// callable registry.
pub struct TestStore {
    /// The store instance.
    pub store: VmoStore,
    /// The backend the store writes to.
    pub backend: Arc<RecordingBackend>,
    /// The store's clock, starting at [`START_MILLIS`].
    pub clock: Arc<ManualClock>,
    /// The store's callable registry.
    pub callables: Arc<CallableRegistry>,
}

impl TestStore {
    /// Opens a store from `config` over a fresh backend.
    ///
    /// The config's storage, clock and registry are replaced.
    pub fn open(config: StoreConfig) -> Self {
        Self::try_open(config, Arc::new(RecordingBackend::new())).expect("Failed to open test store")
    }

    /// Opens a store over `backend`, returning construction errors.
    pub fn try_open(config: StoreConfig, backend: Arc<RecordingBackend>) -> StoreResult<Self> {
        let clock = Arc::new(ManualClock::new(START_MILLIS));
        let callables = Arc::new(CallableRegistry::new());
        let store = VmoStore::new(
            config
                .storage(backend.clone())
                .clock(clock.clone())
                .callables(callables.clone()),
        )?;
        Ok(Self {
            store,
            backend,
            clock,
            callables,
        })
    }

    /// Opens a default-namespace store declaring `fields`.
    pub fn with_fields<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, FieldDescriptor)>,
        K: Into<String>,
    {
        Self::open(StoreConfig::new().fields(fields))
    }

    /// Opens a second store over the same backend and clock, as a process
    /// restart would.
    ///
    /// The new store gets an empty callable registry unless `config`
    /// carries one.
    pub fn reopen(&self, config: StoreConfig) -> StoreResult<VmoStore> {
        VmoStore::new(config.storage(self.backend.clone()).clock(self.clock.clone()))
    }
}

impl std::ops::Deref for TestStore {
    type Target = VmoStore;

    fn deref(&self) -> &Self::Target {
        &self.store
    }
}

/// Runs a test with a store declaring `fields`.
///
/// # Example
///
/// ```rust
/// use vmostore_core::{FieldDescriptor, Value, ValueKind};
/// use vmostore_testkit::with_test_store;
///
/// with_test_store([("n", FieldDescriptor::new(ValueKind::Number))], |store| {
///     store.set_data("n", 1).unwrap();
///     assert_eq!(store.get_data("n"), Some(Value::from(1)));
/// });
/// ```
pub fn with_test_store<I, K, F, R>(fields: I, f: F) -> R
where
    I: IntoIterator<Item = (K, FieldDescriptor)>,
    K: Into<String>,
    F: FnOnce(&TestStore) -> R,
{
    let store = TestStore::with_fields(fields);
    f(&store)
}

/// A file backend in a temporary directory.
pub struct TempFileBackend {
    path: PathBuf,
    _temp_dir: TempDir,
}

impl TempFileBackend {
    /// Creates a temporary directory for the backend file.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("store").join("vmostore.json");
        Self {
            path,
            _temp_dir: temp_dir,
        }
    }

    /// Returns the backend file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Opens a backend over the file; each call simulates a new process.
    pub fn open(&self) -> Arc<FileBackend> {
        Arc::new(FileBackend::open_with_create_dirs(&self.path).expect("Failed to open file backend"))
    }
}

impl Default for TempFileBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Common schemas.
pub mod scenarios {
    use vmostore_core::{FieldDescriptor, ValueKind};

    /// A user profile: durable name, age and tags; a short-lived session token.
    pub fn user_profile() -> Vec<(&'static str, FieldDescriptor)> {
        vec![
            ("name", FieldDescriptor::new(ValueKind::String).with_default("guest")),
            (
                "age",
                FieldDescriptor::of_kinds([ValueKind::Number, ValueKind::String]).with_default(18),
            ),
            ("tags", FieldDescriptor::new(ValueKind::List).with_default(Vec::<serde_json::Value>::new())),
            (
                "token",
                FieldDescriptor::new(ValueKind::String)
                    .session()
                    .expires("1s"),
            ),
        ]
    }
}
