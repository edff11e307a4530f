//! Store configuration.

use crate::callable::CallableRegistry;
use crate::capacity::Capacity;
use crate::clock::{Clock, SystemClock};
use crate::crypto::{CipherMode, CryptoKey};
use crate::namespace::{CleanupMode, Version};
use crate::schema::{FieldDescriptor, Schema};
use std::sync::Arc;
use vmostore_storage::{InMemoryBackend, StorageBackend};

/// Configuration for constructing a [`VmoStore`](crate::VmoStore).
///
/// ```rust
/// use vmostore_core::{Capacity, CleanupMode, FieldDescriptor, StoreConfig, ValueKind};
///
/// let config = StoreConfig::new()
///     .prefix("APP")
///     .namespace("USER")
///     .version(2)
///     .crypto_key("1234567812345678")
///     .capacity(Capacity::default().durable(4096))
///     .cleanup(CleanupMode::SelfVersions)
///     .field("name", FieldDescriptor::new(ValueKind::String).with_default("guest"));
/// assert_eq!(config.fields.len(), 1);
/// ```
#[derive(Clone)]
pub struct StoreConfig {
    /// Namespace segment of the key; `NORMAL` when unset.
    pub namespace: Option<String>,
    /// Prefix segment of the key; `VMO-STORE` when unset.
    pub prefix: Option<String>,
    /// Version segment of the key.
    pub version: Version,
    /// Secret enabling the at-rest transform.
    pub crypto_key: Option<CryptoKey>,
    /// Transform applied when a key is set.
    pub cipher: CipherMode,
    /// The initial field descriptors.
    pub fields: Schema,
    /// Byte limits per backend class.
    pub capacity: Capacity,
    /// The storage backend.
    pub storage: Arc<dyn StorageBackend>,
    /// Cleanup pass run during construction.
    pub cleanup: Option<CleanupMode>,
    /// Time source for write stamps and expiry checks.
    pub clock: Arc<dyn Clock>,
    /// Registry callables are rebound through.
    pub callables: Arc<CallableRegistry>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            namespace: None,
            prefix: None,
            version: Version::default(),
            crypto_key: None,
            cipher: CipherMode::default(),
            fields: Schema::new(),
            capacity: Capacity::unbounded(),
            storage: Arc::new(InMemoryBackend::new()),
            cleanup: None,
            clock: Arc::new(SystemClock),
            callables: CallableRegistry::global(),
        }
    }
}

impl StoreConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the namespace segment.
    #[must_use]
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Sets the prefix segment.
    #[must_use]
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Sets the version segment.
    #[must_use]
    pub fn version(mut self, version: impl Into<Version>) -> Self {
        self.version = version.into();
        self
    }

    /// Enables the at-rest transform keyed by `key`.
    #[must_use]
    pub fn crypto_key(mut self, key: impl Into<CryptoKey>) -> Self {
        self.crypto_key = Some(key.into());
        self
    }

    /// Selects the at-rest transform.
    #[must_use]
    pub const fn cipher(mut self, mode: CipherMode) -> Self {
        self.cipher = mode;
        self
    }

    /// Declares one field.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, descriptor: FieldDescriptor) -> Self {
        self.fields.declare([(name.into(), descriptor)]);
        self
    }

    /// Declares several fields.
    #[must_use]
    pub fn fields<I, K>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, FieldDescriptor)>,
        K: Into<String>,
    {
        self.fields.declare(fields);
        self
    }

    /// Sets the byte limits.
    #[must_use]
    pub const fn capacity(mut self, capacity: Capacity) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the storage backend.
    #[must_use]
    pub fn storage(mut self, storage: Arc<dyn StorageBackend>) -> Self {
        self.storage = storage;
        self
    }

    /// Runs a cleanup pass in `mode` during construction.
    #[must_use]
    pub const fn cleanup(mut self, mode: CleanupMode) -> Self {
        self.cleanup = Some(mode);
        self
    }

    /// Sets the time source.
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Sets the callable registry.
    #[must_use]
    pub fn callables(mut self, registry: Arc<CallableRegistry>) -> Self {
        self.callables = registry;
        self
    }
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConfig")
            .field("namespace", &self.namespace)
            .field("prefix", &self.prefix)
            .field("version", &self.version)
            .field("crypto_key", &self.crypto_key)
            .field("cipher", &self.cipher)
            .field("fields", &self.fields.names())
            .field("capacity", &self.capacity)
            .field("cleanup", &self.cleanup)
            .finish_non_exhaustive()
    }
}
