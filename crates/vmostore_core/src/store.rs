//! The store facade: hot cache, read and write paths, persistence.

use crate::callable::CallableRegistry;
use crate::capacity::{Capacity, CapacityReport, CapacityUsage};
use crate::clock::Clock;
use crate::config::StoreConfig;
use crate::crypto::{Cipher, CryptoKey};
use crate::entry::{decode_entries_partial, encode_entries, CacheEntry, Entries};
use crate::error::{StoreError, StoreResult};
use crate::field::Field;
use crate::namespace::{CleanupMode, Namespace};
use crate::schema::{FieldDescriptor, Schema};
use crate::stats::{StatsSnapshot, StoreStats};
use crate::value::{FieldValue, Value};
use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use vmostore_storage::{BackendClass, StorageBackend};

/// State guarded by the store mutex.
///
/// Every entry in `entries` has a descriptor in `schema`.
#[derive(Clone)]
struct State {
    schema: Schema,
    entries: Entries,
}

/// A schema-driven, TTL-aware cache over a storage backend.
///
/// Each declared field has accepted kinds, an optional default, an optional
/// expiration spec and a backend class. Reads serve the live cached value or
/// fall back to the default; writes are validated and written through to the
/// backend before they return.
///
/// # Example
///
/// ```rust
/// use vmostore_core::{FieldDescriptor, StoreConfig, Value, ValueKind, VmoStore};
///
/// let store = VmoStore::new(
///     StoreConfig::new()
///         .namespace("USER")
///         .field("name", FieldDescriptor::new(ValueKind::String).with_default("guest"))
///         .field("age", FieldDescriptor::new(ValueKind::Number).expires("1d")),
/// )
/// .unwrap();
///
/// assert_eq!(store.get_data("name"), Some(Value::from("guest")));
/// store.set_data("name", "John").unwrap();
/// assert_eq!(store.get_data("name"), Some(Value::from("John")));
///
/// // Wrong kind is rejected, the cache is untouched.
/// assert!(store.set_data("name", 42).is_err());
/// assert_eq!(store.get_data("name"), Some(Value::from("John")));
/// ```
pub struct VmoStore {
    namespace: Namespace,
    backend: Arc<dyn StorageBackend>,
    crypto_key: Option<CryptoKey>,
    cipher: Option<Cipher>,
    capacity: Capacity,
    clock: Arc<dyn Clock>,
    callables: Arc<CallableRegistry>,
    state: Mutex<State>,
    stats: StoreStats,
}

impl VmoStore {
    /// Constructs a store.
    ///
    /// Loads this namespace's blob from both backend classes, keeping the
    /// entries of fields declared in that class, runs the configured cleanup
    /// pass, then persists both classes.
    ///
    /// # Errors
    ///
    /// - [`StoreError::InvalidConfig`] for an unparseable version or empty key.
    /// - [`StoreError::InitialLoadOverflow`] if the loaded data does not fit
    ///   the configured capacity; both classes are then reset to empty.
    /// - [`StoreError::MalformedExpiry`] if a field's expiration spec is invalid.
    /// - [`StoreError::Storage`] if the backend fails.
    pub fn new(config: StoreConfig) -> StoreResult<Self> {
        let StoreConfig {
            namespace,
            prefix,
            version,
            crypto_key,
            cipher,
            fields,
            capacity,
            storage,
            cleanup,
            clock,
            callables,
        } = config;

        let namespace = Namespace::new(prefix.as_deref(), namespace.as_deref(), version.resolve()?);
        let cipher = crypto_key
            .clone()
            .map(|key| Cipher::new(key, cipher))
            .transpose()?;

        let store = Self {
            namespace,
            backend: storage,
            crypto_key,
            cipher,
            capacity,
            clock,
            callables,
            state: Mutex::new(State {
                schema: fields,
                entries: Entries::new(),
            }),
            stats: StoreStats::new(),
        };

        {
            let mut state = store.state.lock();
            let entries = store.load(&state.schema)?;
            state.entries = entries;
        }
        if let Some(mode) = cleanup {
            store.namespace.sweep(store.backend.as_ref(), mode)?;
        }
        store.persist_initial()?;

        info!(
            namespace = %store.namespace,
            fields = store.state.lock().schema.len(),
            encrypted = store.cipher.is_some(),
            "opened store"
        );
        Ok(store)
    }

    /// Reads a field, reporting failures as absent.
    ///
    /// Returns `None` for an undeclared field, for a field with no live
    /// value and no default, or when the read fails (the failure is logged).
    pub fn get_data(&self, name: &str) -> Option<Value> {
        match self.try_get_data(name) {
            Ok(value) => value,
            Err(err) => {
                self.stats.record_read_error();
                warn!(namespace = %self.namespace, field = name, error = %err, "read failed");
                None
            }
        }
    }

    /// Reads a field.
    ///
    /// An expired entry is evicted and its class re-persisted. A candidate
    /// whose kind the field does not accept is replaced by the default.
    ///
    /// # Errors
    ///
    /// Returns an error if the field's expiration spec is malformed, or if
    /// persisting after an eviction fails.
    pub fn try_get_data(&self, name: &str) -> StoreResult<Option<Value>> {
        self.stats.record_read();
        let now = self.clock.now_millis();

        let (descriptor, candidate) = {
            let mut state = self.state.lock();
            let Some(descriptor) = state.schema.get(name).cloned() else {
                return Ok(None);
            };

            let candidate = match (state.entries.get(name).cloned(), &descriptor.expire) {
                (Some(entry), None) => Some(entry),
                (Some(entry), Some(spec)) => {
                    if spec.is_live(name, entry.stored_at, now)? {
                        Some(entry)
                    } else {
                        state.entries.remove(name);
                        self.stats.record_expiration();
                        debug!(namespace = %self.namespace, field = name, "evicted expired entry");
                        self.persist(&state, descriptor.backend)?;
                        None
                    }
                }
                (None, Some(spec)) => {
                    spec.validate(name)?;
                    None
                }
                (None, None) => None,
            };
            (descriptor, candidate)
        };

        let value = candidate.and_then(|entry| {
            let value = entry.reconstitute(&self.callables);
            if value.is_none() {
                warn!(
                    namespace = %self.namespace,
                    field = name,
                    handle = entry.value.as_str().unwrap_or_default(),
                    "callable handle is not registered"
                );
            }
            value
        });

        match value {
            Some(value) if descriptor.accepts(value.kind()) => Ok(Some(value)),
            _ => {
                self.stats.record_default();
                Ok(descriptor.resolve_default())
            }
        }
    }

    /// Writes a field and persists its backend class.
    ///
    /// On failure the hot cache is left as it was.
    ///
    /// # Errors
    ///
    /// - [`StoreError::UndeclaredField`] if `name` has no descriptor.
    /// - [`StoreError::TypeMismatch`] if the value's kind is not accepted.
    /// - [`StoreError::NonFiniteNumber`] for NaN or an infinity.
    /// - [`StoreError::CapacityExceeded`] if the class blob would not fit.
    /// - [`StoreError::MalformedExpiry`] if a spec in the class is invalid.
    pub fn set_data(&self, name: &str, value: impl Into<Value>) -> StoreResult<()> {
        let value = value.into();
        let now = self.clock.now_millis();
        let mut state = self.state.lock();

        let class = match state.schema.get(name) {
            None => {
                self.stats.record_rejected_write();
                return Err(StoreError::undeclared_field(name));
            }
            Some(descriptor) if !descriptor.accepts(value.kind()) => {
                self.stats.record_rejected_write();
                return Err(StoreError::type_mismatch(name, &descriptor.types, value.kind()));
            }
            Some(descriptor) => descriptor.backend,
        };
        // serde_json writes NaN and infinities as null, which no longer decodes.
        if let Value::Number(n) = &value {
            if !n.is_finite() {
                self.stats.record_rejected_write();
                return Err(StoreError::non_finite_number(name, *n));
            }
        }

        if let Value::Callable(callable) = &value {
            self.callables.insert(callable);
        }
        let previous = state
            .entries
            .insert(name.to_string(), CacheEntry::new(value, now));

        if let Err(err) = self.persist(&state, class) {
            match previous {
                Some(entry) => state.entries.insert(name.to_string(), entry),
                None => state.entries.remove(name),
            };
            self.stats.record_rejected_write();
            return Err(err);
        }
        self.stats.record_write();
        Ok(())
    }

    /// Returns a typed accessor for one field.
    #[must_use]
    pub fn field<T: FieldValue>(&self, name: &str) -> Field<'_, T> {
        Field::new(self, name)
    }

    /// Deletes the entries of `names`; their descriptors stay declared.
    ///
    /// # Errors
    ///
    /// Returns an error if re-persisting an affected class fails. The
    /// schema and cache are then restored to their previous state.
    pub fn clear_data<I, S>(&self, names: I) -> StoreResult<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut state = self.state.lock();
        let snapshot = state.clone();
        let mut touched = BTreeSet::new();
        for name in names {
            let name = name.as_ref();
            if state.entries.remove(name).is_some() {
                if let Some(descriptor) = state.schema.get(name) {
                    touched.insert(descriptor.backend);
                }
            }
        }
        self.persist_or_restore(&mut state, touched, snapshot)
    }

    /// Removes the descriptors of `names` together with their entries.
    ///
    /// Returns the names that were declared.
    ///
    /// # Errors
    ///
    /// Returns an error if re-persisting an affected class fails. The
    /// schema and cache are then restored to their previous state.
    pub fn remove_prop<I, S>(&self, names: I) -> StoreResult<Vec<String>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names: Vec<S> = names.into_iter().collect();
        let mut state = self.state.lock();
        let snapshot = state.clone();
        let removed = state.schema.remove(names.iter().map(|name| name.as_ref()));

        let mut touched = BTreeSet::new();
        for (name, descriptor) in &removed {
            if state.entries.remove(name).is_some() {
                touched.insert(descriptor.backend);
            }
        }
        self.persist_or_restore(&mut state, touched, snapshot)?;
        Ok(removed.into_iter().map(|(name, _)| name).collect())
    }

    /// Declares new fields or replaces existing descriptors.
    ///
    /// A field that moves to another backend class takes its entry along.
    ///
    /// # Errors
    ///
    /// Returns an error if re-persisting an affected class fails. The
    /// schema and cache are then restored to their previous state.
    pub fn update_prop<I, K>(&self, fields: I) -> StoreResult<()>
    where
        I: IntoIterator<Item = (K, FieldDescriptor)>,
        K: Into<String>,
    {
        let fields: Vec<(String, FieldDescriptor)> = fields
            .into_iter()
            .map(|(name, descriptor)| (name.into(), descriptor))
            .collect();

        let mut state = self.state.lock();
        let snapshot = state.clone();
        let mut touched = BTreeSet::new();
        for (name, descriptor) in &fields {
            if state.entries.contains_key(name) {
                if let Some(old) = state.schema.get(name) {
                    touched.insert(old.backend);
                }
                touched.insert(descriptor.backend);
            }
        }
        state.schema.declare(fields);
        self.persist_or_restore(&mut state, touched, snapshot)
    }

    /// Returns the descriptor of `name`, or every descriptor for `None`.
    ///
    /// An undeclared name yields an empty schema.
    #[must_use]
    pub fn get_props(&self, name: Option<&str>) -> Schema {
        let state = self.state.lock();
        match name {
            Some(name) => state
                .schema
                .get(name)
                .map(|descriptor| (name, descriptor.clone()))
                .into_iter()
                .collect(),
            None => state.schema.clone(),
        }
    }

    /// Returns the descriptor of one field.
    #[must_use]
    pub fn get_prop(&self, name: &str) -> Option<FieldDescriptor> {
        self.state.lock().schema.get(name).cloned()
    }

    /// Returns the declared field names in order.
    #[must_use]
    pub fn field_names(&self) -> Vec<String> {
        self.state.lock().schema.names()
    }

    /// Returns true if `name` is declared.
    #[must_use]
    pub fn contains_field(&self, name: &str) -> bool {
        self.state.lock().schema.contains(name)
    }

    /// Returns the configured secret.
    #[must_use]
    pub fn get_crypto_key(&self) -> Option<&CryptoKey> {
        self.crypto_key.as_ref()
    }

    /// Returns the namespace key, `prefix:namespace:version`.
    #[must_use]
    pub fn get_namespace(&self) -> &str {
        self.namespace.key()
    }

    /// Returns the parsed namespace.
    #[must_use]
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Reports the bytes stored under the namespace key in each class.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    pub fn get_capacity(&self) -> StoreResult<CapacityReport> {
        let usage = |class| -> StoreResult<CapacityUsage> {
            let used = self
                .backend
                .get_item(self.namespace.key(), class)?
                .map_or(0, |text| text.len() as u64);
            Ok(CapacityUsage {
                used,
                limit: self.capacity.limit(class),
            })
        };
        Ok(CapacityReport {
            durable: usage(BackendClass::Durable)?,
            session: usage(BackendClass::Session)?,
        })
    }

    /// Runs a cleanup pass, returning how many keys were removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    pub fn clear_unused_cache(&self, mode: CleanupMode) -> StoreResult<usize> {
        self.namespace.sweep(self.backend.as_ref(), mode)
    }

    /// Clears one backend class, or both for `None`.
    ///
    /// The hot cache is kept and written back by the next mutation.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    pub fn clear(&self, class: Option<BackendClass>) -> StoreResult<()> {
        self.backend.clear(class)?;
        info!(namespace = %self.namespace, class = ?class, "cleared backend");
        Ok(())
    }

    /// Returns a snapshot of the store counters.
    #[must_use]
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Returns the storage backend.
    #[must_use]
    pub fn backend(&self) -> &Arc<dyn StorageBackend> {
        &self.backend
    }

    fn seal(&self, text: String) -> StoreResult<String> {
        match &self.cipher {
            Some(cipher) => cipher.seal(&text),
            None => Ok(text),
        }
    }

    fn open(&self, text: String) -> StoreResult<String> {
        match &self.cipher {
            Some(cipher) => cipher.open(&text),
            None => Ok(text),
        }
    }

    fn load(&self, schema: &Schema) -> StoreResult<Entries> {
        let mut entries = Entries::new();
        for class in BackendClass::ALL {
            let Some(raw) = self.backend.get_item(self.namespace.key(), class)? else {
                continue;
            };
            let decoded = self
                .open(raw)
                .and_then(|text| decode_entries_partial(&text).map_err(StoreError::from));
            match decoded {
                Ok((blob, skipped)) => {
                    for (name, err) in skipped {
                        warn!(namespace = %self.namespace, %class, field = %name, error = %err, "discarding unreadable entry");
                    }
                    entries.extend(blob.into_iter().filter(|(name, _)| {
                        schema
                            .get(name)
                            .is_some_and(|descriptor| descriptor.backend == class)
                    }));
                }
                Err(err) => {
                    warn!(namespace = %self.namespace, %class, error = %err, "discarding unreadable blob");
                }
            }
        }
        Ok(entries)
    }

    /// Persists every class in `touched`, or puts `snapshot` back.
    ///
    /// On failure, classes already written are rewritten from the snapshot.
    fn persist_or_restore(
        &self,
        state: &mut State,
        touched: BTreeSet<BackendClass>,
        snapshot: State,
    ) -> StoreResult<()> {
        let mut written = Vec::new();
        for class in touched {
            if let Err(err) = self.persist(state, class) {
                *state = snapshot;
                for class in written {
                    if let Err(restore_err) = self.persist(state, class) {
                        warn!(
                            namespace = %self.namespace,
                            %class,
                            error = %restore_err,
                            "failed to restore persisted class"
                        );
                    }
                }
                return Err(err);
            }
            written.push(class);
        }
        Ok(())
    }

    /// Writes the live entries of `class` to the backend.
    fn persist(&self, state: &State, class: BackendClass) -> StoreResult<()> {
        let now = self.clock.now_millis();
        let mut slice = Entries::new();
        for (name, descriptor) in state.schema.in_class(class) {
            if let Some(spec) = &descriptor.expire {
                spec.validate(name)?;
            }
            let Some(entry) = state.entries.get(name) else {
                continue;
            };
            if let Some(spec) = &descriptor.expire {
                if !spec.is_live(name, entry.stored_at, now)? {
                    continue;
                }
            }
            slice.insert(name.clone(), entry.clone());
        }

        let text = self.seal(encode_entries(&slice)?)?;
        let used = text.len() as u64;
        self.capacity.check(class, used)?;
        self.backend.set_item(self.namespace.key(), &text, class)?;
        self.stats.record_persist(used);
        debug!(namespace = %self.namespace, %class, entries = slice.len(), bytes = used, "persisted");
        Ok(())
    }

    fn persist_initial(&self) -> StoreResult<()> {
        let mut state = self.state.lock();
        let result = BackendClass::ALL
            .into_iter()
            .try_for_each(|class| self.persist(&state, class));

        match result {
            Err(err) if err.is_capacity_exceeded() => {
                error!(
                    namespace = %self.namespace,
                    error = %err,
                    "loaded data exceeds capacity; discarding all cached data"
                );
                state.entries.clear();
                let empty = self.seal(encode_entries(&state.entries)?)?;
                for class in BackendClass::ALL {
                    self.backend.set_item(self.namespace.key(), &empty, class)?;
                }
                Err(StoreError::InitialLoadOverflow)
            }
            other => other,
        }
    }
}

impl std::fmt::Debug for VmoStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VmoStore")
            .field("namespace", &self.namespace.key())
            .field("fields", &self.field_names())
            .field("capacity", &self.capacity)
            .field("encrypted", &self.cipher.is_some())
            .finish_non_exhaustive()
    }
}
