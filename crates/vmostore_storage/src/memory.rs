//! In-memory storage backend for testing.

use crate::backend::{union_keys, StorageBackend};
use crate::class::BackendClass;
use crate::error::StorageResult;
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// An in-memory storage backend.
///
/// Both classes are kept in memory, so nothing outlives the backend.
/// This backend is suitable for:
/// - Unit tests
/// - Integration tests
/// - Ephemeral stores that don't need persistence
///
/// # Thread Safety
///
/// This backend is thread-safe and can be shared across threads and
/// between several stores.
///
/// # Example
///
/// ```rust
/// use vmostore_storage::{BackendClass, InMemoryBackend, StorageBackend};
///
/// let backend = InMemoryBackend::new();
/// backend.set_item("k", "v", BackendClass::Session).unwrap();
/// assert_eq!(backend.keys(None).unwrap(), vec!["k".to_string()]);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    durable: RwLock<BTreeMap<String, String>>,
    session: RwLock<BTreeMap<String, String>>,
}

impl InMemoryBackend {
    /// Creates a new empty in-memory backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new in-memory backend with pre-existing entries.
    ///
    /// Useful for testing load and cleanup scenarios.
    #[must_use]
    pub fn with_items<I, K, V>(items: I) -> Self
    where
        I: IntoIterator<Item = (BackendClass, K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let backend = Self::new();
        for (class, key, value) in items {
            backend.area(class).write().insert(key.into(), value.into());
        }
        backend
    }

    /// Returns the number of keys stored in `class`.
    #[must_use]
    pub fn len(&self, class: BackendClass) -> usize {
        self.area(class).read().len()
    }

    /// Returns true if both classes are empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.durable.read().is_empty() && self.session.read().is_empty()
    }

    fn area(&self, class: BackendClass) -> &RwLock<BTreeMap<String, String>> {
        match class {
            BackendClass::Durable => &self.durable,
            BackendClass::Session => &self.session,
        }
    }
}

impl StorageBackend for InMemoryBackend {
    fn get_item(&self, key: &str, class: BackendClass) -> StorageResult<Option<String>> {
        Ok(self.area(class).read().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str, class: BackendClass) -> StorageResult<()> {
        self.area(class)
            .write()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str, class: BackendClass) -> StorageResult<()> {
        self.area(class).write().remove(key);
        Ok(())
    }

    fn clear(&self, class: Option<BackendClass>) -> StorageResult<()> {
        match class {
            Some(class) => self.area(class).write().clear(),
            None => {
                self.durable.write().clear();
                self.session.write().clear();
            }
        }
        Ok(())
    }

    fn keys(&self, class: Option<BackendClass>) -> StorageResult<Vec<String>> {
        match class {
            Some(class) => Ok(self.area(class).read().keys().cloned().collect()),
            None => Ok(union_keys(
                self.durable.read().keys().cloned().collect(),
                self.session.read().keys().cloned().collect(),
            )),
        }
    }
}
