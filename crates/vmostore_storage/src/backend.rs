//! Storage backend trait definition.

use crate::class::BackendClass;
use crate::error::StorageResult;

/// A key-value storage backend for VmoStore.
///
/// Storage backends are **opaque text stores** with two independent
/// areas, one per [`BackendClass`]. VmoStore owns all blob format
/// interpretation - backends do not understand entries, expiry, or
/// obfuscation.
///
/// # Invariants
///
/// - `get_item` returns exactly the text last written with `set_item`
///   for the same key and class, or `None`
/// - the two classes never share entries
/// - every call completes before returning; VmoStore writes through
/// - Backends must be `Send + Sync` for shared access
///
/// # Implementors
///
/// - [`super::InMemoryBackend`] - For testing
/// - [`super::FileBackend`] - For persistent storage
pub trait StorageBackend: Send + Sync {
    /// Reads the text stored under `key` in `class`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store cannot be read.
    fn get_item(&self, key: &str, class: BackendClass) -> StorageResult<Option<String>>;

    /// Stores `value` under `key` in `class`, replacing any previous text.
    ///
    /// # Errors
    ///
    /// Returns an error if the write cannot be made durable.
    fn set_item(&self, key: &str, value: &str, class: BackendClass) -> StorageResult<()>;

    /// Removes `key` from `class`. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the removal cannot be made durable.
    fn remove_item(&self, key: &str, class: BackendClass) -> StorageResult<()>;

    /// Removes every key from `class`, or from both classes when `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the clear cannot be made durable.
    fn clear(&self, class: Option<BackendClass>) -> StorageResult<()>;

    /// Lists the keys of `class`.
    ///
    /// With `None`, returns the de-duplicated union of both classes,
    /// durable keys first.
    ///
    /// # Errors
    ///
    /// Returns an error if the key listing cannot be read.
    fn keys(&self, class: Option<BackendClass>) -> StorageResult<Vec<String>>;
}

/// Merges key lists, keeping the first occurrence of every key.
pub(crate) fn union_keys(durable: Vec<String>, session: Vec<String>) -> Vec<String> {
    let mut keys = durable;
    for key in session {
        if !keys.contains(&key) {
            keys.push(key);
        }
    }
    keys
}
