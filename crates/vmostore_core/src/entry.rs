//! Cache entries and the blob format they are persisted in.
//!
//! A blob is the JSON text of a map from field name to [`CacheEntry`]:
//!
//! ```text
//! {"name":{"v":{"string":"John"},"t":1726193717000,"k":false}}
//! ```

use crate::callable::CallableRegistry;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The hot-data cache: field name to entry.
pub type Entries = BTreeMap<String, CacheEntry>;

/// One stored field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The literal value, or the handle of a callable as a string.
    #[serde(rename = "v")]
    pub value: Value,
    /// When the entry was written, in milliseconds since the epoch.
    #[serde(rename = "t")]
    pub stored_at: i64,
    /// Whether `value` is a callable handle that must be rebound on read.
    #[serde(rename = "k", default)]
    pub is_callable: bool,
}

impl CacheEntry {
    /// Builds the entry for a write of `value` at `now`.
    ///
    /// Callables are reduced to their handle.
    #[must_use]
    pub fn new(value: Value, now: i64) -> Self {
        match value {
            Value::Callable(callable) => Self {
                value: Value::String(callable.handle().to_string()),
                stored_at: now,
                is_callable: true,
            },
            value => Self {
                value,
                stored_at: now,
                is_callable: false,
            },
        }
    }

    /// Turns the entry back into a live value.
    ///
    /// Returns `None` for a callable whose handle is not registered.
    #[must_use]
    pub fn reconstitute(&self, registry: &CallableRegistry) -> Option<Value> {
        if !self.is_callable {
            return Some(self.value.clone());
        }
        self.value
            .as_str()
            .and_then(|handle| registry.resolve(handle))
            .map(Value::Callable)
    }
}

/// Encodes entries as blob text.
///
/// # Errors
///
/// Returns an error if an entry cannot be serialized.
pub fn encode_entries(entries: &Entries) -> serde_json::Result<String> {
    serde_json::to_string(entries)
}

/// Decodes blob text into entries.
///
/// # Errors
///
/// Returns an error if the text is not a valid blob.
pub fn decode_entries(text: &str) -> serde_json::Result<Entries> {
    if text.trim().is_empty() {
        return Ok(Entries::new());
    }
    serde_json::from_str(text)
}

/// Decodes blob text entry by entry.
///
/// Entries that do not decode are returned by name with their error
/// instead of failing the whole blob.
///
/// # Errors
///
/// Returns an error if the text is not a JSON object.
pub fn decode_entries_partial(
    text: &str,
) -> serde_json::Result<(Entries, Vec<(String, serde_json::Error)>)> {
    let mut entries = Entries::new();
    let mut skipped = Vec::new();
    if text.trim().is_empty() {
        return Ok((entries, skipped));
    }

    let raw: serde_json::Map<String, serde_json::Value> = serde_json::from_str(text)?;
    for (name, value) in raw {
        match serde_json::from_value::<CacheEntry>(value) {
            Ok(entry) => {
                entries.insert(name, entry);
            }
            Err(err) => skipped.push((name, err)),
        }
    }
    Ok((entries, skipped))
}
