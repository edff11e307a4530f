//! Namespace keys and generational cleanup of stale keys.

use crate::error::{StoreError, StoreResult};
use std::fmt;
use std::str::FromStr;
use tracing::info;
use vmostore_storage::{BackendClass, StorageBackend};

/// Prefix used when none is configured.
pub const DEFAULT_PREFIX: &str = "VMO-STORE";
/// Namespace used when none is configured.
pub const DEFAULT_NAMESPACE: &str = "NORMAL";

/// A store version, given as a number or a numeric string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Version {
    /// An integer version.
    Number(i64),
    /// A textual version, parsed to an integer when the store is built.
    Text(String),
}

impl Version {
    /// Parses the version into an integer.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidConfig`] if a textual version is not an integer.
    pub fn resolve(&self) -> StoreResult<i64> {
        match self {
            Self::Number(n) => Ok(*n),
            Self::Text(text) => text
                .trim()
                .parse()
                .map_err(|_| StoreError::invalid_config(format!("version {text:?} is not an integer"))),
        }
    }
}

impl Default for Version {
    fn default() -> Self {
        Self::Number(0)
    }
}

impl From<i64> for Version {
    fn from(n: i64) -> Self {
        Self::Number(n)
    }
}

impl From<i32> for Version {
    fn from(n: i32) -> Self {
        Self::Number(i64::from(n))
    }
}

impl From<u32> for Version {
    fn from(n: u32) -> Self {
        Self::Number(i64::from(n))
    }
}

impl From<&str> for Version {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for Version {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

/// Which backend keys a cleanup pass removes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupMode {
    /// Every key except this store's own namespace key.
    All,
    /// Only other versions of this store's prefix and namespace.
    SelfVersions,
}

impl FromStr for CleanupMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Self::All),
            "self" => Ok(Self::SelfVersions),
            other => Err(format!("unknown cleanup mode: {other}")),
        }
    }
}

impl fmt::Display for CleanupMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::All => "all",
            Self::SelfVersions => "self",
        })
    }
}

/// The composite `prefix:namespace:version` key of a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace {
    prefix: String,
    namespace: String,
    version: i64,
    key: String,
}

impl Namespace {
    /// Composes a namespace key, substituting defaults for missing parts.
    #[must_use]
    pub fn new(prefix: Option<&str>, namespace: Option<&str>, version: i64) -> Self {
        let prefix = prefix.unwrap_or(DEFAULT_PREFIX).to_string();
        let namespace = namespace.unwrap_or(DEFAULT_NAMESPACE).to_string();
        let key = format!("{prefix}:{namespace}:{version}");
        Self {
            prefix,
            namespace,
            version,
            key,
        }
    }

    /// Returns the composite key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the prefix segment.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns the namespace segment.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Returns the version segment.
    #[must_use]
    pub fn version(&self) -> i64 {
        self.version
    }

    /// Returns true if `key` belongs to another version of this namespace.
    #[must_use]
    pub fn is_sibling(&self, key: &str) -> bool {
        if key == self.key {
            return false;
        }
        key.strip_prefix(self.prefix.as_str())
            .and_then(|rest| rest.strip_prefix(':'))
            .and_then(|rest| rest.strip_prefix(self.namespace.as_str()))
            .and_then(|rest| rest.strip_prefix(':'))
            .is_some_and(|version| !version.is_empty() && version.bytes().all(|b| b.is_ascii_digit()))
    }

    /// Returns true if a cleanup pass in `mode` removes `key`.
    #[must_use]
    pub fn is_stale(&self, key: &str, mode: CleanupMode) -> bool {
        match mode {
            CleanupMode::All => key != self.key,
            CleanupMode::SelfVersions => self.is_sibling(key),
        }
    }

    /// Removes stale keys from both backend classes, returning how many
    /// keys were removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails to list or remove keys.
    pub fn sweep(&self, backend: &dyn StorageBackend, mode: CleanupMode) -> StoreResult<usize> {
        let mut removed = 0;
        for class in BackendClass::ALL {
            for key in backend.keys(Some(class))? {
                if self.is_stale(&key, mode) {
                    backend.remove_item(&key, class)?;
                    removed += 1;
                }
            }
        }
        info!(namespace = %self.key, %mode, removed, "swept stale cache keys");
        Ok(removed)
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}
