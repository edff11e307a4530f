//! File-based storage backend for persistent storage.

use crate::backend::{union_keys, StorageBackend};
use crate::class::BackendClass;
use crate::error::{StorageError, StorageResult};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A file-based storage backend.
///
/// The durable class is persisted as a single JSON object in one file and
/// survives process restarts. The session class lives in memory and is
/// lost when the backend is dropped.
///
/// # Durability
///
/// Every durable mutation rewrites the whole file: the new contents are
/// written to a sibling temporary file, synced, and renamed over the
/// original, so a crash leaves either the old or the new contents.
///
/// # Thread Safety
///
/// This backend is thread-safe and can be shared across threads.
/// Internal locking ensures consistent access.
///
/// # Example
///
/// ```no_run
/// use vmostore_storage::{BackendClass, FileBackend, StorageBackend};
/// use std::path::Path;
///
/// let backend = FileBackend::open(Path::new("store.json")).unwrap();
/// backend.set_item("key", "persistent data", BackendClass::Durable).unwrap();
/// ```
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    durable: RwLock<BTreeMap<String, String>>,
    session: RwLock<BTreeMap<String, String>>,
}

impl FileBackend {
    /// Opens or creates a file backend at the given path.
    ///
    /// If the file exists, its durable entries are loaded.
    /// If it doesn't exist, it is created on the first durable write.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or decoded.
    pub fn open(path: &Path) -> StorageResult<Self> {
        let durable = if path.exists() {
            let text = fs::read_to_string(path)?;
            if text.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&text).map_err(|e| {
                    StorageError::Corrupted(format!("{}: {e}", path.display()))
                })?
            }
        } else {
            BTreeMap::new()
        };

        debug!(path = %path.display(), keys = durable.len(), "opened file backend");

        Ok(Self {
            path: path.to_path_buf(),
            durable: RwLock::new(durable),
            session: RwLock::new(BTreeMap::new()),
        })
    }

    /// Opens or creates a file backend, creating parent directories if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if directories cannot be created or file cannot be opened.
    pub fn open_with_create_dirs(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Self::open(path)
    }

    /// Returns the path to the underlying file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, durable: &BTreeMap<String, String>) -> StorageResult<()> {
        let text = serde_json::to_string(durable)?;
        let tmp = self.path.with_extension("tmp");
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(text.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn mutate<F>(&self, class: BackendClass, f: F) -> StorageResult<()>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        match class {
            BackendClass::Durable => {
                let mut durable = self.durable.write();
                let mut next = durable.clone();
                f(&mut next);
                self.persist(&next)?;
                *durable = next;
            }
            BackendClass::Session => f(&mut self.session.write()),
        }
        Ok(())
    }
}

impl StorageBackend for FileBackend {
    fn get_item(&self, key: &str, class: BackendClass) -> StorageResult<Option<String>> {
        let area = match class {
            BackendClass::Durable => self.durable.read(),
            BackendClass::Session => self.session.read(),
        };
        Ok(area.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str, class: BackendClass) -> StorageResult<()> {
        self.mutate(class, |area| {
            area.insert(key.to_string(), value.to_string());
        })
    }

    fn remove_item(&self, key: &str, class: BackendClass) -> StorageResult<()> {
        self.mutate(class, |area| {
            area.remove(key);
        })
    }

    fn clear(&self, class: Option<BackendClass>) -> StorageResult<()> {
        match class {
            Some(class) => self.mutate(class, BTreeMap::clear),
            None => {
                self.mutate(BackendClass::Durable, BTreeMap::clear)?;
                self.mutate(BackendClass::Session, BTreeMap::clear)
            }
        }
    }

    fn keys(&self, class: Option<BackendClass>) -> StorageResult<Vec<String>> {
        let durable = || self.durable.read().keys().cloned().collect::<Vec<_>>();
        let session = || self.session.read().keys().cloned().collect::<Vec<_>>();
        Ok(match class {
            Some(BackendClass::Durable) => durable(),
            Some(BackendClass::Session) => session(),
            None => union_keys(durable(), session()),
        })
    }
}
