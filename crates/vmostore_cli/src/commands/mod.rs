//! CLI command implementations.

pub mod clear;
pub mod gc;
pub mod inspect;
pub mod keys;

use std::path::Path;
use vmostore_storage::FileBackend;

/// Opens the backend file, refusing to create one.
fn open_existing(path: &Path) -> Result<FileBackend, Box<dyn std::error::Error>> {
    if !path.exists() {
        return Err(format!("No backend file found at {:?}", path).into());
    }
    Ok(FileBackend::open(path)?)
}
