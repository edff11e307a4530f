//! Keys command implementation.

use std::path::Path;
use vmostore_storage::{BackendClass, StorageBackend};

/// Runs the keys command.
pub fn run(path: &Path, class: Option<BackendClass>) -> Result<(), Box<dyn std::error::Error>> {
    let backend = super::open_existing(path)?;
    for key in backend.keys(class)? {
        println!("{key}");
    }
    Ok(())
}
