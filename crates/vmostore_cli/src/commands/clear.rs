//! Clear command implementation.

use std::path::Path;
use tracing::info;
use vmostore_storage::{BackendClass, StorageBackend};

/// Runs the clear command.
pub fn run(path: &Path, class: Option<BackendClass>) -> Result<(), Box<dyn std::error::Error>> {
    let backend = super::open_existing(path)?;
    let removed = backend.keys(class)?.len();
    backend.clear(class)?;

    info!("Cleared {:?}", path);
    match class {
        Some(class) => println!("Cleared {removed} key(s) from the {class} class"),
        None => println!("Cleared {removed} key(s) from all classes"),
    }
    Ok(())
}
