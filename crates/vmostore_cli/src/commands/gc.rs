//! GC command implementation.

use std::path::Path;
use tracing::info;
use vmostore_core::{CleanupMode, Namespace};

/// Runs the gc command.
pub fn run(path: &Path, namespace: &Namespace, mode: CleanupMode) -> Result<(), Box<dyn std::error::Error>> {
    let backend = super::open_existing(path)?;

    info!("Sweeping {:?} around {}", path, namespace);
    let removed = namespace.sweep(&backend, mode)?;
    println!("Removed {removed} key(s) ({mode} mode, keeping {namespace})");
    Ok(())
}
