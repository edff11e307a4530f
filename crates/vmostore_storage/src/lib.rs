//! # VmoStore Storage
//!
//! Key-value storage backend trait and implementations for VmoStore.
//!
//! This crate provides the lowest-level storage abstraction for VmoStore.
//! Storage backends are **opaque text stores** - they do not interpret
//! the blobs they hold.
//!
//! ## Design Principles
//!
//! - Backends are simple string-keyed stores (get, set, remove, clear, keys)
//! - Every operation is addressed to a [`BackendClass`]: `durable` or `session`
//! - No knowledge of namespaces, cache entries, or schemas
//! - Must be `Send + Sync`; all operations take `&self`
//!
//! ## Available Backends
//!
//! - [`InMemoryBackend`] - For testing and ephemeral stores
//! - [`FileBackend`] - Durable class persisted to a JSON file
//!
//! ## Example
//!
//! ```rust
//! use vmostore_storage::{BackendClass, InMemoryBackend, StorageBackend};
//!
//! let backend = InMemoryBackend::new();
//! backend.set_item("greeting", "hello", BackendClass::Durable).unwrap();
//! let value = backend.get_item("greeting", BackendClass::Durable).unwrap();
//! assert_eq!(value.as_deref(), Some("hello"));
//! assert!(backend.get_item("greeting", BackendClass::Session).unwrap().is_none());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod class;
mod error;
mod file;
mod memory;

pub use backend::StorageBackend;
pub use class::BackendClass;
pub use error::{StorageError, StorageResult};
pub use file::FileBackend;
pub use memory::InMemoryBackend;
