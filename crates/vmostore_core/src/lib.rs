//! # VmoStore Core
//!
//! Schema-driven, TTL-aware, capacity-bounded cache engine.
//!
//! This crate provides:
//! - A schema of typed fields with defaults, expiration specs and backend classes
//! - A hot cache loaded from, and written through to, a [`StorageBackend`]
//! - Lazy expiry: expired entries are evicted the first time a read sees them
//! - Per-class capacity limits on persisted blobs
//! - Optional at-rest obfuscation or AES-256-GCM encryption of blobs
//! - Generational cleanup of keys left behind by other store versions
//!
//! ## Example
//!
//! ```rust
//! use vmostore_core::{BackendClass, FieldDescriptor, StoreConfig, Value, ValueKind, VmoStore};
//!
//! let store = VmoStore::new(
//!     StoreConfig::new()
//!         .prefix("APP")
//!         .namespace("USER")
//!         .version(1)
//!         .field("name", FieldDescriptor::new(ValueKind::String).with_default("guest"))
//!         .field(
//!             "session_id",
//!             FieldDescriptor::new(ValueKind::String).session().expires("30m"),
//!         ),
//! )
//! .unwrap();
//!
//! assert_eq!(store.get_namespace(), "APP:USER:1");
//! store.set_data("name", "John").unwrap();
//! assert_eq!(store.get_data("name"), Some(Value::from("John")));
//! assert_eq!(store.get_prop("session_id").unwrap().backend, BackendClass::Session);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod callable;
mod capacity;
mod clock;
mod config;
pub mod crypto;
mod entry;
mod error;
mod expiry;
mod field;
mod namespace;
mod schema;
mod stats;
mod store;
mod value;

pub use callable::CallableRegistry;
pub use capacity::{Capacity, CapacityReport, CapacityUsage};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::StoreConfig;
pub use crypto::{CipherMode, CryptoKey};
pub use entry::{decode_entries, decode_entries_partial, encode_entries, CacheEntry, Entries};
pub use error::{StoreError, StoreResult};
pub use expiry::ExpireSpec;
pub use field::Field;
pub use namespace::{CleanupMode, Namespace, Version, DEFAULT_NAMESPACE, DEFAULT_PREFIX};
pub use schema::{DefaultProducer, DefaultValue, FieldDescriptor, Schema};
pub use stats::{StatsSnapshot, StoreStats};
pub use store::VmoStore;
pub use value::{Callable, CallableFn, FieldValue, Pattern, Value, ValueKind};

pub use vmostore_storage::{BackendClass, FileBackend, InMemoryBackend, StorageBackend, StorageError};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
