//! # VmoStore Testkit
//!
//! Test utilities for VmoStore.
//!
//! This crate provides:
//! - A recording backend that logs every call and can inject write failures
//! - Store fixtures wired to a manual clock and a private callable registry
//! - Temporary file backends
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust
//! use vmostore_core::{FieldDescriptor, Value, ValueKind};
//! use vmostore_testkit::prelude::*;
//!
//! let store = TestStore::with_fields([("name", FieldDescriptor::new(ValueKind::String))]);
//! store.set_data("name", "John").unwrap();
//! assert_eq!(store.get_data("name"), Some(Value::from("John")));
//! assert_eq!(store.backend.write_count(), 3);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use fixtures::*;
pub use generators::*;
