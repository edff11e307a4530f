//! In-process registry of callables, keyed by handle.
//!
//! Persisted cache entries only ever carry a callable's handle. Reading
//! such an entry rebinds the handle through a registry; a handle that
//! nobody registered in this process cannot be rebound.

use crate::value::{Callable, CallableFn, Value};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

static GLOBAL: Lazy<Arc<CallableRegistry>> = Lazy::new(|| Arc::new(CallableRegistry::new()));

/// Registry mapping handles to functions.
///
/// # Example
///
/// ```rust
/// use vmostore_core::{CallableRegistry, Value};
///
/// let registry = CallableRegistry::new();
/// registry.register("greet", |_| Value::from("hello"));
/// let greet = registry.resolve("greet").unwrap();
/// assert_eq!(greet.call(&[]), Value::from("hello"));
/// ```
#[derive(Default)]
pub struct CallableRegistry {
    entries: RwLock<HashMap<String, Arc<CallableFn>>>,
}

impl CallableRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the process-wide registry stores use by default.
    #[must_use]
    pub fn global() -> Arc<CallableRegistry> {
        Arc::clone(&GLOBAL)
    }

    /// Registers `func` under `handle`, replacing any previous function.
    pub fn register<F>(&self, handle: impl Into<String>, func: F)
    where
        F: Fn(&[Value]) -> Value + Send + Sync + 'static,
    {
        self.entries.write().insert(handle.into(), Arc::new(func));
    }

    /// Registers the function behind an existing callable.
    pub fn insert(&self, callable: &Callable) {
        self.entries
            .write()
            .insert(callable.handle().to_string(), callable.shared_fn());
    }

    /// Rebinds `handle` to a callable, if it is registered.
    #[must_use]
    pub fn resolve(&self, handle: &str) -> Option<Callable> {
        self.entries
            .read()
            .get(handle)
            .map(|func| Callable::from_arc(handle, Arc::clone(func)))
    }

    /// Removes `handle`, returning whether it was registered.
    pub fn unregister(&self, handle: &str) -> bool {
        self.entries.write().remove(handle).is_some()
    }

    /// Returns true if `handle` is registered.
    #[must_use]
    pub fn contains(&self, handle: &str) -> bool {
        self.entries.read().contains_key(handle)
    }

    /// Returns the number of registered handles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl std::fmt::Debug for CallableRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut handles: Vec<String> = self.entries.read().keys().cloned().collect();
        handles.sort();
        f.debug_struct("CallableRegistry")
            .field("handles", &handles)
            .finish()
    }
}
