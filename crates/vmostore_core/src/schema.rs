//! Field descriptors and the schema registry.

use crate::expiry::ExpireSpec;
use crate::value::{Value, ValueKind};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use vmostore_storage::BackendClass;

/// Signature of a default-producing function.
pub type DefaultProducer = dyn Fn() -> Value + Send + Sync;

/// The default of a field: a literal, or a producer invoked on every use.
#[derive(Clone)]
pub enum DefaultValue {
    /// Returned as-is.
    Literal(Value),
    /// Invoked with no arguments each time the default is needed.
    Producer(Arc<DefaultProducer>),
}

impl DefaultValue {
    /// Creates a producer default.
    pub fn producer<F>(func: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        Self::Producer(Arc::new(func))
    }

    /// Resolves the default into a value.
    #[must_use]
    pub fn resolve(&self) -> Value {
        match self {
            Self::Literal(value) => value.clone(),
            Self::Producer(func) => func(),
        }
    }
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            Self::Producer(_) => f.write_str("Producer(..)"),
        }
    }
}

/// The declaration of one field.
///
/// # Example
///
/// ```rust
/// use vmostore_core::{BackendClass, FieldDescriptor, ValueKind};
///
/// let name = FieldDescriptor::new(ValueKind::String)
///     .with_default("anonymous")
///     .expires("1d")
///     .in_backend(BackendClass::Durable);
/// assert!(name.accepts(ValueKind::String));
/// ```
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    /// The kinds the field accepts.
    pub types: Vec<ValueKind>,
    /// The value served when no live, well-typed entry exists.
    pub default: Option<DefaultValue>,
    /// When entries expire; `None` never expires.
    pub expire: Option<ExpireSpec>,
    /// The backend class entries are persisted to.
    pub backend: BackendClass,
}

impl FieldDescriptor {
    /// Creates a durable, never-expiring field accepting one kind.
    #[must_use]
    pub fn new(kind: ValueKind) -> Self {
        Self::of_kinds([kind])
    }

    /// Creates a durable, never-expiring field accepting several kinds.
    #[must_use]
    pub fn of_kinds(kinds: impl IntoIterator<Item = ValueKind>) -> Self {
        let mut types: Vec<ValueKind> = Vec::new();
        for kind in kinds {
            if !types.contains(&kind) {
                types.push(kind);
            }
        }
        Self {
            types,
            default: None,
            expire: None,
            backend: BackendClass::Durable,
        }
    }

    /// Sets a literal default.
    #[must_use]
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(DefaultValue::Literal(value.into()));
        self
    }

    /// Sets a producer default.
    #[must_use]
    pub fn with_default_fn<F>(mut self, func: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.default = Some(DefaultValue::producer(func));
        self
    }

    /// Sets the expiration spec.
    #[must_use]
    pub fn expires(mut self, spec: impl Into<ExpireSpec>) -> Self {
        self.expire = Some(spec.into());
        self
    }

    /// Sets the backend class.
    #[must_use]
    pub fn in_backend(mut self, class: BackendClass) -> Self {
        self.backend = class;
        self
    }

    /// Shorthand for `in_backend(BackendClass::Session)`.
    #[must_use]
    pub fn session(self) -> Self {
        self.in_backend(BackendClass::Session)
    }

    /// Returns true if values of `kind` may be written to the field.
    #[must_use]
    pub fn accepts(&self, kind: ValueKind) -> bool {
        self.types.contains(&kind)
    }

    /// Resolves the default, if any.
    #[must_use]
    pub fn resolve_default(&self) -> Option<Value> {
        self.default.as_ref().map(DefaultValue::resolve)
    }
}

/// The registry of field descriptors, keyed by field name.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: BTreeMap<String, FieldDescriptor>,
}

impl Schema {
    /// Creates an empty schema.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges descriptors into the schema; later declarations win.
    pub fn declare<I, K>(&mut self, fields: I)
    where
        I: IntoIterator<Item = (K, FieldDescriptor)>,
        K: Into<String>,
    {
        for (name, descriptor) in fields {
            self.fields.insert(name.into(), descriptor);
        }
    }

    /// Removes descriptors, returning the ones that existed.
    pub fn remove<'a, I>(&mut self, names: I) -> Vec<(String, FieldDescriptor)>
    where
        I: IntoIterator<Item = &'a str>,
    {
        names
            .into_iter()
            .filter_map(|name| self.fields.remove_entry(name))
            .collect()
    }

    /// Returns one descriptor.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.get(name)
    }

    /// Returns true if `name` is declared.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Iterates all descriptors in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldDescriptor)> {
        self.fields.iter()
    }

    /// Iterates the descriptors assigned to `class`.
    pub fn in_class(&self, class: BackendClass) -> impl Iterator<Item = (&String, &FieldDescriptor)> {
        self.fields
            .iter()
            .filter(move |(_, descriptor)| descriptor.backend == class)
    }

    /// Returns the declared field names in order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.fields.keys().cloned().collect()
    }

    /// Returns the number of declared fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if no field is declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, FieldDescriptor)> for Schema {
    fn from_iter<I: IntoIterator<Item = (K, FieldDescriptor)>>(iter: I) -> Self {
        let mut schema = Schema::new();
        schema.declare(iter);
        schema
    }
}
