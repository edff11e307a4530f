//! Typed access to a single field.

use crate::error::StoreResult;
use crate::store::VmoStore;
use crate::value::FieldValue;
use std::marker::PhantomData;

/// A typed view of one field of a [`VmoStore`].
///
/// Every access goes through the store's read and write paths.
///
/// ```rust
/// use vmostore_core::{FieldDescriptor, StoreConfig, ValueKind, VmoStore};
///
/// let store = VmoStore::new(
///     StoreConfig::new().field("age", FieldDescriptor::new(ValueKind::Number).with_default(18)),
/// )
/// .unwrap();
///
/// let age = store.field::<i64>("age");
/// assert_eq!(age.get(), Some(18));
/// age.set(30).unwrap();
/// assert_eq!(age.get(), Some(30));
/// ```
pub struct Field<'a, T> {
    store: &'a VmoStore,
    name: String,
    _marker: PhantomData<fn() -> T>,
}

impl<'a, T: FieldValue> Field<'a, T> {
    pub(crate) fn new(store: &'a VmoStore, name: &str) -> Self {
        Self {
            store,
            name: name.to_string(),
            _marker: PhantomData,
        }
    }

    /// Returns the field name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Reads the field; `None` if absent or not convertible to `T`.
    #[must_use]
    pub fn get(&self) -> Option<T> {
        self.store.get_data(&self.name).and_then(T::from_value)
    }

    /// Reads the field, returning read-path errors.
    ///
    /// # Errors
    ///
    /// See [`VmoStore::try_get_data`].
    pub fn try_get(&self) -> StoreResult<Option<T>> {
        Ok(self.store.try_get_data(&self.name)?.and_then(T::from_value))
    }

    /// Writes the field.
    ///
    /// # Errors
    ///
    /// See [`VmoStore::set_data`].
    pub fn set(&self, value: T) -> StoreResult<()> {
        self.store.set_data(&self.name, value.into_value())
    }

    /// Deletes the field's entry.
    ///
    /// # Errors
    ///
    /// See [`VmoStore::clear_data`].
    pub fn clear(&self) -> StoreResult<()> {
        self.store.clear_data([self.name.as_str()])
    }
}

impl<T> std::fmt::Debug for Field<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("type", &std::any::type_name::<T>())
            .finish()
    }
}
