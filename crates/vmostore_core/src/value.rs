//! Field values and their kind tags.
//!
//! Every value a field can hold belongs to exactly one [`ValueKind`].
//! Field descriptors declare the kinds they accept, and the engine checks
//! writes and reads by comparing tags.
//!
//! Nested data inside lists and maps is plain JSON: only the top-level
//! value carries a kind.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

/// The closed set of value kinds a field can accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    /// UTF-8 text.
    String,
    /// A double-precision number.
    Number,
    /// `true` or `false`.
    Boolean,
    /// An ordered list of JSON values.
    List,
    /// A string-keyed map of JSON values.
    Map,
    /// An instant in UTC.
    Date,
    /// An invocable value, persisted by handle.
    Callable,
    /// A regular expression.
    Regex,
}

impl ValueKind {
    /// Returns the display name of the kind.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::String => "String",
            Self::Number => "Number",
            Self::Boolean => "Boolean",
            Self::List => "List",
            Self::Map => "Map",
            Self::Date => "Date",
            Self::Callable => "Callable",
            Self::Regex => "Regex",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Signature of the function behind a [`Callable`].
pub type CallableFn = dyn Fn(&[Value]) -> Value + Send + Sync;

/// An invocable value identified by a stable handle.
///
/// Only the handle is ever persisted. The function itself lives in a
/// [`CallableRegistry`](crate::CallableRegistry) for the lifetime of the
/// process; two callables are equal when their handles are.
#[derive(Clone)]
pub struct Callable {
    handle: String,
    func: Arc<CallableFn>,
}

impl Callable {
    /// Creates a callable from a handle and a function.
    pub fn new<F>(handle: impl Into<String>, func: F) -> Self
    where
        F: Fn(&[Value]) -> Value + Send + Sync + 'static,
    {
        Self {
            handle: handle.into(),
            func: Arc::new(func),
        }
    }

    /// Creates a callable from an already shared function.
    pub fn from_arc(handle: impl Into<String>, func: Arc<CallableFn>) -> Self {
        Self {
            handle: handle.into(),
            func,
        }
    }

    /// Returns the handle the callable is persisted under.
    #[must_use]
    pub fn handle(&self) -> &str {
        &self.handle
    }

    /// Invokes the callable.
    pub fn call(&self, args: &[Value]) -> Value {
        (self.func)(args)
    }

    pub(crate) fn shared_fn(&self) -> Arc<CallableFn> {
        Arc::clone(&self.func)
    }
}

impl PartialEq for Callable {
    fn eq(&self, other: &Self) -> bool {
        self.handle == other.handle
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callable")
            .field("handle", &self.handle)
            .finish_non_exhaustive()
    }
}

/// A compiled regular expression that serializes as its source pattern.
#[derive(Clone, Debug)]
pub struct Pattern(regex::Regex);

impl Pattern {
    /// Compiles a pattern.
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern is not a valid regular expression.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        regex::Regex::new(pattern).map(Self)
    }

    /// Returns the source pattern.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns the compiled expression.
    #[must_use]
    pub fn regex(&self) -> &regex::Regex {
        &self.0
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl From<regex::Regex> for Pattern {
    fn from(regex: regex::Regex) -> Self {
        Self(regex)
    }
}

impl Serialize for Pattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Pattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let source = String::deserialize(deserializer)?;
        Pattern::new(&source).map_err(serde::de::Error::custom)
    }
}

/// A value stored in a field.
///
/// Serialized externally tagged by kind, e.g. `{"string":"abc"}`.
/// Callables are never serialized directly; the engine persists their
/// handle instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Value {
    /// UTF-8 text.
    String(String),
    /// A double-precision number.
    Number(f64),
    /// A boolean.
    Boolean(bool),
    /// A list of JSON values.
    List(Vec<serde_json::Value>),
    /// A map of JSON values.
    Map(serde_json::Map<String, serde_json::Value>),
    /// An instant in UTC.
    Date(DateTime<Utc>),
    /// A regular expression.
    Regex(Pattern),
    /// An invocable value.
    #[serde(skip)]
    Callable(Callable),
}

impl Value {
    /// Creates a callable value.
    pub fn callable<F>(handle: impl Into<String>, func: F) -> Self
    where
        F: Fn(&[Value]) -> Value + Send + Sync + 'static,
    {
        Self::Callable(Callable::new(handle, func))
    }

    /// Returns the runtime kind of the value.
    #[must_use]
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::String(_) => ValueKind::String,
            Self::Number(_) => ValueKind::Number,
            Self::Boolean(_) => ValueKind::Boolean,
            Self::List(_) => ValueKind::List,
            Self::Map(_) => ValueKind::Map,
            Self::Date(_) => ValueKind::Date,
            Self::Regex(_) => ValueKind::Regex,
            Self::Callable(_) => ValueKind::Callable,
        }
    }

    /// Returns the text if this is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the number if this is a number.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the boolean if this is a boolean.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the callable if this is a callable.
    #[must_use]
    pub fn as_callable(&self) -> Option<&Callable> {
        match self {
            Self::Callable(c) => Some(c),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<i64> for Value {
    #[allow(clippy::cast_precision_loss)]
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Date(value)
    }
}

impl From<Pattern> for Value {
    fn from(value: Pattern) -> Self {
        Self::Regex(value)
    }
}

impl From<Callable> for Value {
    fn from(value: Callable) -> Self {
        Self::Callable(value)
    }
}

impl From<Vec<serde_json::Value>> for Value {
    fn from(value: Vec<serde_json::Value>) -> Self {
        Self::List(value)
    }
}

impl From<serde_json::Map<String, serde_json::Value>> for Value {
    fn from(value: serde_json::Map<String, serde_json::Value>) -> Self {
        Self::Map(value)
    }
}

/// Conversion between Rust types and field values.
///
/// Used by [`Field`](crate::Field) to give typed access to a field.
pub trait FieldValue: Sized {
    /// Converts into a field value.
    fn into_value(self) -> Value;

    /// Converts from a field value, or `None` if the kind doesn't fit.
    fn from_value(value: Value) -> Option<Self>;
}

impl FieldValue for Value {
    fn into_value(self) -> Value {
        self
    }

    fn from_value(value: Value) -> Option<Self> {
        Some(value)
    }
}

impl FieldValue for String {
    fn into_value(self) -> Value {
        Value::String(self)
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

impl FieldValue for f64 {
    fn into_value(self) -> Value {
        Value::Number(self)
    }

    fn from_value(value: Value) -> Option<Self> {
        value.as_f64()
    }
}

impl FieldValue for i64 {
    fn into_value(self) -> Value {
        Value::from(self)
    }

    #[allow(clippy::cast_possible_truncation)]
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Number(n) if n.fract() == 0.0 && n.is_finite() => Some(n as i64),
            _ => None,
        }
    }
}

impl FieldValue for bool {
    fn into_value(self) -> Value {
        Value::Boolean(self)
    }

    fn from_value(value: Value) -> Option<Self> {
        value.as_bool()
    }
}

impl FieldValue for DateTime<Utc> {
    fn into_value(self) -> Value {
        Value::Date(self)
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Date(d) => Some(d),
            _ => None,
        }
    }
}

impl FieldValue for Pattern {
    fn into_value(self) -> Value {
        Value::Regex(self)
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Regex(p) => Some(p),
            _ => None,
        }
    }
}

impl FieldValue for Callable {
    fn into_value(self) -> Value {
        Value::Callable(self)
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Callable(c) => Some(c),
            _ => None,
        }
    }
}

impl FieldValue for Vec<serde_json::Value> {
    fn into_value(self) -> Value {
        Value::List(self)
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::List(items) => Some(items),
            _ => None,
        }
    }
}

impl FieldValue for serde_json::Map<String, serde_json::Value> {
    fn into_value(self) -> Value {
        Value::Map(self)
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn kinds_match_variants() {
        assert_eq!(Value::from("a").kind(), ValueKind::String);
        assert_eq!(Value::from(1).kind(), ValueKind::Number);
        assert_eq!(Value::from(true).kind(), ValueKind::Boolean);
        assert_eq!(Value::from(vec![json!(1)]).kind(), ValueKind::List);
        assert_eq!(Value::Map(serde_json::Map::new()).kind(), ValueKind::Map);
        assert_eq!(Value::from(Utc::now()).kind(), ValueKind::Date);
        assert_eq!(
            Value::from(Pattern::new("^a+$").unwrap()).kind(),
            ValueKind::Regex
        );
        assert_eq!(
            Value::callable("noop", |_| Value::from(true)).kind(),
            ValueKind::Callable
        );
    }

    #[test]
    fn serialized_form_is_tagged_by_kind() {
        assert_eq!(
            serde_json::to_string(&Value::from("John")).unwrap(),
            r#"{"string":"John"}"#
        );
        assert_eq!(
            serde_json::to_string(&Value::from(30)).unwrap(),
            r#"{"number":30.0}"#
        );
        assert_eq!(
            serde_json::to_string(&Value::from(Pattern::new("a|b").unwrap())).unwrap(),
            r#"{"regex":"a|b"}"#
        );
    }

    #[test]
    fn date_and_map_survive_serde() {
        let date = Utc.with_ymd_and_hms(2024, 9, 13, 2, 15, 17).unwrap();
        let mut map = serde_json::Map::new();
        map.insert("nested".into(), json!({"a": [1, 2]}));

        for value in [Value::from(date), Value::Map(map)] {
            let text = serde_json::to_string(&value).unwrap();
            let back: Value = serde_json::from_str(&text).unwrap();
            assert_eq!(back, value);
        }
    }

    #[test]
    fn callable_is_not_serializable() {
        let value = Value::callable("fetch", |_| Value::from("data"));
        assert!(serde_json::to_string(&value).is_err());
    }

    #[test]
    fn invalid_pattern_fails_to_deserialize() {
        let result = serde_json::from_str::<Value>(r#"{"regex":"("}"#);
        assert!(result.is_err());
    }

    #[test]
    fn callable_invokes_and_compares_by_handle() {
        let double = Callable::new("double", |args| {
            Value::from(args.first().and_then(Value::as_f64).unwrap_or(0.0) * 2.0)
        });
        assert_eq!(double.call(&[Value::from(21)]), Value::from(42));

        let other = Callable::new("double", |_| Value::from(0));
        assert_eq!(double, other);
    }

    #[test]
    fn field_value_conversions() {
        assert_eq!(i64::from_value(Value::from(30)), Some(30));
        assert_eq!(i64::from_value(Value::from(1.5)), None);
        assert_eq!(String::from_value(Value::from(1)), None);
        assert_eq!(bool::from_value(true.into_value()), Some(true));
    }
}
