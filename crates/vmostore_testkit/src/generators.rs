//! Property-based test generators using proptest.
//!
//! Numbers are limited to values that survive a JSON round trip exactly.

use chrono::{DateTime, TimeZone, Utc};
use proptest::prelude::*;
use vmostore_core::{ExpireSpec, Pattern, Value, ValueKind};

/// Strategy for value kinds that can be persisted literally.
pub fn literal_kind_strategy() -> impl Strategy<Value = ValueKind> {
    prop_oneof![
        Just(ValueKind::String),
        Just(ValueKind::Number),
        Just(ValueKind::Boolean),
        Just(ValueKind::List),
        Just(ValueKind::Map),
        Just(ValueKind::Date),
        Just(ValueKind::Regex),
    ]
}

/// Strategy for valid field names.
pub fn field_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z][a-zA-Z0-9_]{0,15}").expect("Invalid regex")
}

/// Strategy for namespace and prefix segments.
pub fn segment_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Z][A-Z0-9-]{0,11}").expect("Invalid regex")
}

/// Strategy for numbers that serialize without loss.
pub fn number_strategy() -> impl Strategy<Value = f64> {
    (any::<i32>(), 0u8..4).prop_map(|(n, quarters)| f64::from(n) + f64::from(quarters) * 0.25)
}

/// Strategy for UTC instants between 1970 and 2100, at millisecond precision.
pub fn date_strategy() -> impl Strategy<Value = DateTime<Utc>> {
    (0i64..4_102_444_800_000).prop_map(|ms| {
        Utc.timestamp_millis_opt(ms)
            .single()
            .expect("in-range timestamp")
    })
}

fn json_scalar_strategy() -> impl Strategy<Value = serde_json::Value> {
    prop_oneof![
        Just(serde_json::Value::Null),
        any::<bool>().prop_map(serde_json::Value::Bool),
        any::<i32>().prop_map(|n| serde_json::Value::from(n)),
        "[a-z]{0,8}".prop_map(serde_json::Value::String),
    ]
}

/// Strategy for a value of `kind`.
pub fn value_of_kind(kind: ValueKind) -> BoxedStrategy<Value> {
    match kind {
        ValueKind::String => any::<String>().prop_map(Value::String).boxed(),
        ValueKind::Number => number_strategy().prop_map(Value::Number).boxed(),
        ValueKind::Boolean => any::<bool>().prop_map(Value::Boolean).boxed(),
        ValueKind::List => prop::collection::vec(json_scalar_strategy(), 0..6)
            .prop_map(Value::List)
            .boxed(),
        ValueKind::Map => prop::collection::btree_map("[a-z]{1,6}", json_scalar_strategy(), 0..6)
            .prop_map(|entries| Value::Map(entries.into_iter().collect()))
            .boxed(),
        ValueKind::Date => date_strategy().prop_map(Value::Date).boxed(),
        ValueKind::Regex => prop_oneof![Just(r"^\d+$"), Just("[a-z]+"), Just(r"\w+@\w+\.com")]
            .prop_map(|pattern| Value::Regex(Pattern::new(pattern).expect("valid pattern")))
            .boxed(),
        ValueKind::Callable => Just(Value::callable("generated", |_| Value::Boolean(true))).boxed(),
    }
}

/// Strategy for a literal value of any kind, paired with its kind.
pub fn literal_value_strategy() -> impl Strategy<Value = (ValueKind, Value)> {
    literal_kind_strategy().prop_flat_map(|kind| value_of_kind(kind).prop_map(move |value| (kind, value)))
}

/// Strategy for well-formed relative expiration specs.
pub fn relative_expire_strategy() -> impl Strategy<Value = ExpireSpec> {
    (1u32..1000, prop_oneof![Just("s"), Just("m"), Just("h"), Just("d")])
        .prop_map(|(amount, unit)| ExpireSpec::from(format!("{amount}{unit}")))
}

/// Strategy for specs that match neither the relative nor the absolute grammar.
pub fn malformed_expire_strategy() -> impl Strategy<Value = ExpireSpec> {
    prop_oneof![
        Just("1o"),
        Just("1y"),
        Just("s"),
        Just("-1s"),
        Just("2024/01/01"),
        Just("1.s"),
        Just(""),
    ]
    .prop_map(ExpireSpec::from)
}
