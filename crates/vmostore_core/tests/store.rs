//! Integration tests for the store read, write and persistence paths.

use std::sync::Arc;
use vmostore_core::{
    BackendClass, CallableRegistry, Capacity, CipherMode, FieldDescriptor, StoreConfig,
    StoreError, Value, ValueKind, VmoStore,
};
use vmostore_testkit::{scenarios, RecordingBackend, TempFileBackend, TestStore};

const KEY: &str = "VMO-STORE:NORMAL:0";

fn name_field() -> (&'static str, FieldDescriptor) {
    ("name", FieldDescriptor::new(ValueKind::String).with_default("guest"))
}

#[test]
fn round_trip_and_default_fallback() {
    let store = TestStore::with_fields(scenarios::user_profile());

    assert_eq!(store.get_data("name"), Some(Value::from("guest")));
    assert_eq!(store.get_data("age"), Some(Value::from(18)));
    assert_eq!(store.get_data("token"), None);

    store.set_data("name", "John").unwrap();
    store.set_data("age", "thirty").unwrap();
    store.set_data("tags", vec![serde_json::json!("a"), serde_json::json!(1)]).unwrap();

    assert_eq!(store.get_data("name"), Some(Value::from("John")));
    assert_eq!(store.get_data("age"), Some(Value::from("thirty")));
    assert_eq!(
        store.get_data("tags"),
        Some(Value::List(vec![serde_json::json!("a"), serde_json::json!(1)]))
    );
}

#[test]
fn namespace_key_composition() {
    let store = TestStore::open(
        StoreConfig::new()
            .prefix("APP")
            .namespace("TEST-NAMESPACE")
            .version("1"),
    );
    assert_eq!(store.get_namespace(), "APP:TEST-NAMESPACE:1");

    let err = VmoStore::new(StoreConfig::new().version("one")).unwrap_err();
    assert!(matches!(err, StoreError::InvalidConfig { .. }));
}

#[test]
fn construction_persists_both_classes() {
    let store = TestStore::with_fields([name_field()]);
    assert_eq!(store.backend.peek(KEY, BackendClass::Durable).as_deref(), Some("{}"));
    assert_eq!(store.backend.peek(KEY, BackendClass::Session).as_deref(), Some("{}"));
}

#[test]
fn write_is_persisted_in_its_class_only() {
    let store = TestStore::with_fields(scenarios::user_profile());
    store.backend.reset_ops();

    store.set_data("token", "abc").unwrap();
    assert_eq!(store.backend.write_count(), 1);
    let session = store.backend.peek(KEY, BackendClass::Session).unwrap();
    assert!(session.contains(r#""token":{"v":{"string":"abc"}"#));
    assert_eq!(store.backend.peek(KEY, BackendClass::Durable).as_deref(), Some("{}"));
}

#[test]
fn type_rejection_names_field_and_kinds() {
    let store = TestStore::with_fields(scenarios::user_profile());
    store.set_data("age", 30).unwrap();
    store.backend.reset_ops();

    let err = store.set_data("age", true).unwrap_err();
    assert!(err.is_schema_violation());
    assert_eq!(
        err.to_string(),
        "Property [age] expects a type of [Number,String], but the actual obtained type is Boolean."
    );
    assert_eq!(store.backend.write_count(), 0);
    assert_eq!(store.get_data("age"), Some(Value::from(30)));
}

#[test]
fn undeclared_write_is_rejected() {
    let store = TestStore::with_fields([name_field()]);
    let err = store.set_data("nickname", "J").unwrap_err();
    assert!(matches!(err, StoreError::UndeclaredField { ref field } if field == "nickname"));
    assert_eq!(store.get_data("nickname"), None);
}

#[test]
fn capacity_exceeded_reports_exact_bytes() {
    let store = TestStore::open(
        StoreConfig::new()
            .capacity(Capacity::default().durable(10))
            .field("name", FieldDescriptor::new(ValueKind::String)),
    );
    store.backend.reset_ops();

    // {"name":{"v":{"string":"John"},"t":1726193717000,"k":false}}
    let err = store.set_data("name", "John").unwrap_err();
    match &err {
        StoreError::CapacityExceeded { class, limit, used } => {
            assert_eq!(*class, BackendClass::Durable);
            assert_eq!(*limit, 10);
            assert_eq!(*used, 60);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(
        err.to_string(),
        "The storage capacity of memory [durable] overflows, with a limit of [10 byte], \
         and a storage capacity of [60 byte], resulting in an overflow of [50 byte]."
    );

    assert_eq!(store.backend.write_count(), 0);
    assert_eq!(store.get_data("name"), None);
    assert_eq!(store.stats().rejected_writes, 1);
}

#[test]
fn capacity_overflow_at_construction_discards_everything() {
    let durable = r#"{"name":{"v":{"string":"John"},"t":1726193717000,"k":false}}"#;
    let session = r#"{"sid":{"v":{"string":"x"},"t":1726193717000,"k":false}}"#;
    let backend = Arc::new(RecordingBackend::with_items([
        (BackendClass::Durable, KEY, durable),
        (BackendClass::Session, KEY, session),
    ]));

    let result = TestStore::try_open(
        StoreConfig::new()
            .capacity(Capacity::default().durable(10))
            .field("name", FieldDescriptor::new(ValueKind::String))
            .field("sid", FieldDescriptor::new(ValueKind::String).session()),
        backend.clone(),
    );

    assert!(matches!(result, Err(StoreError::InitialLoadOverflow)));
    assert_eq!(backend.peek(KEY, BackendClass::Durable).as_deref(), Some("{}"));
    assert_eq!(backend.peek(KEY, BackendClass::Session).as_deref(), Some("{}"));
}

#[test]
fn load_keeps_only_fields_declared_in_that_class() {
    let durable = r#"{"name":{"v":{"string":"John"},"t":1,"k":false},"gone":{"v":{"boolean":true},"t":1,"k":false},"sid":{"v":{"string":"misplaced"},"t":1,"k":false}}"#;
    let backend = Arc::new(RecordingBackend::with_items([(BackendClass::Durable, KEY, durable)]));

    let store = TestStore::try_open(
        StoreConfig::new()
            .field("name", FieldDescriptor::new(ValueKind::String))
            .field("sid", FieldDescriptor::new(ValueKind::String).session()),
        backend,
    )
    .unwrap();

    assert_eq!(store.get_data("name"), Some(Value::from("John")));
    assert_eq!(store.get_data("sid"), None);
    assert_eq!(
        store.backend.peek(KEY, BackendClass::Durable).as_deref(),
        Some(r#"{"name":{"v":{"string":"John"},"t":1,"k":false}}"#)
    );
}

#[test]
fn unreadable_blob_is_discarded_on_load() {
    let backend = Arc::new(RecordingBackend::with_items([(
        BackendClass::Durable,
        KEY,
        "not json",
    )]));
    let store = TestStore::try_open(StoreConfig::new().fields([name_field()]), backend).unwrap();
    assert_eq!(store.get_data("name"), Some(Value::from("guest")));
    assert_eq!(store.backend.peek(KEY, BackendClass::Durable).as_deref(), Some("{}"));
}

#[test]
fn malformed_expiry_fails_construction() {
    let result = TestStore::try_open(
        StoreConfig::new().field("age", FieldDescriptor::new(ValueKind::Number).expires("1o")),
        Arc::new(RecordingBackend::new()),
    );
    match result {
        Err(StoreError::MalformedExpiry { field, spec }) => {
            assert_eq!(field, "age");
            assert_eq!(spec, "1o");
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("construction should fail"),
    }
}

#[test]
fn backend_failure_propagates_and_leaves_cache_unchanged() {
    let store = TestStore::with_fields([name_field()]);
    store.set_data("name", "John").unwrap();

    store.backend.fail_writes(true);
    let err = store.set_data("name", "Jane").unwrap_err();
    assert!(matches!(err, StoreError::Storage(_)));
    assert_eq!(store.get_data("name"), Some(Value::from("John")));

    store.backend.fail_writes(false);
    store.set_data("name", "Jane").unwrap();
    assert_eq!(store.get_data("name"), Some(Value::from("Jane")));
}

#[test]
fn non_finite_numbers_are_rejected() {
    let fields = || [name_field(), ("n", FieldDescriptor::new(ValueKind::Number))];
    let store = TestStore::with_fields(fields());
    store.set_data("name", "John").unwrap();
    store.set_data("n", 1.5).unwrap();

    for bad in [f64::INFINITY, f64::NEG_INFINITY, f64::NAN] {
        let err = store.set_data("n", bad).unwrap_err();
        assert!(matches!(err, StoreError::NonFiniteNumber { .. }));
        assert!(err.is_schema_violation());
    }
    assert_eq!(store.get_data("n"), Some(Value::from(1.5)));
    assert_eq!(store.stats().rejected_writes, 3);

    let restarted = store.reopen(StoreConfig::new().fields(fields())).unwrap();
    assert_eq!(restarted.get_data("name"), Some(Value::from("John")));
    assert_eq!(restarted.get_data("n"), Some(Value::from(1.5)));
}

#[test]
fn undecodable_entry_is_dropped_without_its_neighbours() {
    let blob = r#"{"n":{"v":{"number":null},"t":1,"k":false},"name":{"v":{"string":"John"},"t":1,"k":false}}"#;
    let backend = Arc::new(RecordingBackend::with_items([(BackendClass::Durable, KEY, blob)]));
    let store = TestStore::try_open(
        StoreConfig::new().fields([name_field(), ("n", FieldDescriptor::new(ValueKind::Number))]),
        backend,
    )
    .unwrap();

    assert_eq!(store.get_data("name"), Some(Value::from("John")));
    assert_eq!(store.get_data("n"), None);
    assert_eq!(
        store.backend.peek(KEY, BackendClass::Durable).as_deref(),
        Some(r#"{"name":{"v":{"string":"John"},"t":1,"k":false}}"#)
    );
}

#[test]
fn failed_update_prop_restores_descriptor_and_entry() {
    let store = TestStore::open(
        StoreConfig::new()
            .capacity(Capacity::default().durable(5))
            .field("s", FieldDescriptor::new(ValueKind::String).session()),
    );
    store.set_data("s", "hello").unwrap();

    let err = store
        .update_prop([("s", FieldDescriptor::new(ValueKind::String))])
        .unwrap_err();
    assert!(matches!(err, StoreError::CapacityExceeded { .. }));

    assert_eq!(store.get_prop("s").unwrap().backend, BackendClass::Session);
    assert_eq!(store.get_data("s"), Some(Value::from("hello")));
    assert!(store
        .backend
        .peek(KEY, BackendClass::Session)
        .unwrap()
        .contains("hello"));
    assert_eq!(store.backend.peek(KEY, BackendClass::Durable).as_deref(), Some("{}"));
}

#[test]
fn failed_remove_prop_and_clear_data_restore_state() {
    let store = TestStore::with_fields(scenarios::user_profile());
    store.set_data("name", "John").unwrap();
    store.set_data("token", "abc").unwrap();

    store.backend.fail_writes(true);
    assert!(matches!(
        store.remove_prop(["name"]).unwrap_err(),
        StoreError::Storage(_)
    ));
    assert!(store.contains_field("name"));
    assert_eq!(store.get_data("name"), Some(Value::from("John")));

    assert!(store.clear_data(["name", "token"]).is_err());
    assert_eq!(store.get_data("name"), Some(Value::from("John")));
    assert_eq!(store.get_data("token"), Some(Value::from("abc")));

    store.backend.fail_writes(false);
    store.clear_data(["name"]).unwrap();
    assert_eq!(store.get_data("name"), Some(Value::from("guest")));
}

#[test]
fn clear_data_keeps_descriptors() {
    let store = TestStore::with_fields(scenarios::user_profile());
    store.set_data("name", "John").unwrap();
    store.set_data("token", "abc").unwrap();

    store.clear_data(["name", "token", "unknown"]).unwrap();

    assert_eq!(store.get_data("name"), Some(Value::from("guest")));
    assert_eq!(store.get_data("token"), None);
    assert!(store.contains_field("name"));
    assert_eq!(store.backend.peek(KEY, BackendClass::Durable).as_deref(), Some("{}"));
    assert_eq!(store.backend.peek(KEY, BackendClass::Session).as_deref(), Some("{}"));
}

#[test]
fn remove_prop_cascades_to_entries() {
    let store = TestStore::with_fields(scenarios::user_profile());
    store.set_data("name", "John").unwrap();

    let removed = store.remove_prop(["name", "missing"]).unwrap();
    assert_eq!(removed, vec!["name".to_string()]);

    assert!(store.get_props(Some("name")).is_empty());
    assert!(store.get_prop("name").is_none());
    assert_eq!(store.get_data("name"), None);
    assert!(store.set_data("name", "John").is_err());
    assert_eq!(store.backend.peek(KEY, BackendClass::Durable).as_deref(), Some("{}"));
    assert_eq!(store.field_names(), vec!["age", "tags", "token"]);
}

#[test]
fn update_prop_adds_and_replaces_fields() {
    let store = TestStore::with_fields([name_field()]);
    store.set_data("name", "John").unwrap();

    store
        .update_prop([
            ("email", FieldDescriptor::new(ValueKind::String)),
            ("name", FieldDescriptor::new(ValueKind::Number).with_default(0)),
        ])
        .unwrap();

    assert_eq!(store.get_props(None).len(), 2);
    // The cached string no longer matches the declared kind.
    assert_eq!(store.get_data("name"), Some(Value::from(0)));
    store.set_data("email", "j@example.com").unwrap();
    assert!(store.set_data("name", "John").is_err());
}

#[test]
fn update_prop_moves_entry_between_classes() {
    let store = TestStore::with_fields([name_field()]);
    store.set_data("name", "John").unwrap();

    store
        .update_prop([("name", FieldDescriptor::new(ValueKind::String).session())])
        .unwrap();

    assert_eq!(store.backend.peek(KEY, BackendClass::Durable).as_deref(), Some("{}"));
    assert!(store
        .backend
        .peek(KEY, BackendClass::Session)
        .unwrap()
        .contains("John"));
    assert_eq!(store.get_data("name"), Some(Value::from("John")));
}

#[test]
fn get_capacity_reports_stored_bytes() {
    let store = TestStore::open(
        StoreConfig::new()
            .capacity(Capacity::default().durable(1024))
            .fields([name_field()]),
    );
    store.set_data("name", "John").unwrap();

    let report = store.get_capacity().unwrap();
    assert_eq!(report.durable.used, 60);
    assert_eq!(report.durable.limit, Some(1024));
    assert_eq!(report.session.used, 2);
    assert_eq!(report.session.limit, None);
    assert_eq!(report.session.to_string(), "2 / none");
}

#[test]
fn clear_delegates_to_backend() {
    let store = TestStore::with_fields([name_field()]);
    store.set_data("name", "John").unwrap();

    store.clear(Some(BackendClass::Durable)).unwrap();
    assert!(store.backend.peek(KEY, BackendClass::Durable).is_none());
    assert!(store.backend.peek(KEY, BackendClass::Session).is_some());

    store.clear(None).unwrap();
    assert!(store.backend.peek(KEY, BackendClass::Session).is_none());
}

#[test]
fn callables_persist_by_handle() {
    let store = TestStore::with_fields([("fetch", FieldDescriptor::new(ValueKind::Callable))]);
    store
        .set_data(
            "fetch",
            Value::callable("fetch-user", |args| {
                Value::from(format!("user-{}", args.len()))
            }),
        )
        .unwrap();

    let value = store.get_data("fetch").unwrap();
    let callable = value.as_callable().unwrap();
    assert_eq!(callable.handle(), "fetch-user");
    assert_eq!(callable.call(&[Value::from(1)]), Value::from("user-1"));

    let blob = store.backend.peek(KEY, BackendClass::Durable).unwrap();
    assert!(blob.contains(r#""v":{"string":"fetch-user"}"#));
    assert!(blob.contains(r#""k":true"#));
}

#[test]
fn callables_need_reregistration_after_restart() {
    let store = TestStore::with_fields([(
        "fetch",
        FieldDescriptor::new(ValueKind::Callable).with_default("no-callable"),
    )]);
    store
        .set_data("fetch", Value::callable("fetch-user", |_| Value::from("user")))
        .unwrap();

    let registry = Arc::new(CallableRegistry::new());
    let restarted = store
        .reopen(
            StoreConfig::new()
                .callables(registry.clone())
                .field(
                    "fetch",
                    FieldDescriptor::new(ValueKind::Callable).with_default("no-callable"),
                ),
        )
        .unwrap();
    assert_eq!(restarted.get_data("fetch"), Some(Value::from("no-callable")));

    registry.register("fetch-user", |_| Value::from("revived"));
    let value = restarted.get_data("fetch").unwrap();
    assert_eq!(value.as_callable().unwrap().call(&[]), Value::from("revived"));
}

#[test]
fn xor_obfuscated_round_trip() {
    let config = || {
        StoreConfig::new()
            .crypto_key("1234567812345678")
            .fields([name_field()])
    };
    let store = TestStore::open(config());
    store.set_data("name", "John").unwrap();

    let blob = store.backend.peek(KEY, BackendClass::Durable).unwrap();
    assert!(!blob.contains("John"));
    assert!(serde_json::from_str::<serde_json::Value>(&blob).is_err());
    assert_eq!(store.get_crypto_key().unwrap().expose(), "1234567812345678");

    let restarted = store.reopen(config()).unwrap();
    assert_eq!(restarted.get_data("name"), Some(Value::from("John")));

    let wrong_key = store
        .reopen(StoreConfig::new().crypto_key("another-key").fields([name_field()]))
        .unwrap();
    assert_eq!(wrong_key.get_data("name"), Some(Value::from("guest")));
}

#[cfg(feature = "encryption")]
#[test]
fn aes_encrypted_round_trip() {
    let config = || {
        StoreConfig::new()
            .crypto_key("correct horse battery staple")
            .cipher(CipherMode::Aes256Gcm)
            .fields([name_field()])
    };
    let store = TestStore::open(config());
    store.set_data("name", "John").unwrap();
    assert!(!store.backend.peek(KEY, BackendClass::Durable).unwrap().contains("John"));

    let restarted = store.reopen(config()).unwrap();
    assert_eq!(restarted.get_data("name"), Some(Value::from("John")));
}

#[test]
fn empty_crypto_key_is_rejected() {
    let err = VmoStore::new(StoreConfig::new().crypto_key("").cipher(CipherMode::Xor)).unwrap_err();
    assert!(matches!(err, StoreError::InvalidConfig { .. }));
}

#[test]
fn file_backend_survives_restart_for_durable_class() {
    let temp = TempFileBackend::new();
    let config = || StoreConfig::new().fields(scenarios::user_profile());

    {
        let store = VmoStore::new(config().storage(temp.open())).unwrap();
        store.set_data("name", "John").unwrap();
        store.set_data("token", "abc").unwrap();
        assert_eq!(store.get_data("token"), Some(Value::from("abc")));
    }

    let store = VmoStore::new(config().storage(temp.open())).unwrap();
    assert_eq!(store.get_data("name"), Some(Value::from("John")));
    assert_eq!(store.get_data("token"), None);
}

#[test]
fn stats_track_operations() {
    let store = TestStore::with_fields(scenarios::user_profile());
    store.set_data("name", "John").unwrap();
    let _ = store.set_data("name", 1);
    store.get_data("name");
    store.get_data("age");

    let stats = store.stats();
    assert_eq!(stats.writes, 1);
    assert_eq!(stats.rejected_writes, 1);
    assert_eq!(stats.reads, 2);
    assert_eq!(stats.defaults_served, 1);
    // Two at construction, one per accepted write.
    assert_eq!(stats.persists, 3);
}

#[test]
fn typed_field_accessor() {
    let store = TestStore::with_fields(scenarios::user_profile());
    let age = store.field::<i64>("age");
    assert_eq!(age.get(), Some(18));
    age.set(42).unwrap();
    assert_eq!(age.get(), Some(42));
    assert_eq!(age.name(), "age");
}
