//! Inspect command implementation.

use chrono::{TimeZone, Utc};
use serde::Serialize;
use std::path::Path;
use vmostore_core::crypto::{Cipher, CipherMode, CryptoKey};
use vmostore_core::{decode_entries, CacheEntry, Namespace, ValueKind};
use vmostore_storage::{BackendClass, StorageBackend};

/// Namespace inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Backend file path.
    pub path: String,
    /// The inspected namespace key.
    pub namespace: String,
    /// One report per backend class.
    pub classes: Vec<ClassReport>,
}

/// The blob stored in one class.
#[derive(Debug, Serialize)]
pub struct ClassReport {
    /// Backend class.
    pub class: BackendClass,
    /// Size of the stored text in bytes; absent if nothing is stored.
    pub bytes: Option<usize>,
    /// Decoded entries.
    pub entries: Vec<EntryReport>,
    /// Why the blob could not be decoded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// One stored field.
#[derive(Debug, Serialize)]
pub struct EntryReport {
    /// Field name.
    pub field: String,
    /// Kind of the stored value.
    pub kind: ValueKind,
    /// The stored value; the handle for callables.
    pub value: serde_json::Value,
    /// Write time as RFC 3339.
    pub stored_at: String,
}

/// Runs the inspect command.
pub fn run(
    path: &Path,
    namespace: &Namespace,
    key: Option<String>,
    cipher: CipherMode,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let backend = super::open_existing(path)?;
    let cipher = key
        .map(|key| Cipher::new(CryptoKey::new(key), cipher))
        .transpose()?;

    let mut result = inspect(&backend, namespace, cipher.as_ref())?;
    result.path = path.display().to_string();

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            print_text_output(&result);
        }
    }

    Ok(())
}

/// Decodes the blobs stored under `namespace` in both classes.
pub fn inspect(
    backend: &dyn StorageBackend,
    namespace: &Namespace,
    cipher: Option<&Cipher>,
) -> Result<InspectResult, Box<dyn std::error::Error>> {
    let mut classes = Vec::new();
    for class in BackendClass::ALL {
        let mut report = ClassReport {
            class,
            bytes: None,
            entries: Vec::new(),
            error: None,
        };

        if let Some(raw) = backend.get_item(namespace.key(), class)? {
            report.bytes = Some(raw.len());
            let text = match cipher {
                Some(cipher) => cipher.open(&raw).map_err(|e| e.to_string()),
                None => Ok(raw),
            };
            match text.and_then(|text| decode_entries(&text).map_err(|e| e.to_string())) {
                Ok(entries) => {
                    report.entries = entries
                        .into_iter()
                        .map(|(field, entry)| entry_report(field, &entry))
                        .collect::<Result<_, _>>()?;
                }
                Err(err) => report.error = Some(err),
            }
        }
        classes.push(report);
    }

    Ok(InspectResult {
        path: String::new(),
        namespace: namespace.key().to_string(),
        classes,
    })
}

fn entry_report(field: String, entry: &CacheEntry) -> Result<EntryReport, serde_json::Error> {
    // Values serialize as {"<kind>": <payload>}; keep the payload.
    let value = match serde_json::to_value(&entry.value)? {
        serde_json::Value::Object(tagged) => tagged
            .into_iter()
            .next()
            .map_or(serde_json::Value::Null, |(_, payload)| payload),
        other => other,
    };
    let kind = if entry.is_callable {
        ValueKind::Callable
    } else {
        entry.value.kind()
    };
    let stored_at = Utc
        .timestamp_millis_opt(entry.stored_at)
        .single()
        .map_or_else(|| entry.stored_at.to_string(), |t| t.to_rfc3339());

    Ok(EntryReport {
        field,
        kind,
        value,
        stored_at,
    })
}

fn print_text_output(result: &InspectResult) {
    println!("VmoStore Inspection");
    println!("===================");
    println!();
    println!("Path:      {}", result.path);
    println!("Namespace: {}", result.namespace);

    for class in &result.classes {
        println!();
        match class.bytes {
            Some(bytes) => println!("{} ({} bytes):", class.class, bytes),
            None => {
                println!("{}: nothing stored", class.class);
                continue;
            }
        }
        if let Some(error) = &class.error {
            println!("  unreadable: {error}");
            continue;
        }
        if class.entries.is_empty() {
            println!("  (no entries)");
        }
        for entry in &class.entries {
            println!(
                "  {:<20} {:<9} {}  (stored {})",
                entry.field, entry.kind, entry.value, entry.stored_at
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vmostore_storage::InMemoryBackend;

    const BLOB: &str = r#"{"fetch":{"v":{"string":"fetch-user"},"t":1726193717000,"k":true},"name":{"v":{"string":"John"},"t":1726193717000,"k":false}}"#;

    #[test]
    fn decodes_plain_blob() {
        let backend = InMemoryBackend::with_items([(BackendClass::Durable, "VMO-STORE:NORMAL:0", BLOB)]);
        let namespace = Namespace::new(None, None, 0);

        let result = inspect(&backend, &namespace, None).unwrap();
        let durable = &result.classes[0];
        assert_eq!(durable.bytes, Some(BLOB.len()));
        assert_eq!(durable.entries.len(), 2);

        let fetch = &durable.entries[0];
        assert_eq!(fetch.kind, ValueKind::Callable);
        assert_eq!(fetch.value, serde_json::json!("fetch-user"));
        assert_eq!(fetch.stored_at, "2024-09-13T02:15:17+00:00");

        assert_eq!(durable.entries[1].value, serde_json::json!("John"));
        assert!(result.classes[1].bytes.is_none());
    }

    #[test]
    fn decodes_sealed_blob() {
        let cipher = Cipher::new(CryptoKey::new("1234567812345678"), CipherMode::Xor).unwrap();
        let sealed = cipher.seal(BLOB).unwrap();
        let backend = InMemoryBackend::with_items([(BackendClass::Durable, "A:B:1", sealed.as_str())]);
        let namespace = Namespace::new(Some("A"), Some("B"), 1);

        let result = inspect(&backend, &namespace, Some(&cipher)).unwrap();
        assert_eq!(result.classes[0].entries.len(), 2);

        let unsealed = inspect(&backend, &namespace, None).unwrap();
        assert!(unsealed.classes[0].error.is_some());
    }
}
