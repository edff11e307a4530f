//! Error types for VmoStore core.

use crate::value::ValueKind;
use thiserror::Error;
use vmostore_storage::BackendClass;

/// Result type for core operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in VmoStore core operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] vmostore_storage::StorageError),

    /// A persisted blob could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A write addressed a field that has no descriptor.
    #[error("write to undeclared field [{field}]")]
    UndeclaredField {
        /// The field name.
        field: String,
    },

    /// A written value's kind is not accepted by the field.
    #[error(
        "Property [{field}] expects a type of [{}], but the actual obtained type is {actual}.",
        join_kinds(.expected)
    )]
    TypeMismatch {
        /// The field name.
        field: String,
        /// The kinds the field accepts.
        expected: Vec<ValueKind>,
        /// The kind of the rejected value.
        actual: ValueKind,
    },

    /// A written number is NaN or infinite and cannot be persisted.
    #[error("Property [{field}] cannot store the non-finite number {value}.")]
    NonFiniteNumber {
        /// The field name.
        field: String,
        /// The rejected number.
        value: f64,
    },

    /// An expiration spec could not be parsed.
    #[error(
        "expiration spec for field [{field}] is invalid; expected a number, or a string of form Nd/Nm/Nh/Ns, or an absolute date-time. (got {spec:?})"
    )]
    MalformedExpiry {
        /// The field name.
        field: String,
        /// The offending spec text.
        spec: String,
    },

    /// A serialized slice exceeds its class capacity.
    #[error(
        "The storage capacity of memory [{class}] overflows, with a limit of [{limit} byte], and a storage capacity of [{used} byte], resulting in an overflow of [{} byte].",
        overflow(.used, .limit)
    )]
    CapacityExceeded {
        /// The backend class being persisted.
        class: BackendClass,
        /// The configured limit in bytes.
        limit: u64,
        /// The size of the rejected blob in bytes.
        used: u64,
    },

    /// The data loaded at construction did not fit; all cached data was discarded.
    #[error("storage capacity overflowed while loading persisted data; all cached data was discarded")]
    InitialLoadOverflow,

    /// Encryption failed.
    #[error("encryption failed: {message}")]
    Encryption {
        /// Description of the failure.
        message: String,
    },

    /// Decryption failed.
    #[error("decryption failed: {message}")]
    Decryption {
        /// Description of the failure.
        message: String,
    },

    /// The store configuration is invalid.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the problem.
        message: String,
    },
}

fn overflow(used: &u64, limit: &u64) -> u64 {
    used.saturating_sub(*limit)
}

fn join_kinds(kinds: &[ValueKind]) -> String {
    kinds
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

impl StoreError {
    /// Creates an undeclared field error.
    pub fn undeclared_field(field: impl Into<String>) -> Self {
        Self::UndeclaredField {
            field: field.into(),
        }
    }

    /// Creates a type mismatch error.
    pub fn type_mismatch(field: impl Into<String>, expected: &[ValueKind], actual: ValueKind) -> Self {
        Self::TypeMismatch {
            field: field.into(),
            expected: expected.to_vec(),
            actual,
        }
    }

    /// Creates a non-finite number error.
    pub fn non_finite_number(field: impl Into<String>, value: f64) -> Self {
        Self::NonFiniteNumber {
            field: field.into(),
            value,
        }
    }

    /// Creates a malformed expiry error.
    pub fn malformed_expiry(field: impl Into<String>, spec: impl Into<String>) -> Self {
        Self::MalformedExpiry {
            field: field.into(),
            spec: spec.into(),
        }
    }

    /// Creates an encryption failed error.
    pub fn encryption(message: impl Into<String>) -> Self {
        Self::Encryption {
            message: message.into(),
        }
    }

    /// Creates a decryption failed error.
    pub fn decryption(message: impl Into<String>) -> Self {
        Self::Decryption {
            message: message.into(),
        }
    }

    /// Creates an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Returns true for writes to undeclared fields, type mismatches and
    /// numbers that cannot be persisted.
    #[must_use]
    pub fn is_schema_violation(&self) -> bool {
        matches!(
            self,
            Self::UndeclaredField { .. } | Self::TypeMismatch { .. } | Self::NonFiniteNumber { .. }
        )
    }

    /// Returns true for capacity overflows, including the construction discard.
    #[must_use]
    pub fn is_capacity_exceeded(&self) -> bool {
        matches!(self, Self::CapacityExceeded { .. } | Self::InitialLoadOverflow)
    }
}
