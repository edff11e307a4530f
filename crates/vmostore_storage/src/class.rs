//! Durability tiers a storage backend distinguishes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A durability tier of a storage backend.
///
/// Every backend exposes two independent storage areas. Fields are
/// assigned to exactly one of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendClass {
    /// Survives process restarts.
    Durable,
    /// Lives as long as the backend instance.
    Session,
}

impl BackendClass {
    /// Both classes, durable first.
    pub const ALL: [BackendClass; 2] = [BackendClass::Durable, BackendClass::Session];

    /// Returns the lowercase name of the class.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Durable => "durable",
            Self::Session => "session",
        }
    }
}

impl fmt::Display for BackendClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "durable" | "local" => Ok(Self::Durable),
            "session" => Ok(Self::Session),
            other => Err(format!("unknown backend class: {other}")),
        }
    }
}
