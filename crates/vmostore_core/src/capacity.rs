//! Per-class byte ceilings on persisted blobs.

use crate::error::{StoreError, StoreResult};
use std::fmt;
use vmostore_storage::BackendClass;

/// Byte limits per backend class; `None` is unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capacity {
    /// Limit for the durable class.
    pub durable: Option<u64>,
    /// Limit for the session class.
    pub session: Option<u64>,
}

impl Capacity {
    /// No limits.
    #[must_use]
    pub const fn unbounded() -> Self {
        Self {
            durable: None,
            session: None,
        }
    }

    /// Sets the durable limit.
    #[must_use]
    pub const fn durable(mut self, bytes: u64) -> Self {
        self.durable = Some(bytes);
        self
    }

    /// Sets the session limit.
    #[must_use]
    pub const fn session(mut self, bytes: u64) -> Self {
        self.session = Some(bytes);
        self
    }

    /// Returns the limit for `class`.
    #[must_use]
    pub const fn limit(&self, class: BackendClass) -> Option<u64> {
        match class {
            BackendClass::Durable => self.durable,
            BackendClass::Session => self.session,
        }
    }

    /// Rejects a blob of `used` bytes that does not fit `class`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::CapacityExceeded`] if `used` exceeds the limit.
    pub fn check(&self, class: BackendClass, used: u64) -> StoreResult<()> {
        match self.limit(class) {
            Some(limit) if used > limit => Err(StoreError::CapacityExceeded { class, limit, used }),
            _ => Ok(()),
        }
    }
}

/// Bytes stored for one class against its limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityUsage {
    /// Bytes currently stored under the namespace key.
    pub used: u64,
    /// The configured limit.
    pub limit: Option<u64>,
}

impl CapacityUsage {
    /// Bytes left before the limit, if there is one.
    #[must_use]
    pub fn remaining(&self) -> Option<u64> {
        self.limit.map(|limit| limit.saturating_sub(self.used))
    }
}

impl fmt::Display for CapacityUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.limit {
            Some(limit) => write!(f, "{} / {} bytes", self.used, limit),
            None => write!(f, "{} / none", self.used),
        }
    }
}

/// Usage of both classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityReport {
    /// Durable class usage.
    pub durable: CapacityUsage,
    /// Session class usage.
    pub session: CapacityUsage,
}

impl CapacityReport {
    /// Returns the usage of `class`.
    #[must_use]
    pub const fn get(&self, class: BackendClass) -> CapacityUsage {
        match class {
            BackendClass::Durable => self.durable,
            BackendClass::Session => self.session,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unbounded_accepts_anything() {
        let capacity = Capacity::unbounded();
        assert!(capacity.check(BackendClass::Durable, u64::MAX).is_ok());
    }

    #[test]
    fn limit_is_inclusive() {
        let capacity = Capacity::default().durable(10);
        assert!(capacity.check(BackendClass::Durable, 10).is_ok());
        assert!(capacity.check(BackendClass::Session, 11).is_ok());

        let err = capacity.check(BackendClass::Durable, 11).unwrap_err();
        assert!(err.is_capacity_exceeded());
        assert_eq!(
            err.to_string(),
            "The storage capacity of memory [durable] overflows, with a limit of [10 byte], \
             and a storage capacity of [11 byte], resulting in an overflow of [1 byte]."
        );
    }

    #[test]
    fn usage_display() {
        let bounded = CapacityUsage { used: 4, limit: Some(10) };
        assert_eq!(bounded.to_string(), "4 / 10 bytes");
        assert_eq!(bounded.remaining(), Some(6));

        let unbounded = CapacityUsage { used: 4, limit: None };
        assert_eq!(unbounded.to_string(), "4 / none");
        assert_eq!(unbounded.remaining(), None);
    }
}
