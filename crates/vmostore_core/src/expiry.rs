//! Expiration specs and their resolution into absolute instants.
//!
//! A spec is kept exactly as declared and only parsed when an expiry
//! has to be computed, so a malformed spec surfaces on first use.

use crate::error::{StoreError, StoreResult};
use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

static ABSOLUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}( \d{2}:\d{2}:\d{2})?$").expect("valid absolute expiry regex")
});

static RELATIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+(?:\.\d+)?)(s|m|h|d)$").expect("valid relative expiry regex")
});

const SECOND_MS: f64 = 1_000.0;
const MINUTE_MS: f64 = 60_000.0;
const HOUR_MS: f64 = 3_600_000.0;
const DAY_MS: f64 = 86_400_000.0;

/// An expiration policy as declared on a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpireSpec {
    /// Milliseconds after the write; the sign is ignored.
    Millis(i64),
    /// Either `N[.N](s|m|h|d)` relative to the write, or an absolute
    /// `YYYY-MM-DD[ HH:mm:ss]` instant in UTC.
    Text(String),
}

impl ExpireSpec {
    /// Resolves the absolute expiry instant, in milliseconds since the
    /// epoch, for an entry of `field` written at `stored_at`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::MalformedExpiry`] if the text form matches
    /// neither grammar.
    pub fn resolve(&self, field: &str, stored_at: i64) -> StoreResult<i64> {
        match self {
            Self::Millis(ms) => Ok(stored_at.saturating_add(ms.saturating_abs())),
            Self::Text(text) => {
                if ABSOLUTE.is_match(text) {
                    return parse_absolute(text).ok_or_else(|| StoreError::malformed_expiry(field, text));
                }
                if let Some(caps) = RELATIVE.captures(text) {
                    let amount: f64 = caps[1]
                        .parse()
                        .map_err(|_| StoreError::malformed_expiry(field, text))?;
                    let unit = match &caps[2] {
                        "s" => SECOND_MS,
                        "m" => MINUTE_MS,
                        "h" => HOUR_MS,
                        _ => DAY_MS,
                    };
                    #[allow(clippy::cast_possible_truncation)]
                    let offset = (amount * unit).round() as i64;
                    return Ok(stored_at.saturating_add(offset));
                }
                Err(StoreError::malformed_expiry(field, text))
            }
        }
    }

    /// Validates the expiration spec without computing an instant.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::MalformedExpiry`] for an unparseable spec.
    pub fn validate(&self, field: &str) -> StoreResult<()> {
        self.resolve(field, 0).map(|_| ())
    }

    /// Returns true if an entry written at `stored_at` is still live at `now`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::MalformedExpiry`] for an unparseable spec.
    pub fn is_live(&self, field: &str, stored_at: i64, now: i64) -> StoreResult<bool> {
        Ok(now < self.resolve(field, stored_at)?)
    }
}

fn parse_absolute(text: &str) -> Option<i64> {
    let datetime = if text.len() > 10 {
        NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S").ok()?
    } else {
        NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .ok()?
            .and_hms_opt(0, 0, 0)?
    };
    Some(datetime.and_utc().timestamp_millis())
}

impl From<i64> for ExpireSpec {
    fn from(ms: i64) -> Self {
        Self::Millis(ms)
    }
}

impl From<i32> for ExpireSpec {
    fn from(ms: i32) -> Self {
        Self::Millis(i64::from(ms))
    }
}

impl From<&str> for ExpireSpec {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for ExpireSpec {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl std::fmt::Display for ExpireSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Millis(ms) => write!(f, "{ms}ms"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T: i64 = 1_726_193_717_000;

    #[test]
    fn numeric_spec_is_relative_and_unsigned() {
        assert_eq!(ExpireSpec::Millis(500).resolve("f", T).unwrap(), T + 500);
        assert_eq!(ExpireSpec::Millis(-500).resolve("f", T).unwrap(), T + 500);
    }

    #[test]
    fn relative_units() {
        let cases = [
            ("1s", 1_000),
            ("2m", 120_000),
            ("1h", 3_600_000),
            ("1d", 86_400_000),
            ("1.5h", 5_400_000),
            ("0.5s", 500),
        ];
        for (spec, offset) in cases {
            assert_eq!(
                ExpireSpec::from(spec).resolve("f", T).unwrap(),
                T + offset,
                "spec {spec}"
            );
        }
    }

    #[test]
    fn absolute_date_ignores_stored_at() {
        let spec = ExpireSpec::from("2050-12-11");
        let a = spec.resolve("birth", 0).unwrap();
        let b = spec.resolve("birth", T).unwrap();
        assert_eq!(a, b);
        assert_eq!(a, 2_554_329_600_000);
    }

    #[test]
    fn absolute_date_time() {
        let spec = ExpireSpec::from("2024-09-13 02:15:17");
        assert_eq!(spec.resolve("f", 0).unwrap(), T);
    }

    #[test]
    fn malformed_specs_are_rejected() {
        for bad in ["1o", "", "d", "1.d", "2024-13-45", "2024-09-13T02:15:17", "10 s", "-1s"] {
            let err = ExpireSpec::from(bad).resolve("age", T).unwrap_err();
            assert!(
                matches!(err, StoreError::MalformedExpiry { ref field, .. } if field == "age"),
                "spec {bad:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn liveness_is_strict() {
        let spec = ExpireSpec::from("1s");
        assert!(spec.is_live("f", T, T + 999).unwrap());
        assert!(!spec.is_live("f", T, T + 1_000).unwrap());
    }

    #[test]
    fn validate_checks_grammar_only() {
        assert!(ExpireSpec::from("3d").validate("f").is_ok());
        assert!(ExpireSpec::from("3y").validate("f").is_err());
    }
}
