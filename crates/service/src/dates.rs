//! Date normalization for banner expirations.
//!
//! User input is accepted in a handful of common shapes and stored as an
//! RFC 3339 timestamp with second precision and a numeric offset.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Offset, SecondsFormat, TimeZone, Utc};

use crate::errors::ServiceError;

/// Converts a user-supplied date expression into the canonical timestamp string.
pub trait DateNormalizer: Send + Sync {
    fn normalize(&self, expr: &str) -> Result<String, ServiceError>;
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d %B %Y",
    "%d %b %Y",
    "%B %d %Y",
    "%B %d, %Y",
    "%b %d %Y",
    "%b %d, %Y",
];

/// Chrono-based normalizer. Values without an offset are read in `default_offset`.
#[derive(Debug, Clone)]
pub struct ChronoDateNormalizer {
    default_offset: FixedOffset,
}

impl Default for ChronoDateNormalizer {
    fn default() -> Self {
        Self { default_offset: Utc.fix() }
    }
}

impl ChronoDateNormalizer {
    /// Normalizer reading naive input at `minutes` east of UTC.
    pub fn with_offset_minutes(minutes: i32) -> Result<Self, ServiceError> {
        let default_offset = minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| ServiceError::validation(format!("invalid UTC offset: {minutes} minutes")))?;
        Ok(Self { default_offset })
    }

    fn parse(&self, value: &str) -> Option<DateTime<FixedOffset>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
            return Some(dt);
        }
        // offset without colon, e.g. 2026-10-17T22:00:00+0200
        if let Ok(dt) = DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%z") {
            return Some(dt);
        }
        let naive = DATETIME_FORMATS
            .iter()
            .find_map(|f| NaiveDateTime::parse_from_str(value, f).ok())
            .or_else(|| {
                DATE_FORMATS
                    .iter()
                    .find_map(|f| NaiveDate::parse_from_str(value, f).ok())
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
            })?;
        self.default_offset.from_local_datetime(&naive).single()
    }
}

impl DateNormalizer for ChronoDateNormalizer {
    fn normalize(&self, expr: &str) -> Result<String, ServiceError> {
        let value = expr.trim();
        self.parse(value)
            .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, false))
            .ok_or_else(|| {
                ServiceError::validation(format!(
                    "The expiration argument value '{value}' is not a valid date."
                ))
            })
    }
}
