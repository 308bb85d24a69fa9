//! Datetime interval serialized as `"<start>/<end>"`.

use crate::ValidationError;
use chrono::{DateTime, FixedOffset, SecondsFormat};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Closed time interval with offset-aware bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatetimeInterval {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}

impl DatetimeInterval {
    pub fn new(
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    ) -> Result<Self, ValidationError> {
        if start > end {
            return Err(ValidationError::new(
                "interval start cannot be after interval end",
            ));
        }
        Ok(Self { start, end })
    }

    /// Build an interval from two RFC 3339 timestamps.
    pub fn from_bounds(start: &str, end: &str) -> Result<Self, ValidationError> {
        Self::new(parse_timestamp(start)?, parse_timestamp(end)?)
    }

    /// Parse `"<start>/<end>"`.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let mut parts = s.split('/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(start), Some(end), None) => Self::from_bounds(start.trim(), end.trim()),
            _ => Err(ValidationError::new(format!(
                "invalid datetime interval {:?}: expected \"<start>/<end>\"",
                s
            ))),
        }
    }
}

fn parse_timestamp(s: &str) -> Result<DateTime<FixedOffset>, ValidationError> {
    DateTime::parse_from_rfc3339(s)
        .map_err(|e| ValidationError::new(format!("invalid timestamp {:?}: {}", s, e)))
}

impl fmt::Display for DatetimeInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}",
            self.start.to_rfc3339_opts(SecondsFormat::AutoSi, false),
            self.end.to_rfc3339_opts(SecondsFormat::AutoSi, false)
        )
    }
}

impl FromStr for DatetimeInterval {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for DatetimeInterval {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DatetimeInterval {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_formats_interval() {
        let iv = DatetimeInterval::parse("2025-03-01T00:00:00+00:00/2025-03-08T12:30:00+02:00")
            .unwrap();
        assert_eq!(
            iv.to_string(),
            "2025-03-01T00:00:00+00:00/2025-03-08T12:30:00+02:00"
        );
        assert_eq!(DatetimeInterval::parse(&iv.to_string()).unwrap(), iv);
    }

    #[test]
    fn rejects_reversed_and_malformed_intervals() {
        assert!(DatetimeInterval::parse("2025-03-08T00:00:00Z/2025-03-01T00:00:00Z").is_err());
        assert!(DatetimeInterval::parse("2025-03-01T00:00:00Z").is_err());
        assert!(DatetimeInterval::parse("a/b/c").is_err());
        assert!(DatetimeInterval::parse("yesterday/today").is_err());
    }

    #[test]
    fn serde_uses_interval_string() {
        let iv: DatetimeInterval =
            serde_json::from_str("\"2025-03-01T00:00:00Z/2025-03-02T00:00:00Z\"").unwrap();
        let json = serde_json::to_string(&iv).unwrap();
        assert_eq!(json, "\"2025-03-01T00:00:00+00:00/2025-03-02T00:00:00+00:00\"");
    }
}
