//! Timestamp (de)serialization tolerant of offset-less capture output.
//!
//! Capture plugins on some platforms emit local, offset-less timestamps.
//! Offset-less values are interpreted as UTC so that every in-memory
//! comparison operates on one normalized timeline; values with an offset
//! are converted to UTC. Serialization always emits RFC 3339 with offset.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serializer};

use crate::error::Error;

pub fn serialize<S>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&ts.to_rfc3339())
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_normalized(&raw).map_err(serde::de::Error::custom)
}

/// Parse an RFC 3339 timestamp, treating offset-less values as UTC.
pub fn parse_normalized(raw: &str) -> Result<DateTime<Utc>, Error> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|_| Error::InvalidTimestamp(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn offset_aware_converts_to_utc() {
        let parsed = parse_normalized("2026-03-02T14:30:00+02:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2026, 3, 2, 12, 30, 0).unwrap());
    }

    #[test]
    fn naive_is_read_as_utc() {
        let parsed = parse_normalized("2026-03-02T12:30:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2026, 3, 2, 12, 30, 0).unwrap());

        let with_fraction = parse_normalized("2026-03-02T12:30:00.250").unwrap();
        assert_eq!(
            with_fraction,
            Utc.with_ymd_and_hms(2026, 3, 2, 12, 30, 0).unwrap()
                + chrono::Duration::milliseconds(250)
        );
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(parse_normalized("last tuesday").is_err());
    }
}
