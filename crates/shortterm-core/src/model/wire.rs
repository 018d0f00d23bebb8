//! Serde helpers for loosely encoded wire fields.
//!
//! The service and older persisted records are not consistent about how
//! times are encoded: some carry RFC 3339 strings, some epoch milliseconds,
//! and some RFC 2822 dates. Everything is normalized to `DateTime<Utc>`.

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Millis(i64),
    Float(f64),
    Text(String),
}

/// Parses a textual timestamp (RFC 3339, RFC 2822 or epoch milliseconds).
#[must_use]
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt.with_timezone(&Utc));
    }
    text.parse::<i64>().ok().and_then(from_millis)
}

fn from_millis(millis: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis).single()
}

fn deserialize_any<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let parsed = match RawTimestamp::deserialize(deserializer)? {
        RawTimestamp::Millis(ms) => from_millis(ms),
        #[allow(clippy::cast_possible_truncation)] // Sub-millisecond precision is dropped
        RawTimestamp::Float(ms) if ms.is_finite() => from_millis(ms as i64),
        RawTimestamp::Float(_) => None,
        RawTimestamp::Text(text) => parse_timestamp(&text),
    };
    parsed.ok_or_else(|| serde::de::Error::custom("unrecognized timestamp"))
}

/// Written as RFC 3339, read from any supported encoding.
pub mod flexible {
    use super::{DateTime, Deserializer, SecondsFormat, Serializer, Utc};

    /// Serializes as an RFC 3339 string with millisecond precision.
    ///
    /// # Errors
    ///
    /// Propagates serializer errors.
    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    /// Deserializes from RFC 3339, RFC 2822 or epoch milliseconds.
    ///
    /// # Errors
    ///
    /// Fails if the value is not a recognizable timestamp.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        super::deserialize_any(deserializer)
    }
}

/// Written as epoch milliseconds, read from any supported encoding.
pub mod epoch_millis {
    use super::{DateTime, Deserializer, Serializer, Utc};

    /// Serializes as a number of milliseconds since the Unix epoch.
    ///
    /// # Errors
    ///
    /// Propagates serializer errors.
    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_i64(value.timestamp_millis())
    }

    /// Deserializes from RFC 3339, RFC 2822 or epoch milliseconds.
    ///
    /// # Errors
    ///
    /// Fails if the value is not a recognizable timestamp.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        super::deserialize_any(deserializer)
    }
}

/// Deserializes a string field that may be `null`.
///
/// # Errors
///
/// Fails if the value is neither a string nor `null`.
pub fn nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Debug, Serialize, Deserialize)]
    struct Probe {
        #[serde(with = "flexible")]
        at: DateTime<Utc>,
        #[serde(with = "epoch_millis")]
        created: DateTime<Utc>,
    }

    #[test]
    fn test_parse_rfc3339_and_rfc2822() {
        let a = parse_timestamp("2026-01-15T19:31:43Z").unwrap();
        let b = parse_timestamp("Thu, 15 Jan 2026 19:31:43 +0000").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_parse_millis_string() {
        let dt = parse_timestamp("1768505503000").unwrap();
        assert_eq!(dt.timestamp(), 1_768_505_503);
    }

    #[test]
    fn test_parse_garbage() {
        assert!(parse_timestamp("next tuesday").is_none());
    }

    #[test]
    fn test_accepts_mixed_encodings() {
        let probe: Probe =
            serde_json::from_str(r#"{"at":1768505503000,"created":"2026-01-15T19:31:43Z"}"#)
                .unwrap();
        assert_eq!(probe.at, probe.created);
    }

    #[test]
    fn test_serialized_forms() {
        let at = parse_timestamp("2026-01-15T19:31:43Z").unwrap();
        let json = serde_json::to_string(&Probe { at, created: at }).unwrap();
        assert_eq!(
            json,
            r#"{"at":"2026-01-15T19:31:43.000Z","created":1768505503000}"#
        );
    }
}
