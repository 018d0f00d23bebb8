//! Temporary address session model.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::wire;
use crate::{Error, Result};

/// The currently active temporary address and its lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// The temporary email address.
    pub address: String,
    /// When the address stops receiving mail.
    pub expires_at: DateTime<Utc>,
    /// When the address was generated.
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Creates a new session.
    #[must_use]
    pub fn new(
        address: impl Into<String>,
        expires_at: DateTime<Utc>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            address: address.into(),
            expires_at,
            created_at,
        }
    }

    /// Returns true if the session is still valid at `now`.
    #[must_use]
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }

    /// Returns the remaining lifetime, or `None` once expired.
    #[must_use]
    pub fn time_remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        if self.is_valid_at(now) {
            Some(self.expires_at - now)
        } else {
            None
        }
    }

    /// Encodes the session as the persisted JSON record.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_record(&self) -> Result<String> {
        let record = StoredSession {
            email: self.address.clone(),
            expires: self.expires_at,
            created: self.created_at,
        };
        Ok(serde_json::to_string(&record)?)
    }

    /// Decodes a persisted JSON record.
    ///
    /// Expiry is not checked here; a decoded session may already be stale.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StorageCorrupt`] if the record is unparsable, is
    /// missing a field, or carries an empty address.
    pub fn from_record(record: &str) -> Result<Self> {
        let stored: StoredSession =
            serde_json::from_str(record).map_err(|e| Error::StorageCorrupt(e.to_string()))?;
        if stored.email.trim().is_empty() {
            return Err(Error::StorageCorrupt("empty address".into()));
        }
        Ok(Self {
            address: stored.email,
            expires_at: stored.expires,
            created_at: stored.created,
        })
    }
}

/// On-disk shape of a session: `{ email, expires, created }`.
#[derive(Debug, Serialize, Deserialize)]
struct StoredSession {
    email: String,
    #[serde(with = "wire::flexible")]
    expires: DateTime<Utc>,
    #[serde(with = "wire::epoch_millis")]
    created: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn at(rfc3339: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(rfc3339)
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_validity_boundary() {
        let session = Session::new(
            "x@shorttermemail.com",
            at("2026-01-15T12:00:00Z"),
            at("2026-01-15T11:00:00Z"),
        );
        assert!(session.is_valid_at(at("2026-01-15T11:59:59Z")));
        assert!(!session.is_valid_at(at("2026-01-15T12:00:00Z")));
        assert_eq!(
            session.time_remaining(at("2026-01-15T11:59:00Z")),
            Some(Duration::seconds(60))
        );
        assert_eq!(session.time_remaining(at("2026-01-15T13:00:00Z")), None);
    }

    #[test]
    fn test_record_roundtrip() {
        let session = Session::new(
            "x@shorttermemail.com",
            at("2026-01-15T12:00:00Z"),
            at("2026-01-15T11:00:00Z"),
        );
        let record = session.to_record().unwrap();
        assert!(record.contains(r#""email":"x@shorttermemail.com""#));
        assert!(record.contains(r#""created":1768474800000"#));
        assert_eq!(Session::from_record(&record).unwrap(), session);
    }

    #[test]
    fn test_record_written_by_browser_client() {
        let record = r#"{"email":"x@shorttermemail.com","expires":"2026-01-15T12:00:00.000Z","created":1768474800000,"language":"ar"}"#;
        let session = Session::from_record(record).unwrap();
        assert_eq!(session.address, "x@shorttermemail.com");
        assert_eq!(session.created_at, at("2026-01-15T11:00:00Z"));
    }

    #[test]
    fn test_corrupt_records() {
        for record in [
            "not json",
            r#"{"email":"x@y.z"}"#,
            r#"{"email":"","expires":"2026-01-15T12:00:00Z","created":0}"#,
            r#"{"email":"x@y.z","expires":"soon","created":0}"#,
        ] {
            assert!(
                matches!(Session::from_record(record), Err(Error::StorageCorrupt(_))),
                "record should be rejected: {record}"
            );
        }
    }
}
