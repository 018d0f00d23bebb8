//! Received message model.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::wire;

/// Identifier assigned to a message by the service.
///
/// The service is not consistent about sending ids as strings or numbers,
/// so both are accepted and normalized to a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    /// Creates an id from any string-like value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MessageId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl<'de> Deserialize<'de> for MessageId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Int(i64),
            Uint(u64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(s) => Self(s),
            RawId::Int(n) => Self(n.to_string()),
            RawId::Uint(n) => Self(n.to_string()),
        })
    }
}

/// A message received at the temporary address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Service-assigned identifier.
    pub id: MessageId,
    /// Sender as reported by the service.
    #[serde(default, deserialize_with = "wire::nullable_string")]
    pub from: String,
    /// Recipient as reported by the service.
    #[serde(default, deserialize_with = "wire::nullable_string")]
    pub to: String,
    /// Subject line.
    #[serde(default, deserialize_with = "wire::nullable_string")]
    pub subject: String,
    /// Plain text body.
    #[serde(default, deserialize_with = "wire::nullable_string")]
    pub body: String,
    /// Raw, untrusted HTML body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    /// When the message was received.
    #[serde(with = "wire::flexible")]
    pub timestamp: DateTime<Utc>,
    /// Whether the message has been opened locally.
    #[serde(default)]
    pub read: bool,
}

impl Message {
    /// Creates an unread plain-text message.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        from: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: MessageId::new(id),
            from: from.into(),
            to: String::new(),
            subject: subject.into(),
            body: body.into(),
            html: None,
            timestamp,
            read: false,
        }
    }

    /// Attaches an HTML body.
    #[must_use]
    pub fn with_html(mut self, html: impl Into<String>) -> Self {
        self.html = Some(html.into());
        self
    }

    /// Sets the recipient.
    #[must_use]
    pub fn with_to(mut self, to: impl Into<String>) -> Self {
        self.to = to.into();
        self
    }

    /// Returns the HTML body when it has any non-whitespace content.
    #[must_use]
    pub fn html_body(&self) -> Option<&str> {
        self.html.as_deref().filter(|html| !html.trim().is_empty())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_service_payload() {
        let json = r#"{
            "id": 42,
            "from": "Alice <alice@example.com>",
            "to": "x7k2@shorttermemail.com",
            "subject": "Hello",
            "body": "Plain body",
            "html": "<p>Plain body</p>",
            "timestamp": "2026-01-15T19:31:43Z",
            "read": true
        }"#;
        let msg: Message = serde_json::from_str(json).unwrap();
        assert_eq!(msg.id.as_str(), "42");
        assert_eq!(msg.from, "Alice <alice@example.com>");
        assert_eq!(msg.html_body(), Some("<p>Plain body</p>"));
        assert!(msg.read);
    }

    #[test]
    fn test_deserialize_sparse_payload() {
        let json = r#"{"id":"abc","subject":null,"timestamp":1768505503000}"#;
        let msg: Message = serde_json::from_str(json).unwrap();
        assert_eq!(msg.id, MessageId::from("abc"));
        assert_eq!(msg.subject, "");
        assert_eq!(msg.body, "");
        assert!(msg.html.is_none());
        assert!(!msg.read);
    }

    #[test]
    fn test_blank_html_is_ignored() {
        let msg = Message::new("1", "a@b.c", "s", "text", Utc::now()).with_html("  \n ");
        assert!(msg.html_body().is_none());
    }
}
