//! `reqwest` client for the temporary email HTTP API.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::{Client, Method, StatusCode};
use serde::Deserialize;
use url::Url;

use super::{ApiStatus, GeneratedAddress, MailApi};
use crate::config::Config;
use crate::model::{Message, wire};
use crate::{Error, Result};

/// HTTP implementation of [`MailApi`].
#[derive(Debug, Clone)]
pub struct HttpApi {
    base_url: Url,
    http_client: Client,
}

impl HttpApi {
    /// Creates a client for the service at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot carry a path or the HTTP client
    /// cannot be built.
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self> {
        if base_url.cannot_be_a_base() {
            return Err(Error::Config(format!("not a usable base URL: {base_url}")));
        }
        let http_client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("shortterm/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            base_url,
            http_client,
        })
    }

    /// Creates a client from the configured base URL and timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.base_url()?, config.request_timeout())
    }

    /// Base URL of the service.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Builds an endpoint URL; each segment is percent-encoded on its own.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::Config(format!("not a usable base URL: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// URL of the inbox of `address`.
    fn inbox_url(&self, address: &str) -> Result<Url> {
        self.endpoint(&["api", "emails", address])
    }

    async fn send(&self, method: Method, url: Url) -> Result<(StatusCode, String)> {
        tracing::debug!(%method, %url, "API request");
        let response = self.http_client.request(method, url).send().await?;
        let status = response.status();
        let body = response.text().await?;
        Ok((status, body))
    }
}

impl MailApi for HttpApi {
    async fn generate_address(&self) -> Result<GeneratedAddress> {
        let url = self.endpoint(&["api", "generate-email"])?;
        let (status, body) = self.send(Method::POST, url).await?;
        parse_generated(status, &body)
    }

    async fn fetch_inbox(&self, address: &str) -> Result<Vec<Message>> {
        let url = self.inbox_url(address)?;
        let (status, body) = self.send(Method::GET, url).await?;
        parse_inbox(status, &body)
    }

    async fn clear_inbox(&self, address: &str) -> Result<()> {
        let url = self.inbox_url(address)?;
        let (status, body) = self.send(Method::DELETE, url).await?;
        parse_ack(status, &body)
    }

    async fn health(&self) -> ApiStatus {
        let result = match self.endpoint(&["api", "health"]) {
            Ok(url) => self.send(Method::GET, url).await,
            Err(e) => Err(e),
        };
        match result {
            Ok((_, body)) => parse_health(&body),
            Err(e) => {
                tracing::debug!(error = %e, "health check failed");
                ApiStatus::Offline
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(flatten)]
    payload: T,
}

#[derive(Debug, Deserialize)]
struct GeneratedPayload {
    email: Option<String>,
    expires: Option<Expiry>,
}

#[derive(Debug, Deserialize)]
struct Expiry(#[serde(with = "wire::flexible")] DateTime<Utc>);

#[derive(Debug, Deserialize)]
struct InboxPayload {
    #[serde(default)]
    emails: Option<Vec<Message>>,
}

#[derive(Debug, Deserialize)]
struct NoPayload {}

#[derive(Debug, Deserialize)]
struct Health {
    #[serde(default)]
    status: Option<String>,
}

/// Decodes an envelope, turning HTTP failures and `success: false` into
/// [`Error::Api`].
fn open_envelope<T>(status: StatusCode, body: &str, action: &str) -> Result<T>
where
    T: for<'de> Deserialize<'de>,
{
    let code = status.as_u16();
    let envelope = match serde_json::from_str::<Envelope<T>>(body) {
        Ok(envelope) => envelope,
        Err(e) if status.is_success() => {
            return Err(Error::api(code, format!("malformed response: {e}")));
        }
        Err(_) => return Err(Error::api(code, fallback_message(status, action))),
    };

    if !status.is_success() || !envelope.success {
        let message = envelope
            .error
            .filter(|e| !e.trim().is_empty())
            .unwrap_or_else(|| fallback_message(status, action));
        return Err(Error::api(code, message));
    }
    Ok(envelope.payload)
}

fn fallback_message(status: StatusCode, action: &str) -> String {
    match status.canonical_reason() {
        Some(reason) if !status.is_success() => format!("{action}: {reason}"),
        _ => action.to_string(),
    }
}

fn parse_generated(status: StatusCode, body: &str) -> Result<GeneratedAddress> {
    let payload: GeneratedPayload = open_envelope(status, body, "failed to generate address")?;
    match (payload.email, payload.expires) {
        (Some(address), Some(Expiry(expires_at))) if !address.trim().is_empty() => {
            Ok(GeneratedAddress {
                address,
                expires_at,
            })
        }
        _ => Err(Error::api(
            status.as_u16(),
            "response is missing the address or its expiry",
        )),
    }
}

fn parse_inbox(status: StatusCode, body: &str) -> Result<Vec<Message>> {
    let payload: InboxPayload = open_envelope(status, body, "failed to fetch messages")?;
    Ok(payload.emails.unwrap_or_default())
}

fn parse_ack(status: StatusCode, body: &str) -> Result<()> {
    open_envelope::<NoPayload>(status, body, "failed to clear inbox").map(|_| ())
}

fn parse_health(body: &str) -> ApiStatus {
    match serde_json::from_str::<Health>(body) {
        Ok(Health {
            status: Some(status),
        }) if status == "OK" => ApiStatus::Online,
        _ => ApiStatus::Offline,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn api(base: &str) -> HttpApi {
        HttpApi::new(Url::parse(base).unwrap(), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_endpoint_urls() {
        let client = api("https://api.shorttermemail.com");
        assert_eq!(
            client.endpoint(&["api", "generate-email"]).unwrap().as_str(),
            "https://api.shorttermemail.com/api/generate-email"
        );

        let nested = api("http://localhost:3001/v1/");
        assert_eq!(
            nested.endpoint(&["api", "health"]).unwrap().as_str(),
            "http://localhost:3001/v1/api/health"
        );
    }

    #[test]
    fn test_address_is_a_single_segment() {
        let client = api("https://api.shorttermemail.com");
        let url = client.inbox_url("a b/c?d#e@shorttermemail.com").unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.shorttermemail.com/api/emails/a%20b%2Fc%3Fd%23e@shorttermemail.com"
        );
        assert_eq!(url.path_segments().unwrap().count(), 3);
    }

    #[test]
    fn test_rejects_non_base_url() {
        let err = HttpApi::new(
            Url::parse("mailto:x@y.z").unwrap(),
            Duration::from_secs(1),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_parse_generated() {
        let body = r#"{"success":true,"email":"k7x@shorttermemail.com","expires":"2026-01-15T12:00:00.000Z"}"#;
        let generated = parse_generated(StatusCode::OK, body).unwrap();
        assert_eq!(generated.address, "k7x@shorttermemail.com");
        assert_eq!(generated.expires_at.to_rfc3339(), "2026-01-15T12:00:00+00:00");

        let millis = r#"{"success":true,"email":"a@b.c","expires":1768478400000}"#;
        let generated = parse_generated(StatusCode::OK, millis).unwrap();
        assert_eq!(generated.expires_at.to_rfc3339(), "2026-01-15T12:00:00+00:00");
    }

    #[test]
    fn test_parse_generated_failure() {
        let body = r#"{"success":false,"error":"rate limited"}"#;
        let err = parse_generated(StatusCode::OK, body).unwrap_err();
        assert_eq!(err.to_string(), "API error (200): rate limited");

        let err = parse_generated(StatusCode::OK, r#"{"success":true}"#).unwrap_err();
        assert!(matches!(err, Error::Api { status: 200, .. }));
    }

    #[test]
    fn test_parse_inbox() {
        let body = r#"{
            "success": true,
            "emails": [
                {"id": 7, "from": "a@x.y", "subject": "Hi", "body": "text",
                 "timestamp": "2026-01-15T11:30:00Z"},
                {"id": "m-2", "from": "b@x.y", "subject": null, "html": "<p>x</p>",
                 "timestamp": 1768476600000, "read": true}
            ]
        }"#;
        let messages = parse_inbox(StatusCode::OK, body).unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].id.as_str(), "7");
        assert_eq!(messages[1].subject, "");
        assert!(messages[1].read);

        let empty = parse_inbox(StatusCode::OK, r#"{"success":true}"#).unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_http_error_status() {
        let err = parse_inbox(StatusCode::NOT_FOUND, r#"{"success":false,"error":"Email not found"}"#)
            .unwrap_err();
        assert_eq!(err.to_string(), "API error (404): Email not found");

        let err = parse_inbox(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>").unwrap_err();
        assert_eq!(
            err.to_string(),
            "API error (502): failed to fetch messages: Bad Gateway"
        );
        assert!(err.is_transient());
    }

    #[test]
    fn test_malformed_success_body() {
        let err = parse_inbox(StatusCode::OK, "not json").unwrap_err();
        assert!(matches!(err, Error::Api { status: 200, .. }));
    }

    #[test]
    fn test_parse_ack() {
        parse_ack(StatusCode::OK, r#"{"success":true}"#).unwrap();
        assert!(parse_ack(StatusCode::OK, r#"{"success":false}"#).is_err());
    }

    #[test]
    fn test_parse_health() {
        assert_eq!(parse_health(r#"{"status":"OK"}"#), ApiStatus::Online);
        assert_eq!(parse_health(r#"{"status":"DEGRADED"}"#), ApiStatus::Offline);
        assert_eq!(parse_health("{}"), ApiStatus::Offline);
        assert_eq!(parse_health("oops"), ApiStatus::Offline);
    }
}
