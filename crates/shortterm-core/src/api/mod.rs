//! Remote temporary email service.
//!
//! The session layer talks to the service only through [`MailApi`], so the
//! HTTP client can be swapped for a scripted fake in tests.

mod http;
mod push;

use std::future::Future;

use chrono::{DateTime, Utc};

pub use http::HttpApi;
pub use push::{NoPush, PushChannel, PushHub};

use crate::Result;
use crate::model::Message;

/// A freshly issued temporary address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedAddress {
    /// The temporary email address.
    pub address: String,
    /// When the address stops receiving mail.
    pub expires_at: DateTime<Utc>,
}

/// Reported availability of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiStatus {
    /// Health endpoint answered `"OK"`.
    Online,
    /// Health endpoint answered anything else, or could not be reached.
    Offline,
}

impl ApiStatus {
    /// Returns true if the service is reachable and healthy.
    #[must_use]
    pub const fn is_online(self) -> bool {
        matches!(self, Self::Online)
    }
}

/// Operations offered by the temporary email service.
///
/// Every call can be retried safely. Callers tolerate duplicate and
/// out-of-order messages.
pub trait MailApi: Send + Sync + 'static {
    /// Requests a new temporary address.
    fn generate_address(&self) -> impl Future<Output = Result<GeneratedAddress>> + Send;

    /// Fetches the full current inbox of `address`.
    fn fetch_inbox(&self, address: &str) -> impl Future<Output = Result<Vec<Message>>> + Send;

    /// Deletes every message of `address` on the service.
    fn clear_inbox(&self, address: &str) -> impl Future<Output = Result<()>> + Send;

    /// Checks service health. Never fails; an unreachable service is offline.
    fn health(&self) -> impl Future<Output = ApiStatus> + Send;
}
