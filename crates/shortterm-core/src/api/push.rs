//! Event-driven message delivery.
//!
//! A push channel hands over single messages as they arrive, next to the
//! regular polling. No network transport is provided here; [`PushHub`] is
//! an in-process fan-out that a host feeds from whatever transport it has.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc;

use crate::model::Message;

/// Source of pushed messages for an address.
pub trait PushChannel: Send + Sync + 'static {
    /// Subscribes to messages for `address`.
    ///
    /// The receiver yields `None` once the channel stops delivering.
    fn subscribe(&self, address: &str) -> mpsc::UnboundedReceiver<Message>;
}

/// Polling-only operation: subscriptions end immediately.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPush;

impl PushChannel for NoPush {
    fn subscribe(&self, _address: &str) -> mpsc::UnboundedReceiver<Message> {
        let (_tx, rx) = mpsc::unbounded_channel();
        rx
    }
}

/// In-process push fan-out, shared between clones.
#[derive(Debug, Clone, Default)]
pub struct PushHub {
    subscribers: Arc<Mutex<HashMap<String, Vec<mpsc::UnboundedSender<Message>>>>>,
}

impl PushHub {
    /// Creates a hub with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delivers `message` to every live subscriber of `address`.
    ///
    /// Returns the number of subscribers reached. Closed subscriptions are
    /// dropped along the way.
    pub fn deliver(&self, address: &str, message: &Message) -> usize {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let Some(senders) = subscribers.get_mut(address) else {
            tracing::debug!(address, "push for address without subscribers");
            return 0;
        };

        senders.retain(|tx| tx.send(message.clone()).is_ok());
        let reached = senders.len();
        if senders.is_empty() {
            subscribers.remove(address);
        }
        reached
    }

    /// Number of live subscriptions for `address`.
    #[must_use]
    pub fn subscriber_count(&self, address: &str) -> usize {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(address)
            .map_or(0, |senders| senders.iter().filter(|tx| !tx.is_closed()).count())
    }
}

impl PushChannel for PushHub {
    fn subscribe(&self, address: &str) -> mpsc::UnboundedReceiver<Message> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        // Drop subscriptions whose receivers are gone, across all addresses.
        subscribers.retain(|_, senders| {
            senders.retain(|tx| !tx.is_closed());
            !senders.is_empty()
        });
        subscribers.entry(address.to_string()).or_default().push(tx);
        rx
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn message(id: &str) -> Message {
        Message::new(id, "a@x.y", "s", "b", Utc::now())
    }

    #[tokio::test]
    async fn test_no_push_ends_immediately() {
        let mut rx = NoPush.subscribe("a@b.c");
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_hub_routes_by_address() {
        let hub = PushHub::new();
        let mut mine = hub.subscribe("me@x.y");
        let mut other = hub.subscribe("you@x.y");

        assert_eq!(hub.deliver("me@x.y", &message("1")), 1);
        assert_eq!(mine.recv().await.unwrap().id.as_str(), "1");
        assert!(other.try_recv().is_err());
        assert_eq!(hub.deliver("nobody@x.y", &message("2")), 0);
    }

    #[test]
    fn test_delivery_wakes_waiting_subscriber() {
        use tokio_test::{assert_pending, assert_ready, task};

        let hub = PushHub::new();
        let mut rx = hub.subscribe("me@x.y");
        let mut recv = task::spawn(rx.recv());
        assert_pending!(recv.poll());

        hub.deliver("me@x.y", &message("1"));
        assert!(recv.is_woken());
        let received = assert_ready!(recv.poll());
        assert_eq!(received.unwrap().id.as_str(), "1");
    }

    #[test]
    fn test_subscribe_forgets_abandoned_addresses() {
        let hub = PushHub::new();
        let old = hub.subscribe("old@x.y");
        let _kept = hub.subscribe("kept@x.y");
        drop(old);

        let _new = hub.subscribe("new@x.y");
        let subscribers = hub.subscribers.lock().unwrap();
        let mut addresses: Vec<&str> = subscribers.keys().map(String::as_str).collect();
        addresses.sort_unstable();
        assert_eq!(addresses, ["kept@x.y", "new@x.y"]);
    }

    #[test]
    fn test_hub_prunes_closed_subscribers() {
        let hub = PushHub::new();
        let rx = hub.subscribe("me@x.y");
        let _live = hub.subscribe("me@x.y");
        assert_eq!(hub.subscriber_count("me@x.y"), 2);

        drop(rx);
        assert_eq!(hub.subscriber_count("me@x.y"), 1);
        assert_eq!(hub.deliver("me@x.y", &message("1")), 1);
    }
}
