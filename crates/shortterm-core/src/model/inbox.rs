//! In-memory inbox for the active session.

use super::{Message, MessageId};

/// Ordered collection of received messages.
///
/// A full refresh stores messages newest-first. Push deliveries are put in
/// front as they arrive; [`Inbox::sorted`] reapplies the timestamp order for
/// display, since the service does not promise in-order delivery.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inbox {
    messages: Vec<Message>,
}

impl Inbox {
    /// Creates an empty inbox.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            messages: Vec::new(),
        }
    }

    /// Replaces the whole inbox with a fresh snapshot.
    pub fn replace_all(&mut self, mut messages: Vec<Message>) {
        sort_newest_first(&mut messages);
        self.messages = messages;
    }

    /// Puts a single pushed message in front of the inbox.
    pub fn prepend(&mut self, message: Message) {
        self.messages.insert(0, message);
    }

    /// Removes every message.
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Marks a message as read. Returns false if it is not in the inbox.
    pub fn mark_read(&mut self, id: &MessageId) -> bool {
        self.messages
            .iter_mut()
            .find(|m| &m.id == id)
            .map(|m| m.read = true)
            .is_some()
    }

    /// Looks up a message by id.
    #[must_use]
    pub fn get(&self, id: &MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| &m.id == id)
    }

    /// Messages in stored order.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Messages ordered newest-first by timestamp.
    #[must_use]
    pub fn sorted(&self) -> Vec<&Message> {
        let mut sorted: Vec<&Message> = self.messages.iter().collect();
        sorted.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        sorted
    }

    /// Number of messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns true if there are no messages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Number of messages not yet opened.
    #[must_use]
    pub fn unread_count(&self) -> usize {
        self.messages.iter().filter(|m| !m.read).count()
    }
}

fn sort_newest_first(messages: &mut [Message]) {
    // Stable, so duplicates and equal timestamps keep arrival order.
    messages.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
}
