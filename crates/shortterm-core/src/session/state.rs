//! Events and the state they are applied to.
//!
//! Producers (the refresh timer, the push forwarder) never touch state
//! directly. They send [`Event`]s tagged with the session generation they
//! were started for; the coordinator applies them in order and drops any
//! that belong to a superseded generation.

use std::collections::HashSet;

use crate::Error;
use crate::model::{Inbox, Message, MessageId};

/// Session generation a producer was started for.
pub type Generation = u64;

/// A change to the inbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboxUpdate {
    /// Full snapshot from a poll; replaces the inbox.
    ReplaceAll(Vec<Message>),
    /// Single pushed message; goes to the front.
    Prepend(Message),
}

/// Something a background producer observed.
#[derive(Debug)]
pub enum Event {
    /// New inbox content.
    Inbox {
        /// Producer generation.
        generation: Generation,
        /// The change to apply.
        update: InboxUpdate,
    },
    /// A scheduled refresh failed; the inbox is left as it was.
    RefreshFailed {
        /// Producer generation.
        generation: Generation,
        /// Why the refresh failed.
        error: Error,
    },
    /// The refresh timer found the session past its expiry.
    Expired {
        /// Producer generation.
        generation: Generation,
    },
}

impl Event {
    /// Generation of the producer that sent this event.
    #[must_use]
    pub const fn generation(&self) -> Generation {
        match self {
            Self::Inbox { generation, .. }
            | Self::RefreshFailed { generation, .. }
            | Self::Expired { generation } => *generation,
        }
    }
}

/// Severity of a [`Notice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoticeLevel {
    /// Informational.
    Info,
    /// An action completed.
    Success,
    /// Something needs attention but nothing failed.
    Warning,
    /// An action failed.
    Error,
}

/// Transient user-facing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Severity.
    pub level: NoticeLevel,
    /// Text to show.
    pub text: String,
}

impl Notice {
    /// Creates a notice.
    #[must_use]
    pub fn new(level: NoticeLevel, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
        }
    }
}

/// Inbox, generation counter and pending notices.
#[derive(Debug, Default)]
pub struct InboxState {
    inbox: Inbox,
    generation: Generation,
    notices: Vec<Notice>,
}

impl InboxState {
    /// Creates an empty state at generation zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The inbox.
    #[must_use]
    pub const fn inbox(&self) -> &Inbox {
        &self.inbox
    }

    /// Mutable access to the inbox.
    pub const fn inbox_mut(&mut self) -> &mut Inbox {
        &mut self.inbox
    }

    /// Current generation.
    #[must_use]
    pub const fn generation(&self) -> Generation {
        self.generation
    }

    /// Returns true if `generation` is the current one.
    #[must_use]
    pub const fn is_current(&self, generation: Generation) -> bool {
        self.generation == generation
    }

    /// Starts a new generation with an empty inbox.
    ///
    /// Events from earlier generations are ignored from now on.
    pub fn reset(&mut self) -> Generation {
        self.generation += 1;
        self.inbox.clear();
        self.generation
    }

    /// Applies an inbox update and returns the messages that were not
    /// present before.
    ///
    /// A snapshot keeps the local read mark of messages already opened.
    pub fn apply(&mut self, update: InboxUpdate) -> Vec<Message> {
        match update {
            InboxUpdate::ReplaceAll(mut messages) => {
                let arrived = {
                    let known: HashSet<&MessageId> =
                        self.inbox.messages().iter().map(|m| &m.id).collect();
                    let opened: HashSet<&MessageId> = self
                        .inbox
                        .messages()
                        .iter()
                        .filter(|m| m.read)
                        .map(|m| &m.id)
                        .collect();

                    let mut arrived = Vec::new();
                    for message in &mut messages {
                        if opened.contains(&message.id) {
                            message.read = true;
                        }
                        if !known.contains(&message.id) {
                            arrived.push(message.clone());
                        }
                    }
                    arrived
                };

                self.inbox.replace_all(messages);
                arrived
            }
            InboxUpdate::Prepend(message) => {
                let arrived = vec![message.clone()];
                self.inbox.prepend(message);
                arrived
            }
        }
    }

    /// Queues a notice.
    pub fn notify(&mut self, level: NoticeLevel, text: impl Into<String>) {
        let notice = Notice::new(level, text);
        tracing::debug!(level = ?notice.level, text = %notice.text, "notice");
        self.notices.push(notice);
    }

    /// Takes all pending notices, oldest first.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }
}
