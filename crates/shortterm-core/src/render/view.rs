//! Display-ready projections of the inbox and of single messages.
//!
//! Every string produced here is safe to place into markup as-is: plain
//! fields are escaped and HTML bodies are sanitized.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};

use super::format::{escape_html, format_relative, truncate_text};
use super::sanitize::sanitize_html;
use crate::model::{Inbox, Message, MessageId};

/// Default length of the preview snippet in the inbox list.
pub const DEFAULT_PREVIEW_LEN: usize = 120;

/// Product name shown in window titles.
const APP_NAME: &str = "ShortTermEmail";

/// One entry of the inbox list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboxRow {
    /// Message id (unescaped, for lookups).
    pub id: MessageId,
    /// Escaped subject.
    pub subject: String,
    /// Escaped sender.
    pub from: String,
    /// Escaped, truncated body preview.
    pub preview: String,
    /// Escaped relative date label.
    pub date: String,
    /// Whether the message is still unread.
    pub unread: bool,
}

impl InboxRow {
    /// Builds a row for `message`.
    #[must_use]
    pub fn new(message: &Message, now: DateTime<Utc>, preview_len: usize) -> Self {
        Self {
            id: message.id.clone(),
            subject: escape_html(&message.subject),
            from: escape_html(&message.from),
            preview: escape_html(&truncate_text(&message.body, preview_len)),
            date: escape_html(&format_relative(message.timestamp, now)),
            unread: !message.read,
        }
    }

    /// Renders the row as an HTML list item.
    #[must_use]
    pub fn to_html(&self) -> String {
        format!(
            r#"<div class="email-item{unread}" data-email-id="{id}"><div class="email-header"><div class="email-subject">{subject}</div><div class="email-date">{date}</div></div><div class="email-from">From: {from}</div><div class="email-preview">{preview}</div></div>"#,
            unread = if self.unread { " unread" } else { "" },
            id = escape_html(self.id.as_str()),
            subject = self.subject,
            date = self.date,
            from = self.from,
            preview = self.preview,
        )
    }
}

/// Builds the inbox list, newest first.
#[must_use]
pub fn render_inbox(inbox: &Inbox, now: DateTime<Utc>, preview_len: usize) -> Vec<InboxRow> {
    inbox
        .sorted()
        .into_iter()
        .map(|message| InboxRow::new(message, now, preview_len))
        .collect()
}

/// Renders the whole inbox list as HTML.
#[must_use]
pub fn render_inbox_html(inbox: &Inbox, now: DateTime<Utc>, preview_len: usize) -> String {
    render_inbox(inbox, now, preview_len)
        .iter()
        .map(InboxRow::to_html)
        .collect()
}

/// Displayable message body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    /// Literal text; must be displayed without markup interpretation.
    Text(String),
    /// Sanitized HTML markup.
    Html(String),
}

/// A message prepared for the message viewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    /// Message id (unescaped, for lookups).
    pub id: MessageId,
    /// Escaped subject.
    pub subject: String,
    /// Escaped sender.
    pub from: String,
    /// Escaped recipient.
    pub to: String,
    /// Escaped relative date label.
    pub date: String,
    /// Body content.
    pub body: Body,
}

impl RenderedMessage {
    /// Renders the message as an HTML fragment.
    ///
    /// A text body is escaped and wrapped in `<pre>`; an HTML body is
    /// inserted as sanitized.
    #[must_use]
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        let _ = write!(
            out,
            r#"<div class="email-view"><h2 class="email-subject">{}</h2><div class="email-meta"><div>From: {}</div><div>To: {}</div><div>{}</div></div><div class="email-body">"#,
            self.subject, self.from, self.to, self.date
        );
        match &self.body {
            Body::Text(text) => {
                let _ = write!(out, "<pre>{}</pre>", escape_html(text));
            }
            Body::Html(html) => out.push_str(html),
        }
        out.push_str("</div></div>");
        out
    }
}

/// Prepares a message for display.
///
/// Without an HTML body the plain text is kept literal; with one, the HTML
/// is sanitized.
#[must_use]
pub fn render_message(message: &Message, now: DateTime<Utc>) -> RenderedMessage {
    let body = message.html_body().map_or_else(
        || Body::Text(message.body.clone()),
        |html| Body::Html(sanitize_html(html)),
    );

    RenderedMessage {
        id: message.id.clone(),
        subject: escape_html(&message.subject),
        from: escape_html(&message.from),
        to: escape_html(&message.to),
        date: escape_html(&format_relative(message.timestamp, now)),
        body,
    }
}

/// Window title: `"(N) address - ShortTermEmail"` while there are unread messages.
#[must_use]
pub fn window_title(address: &str, unread: usize) -> String {
    if unread > 0 {
        format!("({unread}) {address} - {APP_NAME}")
    } else {
        format!("{address} - {APP_NAME}")
    }
}
