//! Safe rendering of untrusted message content.
//!
//! Message bodies come from arbitrary senders. Before anything reaches a
//! page it goes through this module:
//!
//! - plain-text fields are escaped ([`escape_html`])
//! - HTML bodies are sanitized ([`sanitize_html`])
//! - bodies without HTML are shown as literal text ([`Body::Text`])

mod entities;
mod format;
mod sanitize;
mod text;
mod token;
mod tokenizer;
mod view;

pub use format::{escape_html, format_relative, truncate_text};
pub use sanitize::{is_allowed_attribute, is_blocked_url, sanitize_html};
pub use text::html_to_text;
pub use token::{Attribute, Token};
pub use tokenizer::Tokenizer;
pub use view::{
    Body, DEFAULT_PREVIEW_LEN, InboxRow, RenderedMessage, render_inbox, render_inbox_html,
    render_message, window_title,
};
