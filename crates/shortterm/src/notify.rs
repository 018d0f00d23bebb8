//! Desktop notifications for newly arrived mail.

use notify_rust::Notification;
use shortterm_core::Message;
use shortterm_core::render::{escape_html, html_to_text, truncate_text};

use crate::cli::terminal_safe;

const SUMMARY_LEN: usize = 80;
const BODY_LEN: usize = 160;

/// Raises one desktop notification per message.
#[derive(Debug, Default)]
pub struct DesktopNotifier;

impl DesktopNotifier {
    /// Creates a notifier.
    pub const fn new() -> Self {
        Self
    }

    /// Shows a notification; failures are logged and otherwise ignored.
    pub fn notify(&self, message: &Message) {
        let (summary, body) = notification_text(message);
        if let Err(e) = Notification::new()
            .appname("ShortTerm")
            .summary(&summary)
            .body(&body)
            .show()
        {
            tracing::warn!(error = %e, "desktop notification failed");
        }
    }
}

/// Summary and body for a message.
///
/// The body is escaped since notification servers may interpret a subset of
/// markup in it. A plain body is taken literally; an HTML-only body is
/// flattened to text first.
fn notification_text(message: &Message) -> (String, String) {
    let subject = if message.subject.trim().is_empty() {
        "(no subject)"
    } else {
        message.subject.trim()
    };
    let summary = truncate_text(
        &terminal_safe(&format!("{} - {subject}", message.from.trim())),
        SUMMARY_LEN,
    );

    let text = if message.body.trim().is_empty() {
        message.html_body().map(html_to_text).unwrap_or_default()
    } else {
        message.body.trim().to_string()
    };
    let body = escape_html(&truncate_text(&terminal_safe(&text), BODY_LEN));
    (summary, body)
}
