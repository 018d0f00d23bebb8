//! Terminal formatting.
//!
//! Message fields are untrusted. On a terminal the risk is control
//! sequences rather than markup, so everything printed from a message goes
//! through [`terminal_safe`].

use chrono::{DateTime, Utc};
use shortterm_core::render::{format_relative, truncate_text};
use shortterm_core::{Message, Notice, NoticeLevel, Session};

/// Drops control characters (escape sequences included), keeping newlines
/// and tabs.
pub fn terminal_safe(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect()
}

/// Single-line form of an untrusted field.
fn one_line(text: &str) -> String {
    terminal_safe(text)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// One inbox line: marker, id, age, sender and subject, then a preview.
pub fn message_line(message: &Message, now: DateTime<Utc>, preview_len: usize) -> String {
    let marker = if message.read { ' ' } else { '*' };
    let subject = if message.subject.trim().is_empty() {
        "(no subject)".to_string()
    } else {
        one_line(&message.subject)
    };
    let mut line = format!(
        "{marker} [{}] {:>10}  {}  {}",
        one_line(message.id.as_str()),
        format_relative(message.timestamp, now),
        one_line(&message.from),
        subject,
    );
    let preview = truncate_text(&one_line(&message.body), preview_len);
    if !preview.is_empty() {
        line.push_str("\n      ");
        line.push_str(&preview);
    }
    line
}

/// Header block printed above a message body.
pub fn message_header(message: &Message, now: DateTime<Utc>) -> String {
    format!(
        "From:    {}\nTo:      {}\nSubject: {}\nDate:    {} ({})",
        one_line(&message.from),
        one_line(&message.to),
        one_line(&message.subject),
        message.timestamp.format("%Y-%m-%d %H:%M UTC"),
        format_relative(message.timestamp, now),
    )
}

/// Human description of how long a session has left.
pub fn expiry_line(session: &Session, now: DateTime<Utc>) -> String {
    match session.time_remaining(now) {
        Some(left) if left.num_hours() > 0 => format!(
            "expires in {}h {}m",
            left.num_hours(),
            left.num_minutes() % 60
        ),
        Some(left) if left.num_minutes() > 0 => format!("expires in {}m", left.num_minutes()),
        Some(_) => "expires in less than a minute".to_string(),
        None => "expired".to_string(),
    }
}

/// Prints queued notices to stderr.
pub fn print_notices(notices: &[Notice]) {
    for notice in notices {
        let tag = match notice.level {
            NoticeLevel::Info => "info",
            NoticeLevel::Success => "ok",
            NoticeLevel::Warning => "warning",
            NoticeLevel::Error => "error",
        };
        eprintln!("[{tag}] {}", notice.text);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_terminal_safe_strips_escapes() {
        assert_eq!(terminal_safe("a\u{1b}[31mred\u{7}\n\tb"), "a[31mred\n\tb");
    }

    #[test]
    fn test_message_line() {
        let now = Utc::now();
        let message = Message::new(
            "7",
            "eve@evil.test",
            "Hi\u{1b}]0;pwned\u{7}",
            "first line\nsecond   line",
            now - Duration::minutes(5),
        );
        let line = message_line(&message, now, 120);
        assert_eq!(
            line,
            "* [7]     5m ago  eve@evil.test  Hi]0;pwned\n      first line second line"
        );
    }

    #[test]
    fn test_empty_subject() {
        let now = Utc::now();
        let mut message = Message::new("1", "a@b.c", "  ", "", now);
        message.read = true;
        assert_eq!(
            message_line(&message, now, 120),
            "  [1]   Just now  a@b.c  (no subject)"
        );
    }

    #[test]
    fn test_expiry_line() {
        let now = Utc::now();
        let session = Session::new("a@b.c", now + Duration::minutes(90), now);
        assert_eq!(expiry_line(&session, now), "expires in 1h 30m");
        assert_eq!(
            expiry_line(&session, now + Duration::minutes(80)),
            "expires in 10m"
        );
        assert_eq!(expiry_line(&session, now + Duration::hours(2)), "expired");
    }
}
