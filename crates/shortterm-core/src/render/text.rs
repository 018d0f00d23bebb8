//! Plain-text rendering of HTML bodies for terminal display.

use super::entities;
use super::token::Token;
use super::tokenizer::Tokenizer;

/// Elements that start on a new line.
const BLOCK_ELEMENTS: &[&str] = &[
    "p", "div", "br", "tr", "li", "ul", "ol", "table", "h1", "h2", "h3", "h4", "h5", "h6",
    "blockquote", "pre", "hr", "section", "article", "header", "footer",
];

/// Converts HTML to readable plain text.
///
/// - tags are stripped; block elements become line breaks
/// - character references are decoded
/// - script and style content is dropped
/// - whitespace runs collapse to a single space, and at most one blank line
///   is kept between blocks
#[must_use]
pub fn html_to_text(html: &str) -> String {
    let mut result = String::with_capacity(html.len());

    for token in Tokenizer::new(html) {
        match token {
            Token::StartTag { name, .. } | Token::EndTag { name } => {
                if BLOCK_ELEMENTS.contains(&name.as_str()) && !result.is_empty() {
                    result.push('\n');
                }
            }
            Token::Text(text) => {
                for c in entities::decode(text).chars() {
                    if c.is_whitespace() {
                        if !result.is_empty() && !result.ends_with(' ') && !result.ends_with('\n')
                        {
                            result.push(' ');
                        }
                    } else {
                        result.push(c);
                    }
                }
            }
            Token::RawText(_) | Token::Comment(_) => {}
        }
    }

    collapse_blank_lines(&result)
}

/// Trims each line and keeps at most one empty line in a row.
fn collapse_blank_lines(text: &str) -> String {
    let mut cleaned = String::with_capacity(text.len());
    let mut blank_run = 0;

    for line in text.lines().map(str::trim) {
        if line.is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        cleaned.push_str(line);
        cleaned.push('\n');
    }

    cleaned.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocks_become_lines() {
        let text = html_to_text("<h1>Welcome</h1><p>First   paragraph.</p><p>Second<br>line</p>");
        assert_eq!(text, "Welcome\n\nFirst paragraph.\n\nSecond\nline");
    }

    #[test]
    fn test_entities_are_decoded() {
        assert_eq!(
            html_to_text("Tom &amp; Jerry &mdash; &#8220;hi&#8221;"),
            "Tom & Jerry \u{2014} \u{201C}hi\u{201D}"
        );
    }

    #[test]
    fn test_script_and_style_are_dropped() {
        let text = html_to_text("<style>p{color:red}</style><p>Visible</p><script>x()</script>");
        assert_eq!(text, "Visible");
    }

    #[test]
    fn test_inline_elements_do_not_break_lines() {
        assert_eq!(
            html_to_text("Click <a href=\"https://x.y\">here</a> <b>now</b>"),
            "Click here now"
        );
    }
}
