//! Denylist sanitizer for untrusted message HTML.
//!
//! The markup is tokenized (never evaluated), filtered and re-serialized:
//!
//! - `<script>` elements are dropped together with their content
//! - `on*` event handler attributes and `style` attributes are dropped
//! - `src`/`href` values using the `javascript:` or `data:` scheme are dropped
//! - comments, doctypes and processing instructions are dropped
//! - text is re-escaped, so nothing that was text can turn into markup
//!
//! This is not a general-purpose HTML sanitizer. It does not defend against
//! CSS-based attacks, SVG-specific vectors, or URL attributes other than
//! `src` and `href`.

use super::format::escape_html;
use super::token::{Attribute, Token};
use super::tokenizer::Tokenizer;
use super::{entities, tokenizer};

/// Elements removed together with their content.
const SCRIPT_ELEMENTS: &[&str] = &["script"];

/// Attributes that load a resource or navigate.
const URL_ATTRIBUTES: &[&str] = &["src", "href"];

/// URL schemes that are never allowed in [`URL_ATTRIBUTES`].
const BLOCKED_SCHEMES: &[&str] = &["javascript:", "data:"];

/// Sanitizes an HTML fragment for insertion into a page.
#[must_use]
pub fn sanitize_html(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_script = false;
    let mut raw_parent_is_open = false;

    for token in Tokenizer::new(html) {
        match token {
            Token::StartTag {
                name,
                attrs,
                self_closing,
            } => {
                if SCRIPT_ELEMENTS.contains(&name.as_str()) {
                    in_script = true;
                    continue;
                }
                if !is_valid_tag_name(&name) {
                    continue;
                }
                raw_parent_is_open = tokenizer::is_raw_text_element(&name);
                write_start_tag(&mut out, &name, &attrs, self_closing);
            }
            Token::EndTag { name } => {
                if SCRIPT_ELEMENTS.contains(&name.as_str()) {
                    in_script = false;
                    continue;
                }
                raw_parent_is_open = false;
                if is_valid_tag_name(&name) {
                    out.push_str("</");
                    out.push_str(&name);
                    out.push('>');
                }
            }
            Token::RawText(text) => {
                if in_script || !raw_parent_is_open {
                    continue;
                }
                // Only `<` can end a raw text element early, or start markup
                // if the content is ever parsed in a different context.
                out.push_str(&text.replace('<', "&lt;"));
            }
            Token::Text(text) => {
                out.push_str(&escape_html(&entities::decode(text)));
            }
            Token::Comment(_) => {}
        }
    }

    out
}

/// Returns true if the attribute survives sanitization.
#[must_use]
pub fn is_allowed_attribute(attr: &Attribute) -> bool {
    if !is_valid_attribute_name(&attr.name) {
        return false;
    }
    if attr.name.starts_with("on") || attr.name == "style" {
        return false;
    }
    if URL_ATTRIBUTES.contains(&attr.name.as_str()) {
        return !attr.value.as_deref().is_some_and(is_blocked_url);
    }
    true
}

/// Returns true if `url` uses a blocked scheme.
///
/// Browsers ignore leading whitespace and control characters and drop tabs
/// and newlines anywhere in a URL, and schemes are case-insensitive, so the
/// check is made on the URL as a browser would read it.
#[must_use]
pub fn is_blocked_url(url: &str) -> bool {
    let normalized: String = url
        .trim_start_matches(|c: char| c <= ' ')
        .chars()
        .filter(|c| !matches!(c, '\t' | '\n' | '\r'))
        .take(16)
        .collect::<String>()
        .to_ascii_lowercase();
    BLOCKED_SCHEMES
        .iter()
        .any(|scheme| normalized.starts_with(scheme))
}

fn write_start_tag(out: &mut String, name: &str, attrs: &[Attribute], self_closing: bool) {
    out.push('<');
    out.push_str(name);
    for attr in attrs.iter().filter(|a| is_allowed_attribute(a)) {
        out.push(' ');
        out.push_str(&attr.name);
        if let Some(value) = &attr.value {
            out.push_str("=\"");
            out.push_str(&escape_html(value));
            out.push('"');
        }
    }
    out.push_str(if self_closing { " />" } else { ">" });
}

fn is_valid_tag_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == ':')
}

fn is_valid_attribute_name(name: &str) -> bool {
    !name.is_empty()
        && name.chars().all(|c| {
            !c.is_control() && !c.is_whitespace() && !matches!(c, '"' | '\'' | '<' | '>' | '/' | '=')
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_plain_markup_survives() {
        let html = r#"<div class="x"><p>Hello <b>world</b></p><br /></div>"#;
        assert_eq!(sanitize_html(html), html);
    }

    #[test]
    fn test_removes_script_element_and_content() {
        let out = sanitize_html("<p>a</p><script>alert('x')</script><p>b</p>");
        assert_eq!(out, "<p>a</p><p>b</p>");
    }

    #[test]
    fn test_removes_script_with_markup_inside() {
        let out = sanitize_html("<SCRIPT type=module>document.write('<p>x</p>')</SCRIPT>ok");
        assert_eq!(out, "ok");
    }

    #[test]
    fn test_removes_unclosed_script() {
        assert_eq!(sanitize_html("<p>x</p><script>steal()"), "<p>x</p>");
    }

    #[test]
    fn test_removes_event_handlers() {
        let out = sanitize_html(r#"<button onclick="evil()" OnMouseOver='x()' type="button">Hi</button>"#);
        assert_eq!(out, r#"<button type="button">Hi</button>"#);
    }

    #[test]
    fn test_removes_style_attribute() {
        let out = sanitize_html(r#"<p style="background:url(x)" class="c">t</p>"#);
        assert_eq!(out, r#"<p class="c">t</p>"#);
    }

    #[test]
    fn test_removes_dangerous_urls() {
        let out = sanitize_html(
            r#"<a href="javascript:alert(1)">a</a><img src="data:image/svg+xml;base64,AAA" alt="i">"#,
        );
        assert_eq!(out, r#"<a>a</a><img alt="i">"#);
    }

    #[test]
    fn test_keeps_https_urls_unchanged() {
        let html = r#"<a href="https://example.com/path?q=1">link</a><img src="https://cdn.example.com/x.png">"#;
        assert_eq!(sanitize_html(html), html);
    }

    #[test]
    fn test_query_string_ampersands_are_reescaped() {
        let out = sanitize_html(r#"<a href="https://x.y/?a=1&amp;b=2">x</a>"#);
        assert_eq!(out, r#"<a href="https://x.y/?a=1&amp;b=2">x</a>"#);
    }

    #[test]
    fn test_obfuscated_schemes_are_blocked() {
        for url in [
            "JavaScript:alert(1)",
            "  javascript:alert(1)",
            "\u{1}javascript:alert(1)",
            "java\tscript:alert(1)",
            "java\nscript:alert(1)",
            "DATA:text/html,x",
        ] {
            assert!(is_blocked_url(url), "{url:?} should be blocked");
        }
        assert!(!is_blocked_url("https://example.com/javascript:"));
        assert!(!is_blocked_url("/relative/data:x"));
    }

    #[test]
    fn test_entity_encoded_scheme_is_blocked() {
        let out = sanitize_html(r#"<a href="&#106;avascript&colon;alert(1)">x</a>"#);
        assert_eq!(out, "<a>x</a>");
    }

    #[test]
    fn test_drops_comments_and_doctype() {
        let out = sanitize_html("<!DOCTYPE html><!--[if IE]><script>x</script><![endif]--><p>t</p>");
        assert_eq!(out, "<p>t</p>");
    }

    #[test]
    fn test_text_is_reescaped() {
        assert_eq!(sanitize_html("1 < 2 &amp; 3 > 2"), "1 &lt; 2 &amp; 3 &gt; 2");
    }

    #[test]
    fn test_attribute_breakout_in_raw_text() {
        let out = sanitize_html(r#"<noscript><p title="</noscript><img src=x onerror=alert(1)>"></noscript>"#);
        assert_eq!(
            out,
            r#"<noscript>&lt;p title="</noscript><img src="x">&quot;&gt;</noscript>"#
        );
    }

    #[test]
    fn test_style_element_content_cannot_open_tags() {
        let out = sanitize_html("<svg><style><img src=x onerror=alert(1)></style></svg>");
        assert_eq!(
            out,
            "<svg><style>&lt;img src=x onerror=alert(1)></style></svg>"
        );
    }

    #[test]
    fn test_invalid_tag_names_are_dropped() {
        assert_eq!(sanitize_html("<scr<script>ipt>x"), "ipt&gt;x");
        assert_eq!(sanitize_html("<a\"b>t</a\"b>"), "t");
    }

    fn output_is_safe(out: &str) -> bool {
        Tokenizer::new(out).all(|token| match token {
            Token::StartTag { name, attrs, .. } => {
                name != "script"
                    && attrs.iter().all(|a| {
                        !a.name.starts_with("on")
                            && a.name != "style"
                            && !(URL_ATTRIBUTES.contains(&a.name.as_str())
                                && a.value.as_deref().is_some_and(is_blocked_url))
                    })
            }
            _ => true,
        })
    }

    fn html_fragment() -> impl Strategy<Value = String> {
        let piece = prop_oneof![
            Just("<script>".to_string()),
            Just("</script>".to_string()),
            Just("<p onclick=\"x()\">".to_string()),
            Just("<a href=\"javascript:alert(1)\">".to_string()),
            Just("<img src='data:x' onerror=y>".to_string()),
            Just("<div style=\"color:red\">".to_string()),
            Just("<!--".to_string()),
            Just("-->".to_string()),
            Just("<style>".to_string()),
            Just("</style>".to_string()),
            "[a-zA-Z<>/=\"' &;:#0-9\\t]{0,10}",
        ];
        prop::collection::vec(piece, 0..24).prop_map(|pieces| pieces.concat())
    }

    proptest! {
        #[test]
        fn prop_sanitized_fragments_are_safe(html in html_fragment()) {
            let out = sanitize_html(&html);
            prop_assert!(output_is_safe(&out), "unsafe output {out:?} for {html:?}");
        }

        #[test]
        fn prop_arbitrary_input_is_safe(html in any::<String>()) {
            let out = sanitize_html(&html);
            prop_assert!(output_is_safe(&out), "unsafe output {out:?} for {html:?}");
        }
    }
}
