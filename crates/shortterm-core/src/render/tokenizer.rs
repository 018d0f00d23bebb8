//! HTML tokenizer.
//!
//! Breaks untrusted markup into [`Token`]s without building a tree and
//! without ever evaluating anything. It follows the browser tokenization
//! rules closely enough that the sanitizer sees the same tags and
//! attributes a browser would:
//!
//! - tag and attribute names end at whitespace, `/` or `>`
//! - raw text elements (`<script>`, `<style>`, ...) swallow everything up to
//!   their matching end tag
//! - a tag cut off by the end of input is dropped
//! - repeated attributes keep their first value

use super::entities;
use super::token::{Attribute, Token};

/// Elements whose content is not parsed as markup.
const RAW_TEXT_ELEMENTS: &[&str] = &[
    "script", "style", "xmp", "iframe", "noembed", "noframes", "noscript", "textarea", "title",
    "plaintext",
];

/// Returns true if `name` is an element whose content is raw text.
#[must_use]
pub fn is_raw_text_element(name: &str) -> bool {
    RAW_TEXT_ELEMENTS.contains(&name)
}

/// HTML tokenizer state.
pub struct Tokenizer<'a> {
    input: &'a str,
    pos: usize,
    /// Set after a raw text start tag; the next token is its content.
    raw_text_end: Option<String>,
}

impl<'a> Tokenizer<'a> {
    /// Creates a tokenizer over `input`.
    #[must_use]
    pub const fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            raw_text_end: None,
        }
    }

    const fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.as_bytes().get(self.pos + offset).copied()
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(is_html_whitespace) {
            self.pos += 1;
        }
    }

    /// Advances past the next `>` (or to the end of input).
    fn skip_past_gt(&mut self) {
        match self.rest().find('>') {
            Some(idx) => self.pos += idx + 1,
            None => self.pos = self.input.len(),
        }
    }

    /// Reads the next token, or `None` at end of input.
    pub fn next_token(&mut self) -> Option<Token<'a>> {
        if let Some(end) = self.raw_text_end.take() {
            let content = self.read_raw_text(&end);
            if !content.is_empty() {
                return Some(Token::RawText(content));
            }
        }

        loop {
            if self.is_eof() {
                return None;
            }
            if self.peek() != Some(b'<') {
                return Some(self.read_text());
            }

            match self.peek_at(1) {
                Some(b'!') => return Some(self.read_markup_declaration()),
                Some(b'?') => return Some(self.read_bogus_comment(1)),
                Some(b'/') => match self.peek_at(2) {
                    Some(b) if b.is_ascii_alphabetic() => return Some(self.read_end_tag()),
                    Some(b'>') => {
                        // `</>` is dropped entirely.
                        self.pos += 3;
                    }
                    Some(_) => return Some(self.read_bogus_comment(2)),
                    None => return Some(self.read_literal_lt()),
                },
                Some(b) if b.is_ascii_alphabetic() => {
                    if let Some(token) = self.read_start_tag() {
                        return Some(token);
                    }
                    // Tag ran into end of input and is discarded.
                    self.pos = self.input.len();
                }
                _ => return Some(self.read_literal_lt()),
            }
        }
    }

    /// Reads character data up to the next `<` that could start markup.
    fn read_text(&mut self) -> Token<'a> {
        let start = self.pos;
        let bytes = self.input.as_bytes();
        let mut end = self.pos;
        while end < bytes.len() {
            if bytes[end] == b'<' && end > start {
                break;
            }
            end += 1;
        }
        self.pos = end;
        Token::Text(&self.input[start..end])
    }

    /// A `<` that does not open markup is plain text.
    fn read_literal_lt(&mut self) -> Token<'a> {
        let start = self.pos;
        self.pos += 1;
        let text = self.read_text_from(start);
        Token::Text(text)
    }

    fn read_text_from(&mut self, start: usize) -> &'a str {
        match self.rest().find('<') {
            Some(idx) => self.pos += idx,
            None => self.pos = self.input.len(),
        }
        &self.input[start..self.pos]
    }

    /// Handles `<!--`, `<!DOCTYPE`, `<![CDATA[` and other `<!` constructs.
    fn read_markup_declaration(&mut self) -> Token<'a> {
        if self.rest().starts_with("<!--") {
            let body_start = self.pos + 4;
            let body = &self.input[body_start..];
            // `<!-->` and `<!--->` close immediately.
            if body.starts_with('>') {
                self.pos = body_start + 1;
                return Token::Comment("");
            }
            if body.starts_with("->") {
                self.pos = body_start + 2;
                return Token::Comment("");
            }
            return match body.find("-->") {
                Some(idx) => {
                    self.pos = body_start + idx + 3;
                    Token::Comment(&self.input[body_start..body_start + idx])
                }
                None => {
                    self.pos = self.input.len();
                    Token::Comment(body)
                }
            };
        }
        self.read_bogus_comment(2)
    }

    /// Everything up to the next `>` becomes a comment.
    fn read_bogus_comment(&mut self, prefix_len: usize) -> Token<'a> {
        let body_start = (self.pos + prefix_len).min(self.input.len());
        self.pos = body_start;
        self.skip_past_gt();
        let body_end = if self.input[..self.pos].ends_with('>') && self.pos > body_start {
            self.pos - 1
        } else {
            self.pos
        };
        Token::Comment(&self.input[body_start..body_end])
    }

    /// Reads a tag or attribute name, lowercased.
    fn read_name(&mut self, stop_at_eq: bool) -> String {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if is_html_whitespace(b) || b == b'/' || b == b'>' || (stop_at_eq && b == b'=') {
                break;
            }
            self.pos += 1;
        }
        self.input[start..self.pos].to_ascii_lowercase()
    }

    fn read_end_tag(&mut self) -> Token<'a> {
        self.pos += 2;
        let name = self.read_name(false);
        // Attributes on end tags are ignored.
        self.skip_past_gt();
        Token::EndTag { name }
    }

    fn read_start_tag(&mut self) -> Option<Token<'a>> {
        self.pos += 1;
        let name = self.read_name(false);
        let mut attrs: Vec<Attribute> = Vec::new();
        let mut self_closing = false;

        loop {
            self.skip_whitespace();
            match self.peek() {
                None => return None,
                Some(b'>') => {
                    self.pos += 1;
                    break;
                }
                Some(b'/') => {
                    self.pos += 1;
                    self_closing = self.peek() == Some(b'>');
                }
                Some(_) => {
                    let attr = self.read_attribute()?;
                    if !attrs.iter().any(|a| a.name == attr.name) {
                        attrs.push(attr);
                    }
                }
            }
        }

        if is_raw_text_element(&name) {
            self.raw_text_end = Some(name.clone());
        }

        Some(Token::StartTag {
            name,
            attrs,
            self_closing,
        })
    }

    /// Reads one attribute. Returns `None` if input ends inside it.
    fn read_attribute(&mut self) -> Option<Attribute> {
        // A leading `=` belongs to the name.
        let name = if self.peek() == Some(b'=') {
            self.pos += 1;
            let mut name = String::from("=");
            name.push_str(&self.read_name(true));
            name
        } else {
            self.read_name(true)
        };

        self.skip_whitespace();
        if self.peek() != Some(b'=') {
            return Some(Attribute { name, value: None });
        }
        self.pos += 1;
        self.skip_whitespace();

        let raw = match self.peek()? {
            quote @ (b'"' | b'\'') => {
                self.pos += 1;
                let start = self.pos;
                let len = self.rest().find(quote as char)?;
                self.pos = start + len + 1;
                &self.input[start..start + len]
            }
            b'>' => "",
            _ => {
                let start = self.pos;
                while let Some(b) = self.peek() {
                    if is_html_whitespace(b) || b == b'>' {
                        break;
                    }
                    self.pos += 1;
                }
                &self.input[start..self.pos]
            }
        };

        Some(Attribute {
            name,
            value: Some(entities::decode_attribute(raw)),
        })
    }

    /// Consumes raw text up to `</name` followed by whitespace, `/` or `>`.
    fn read_raw_text(&mut self, name: &str) -> &'a str {
        let start = self.pos;
        let bytes = self.input.as_bytes();
        let mut search = start;

        while let Some(idx) = self.input[search..].find("</") {
            let tag_start = search + idx;
            let name_start = tag_start + 2;
            let name_end = name_start + name.len();
            let matches_name = self
                .input
                .get(name_start..name_end)
                .is_some_and(|candidate| candidate.eq_ignore_ascii_case(name));
            let terminated = bytes
                .get(name_end)
                .is_none_or(|&b| is_html_whitespace(b) || b == b'/' || b == b'>');
            if matches_name && terminated {
                self.pos = tag_start;
                return &self.input[start..tag_start];
            }
            search = tag_start + 2;
        }

        self.pos = self.input.len();
        &self.input[start..]
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token()
    }
}

const fn is_html_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | b'\x0C')
}
