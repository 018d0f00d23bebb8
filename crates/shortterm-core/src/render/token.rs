//! HTML token types.

/// An attribute on a start tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Lowercased attribute name.
    pub name: String,
    /// Value with character references decoded; `None` for bare attributes.
    pub value: Option<String>,
}

impl Attribute {
    /// Creates an attribute with a value.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
        }
    }
}

/// A lexical unit of an HTML document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    /// Character data, exactly as written (references not yet decoded).
    Text(&'a str),
    /// Content of a raw text element such as `<script>` or `<style>`.
    RawText(&'a str),
    /// Opening tag.
    StartTag {
        /// Lowercased tag name.
        name: String,
        /// Attributes in source order, first occurrence of each name only.
        attrs: Vec<Attribute>,
        /// Whether the tag was written as `<name/>`.
        self_closing: bool,
    },
    /// Closing tag.
    EndTag {
        /// Lowercased tag name.
        name: String,
    },
    /// Comment, doctype, processing instruction or CDATA section.
    Comment(&'a str),
}
