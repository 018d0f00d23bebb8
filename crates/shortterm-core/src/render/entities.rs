//! Character reference decoding.

/// Named references recognized by the decoder.
///
/// Not the full HTML table: the common typographic entities plus every
/// reference that can spell out a URL scheme (`&colon;`, `&Tab;`, ...).
const NAMED: &[(&str, &str)] = &[
    ("amp", "&"),
    ("lt", "<"),
    ("gt", ">"),
    ("quot", "\""),
    ("apos", "'"),
    ("nbsp", "\u{00A0}"),
    ("Tab", "\t"),
    ("NewLine", "\n"),
    ("colon", ":"),
    ("sol", "/"),
    ("lpar", "("),
    ("rpar", ")"),
    ("period", "."),
    ("comma", ","),
    ("semi", ";"),
    ("equals", "="),
    ("num", "#"),
    ("excl", "!"),
    ("mdash", "\u{2014}"),
    ("ndash", "\u{2013}"),
    ("hellip", "\u{2026}"),
    ("ldquo", "\u{201C}"),
    ("rdquo", "\u{201D}"),
    ("lsquo", "\u{2018}"),
    ("rsquo", "\u{2019}"),
    ("laquo", "\u{00AB}"),
    ("raquo", "\u{00BB}"),
    ("bull", "\u{2022}"),
    ("middot", "\u{00B7}"),
    ("copy", "\u{00A9}"),
    ("reg", "\u{00AE}"),
    ("trade", "\u{2122}"),
    ("euro", "\u{20AC}"),
    ("pound", "\u{00A3}"),
    ("yen", "\u{00A5}"),
    ("cent", "\u{00A2}"),
    ("deg", "\u{00B0}"),
    ("times", "\u{00D7}"),
    ("divide", "\u{00F7}"),
    ("zwnj", "\u{200C}"),
    ("zwj", "\u{200D}"),
    ("shy", "\u{00AD}"),
];

/// Legacy references browsers also accept without the trailing semicolon.
const LEGACY: &[&str] = &["amp", "lt", "gt", "quot", "nbsp", "copy", "reg"];

/// Decodes character references in `input`.
///
/// Numeric references are decoded with or without a trailing semicolon, the
/// way browsers do. Unknown named references are left as written.
#[must_use]
pub fn decode(input: &str) -> String {
    decode_with(input, false)
}

/// Decodes character references in an attribute value.
///
/// Same as [`decode`], except a legacy reference without semicolon that is
/// followed by an alphanumeric or `=` is kept literally (`?a=1&copy=2`).
#[must_use]
pub fn decode_attribute(input: &str) -> String {
    decode_with(input, true)
}

fn decode_with(input: &str, in_attribute: bool) -> String {
    if !input.contains('&') {
        return input.to_string();
    }

    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        match decode_reference(after, in_attribute) {
            Some((decoded, consumed)) => {
                out.push_str(&decoded);
                rest = &after[consumed..];
            }
            None => {
                out.push('&');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Decodes one reference following an `&`. Returns the text and bytes consumed.
fn decode_reference(s: &str, in_attribute: bool) -> Option<(String, usize)> {
    if let Some(num) = s.strip_prefix('#') {
        let (radix, digits_start) = match num.as_bytes().first() {
            Some(b'x' | b'X') => (16, 2),
            _ => (10, 1),
        };
        let digits: &str = {
            let tail = &s[digits_start..];
            let len = tail
                .bytes()
                .take_while(|b| (*b as char).is_digit(radix))
                .count();
            &tail[..len]
        };
        if digits.is_empty() {
            return None;
        }
        let mut consumed = digits_start + digits.len();
        if s[consumed..].starts_with(';') {
            consumed += 1;
        }
        let ch = u32::from_str_radix(digits, radix)
            .ok()
            .filter(|&code| code != 0)
            .and_then(char::from_u32)
            .unwrap_or('\u{FFFD}');
        return Some((ch.to_string(), consumed));
    }

    let name_len = s.bytes().take_while(u8::is_ascii_alphanumeric).count();
    if name_len == 0 {
        return None;
    }
    let name = &s[..name_len];
    let has_semicolon = s[name_len..].starts_with(';');

    if has_semicolon && let Some((_, value)) = NAMED.iter().find(|(n, _)| *n == name) {
        return Some(((*value).to_string(), name_len + 1));
    }

    // `&ampfoo` decodes as `&foo`: match the longest legacy prefix.
    LEGACY
        .iter()
        .filter(|legacy| name.starts_with(*legacy))
        .max_by_key(|legacy| legacy.len())
        .filter(|legacy| {
            let next = s.as_bytes().get(legacy.len()).copied();
            !(in_attribute && next.is_some_and(|b| b.is_ascii_alphanumeric() || b == b'='))
        })
        .and_then(|legacy| {
            NAMED
                .iter()
                .find(|(n, _)| n == legacy)
                .map(|(_, value)| ((*value).to_string(), legacy.len()))
        })
}
