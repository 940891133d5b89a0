//! Entity and whitespace normalization.
//!
//! Every attribute value and text node goes through the same ordered chain of
//! `&str -> String` steps before it reaches the canonicalizer, so that two
//! parses of equivalent markup agree on the encoded form of every value:
//!
//! 1. uppercase the digits of `&#xHH;` references
//! 2. rewrite `&#DD;` references as `&#xHH;`
//! 3. escape literal special characters
//! 4. decode numeric references, keeping the protected whitespace ones
//! 5. decode named entities, keeping the protected ones
//!
//! Attribute values additionally have raw CR, LF and TAB reduced to spaces by
//! the parser before step 1 ([`normalize_whitespace`]).

use std::borrow::Cow;

/// Where a value lives decides which characters are escaped and which
/// references survive decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Attribute,
    Text,
}

impl ValueKind {
    /// Canonical escape for a literal character, if it needs one
    fn escape(self, ch: char) -> Option<&'static str> {
        match (self, ch) {
            (_, '&') => Some("&amp;"),
            (_, '<') => Some("&lt;"),
            (_, '\r') => Some("&#xD;"),
            (ValueKind::Text, '>') => Some("&gt;"),
            (ValueKind::Attribute, '"') => Some("&quot;"),
            (ValueKind::Attribute, '\n') => Some("&#xA;"),
            (ValueKind::Attribute, '\t') => Some("&#x9;"),
            _ => None,
        }
    }

    /// Characters whose numeric reference is never decoded
    fn protected_characters(self) -> &'static [char] {
        match self {
            ValueKind::Attribute => &['\r', '\n', '\t'],
            ValueKind::Text => &['\r'],
        }
    }

    /// Named entities that stay encoded
    fn protected_entities(self) -> &'static [&'static str] {
        match self {
            ValueKind::Attribute => &["amp", "lt", "quot"],
            ValueKind::Text => &["amp", "lt", "gt"],
        }
    }
}

/// A character or entity reference recognized inside a value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reference<'a> {
    /// `&#xHH;`, holding the hex digits
    Hex(&'a str),
    /// `&#DD;`, holding the decimal digits
    Decimal(&'a str),
    /// One of the five predefined entities, holding its name
    Named(&'a str),
}

impl Reference<'_> {
    fn character(&self) -> Option<char> {
        match self {
            Reference::Hex(digits) => u32::from_str_radix(digits, 16).ok().and_then(char::from_u32),
            Reference::Decimal(digits) => digits.parse::<u32>().ok().and_then(char::from_u32),
            Reference::Named(name) => predefined_entity(name),
        }
    }
}

fn predefined_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => None,
    }
}

/// Recognize a reference at the start of `s`, returning it with its byte length
fn scan_reference(s: &str) -> Option<(Reference<'_>, usize)> {
    let rest = s.strip_prefix('&')?;
    let end = rest.find(';')?;
    let body = &rest[..end];

    let reference = if let Some(digits) = body.strip_prefix("#x") {
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        Reference::Hex(digits)
    } else if let Some(digits) = body.strip_prefix('#') {
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        Reference::Decimal(digits)
    } else {
        Reference::Named(body)
    };

    reference.character()?;
    Some((reference, end + 2))
}

/// Copy `s` to a new string, letting `rewrite` emit the replacement of every
/// recognized reference. Everything else is copied verbatim.
fn rewrite_references<F>(s: &str, mut rewrite: F) -> String
where
    F: FnMut(Reference<'_>, &str, &mut String),
{
    let mut out = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];
        match scan_reference(rest) {
            Some((reference, len)) => {
                rewrite(reference, &rest[..len], &mut out);
                rest = &rest[len..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn push_hex_reference(out: &mut String, ch: char) {
    out.push_str(&format!("&#x{:X};", u32::from(ch)));
}

/// Step 1: `&#xd;` becomes `&#xD;`
pub fn uppercase_hex_references(s: &str) -> String {
    rewrite_references(s, |reference, original, out| match reference {
        Reference::Hex(digits) => {
            out.push_str("&#x");
            out.push_str(&digits.to_ascii_uppercase());
            out.push(';');
        }
        _ => out.push_str(original),
    })
}

/// Step 2: `&#13;` becomes `&#xD;`
pub fn decimal_to_hex_references(s: &str) -> String {
    rewrite_references(s, |reference, original, out| match reference {
        Reference::Decimal(_) => match reference.character() {
            Some(ch) => push_hex_reference(out, ch),
            None => out.push_str(original),
        },
        _ => out.push_str(original),
    })
}

/// Step 3: escape literal special characters. An `&` that already starts a
/// recognized reference is left alone.
pub fn escape_special_characters(s: &str, kind: ValueKind) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(ch) = rest.chars().next() {
        if ch == '&' {
            if let Some((_, len)) = scan_reference(rest) {
                out.push_str(&rest[..len]);
                rest = &rest[len..];
                continue;
            }
        }
        match kind.escape(ch) {
            Some(escaped) => out.push_str(escaped),
            None => out.push(ch),
        }
        rest = &rest[ch.len_utf8()..];
    }
    out
}

/// Step 4: decode numeric references to literal characters.
///
/// Protected whitespace stays a reference in its canonical `&#xH;` spelling;
/// decoded characters that must be escaped come out in their escaped form.
pub fn decode_numeric_references(s: &str, kind: ValueKind) -> String {
    rewrite_references(s, |reference, original, out| {
        let ch = match reference {
            Reference::Hex(_) | Reference::Decimal(_) => reference.character(),
            Reference::Named(_) => None,
        };
        match ch {
            Some(ch) if kind.protected_characters().contains(&ch) => push_hex_reference(out, ch),
            Some(ch) => match kind.escape(ch) {
                Some(escaped) => out.push_str(escaped),
                None => out.push(ch),
            },
            None => out.push_str(original),
        }
    })
}

/// Step 5: decode named entities except the protected ones
pub fn decode_named_entities(s: &str, kind: ValueKind) -> String {
    rewrite_references(s, |reference, original, out| match reference {
        Reference::Named(name) if !kind.protected_entities().contains(&name) => {
            match reference.character() {
                Some(ch) => match kind.escape(ch) {
                    Some(escaped) => out.push_str(escaped),
                    None => out.push(ch),
                },
                None => out.push_str(original),
            }
        }
        _ => out.push_str(original),
    })
}

/// Run the full chain for a value of the given kind
pub fn process_value(s: &str, kind: ValueKind) -> String {
    let s = uppercase_hex_references(s);
    let s = decimal_to_hex_references(&s);
    let s = escape_special_characters(&s, kind);
    let s = decode_numeric_references(&s, kind);
    decode_named_entities(&s, kind)
}

pub fn process_attribute_value(s: &str) -> String {
    process_value(s, ValueKind::Attribute)
}

pub fn process_text_value(s: &str) -> String {
    process_value(s, ValueKind::Text)
}

/// Raw CR, LF and TAB in an attribute value become a single space each
pub fn normalize_whitespace(s: &str) -> Cow<'_, str> {
    if !s.contains(['\r', '\n', '\t']) {
        return Cow::Borrowed(s);
    }
    Cow::Owned(s.replace(['\r', '\n', '\t'], " "))
}

/// Normalize line endings to LF as an XML processor does before handing
/// text to the application
pub fn normalize_line_endings(s: &str) -> Cow<'_, str> {
    if !s.contains('\r') {
        return Cow::Borrowed(s);
    }
    Cow::Owned(s.replace("\r\n", "\n").replace('\r', "\n"))
}

/// Canonical encoding of a literal string (not markup) placed in text
pub fn encode_text(s: &str) -> String {
    encode_literal(s, ValueKind::Text)
}

/// Canonical encoding of a literal string (not markup) placed in an attribute
pub fn encode_attribute(s: &str) -> String {
    encode_literal(s, ValueKind::Attribute)
}

fn encode_literal(s: &str, kind: ValueKind) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match kind.escape(ch) {
            Some(escaped) => out.push_str(escaped),
            None => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_hex_references_are_uppercased() {
        assert_eq!(
            process_attribute_value("Thing &#xd; 1 &#xd;"),
            "Thing &#xD; 1 &#xD;"
        );
    }

    #[test]
    fn test_attribute_decimal_references_become_hex() {
        assert_eq!(
            process_attribute_value("Thing &#013; 1 &#013;"),
            "Thing &#xD; 1 &#xD;"
        );
    }

    #[test]
    fn test_attribute_special_characters_are_escaped() {
        assert_eq!(
            process_attribute_value("Thing\" &\n << &#09; 1 &#09; "),
            "Thing&quot; &amp;&#xA; &lt;&lt; &#x9; 1 &#x9; "
        );
        assert_eq!(process_attribute_value("Thing &#xf3; 1 &#xf3;"), "Thing ó 1 ó");
        assert_eq!(process_attribute_value("Thing &#x16f; 1 &#x16f;"), "Thing ů 1 ů");
        assert_eq!(process_attribute_value("Thing &#x1fA; 1 &#x1fA;"), "Thing Ǻ 1 Ǻ");
    }

    #[test]
    fn test_attribute_keeps_amp_lt_quot() {
        assert_eq!(
            process_attribute_value("Thing &amp; 1 &amp; &#xf3;"),
            "Thing &amp; 1 &amp; ó"
        );
        assert_eq!(
            process_attribute_value("Thing &lt; 1 &lt; &#xf3;"),
            "Thing &lt; 1 &lt; ó"
        );
        assert_eq!(
            process_attribute_value("Thing &quot; 1 &quot;&#xf3;"),
            "Thing &quot; 1 &quot;ó"
        );
    }

    #[test]
    fn test_attribute_decodes_space_references() {
        assert_eq!(
            process_attribute_value(" &#x20; Thing &#x20; &#x20; "),
            "   Thing     "
        );
    }

    #[test]
    fn test_attribute_decodes_gt_and_apos() {
        assert_eq!(process_attribute_value("a &gt; b &apos;c&apos;"), "a > b 'c'");
    }

    #[test]
    fn test_text_hex_and_decimal_references() {
        assert_eq!(process_text_value("Thing &#xd; 1 &#xd;"), "Thing &#xD; 1 &#xD;");
        assert_eq!(process_text_value("Thing &#013; 1 &#013;"), "Thing &#xD; 1 &#xD;");
    }

    #[test]
    fn test_text_keeps_amp_lt_gt_and_cr() {
        assert_eq!(
            process_text_value("Thing &amp; 1 &amp; &#xD; &#xf3;"),
            "Thing &amp; 1 &amp; &#xD; ó"
        );
        assert_eq!(
            process_text_value("Thing &lt; 1 &lt; &#xD; &#xf3;"),
            "Thing &lt; 1 &lt; &#xD; ó"
        );
        assert_eq!(
            process_text_value("Thing &gt; 1 &gt; &#xD;&#xf3;"),
            "Thing &gt; 1 &gt; &#xD;ó"
        );
    }

    #[test]
    fn test_text_line_feed_reference_is_decoded() {
        assert_eq!(
            process_text_value("First line&#x0d;&#10;Second line"),
            "First line&#xD;\nSecond line"
        );
    }

    #[test]
    fn test_text_quotes_are_decoded() {
        assert_eq!(process_text_value("&quot;a&quot; &apos;b&apos;"), "\"a\" 'b'");
    }

    #[test]
    fn test_decoded_specials_stay_escaped() {
        assert_eq!(process_text_value("&#x26;&#60;&#x3E;"), "&amp;&lt;&gt;");
        assert_eq!(process_attribute_value("&#x26;&#60;&#x22;"), "&amp;&lt;&quot;");
    }

    #[test]
    fn test_unrecognized_ampersand_is_escaped() {
        assert_eq!(process_text_value("R&D &unknown; &#xZZ;"), "R&amp;D &amp;unknown; &amp;#xZZ;");
    }

    #[test]
    fn test_pipeline_is_idempotent() {
        let inputs = [
            " &apos;   &#x20;&#13;&#xa;&#9;   &apos; ",
            "value>\"0\" &amp;&amp; value&lt;\"10\"",
            "Thing &#xf3; &#x1fA; &lt;",
        ];
        for input in inputs {
            let once = process_attribute_value(input);
            assert_eq!(process_attribute_value(&once), once);
            let once = process_text_value(input);
            assert_eq!(process_text_value(&once), once);
        }
    }

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("a\r\n\tb"), "a   b");
        assert!(matches!(normalize_whitespace("plain"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_normalize_line_endings() {
        assert_eq!(normalize_line_endings("hello\r\nworld\rtest"), "hello\nworld\ntest");
    }

    #[test]
    fn test_encode_literals() {
        assert_eq!(encode_text("a < b && c > d\r"), "a &lt; b &amp;&amp; c &gt; d&#xD;");
        assert_eq!(encode_attribute("\"&amp;\"\n"), "&quot;&amp;amp;&quot;&#xA;");
    }
}
