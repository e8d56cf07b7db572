//! Text-level edits on a single serialised XML element.
//!
//! Project files are never re-serialised. The engine takes an element's exact
//! source text, edits attributes inside its start tag, and splices the result
//! back, so every byte outside the edited attribute is left alone.

use std::ops::Range;

/// An attribute located inside a start tag.
#[derive(Debug, Clone, PartialEq, Eq)]
struct AttrSpan {
    name: String,
    /// From the whitespace preceding the name to the closing quote, inclusive.
    full: Range<usize>,
    /// The value between the quotes.
    value: Range<usize>,
}

/// Byte offset of the `>` that closes the start tag.
fn start_tag_end(element: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (i, c) in element.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"') | (None, '\'') => quote = Some(c),
            (None, '>') => return Some(i),
            _ => {}
        }
    }
    None
}

fn attributes(element: &str) -> Vec<AttrSpan> {
    let Some(end) = start_tag_end(element) else {
        return Vec::new();
    };
    let tag = &element[..end];
    let bytes = tag.as_bytes();
    let mut spans = Vec::new();

    // skip `<` and the element name
    let mut i = 1;
    while i < bytes.len() && !bytes[i].is_ascii_whitespace() && bytes[i] != b'/' {
        i += 1;
    }

    loop {
        let ws_start = i;
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        let name_start = i;
        while i < bytes.len() && !matches!(bytes[i], b'=' | b'/' | b'>') && !bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i == name_start {
            break;
        }
        let name = tag[name_start..i].to_string();
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= bytes.len() || bytes[i] != b'=' {
            break;
        }
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= bytes.len() || !matches!(bytes[i], b'"' | b'\'') {
            break;
        }
        let quote = bytes[i];
        let value_start = i + 1;
        let Some(len) = tag[value_start..].bytes().position(|b| b == quote) else {
            break;
        };
        i = value_start + len + 1;
        spans.push(AttrSpan {
            name,
            full: ws_start..i,
            value: value_start..value_start + len,
        });
    }

    spans
}

/// Escape a value for a double-quoted attribute.
pub fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('"', "&quot;")
}

/// Set `name` to `value` in the element's start tag.
///
/// An existing attribute keeps its position and quote style. A new one is
/// appended after the last attribute, before any `/>` or `>`.
pub fn set_attribute(element: &str, name: &str, value: &str) -> Option<String> {
    let end = start_tag_end(element)?;
    let escaped = escape_attr(value);

    if let Some(attr) = attributes(element).into_iter().find(|a| a.name == name) {
        let mut out = element.to_string();
        let escaped = if element.as_bytes()[attr.value.start - 1] == b'\'' {
            escaped.replace('\'', "&apos;")
        } else {
            escaped
        };
        out.replace_range(attr.value, &escaped);
        return Some(out);
    }

    let mut insert_at = end;
    if element[..end].ends_with('/') {
        insert_at -= 1;
    }
    insert_at = element[..insert_at].trim_end().len();

    let mut out = String::with_capacity(element.len() + name.len() + escaped.len() + 4);
    out.push_str(&element[..insert_at]);
    out.push_str(&format!(" {name}=\"{escaped}\""));
    out.push_str(&element[insert_at..]);
    Some(out)
}

/// Remove `name` and the whitespace before it from the start tag.
///
/// Returns `None` when the attribute is not present.
pub fn remove_attribute(element: &str, name: &str) -> Option<String> {
    let attr = attributes(element).into_iter().find(|a| a.name == name)?;
    let mut out = element.to_string();
    out.replace_range(attr.full, "");
    Some(out)
}

/// Serialise a self-closing element in the style `<Tag A="x" B="y" />`.
pub fn empty_element(tag: &str, attrs: &[(&str, &str)]) -> String {
    let mut out = format!("<{tag}");
    for (name, value) in attrs {
        out.push_str(&format!(" {name}=\"{}\"", escape_attr(value)));
    }
    out.push_str(" />");
    out
}

/// Leading whitespace of the line containing `offset`, if only whitespace precedes it.
pub fn line_indent(text: &str, offset: usize) -> Option<&str> {
    let line_start = text[..offset].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let prefix = &text[line_start..offset];
    prefix.chars().all(|c| c == ' ' || c == '\t').then_some(prefix)
}

/// Newline sequence used by `text`.
pub fn line_ending(text: &str) -> &'static str {
    if text.contains("\r\n") {
        "\r\n"
    } else {
        "\n"
    }
}
