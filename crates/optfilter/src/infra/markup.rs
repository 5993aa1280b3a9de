//! Markup parsing and rendering for the HTML subset pages are written in.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::domain::dom::{Document, NodeId, NodeKind};
use crate::domain::errors::MarkupError;

/// Read and parse a markup file.
pub fn load(path: &Path) -> Result<Document> {
    let markup = fs::read_to_string(path)
        .with_context(|| format!("failed to read markup file: {}", path.display()))?;
    let document =
        parse(&markup).with_context(|| format!("failed to parse markup in {}", path.display()))?;
    tracing::debug!(
        path = %path.display(),
        nodes = document.descendants(document.root()).len(),
        "loaded document"
    );
    Ok(document)
}

/// Parse markup into a [`Document`].
///
/// The parser is tolerant in the ways hand-written pages need: stray end tags
/// are ignored, unclosed elements are closed at end of input, and an `option`
/// is implicitly closed by the next `option` or `optgroup`.
pub fn parse(markup: &str) -> Result<Document, MarkupError> {
    let mut document = Document::new();
    let mut stack = vec![document.root()];
    let bytes = markup.as_bytes();
    let mut i = 0usize;

    while i < bytes.len() {
        if starts_with_at(bytes, i, b"<!--") {
            let end = find_subslice(bytes, i + 4, b"-->")
                .ok_or(MarkupError::UnclosedComment { offset: i })?;
            i = end + 3;
            continue;
        }

        if starts_with_at(bytes, i, b"<!") {
            let end = find_byte(bytes, i + 2, b'>').ok_or(MarkupError::UnclosedTag { offset: i })?;
            let declaration = markup[i + 2..end].trim();
            if declaration
                .get(..7)
                .map(|head| head.eq_ignore_ascii_case("doctype"))
                .unwrap_or(false)
            {
                document.set_doctype(declaration);
            }
            i = end + 1;
            continue;
        }

        if starts_with_at(bytes, i, b"</") {
            let (tag, next) = parse_end_tag(markup, i)?;
            i = next;
            close_element(&document, &mut stack, &tag);
            continue;
        }

        if bytes[i] == b'<' && bytes.get(i + 1).is_some_and(u8::is_ascii_alphabetic) {
            let start = parse_start_tag(markup, i)?;
            i = start.next;

            if matches!(start.tag.as_str(), "option" | "optgroup") {
                close_open_option(&document, &mut stack);
            }

            let parent = current(&stack, document.root());
            let node = document.create_element(parent, start.tag.clone(), start.attrs);

            if is_raw_text_tag(&start.tag) && !start.self_closing {
                let close = find_end_tag_ci(bytes, i, start.tag.as_bytes()).unwrap_or(bytes.len());
                if close > i {
                    document.create_text(node, &markup[i..close]);
                }
                i = close;
                if i < bytes.len() {
                    let (_, next) = parse_end_tag(markup, i)?;
                    i = next;
                }
                continue;
            }

            if !start.self_closing && !is_void_tag(&start.tag) {
                stack.push(node);
            }
            continue;
        }

        let text_start = i;
        i += 1;
        while i < bytes.len() && bytes[i] != b'<' {
            i += 1;
        }
        let text = &markup[text_start..i];
        if !text.is_empty() {
            let parent = current(&stack, document.root());
            document.create_text(parent, decode_entities(text));
        }
    }

    Ok(document)
}

/// Render a document back to markup, reflecting its current state.
pub fn render(document: &Document) -> String {
    let mut out = String::new();
    if let Some(doctype) = document.doctype() {
        out.push_str("<!");
        out.push_str(doctype);
        out.push('>');
    }
    for child in document.children(document.root()) {
        render_node(document, *child, false, &mut out);
    }
    out
}

fn render_node(document: &Document, node: NodeId, raw: bool, out: &mut String) {
    match document.kind(node) {
        Some(NodeKind::Text(text)) => {
            if raw {
                out.push_str(text);
            } else {
                out.push_str(&escape_text(text));
            }
        }
        Some(NodeKind::Element(element)) => {
            out.push('<');
            out.push_str(element.tag());
            for (name, value) in element.attrs() {
                out.push(' ');
                out.push_str(name);
                if !value.is_empty() {
                    out.push_str("=\"");
                    out.push_str(&escape_attr(value));
                    out.push('"');
                }
            }
            out.push('>');
            if is_void_tag(element.tag()) {
                return;
            }
            let raw_children = is_raw_text_tag(element.tag());
            for child in document.children(node) {
                render_node(document, *child, raw_children, out);
            }
            out.push_str("</");
            out.push_str(element.tag());
            out.push('>');
        }
        Some(NodeKind::Document) | None => {}
    }
}

struct StartTag {
    tag: String,
    attrs: Vec<(String, String)>,
    self_closing: bool,
    next: usize,
}

fn parse_start_tag(markup: &str, at: usize) -> Result<StartTag, MarkupError> {
    let bytes = markup.as_bytes();
    let mut i = at + 1;

    let tag_start = i;
    while i < bytes.len() && is_tag_char(bytes[i]) {
        i += 1;
    }
    let tag = markup[tag_start..i].to_ascii_lowercase();
    if tag.is_empty() {
        return Err(MarkupError::EmptyTagName { offset: at });
    }

    let mut attrs: Vec<(String, String)> = Vec::new();
    let self_closing;

    loop {
        skip_ws(bytes, &mut i);
        if i >= bytes.len() {
            return Err(MarkupError::UnclosedTag { offset: at });
        }
        if bytes[i] == b'>' {
            self_closing = false;
            i += 1;
            break;
        }
        if bytes[i] == b'/' {
            if bytes.get(i + 1) == Some(&b'>') {
                self_closing = true;
                i += 2;
                break;
            }
            i += 1;
            continue;
        }

        let name_start = i;
        while i < bytes.len() && is_attr_name_char(bytes[i]) {
            i += 1;
        }
        if name_start == i {
            // Skip a byte the attribute grammar does not cover.
            i += 1;
            continue;
        }
        let name = markup[name_start..i].to_ascii_lowercase();

        skip_ws(bytes, &mut i);
        let value = if bytes.get(i) == Some(&b'=') {
            i += 1;
            skip_ws(bytes, &mut i);
            parse_attr_value(markup, &mut i)?
        } else {
            String::new()
        };

        if !attrs.iter().any(|(existing, _)| *existing == name) {
            attrs.push((name, value));
        }
    }

    Ok(StartTag {
        tag,
        attrs,
        self_closing,
        next: i,
    })
}

fn parse_attr_value(markup: &str, i: &mut usize) -> Result<String, MarkupError> {
    let bytes = markup.as_bytes();
    match bytes.get(*i) {
        Some(&quote) if quote == b'"' || quote == b'\'' => {
            let start = *i + 1;
            let end = find_byte(bytes, start, quote)
                .ok_or(MarkupError::UnclosedQuote { offset: *i })?;
            *i = end + 1;
            Ok(decode_entities(&markup[start..end]))
        }
        Some(_) => {
            let start = *i;
            while *i < bytes.len() && !bytes[*i].is_ascii_whitespace() && bytes[*i] != b'>' {
                *i += 1;
            }
            Ok(decode_entities(&markup[start..*i]))
        }
        None => Ok(String::new()),
    }
}

fn parse_end_tag(markup: &str, at: usize) -> Result<(String, usize), MarkupError> {
    let bytes = markup.as_bytes();
    let mut i = at + 2;
    skip_ws(bytes, &mut i);
    let tag_start = i;
    while i < bytes.len() && is_tag_char(bytes[i]) {
        i += 1;
    }
    let tag = markup[tag_start..i].to_ascii_lowercase();
    let end = find_byte(bytes, i, b'>').ok_or(MarkupError::UnclosedTag { offset: at })?;
    Ok((tag, end + 1))
}

fn current(stack: &[NodeId], root: NodeId) -> NodeId {
    stack.last().copied().unwrap_or(root)
}

fn close_element(document: &Document, stack: &mut Vec<NodeId>, tag: &str) {
    let Some(position) = stack
        .iter()
        .rposition(|node| document.tag_name(*node) == Some(tag))
    else {
        tracing::trace!(tag, "ignoring stray end tag");
        return;
    };
    if position > 0 {
        stack.truncate(position);
    }
}

fn close_open_option(document: &Document, stack: &mut Vec<NodeId>) {
    let top = match stack.last() {
        Some(top) if stack.len() > 1 => *top,
        _ => return,
    };
    if document.tag_name(top) == Some("option") {
        stack.pop();
    }
}

/// Decode the character references pages commonly use. Unknown references are
/// kept verbatim.
pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_owned();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = rest
            .find(';')
            .filter(|semi| *semi <= 10)
            .and_then(|semi| decode_reference(&rest[1..semi]).map(|ch| (ch, semi)));
        match decoded {
            Some((ch, semi)) => {
                out.push(ch);
                rest = &rest[semi + 1..];
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

fn decode_reference(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" | "#39" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let number = name.strip_prefix('#')?;
            let code = match number.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => number.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attr(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}

fn skip_ws(bytes: &[u8], i: &mut usize) {
    while *i < bytes.len() && bytes[*i].is_ascii_whitespace() {
        *i += 1;
    }
}

fn is_tag_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_'
}

fn is_attr_name_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b':' | b'.' | b'@')
}

fn is_void_tag(tag: &str) -> bool {
    matches!(
        tag,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}

fn is_raw_text_tag(tag: &str) -> bool {
    matches!(tag, "script" | "style")
}

fn starts_with_at(bytes: &[u8], at: usize, needle: &[u8]) -> bool {
    bytes
        .get(at..at + needle.len())
        .map(|slice| slice == needle)
        .unwrap_or(false)
}

fn find_byte(bytes: &[u8], from: usize, needle: u8) -> Option<usize> {
    bytes
        .get(from..)?
        .iter()
        .position(|b| *b == needle)
        .map(|pos| from + pos)
}

fn find_subslice(bytes: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    bytes
        .get(from..)?
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|pos| from + pos)
}

fn find_end_tag_ci(bytes: &[u8], from: usize, tag: &[u8]) -> Option<usize> {
    let mut i = from;
    while let Some(pos) = find_subslice(bytes, i, b"</") {
        let name_end = pos + 2 + tag.len();
        let name = bytes.get(pos + 2..name_end)?;
        let terminated = bytes
            .get(name_end)
            .is_none_or(|&b| b.is_ascii_whitespace() || matches!(b, b'/' | b'>'));
        if name.eq_ignore_ascii_case(tag) && terminated {
            return Some(pos);
        }
        i = pos + 2;
    }
    None
}
