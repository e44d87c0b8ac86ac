//! Encode JSON values as YAML text.
//!
//! A single tree walk over a `serde_json::Value`: objects become
//! `key: value` lines, arrays become `- ` items, nested containers
//! indent one level deeper. Strings that would re-parse as another
//! scalar kind are double-quoted; multi-line strings use block literals
//! and long single-line strings fold under `>-`.

use serde_json::Value;

use crate::Options;

/// Width beyond which a plain string is folded across lines.
const FOLD_WIDTH: usize = 80;

/// Render a JSON value as YAML text with a trailing newline.
pub fn encode_yaml(value: &Value, opts: &Options) -> String {
    let width = opts.indent_width.clamp(2, 8);
    let mut out = String::new();
    match value {
        Value::Object(map) if !map.is_empty() => write_object(&mut out, map, 0, width, opts),
        Value::Array(items) if !items.is_empty() => write_array(&mut out, items, 0, width, opts),
        Value::String(s) => write_root_string(&mut out, s, width, opts),
        _ => {
            out.push_str(&plain_token(value, opts));
            out.push('\n');
        }
    }
    out
}

fn write_object(
    out: &mut String,
    map: &serde_json::Map<String, Value>,
    indent: usize,
    width: usize,
    opts: &Options,
) {
    let pad = " ".repeat(indent);
    for (k, v) in map {
        out.push_str(&pad);
        out.push_str(&key_token(k));
        out.push(':');
        write_entry_value(out, v, indent, width, opts);
    }
}

/// Write the value part of a `key:` line, choosing between an inline
/// scalar, a block scalar, and a nested container.
fn write_entry_value(out: &mut String, v: &Value, indent: usize, width: usize, opts: &Options) {
    match v {
        Value::Object(map) if !map.is_empty() => {
            out.push('\n');
            write_object(out, map, indent + width, width, opts);
        }
        Value::Array(items) if !items.is_empty() => {
            out.push('\n');
            write_array(out, items, indent + width, width, opts);
        }
        Value::String(s) => {
            if let Some(style) = block_style(s) {
                out.push_str(" |");
                out.push_str(style);
                out.push('\n');
                write_block_lines(out, s, indent + width);
            } else if foldable(s, opts) {
                out.push_str(" >-\n");
                write_folded_lines(out, s, indent + width);
            } else {
                out.push(' ');
                out.push_str(&string_token(s, opts));
                out.push('\n');
            }
        }
        _ => {
            out.push(' ');
            out.push_str(&plain_token(v, opts));
            out.push('\n');
        }
    }
}

fn write_array(out: &mut String, items: &[Value], indent: usize, width: usize, opts: &Options) {
    let pad = " ".repeat(indent);
    for v in items {
        match v {
            Value::Object(map) if !map.is_empty() => {
                let mut nested = String::new();
                write_object(&mut nested, map, indent + 2, width, opts);
                splice_item(out, &pad, &nested, indent + 2);
            }
            Value::Array(nested_items) if !nested_items.is_empty() => {
                let mut nested = String::new();
                write_array(&mut nested, nested_items, indent + 2, width, opts);
                splice_item(out, &pad, &nested, indent + 2);
            }
            Value::String(s) => {
                // Block scalars are illegal after `- `, so multi-line and
                // long strings fall back to quoted form in items.
                out.push_str(&pad);
                out.push_str("- ");
                out.push_str(&string_token(s, opts));
                out.push('\n');
            }
            _ => {
                out.push_str(&pad);
                out.push_str("- ");
                out.push_str(&plain_token(v, opts));
                out.push('\n');
            }
        }
    }
}

/// Prefix nested container lines with the item marker: the first line
/// moves onto the `- ` line, the rest keep their deeper indent.
fn splice_item(out: &mut String, pad: &str, nested: &str, content_indent: usize) {
    for (i, line) in nested.lines().enumerate() {
        if i == 0 {
            out.push_str(pad);
            out.push_str("- ");
            out.push_str(&line[content_indent.min(line.len())..]);
        } else {
            out.push_str(line);
        }
        out.push('\n');
    }
}

fn write_root_string(out: &mut String, s: &str, width: usize, opts: &Options) {
    if let Some(style) = block_style(s) {
        out.push('|');
        out.push_str(style);
        out.push('\n');
        write_block_lines(out, s, width);
    } else {
        out.push_str(&string_token(s, opts));
        out.push('\n');
    }
}

// ----------------------------------------------------------------------
// Strings
// ----------------------------------------------------------------------

/// Pick the block scalar style for a multi-line string, or `None` when
/// the string must be quoted instead (single-line, odd whitespace, or
/// control characters a block cannot carry).
fn block_style(s: &str) -> Option<&'static str> {
    if !s.contains('\n') {
        return None;
    }
    if s.chars().any(|c| c != '\n' && (c as u32) < 0x20) {
        return None;
    }
    if s.contains("\u{0085}") || s.contains("\u{2028}") || s.contains("\u{2029}") {
        return None;
    }
    let lines: Vec<&str> = body_lines(s);
    if lines.iter().any(|l| l.ends_with(' ') || l.ends_with('\t')) {
        return None;
    }
    // A fully indented body would lose its margin on re-parse.
    if lines
        .iter()
        .filter(|l| !l.is_empty())
        .all(|l| l.starts_with(' '))
    {
        return None;
    }
    if s.ends_with("\n\n") {
        Some("+")
    } else if s.ends_with('\n') {
        Some("")
    } else {
        Some("-")
    }
}

/// The lines a block scalar body should carry, without the split
/// artifact of a single trailing newline.
fn body_lines(s: &str) -> Vec<&str> {
    let mut lines: Vec<&str> = s.split('\n').collect();
    if s.ends_with('\n') {
        lines.pop();
    }
    lines
}

fn write_block_lines(out: &mut String, s: &str, indent: usize) {
    let pad = " ".repeat(indent);
    for line in body_lines(s) {
        if line.is_empty() {
            out.push('\n');
        } else {
            out.push_str(&pad);
            out.push_str(line);
            out.push('\n');
        }
    }
}

/// Whether a long string can fold under `>-` without changing content:
/// single spaces only, no characters that need quoting.
fn foldable(s: &str, opts: &Options) -> bool {
    s.len() > FOLD_WIDTH
        && !needs_quote(s, opts)
        && !s.contains("  ")
        && s.split(' ').all(|w| !w.is_empty() && w.len() < FOLD_WIDTH)
}

fn write_folded_lines(out: &mut String, s: &str, indent: usize) {
    let pad = " ".repeat(indent);
    let mut line_len = 0usize;
    for (i, word) in s.split(' ').enumerate() {
        if i == 0 {
            out.push_str(&pad);
            out.push_str(word);
            line_len = word.len();
        } else if line_len + 1 + word.len() > FOLD_WIDTH {
            out.push('\n');
            out.push_str(&pad);
            out.push_str(word);
            line_len = word.len();
        } else {
            out.push(' ');
            out.push_str(word);
            line_len += 1 + word.len();
        }
    }
    out.push('\n');
}

fn string_token(s: &str, opts: &Options) -> String {
    if needs_quote(s, opts) {
        quote_string(s)
    } else {
        s.to_string()
    }
}

/// Whether a string must be double-quoted to survive a round-trip.
fn needs_quote(s: &str, opts: &Options) -> bool {
    if s.is_empty() {
        return true;
    }
    // Strings the classifier would coerce into another kind.
    if s.eq_ignore_ascii_case("null")
        || s.eq_ignore_ascii_case("true")
        || s.eq_ignore_ascii_case("false")
    {
        return true;
    }
    if opts.yes_no_bool && (s.eq_ignore_ascii_case("yes") || s.eq_ignore_ascii_case("no")) {
        return true;
    }
    if looks_numeric(s) || looks_like_timestamp(s) {
        return true;
    }
    let first = s.chars().next().unwrap_or(' ');
    if matches!(
        first,
        '!' | '&' | '*' | '-' | '?' | '#' | '@' | '`' | '"' | '\'' | '[' | ']' | '{' | '}' | '|'
            | '>' | ',' | '%' | ':' | ' '
    ) {
        return true;
    }
    if s.ends_with(' ') || s.ends_with(':') {
        return true;
    }
    if s.contains(": ") || s.contains(" #") {
        return true;
    }
    s.chars().any(|c| {
        (c as u32) < 0x20 || matches!(c, '\u{0085}' | '\u{2028}' | '\u{2029}')
    })
}

/// Loose numeric shape test; anything that might classify as a number
/// gets quoted.
fn looks_numeric(s: &str) -> bool {
    let t = s
        .strip_prefix('-')
        .or_else(|| s.strip_prefix('+'))
        .unwrap_or(s);
    !t.is_empty()
        && t.bytes().next().map(|b| b.is_ascii_digit() || b == b'.').unwrap_or(false)
        && t.bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-'))
}

fn looks_like_timestamp(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() >= 10 && b[..4].iter().all(|c| c.is_ascii_digit()) && b[4] == b'-'
}

/// JSON-style double-quoted escape.
fn quote_string(s: &str) -> String {
    let mut out = String::from("\"");
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\x08' => out.push_str("\\b"),
            '\x0c' => out.push_str("\\f"),
            '\u{0085}' => out.push_str("\\u0085"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            c if (c as u32) < 0x20 => {
                out.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Plain token for null, booleans, numbers, and empty containers.
fn plain_token(v: &Value, opts: &Options) -> String {
    match v {
        Value::Null => "null".to_string(),
        Value::Bool(b) => {
            if opts.yes_no_bool {
                if *b { "yes" } else { "no" }.to_string()
            } else {
                b.to_string()
            }
        }
        Value::Number(n) => n.to_string(),
        Value::String(s) => string_token(s, opts),
        Value::Array(items) if items.is_empty() => "[]".to_string(),
        Value::Object(map) if map.is_empty() => "{}".to_string(),
        // Non-empty containers are handled by the tree walk.
        _ => String::new(),
    }
}

/// Identifier-ish keys stay bare, everything else is quoted.
fn key_token(k: &str) -> String {
    let bare = !k.is_empty()
        && !k.starts_with('-')
        && k != "<<"
        && k.chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if bare {
        k.to_string()
    } else {
        quote_string(k)
    }
}
