//! Value classification and JSON emission.
//!
//! The emitter walks the fully resolved flat list once, top to bottom,
//! writing one JSON line per element. Each scalar is classified into a
//! JSON token from its text, its literal flag and its explicit tag; the
//! logical line-break sentinel becomes the two-character escape `\n`
//! here and nowhere else.

use base64::prelude::*;
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};

use crate::error::{ParseError, Result};
use crate::flat::{FlatElement, Marker, Node, Tag, LINE_BREAK};
use crate::Options;

/// Render the flat list as indented JSON text.
pub fn emit_json(elements: &[FlatElement], opts: &Options) -> Result<String> {
    let width = opts.indent_width.min(8);
    let mut lines: Vec<String> = Vec::new();

    for e in elements {
        let pad = " ".repeat(e.indent * width);
        let key_part = match &e.key {
            Some(k) => format!("\"{}\": ", k),
            None => String::new(),
        };
        match &e.node {
            Node::Open(marker) => {
                if let Some(tag) = e.tag {
                    let ok = matches!(
                        (marker, tag),
                        (Marker::Map, Tag::Map) | (Marker::Seq, Tag::Seq)
                    );
                    if !ok {
                        return Err(ParseError::TagMismatch(tag.name().to_string(), e.line));
                    }
                }
                let bracket = match marker {
                    Marker::Map => '{',
                    Marker::Seq => '[',
                };
                lines.push(format!("{}{}{}", pad, key_part, bracket));
            }
            Node::Close(marker) => {
                if let Some(last) = lines.last_mut() {
                    if last.ends_with(',') {
                        last.pop();
                    }
                }
                let bracket = match marker {
                    Marker::Map => '}',
                    Marker::Seq => ']',
                };
                lines.push(format!("{}{},", pad, bracket));
            }
            Node::Scalar { text, literal } => {
                let token = json_token(text, *literal, e.tag, e.line, opts)?;
                lines.push(format!("{}{}{},", pad, key_part, token));
            }
        }
    }

    if let Some(last) = lines.last_mut() {
        if last.ends_with(',') {
            last.pop();
        }
    }
    Ok(lines.join("\n"))
}

// ----------------------------------------------------------------------
// Classification
// ----------------------------------------------------------------------

/// Compute the JSON token for a scalar from `(text, literal, tag)`.
fn json_token(
    text: &str,
    literal: bool,
    tag: Option<Tag>,
    line: usize,
    opts: &Options,
) -> Result<String> {
    if let Some(tag) = tag {
        return tagged_token(text, tag, line, opts);
    }
    if literal {
        return Ok(string_token(text));
    }
    // Inline empty containers, the one flow-mapping spelling accepted.
    if text == "{}" {
        return Ok("{}".to_string());
    }
    if is_null(text) {
        return Ok("null".to_string());
    }
    if let Some(b) = parse_bool(text, opts.yes_no_bool) {
        return Ok(if b { "true" } else { "false" }.to_string());
    }
    if let Some(n) = parse_integer(text) {
        return Ok(n.to_string());
    }
    if let Some(f) = parse_float(text) {
        return Ok(float_token(f));
    }
    if let Some(ts) = parse_timestamp(text) {
        return Ok(format!("\"{}\"", ts));
    }
    Ok(string_token(text))
}

/// An explicit tag overrides inference; a value the tag cannot hold is
/// an error. `!!float` accepts integers.
fn tagged_token(text: &str, tag: Tag, line: usize, opts: &Options) -> Result<String> {
    let mismatch = || ParseError::TagMismatch(tag.name().to_string(), line);
    match tag {
        Tag::Str => Ok(string_token(text)),
        Tag::Null => {
            if is_null(text) {
                Ok("null".to_string())
            } else {
                Err(mismatch())
            }
        }
        Tag::Bool => match parse_bool(text, opts.yes_no_bool) {
            Some(b) => Ok(if b { "true" } else { "false" }.to_string()),
            None => Err(mismatch()),
        },
        Tag::Int => match parse_integer(text) {
            Some(n) => Ok(n.to_string()),
            None => Err(mismatch()),
        },
        Tag::Float => {
            if let Some(n) = parse_integer(text) {
                return Ok(float_token(n as f64));
            }
            match parse_float(text) {
                Some(f) => Ok(float_token(f)),
                None => Err(mismatch()),
            }
        }
        Tag::Timestamp => match parse_timestamp(text) {
            Some(ts) => Ok(format!("\"{}\"", ts)),
            None => Err(mismatch()),
        },
        Tag::Binary => {
            let clean: String = text
                .chars()
                .filter(|c| !c.is_whitespace() && *c != LINE_BREAK)
                .collect();
            let bytes = BASE64_STANDARD.decode(&clean).map_err(|_| mismatch())?;
            let items: Vec<String> = bytes.iter().map(|b| b.to_string()).collect();
            Ok(format!("[{}]", items.join(", ")))
        }
        Tag::Map => {
            if text.is_empty() {
                Ok("{}".to_string())
            } else {
                Err(mismatch())
            }
        }
        Tag::Seq => {
            if text.is_empty() {
                Ok("[]".to_string())
            } else {
                Err(mismatch())
            }
        }
    }
}

fn string_token(text: &str) -> String {
    format!("\"{}\"", text.replace(LINE_BREAK, "\\n"))
}

fn float_token(f: f64) -> String {
    let s = format!("{}", f);
    if s.contains('.') || s.contains('e') || s.contains('E') {
        s
    } else {
        format!("{}.0", s)
    }
}

fn is_null(text: &str) -> bool {
    text.is_empty() || text.eq_ignore_ascii_case("null")
}

fn parse_bool(text: &str, yes_no: bool) -> Option<bool> {
    if text.eq_ignore_ascii_case("true") {
        return Some(true);
    }
    if text.eq_ignore_ascii_case("false") {
        return Some(false);
    }
    if yes_no {
        if text.eq_ignore_ascii_case("yes") {
            return Some(true);
        }
        if text.eq_ignore_ascii_case("no") {
            return Some(false);
        }
    }
    None
}

fn parse_integer(text: &str) -> Option<i64> {
    let digits = text
        .strip_prefix('-')
        .or_else(|| text.strip_prefix('+'))
        .unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse::<i64>().ok()
}

/// A float needs a decimal point or an exponent; anything `f64::from_str`
/// would accept beyond that (`inf`, `nan`, hex) stays a string.
fn parse_float(text: &str) -> Option<f64> {
    if !is_float_pattern(text) {
        return None;
    }
    text.parse::<f64>().ok()
}

fn is_float_pattern(text: &str) -> bool {
    let s = text
        .strip_prefix('-')
        .or_else(|| text.strip_prefix('+'))
        .unwrap_or(text);

    let (mantissa, exponent) = match s.find(['e', 'E']) {
        Some(pos) => (&s[..pos], Some(&s[pos + 1..])),
        None => (s, None),
    };

    if let Some(exp) = exponent {
        let exp = exp
            .strip_prefix('+')
            .or_else(|| exp.strip_prefix('-'))
            .unwrap_or(exp);
        if exp.is_empty() || !exp.bytes().all(|b| b.is_ascii_digit()) {
            return false;
        }
    }

    if exponent.is_some() && !mantissa.contains('.') {
        return !mantissa.is_empty() && mantissa.bytes().all(|b| b.is_ascii_digit());
    }

    let Some((before, after)) = mantissa.split_once('.') else {
        return false;
    };
    if before.is_empty() && after.is_empty() {
        return false;
    }
    before.bytes().all(|b| b.is_ascii_digit()) && after.bytes().all(|b| b.is_ascii_digit())
}

// ----------------------------------------------------------------------
// Timestamps
// ----------------------------------------------------------------------

/// Parse an ISO-8601 / `YYYY-MM-DD [HH:MM:SS[.f]][Z]` timestamp and
/// normalize it to UTC. Date-only input becomes midnight UTC.
fn parse_timestamp(text: &str) -> Option<String> {
    // Cheap shape gate before handing off to chrono.
    let b = text.as_bytes();
    if b.len() < 10 || b[4] != b'-' || !b[..4].iter().all(|c| c.is_ascii_digit()) {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(format_utc(dt.with_timezone(&Utc)));
    }

    let naive = text.strip_suffix('Z').unwrap_or(text).trim_end();
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(n) = NaiveDateTime::parse_from_str(naive, fmt) {
            return Some(format_utc(Utc.from_utc_datetime(&n)));
        }
    }

    if text.len() == 10 {
        if let Ok(d) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
            let midnight = d.and_hms_opt(0, 0, 0)?;
            return Some(format_utc(Utc.from_utc_datetime(&midnight)));
        }
    }
    None
}

fn format_utc(dt: DateTime<Utc>) -> String {
    if dt.timestamp_subsec_nanos() == 0 {
        dt.to_rfc3339_opts(SecondsFormat::Secs, true)
    } else {
        dt.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}
