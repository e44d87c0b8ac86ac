//! Tokenizer.
//!
//! Produces the next logical token (key or value scalar, flow delimiter,
//! or collection item marker) from the line source, starting at a
//! `(row, indent)` cursor. Inline splits — text after `:`, `,` or `]`
//! that belongs to the next token on the same physical line — are carried
//! across calls in the cursor's `remainder`.
//!
//! Multi-line scalars are consumed whole here: plain continuation lines,
//! quoted literals spanning lines, and block scalars (`|`, `>`) with
//! their chomping indicators. The folded text is JSON-escaped on the way
//! out, with [`LINE_BREAK`] standing in for logical newlines.

use crate::error::{ParseError, Result};
use crate::flat::{Tag, LINE_BREAK};
use crate::source::Source;

/// Token classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// A mapping key; the text after the `:` stays in the remainder.
    Key,
    /// A scalar value (plain, quoted, block, alias, or empty).
    Scalar,
    /// `[`
    FlowOpen,
    /// `]`
    FlowClose,
    /// `,`
    Comma,
    /// A `- ` collection item marker; the item content stays in the
    /// remainder at the marker's virtual indent.
    ItemMarker,
    /// A brace-wrapped `{key: value}` chunk inside a flow sequence;
    /// `text` holds the raw content between the braces.
    Pair,
}

/// One token, with its attachments.
#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    /// Scalar or key text, already JSON-escaped (raw for [`TokenKind::Pair`]).
    pub text: String,
    /// True when the text came from a quoted literal or block scalar.
    pub literal: bool,
    pub tag: Option<Tag>,
    /// Anchor name from a `&name` definition.
    pub anchor: Option<String>,
    /// Alias name from a `*name` reference.
    pub alias: Option<String>,
    /// 1-based source line the token started on.
    pub line: usize,
    /// Source indent of the line the token started on.
    pub indent: usize,
}

impl Token {
    fn new(kind: TokenKind, line: usize, indent: usize) -> Self {
        Self {
            kind,
            text: String::new(),
            literal: false,
            tag: None,
            anchor: None,
            alias: None,
            line,
            indent,
        }
    }
}

/// Non-consuming look-ahead used by the structural parser.
#[derive(Debug, Clone)]
pub struct Peek {
    /// First meaningful chunk of text (comments stripped, trimmed).
    pub text: String,
    pub indent: usize,
    pub line: usize,
}

impl Peek {
    /// Whether the look-ahead starts a collection item.
    pub fn is_item(&self) -> bool {
        is_item_text(&self.text)
    }

    /// Whether the look-ahead introduces a mapping key.
    pub fn is_key(&self) -> bool {
        find_key_split(&self.text).is_some()
    }
}

/// Block scalar chomping policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Chomp {
    Clip,
    Strip,
    Keep,
}

/// The tokenizer cursor over a [`Source`].
pub struct Tokenizer<'a> {
    src: &'a Source,
    /// Next unread row.
    next_row: usize,
    /// Source indent of the line the remainder came from. Item markers
    /// advance this by the marker width to re-indent item content.
    pub indent: usize,
    /// 1-based line of the remainder.
    pub line: usize,
    /// Unconsumed text from the current line.
    remainder: String,
}

impl<'a> Tokenizer<'a> {
    pub fn new(src: &'a Source) -> Self {
        Self {
            src,
            next_row: 0,
            indent: 0,
            line: 0,
            remainder: String::new(),
        }
    }

    /// Whether the current line still carries a value (comments ignored).
    pub fn has_inline_value(&self) -> bool {
        !strip_comment(&self.remainder).trim().is_empty()
    }

    /// Load the next non-blank, non-comment line into the remainder.
    fn refill(&mut self) -> bool {
        while self.next_row < self.src.len() {
            let row = self.next_row;
            self.next_row += 1;
            if self.src.is_blank(row) || self.src.is_comment(row) {
                continue;
            }
            self.indent = self.src.indent(row);
            self.line = row + 1;
            self.remainder = self.src.content(row).trim_end().to_string();
            return true;
        }
        false
    }

    /// Look at the next meaningful text without consuming anything.
    pub fn peek(&self) -> Option<Peek> {
        let rem = strip_comment(&self.remainder);
        let trimmed = rem.trim();
        if !trimmed.is_empty() {
            return Some(Peek {
                text: trimmed.to_string(),
                indent: self.indent,
                line: self.line,
            });
        }
        let mut row = self.next_row;
        while row < self.src.len() {
            if !self.src.is_blank(row) && !self.src.is_comment(row) {
                let content = strip_comment(self.src.content(row));
                return Some(Peek {
                    text: content.trim().to_string(),
                    indent: self.src.indent(row),
                    line: row + 1,
                });
            }
            row += 1;
        }
        None
    }

    // ------------------------------------------------------------------
    // Block-context tokens
    // ------------------------------------------------------------------

    /// Fetch the next token in block context.
    ///
    /// `base_indent` bounds multi-line constructs: plain scalars fold
    /// continuation lines deeper than it, block scalar bodies consist of
    /// the lines deeper than it. `after_item` marks that the token
    /// directly follows a `- ` marker, where block scalars are illegal.
    pub fn next_block(&mut self, base_indent: usize, after_item: bool) -> Result<Option<Token>> {
        if !self.has_inline_value() {
            self.remainder.clear();
            if !self.refill() {
                return Ok(None);
            }
        }

        let line0 = self.line;
        let indent0 = self.indent;
        let mut rest = strip_comment(&self.remainder).trim().to_string();
        self.remainder.clear();

        let mut tag: Option<Tag> = None;
        let mut anchor: Option<String> = None;

        // Tag and anchor prefixes; an alias consumes the token outright.
        loop {
            if rest.starts_with("!!") && tag.is_none() {
                let word_len = rest.find(' ').unwrap_or(rest.len());
                tag = Some(Tag::parse(&rest[..word_len], line0)?);
                rest = rest[word_len..].trim_start().to_string();
                continue;
            }
            if (rest.starts_with('&') || rest.starts_with('*')) && anchor.is_none() {
                let is_anchor = rest.starts_with('&');
                let (name, after) = scan_name(&rest[1..], line0)?;
                if is_anchor {
                    anchor = Some(name);
                    rest = after.trim_start().to_string();
                    continue;
                }
                if !after.trim().is_empty() {
                    return Err(ParseError::AliasWithValue(line0));
                }
                let mut t = Token::new(TokenKind::Scalar, line0, indent0);
                t.alias = Some(name);
                t.tag = tag;
                return Ok(Some(t));
            }
            break;
        }

        // Attachments with nothing after them: the anchored or tagged
        // value is null or a nested block, which the caller dispatches.
        if rest.is_empty() && (anchor.is_some() || tag.is_some()) {
            let mut t = Token::new(TokenKind::Scalar, line0, indent0);
            t.tag = tag;
            t.anchor = anchor;
            return Ok(Some(t));
        }

        // Inline flow opener.
        if let Some(after) = rest.strip_prefix('[') {
            self.remainder = after.to_string();
            let mut t = Token::new(TokenKind::FlowOpen, line0, indent0);
            t.tag = tag;
            t.anchor = anchor;
            return Ok(Some(t));
        }

        // Collection item marker. A bare `-` is `- ` plus an empty scalar.
        // When an anchor or tag is pending it belongs to the sequence the
        // caller is about to open, so the marker is left for the next call.
        if is_item_text(&rest) {
            if anchor.is_some() || tag.is_some() {
                self.remainder = rest;
                let mut t = Token::new(TokenKind::Scalar, line0, indent0);
                t.tag = tag;
                t.anchor = anchor;
                return Ok(Some(t));
            }
            self.remainder = if rest == "-" {
                String::new()
            } else {
                rest[2..].to_string()
            };
            self.indent = indent0 + 2;
            return Ok(Some(Token::new(TokenKind::ItemMarker, line0, indent0)));
        }

        // Block scalars.
        if rest.starts_with('|') || rest.starts_with('>') {
            if after_item {
                return Err(ParseError::BlockModifierOnCollectionItem(line0));
            }
            let folded = rest.starts_with('>');
            let chomp = match rest[1..].trim() {
                "" => Chomp::Clip,
                "+" => Chomp::Keep,
                "-" => Chomp::Strip,
                _ => return Err(ParseError::InvalidBlockModifier(line0)),
            };
            let body = self.collect_block_lines(base_indent);
            let mut t = Token::new(TokenKind::Scalar, line0, indent0);
            t.text = escape_plain(&fold_block(&body, folded, chomp));
            t.literal = true;
            t.tag = tag;
            t.anchor = anchor;
            return Ok(Some(t));
        }

        // Quoted literals.
        if rest.starts_with('"') || rest.starts_with('\'') {
            let (text, multiline, leftover) = self.scan_quoted(&rest, line0)?;
            let after = strip_comment(&leftover).trim().to_string();
            if after == ":" || after.starts_with(": ") {
                if multiline {
                    return Err(ParseError::MultiLineKey(line0));
                }
                if anchor.is_some() {
                    return Err(ParseError::AliasOnKey(line0));
                }
                self.remainder = after[1..].to_string();
                let mut t = Token::new(TokenKind::Key, line0, indent0);
                t.text = text;
                t.literal = true;
                return Ok(Some(t));
            }
            self.remainder = leftover;
            let mut t = Token::new(TokenKind::Scalar, line0, indent0);
            t.text = text;
            t.literal = true;
            t.tag = tag;
            t.anchor = anchor;
            return Ok(Some(t));
        }

        // Plain text: a key if an unquoted `: ` (or trailing `:`) splits
        // the line, otherwise a possibly multi-line plain scalar.
        if let Some(idx) = find_key_split(&rest) {
            if anchor.is_some() {
                return Err(ParseError::AliasOnKey(line0));
            }
            let key_raw = rest[..idx].trim_end();
            if key_raw.is_empty() {
                return Err(ParseError::EmptyKey(line0));
            }
            let first = key_raw.chars().next().unwrap_or(' ');
            if matches!(first, '[' | ',' | ']' | '-' | '&' | '*' | '|' | '>' | '+') {
                return Err(ParseError::InvalidInitialChar(first, line0));
            }
            self.remainder = rest[idx + 1..].to_string();
            let mut t = Token::new(TokenKind::Key, line0, indent0);
            t.text = escape_plain(key_raw);
            t.tag = tag;
            return Ok(Some(t));
        }

        let mut segments = vec![rest];
        self.collect_plain_continuation(base_indent, &mut segments);
        let mut t = Token::new(TokenKind::Scalar, line0, indent0);
        t.text = escape_plain(&fold_plain(&segments, false));
        t.tag = tag;
        t.anchor = anchor;
        Ok(Some(t))
    }

    /// Consume the body lines of a block scalar: everything deeper than
    /// `base_indent`, blanks included, with the common left margin removed.
    fn collect_block_lines(&mut self, base_indent: usize) -> Vec<String> {
        let mut raw: Vec<(usize, String)> = Vec::new();
        while self.next_row < self.src.len() {
            let row = self.next_row;
            if self.src.is_blank(row) {
                raw.push((0, String::new()));
                self.next_row += 1;
                continue;
            }
            let indent = self.src.indent(row);
            if indent <= base_indent {
                break;
            }
            // A `#` inside a block scalar body is content, not a comment.
            raw.push((indent, self.src.content(row).trim_end().to_string()));
            self.next_row += 1;
        }
        let margin = raw
            .iter()
            .filter(|(_, text)| !text.is_empty())
            .map(|(indent, _)| *indent)
            .min()
            .unwrap_or(0);
        raw.into_iter()
            .map(|(indent, text)| {
                if text.is_empty() {
                    String::new()
                } else {
                    format!("{}{}", " ".repeat(indent - margin), text)
                }
            })
            .collect()
    }

    /// Fold continuation lines of a plain scalar into `segments`.
    ///
    /// A continuation line is deeper than `base_indent` and does not
    /// introduce a key; blank lines fold to logical line breaks and
    /// comment lines are skipped.
    fn collect_plain_continuation(&mut self, base_indent: usize, segments: &mut Vec<String>) {
        while self.next_row < self.src.len() {
            let row = self.next_row;
            if self.src.is_blank(row) {
                segments.push(String::new());
                self.next_row += 1;
                continue;
            }
            if self.src.is_comment(row) {
                self.next_row += 1;
                continue;
            }
            if self.src.indent(row) <= base_indent {
                break;
            }
            let content = strip_comment(self.src.content(row)).trim().to_string();
            if find_key_split(&content).is_some() {
                break;
            }
            segments.push(content);
            self.next_row += 1;
        }
        // Trailing blank rows belong to whatever comes next.
        while segments.last().map(|s| s.is_empty()).unwrap_or(false) {
            segments.pop();
        }
    }

    /// Scan a quoted literal starting at `rest`. Returns the folded,
    /// escaped content, whether it spanned lines, and the leftover text
    /// after the closing quote.
    fn scan_quoted(&mut self, rest: &str, line0: usize) -> Result<(String, bool, String)> {
        let double = rest.starts_with('"');
        let quote = if double { '"' } else { '\'' };
        let mut segments: Vec<String> = Vec::new();
        let mut seg = String::new();
        let mut chars: Vec<char> = rest.chars().skip(1).collect();
        let mut i = 0usize;

        loop {
            if i >= chars.len() {
                // Line exhausted without a closing quote; accumulate and
                // continue on the next line.
                segments.push(std::mem::take(&mut seg));
                if !self.refill_quoted() {
                    return Err(ParseError::UnclosedLiteral(line0));
                }
                chars = self.remainder.chars().collect();
                self.remainder.clear();
                i = 0;
                continue;
            }
            let c = chars[i];
            if double && c == '\\' && i + 1 < chars.len() {
                // Keep the escape pair verbatim; the content of a
                // double-quoted literal is already in JSON escape form.
                seg.push('\\');
                seg.push(chars[i + 1]);
                i += 2;
                continue;
            }
            if !double && c == '\'' && chars.get(i + 1) == Some(&'\'') {
                seg.push('\'');
                i += 2;
                continue;
            }
            if c == quote {
                let leftover: String = chars[i + 1..].iter().collect();
                let multiline = !segments.is_empty();
                let folded = if multiline {
                    segments.push(seg);
                    fold_plain(&segments, double)
                } else {
                    // Single-line content is verbatim; folding only
                    // applies across line boundaries.
                    seg
                };
                let text = if double {
                    escape_double_quoted(&folded)
                } else {
                    escape_plain(&folded)
                };
                return Ok((text, multiline, leftover));
            }
            seg.push(c);
            i += 1;
        }
    }

    /// Load the next line for a quoted continuation. Blank lines are kept
    /// (they fold to line breaks); only end of input stops the scan.
    fn refill_quoted(&mut self) -> bool {
        if self.next_row >= self.src.len() {
            return false;
        }
        let row = self.next_row;
        self.next_row += 1;
        self.line = row + 1;
        self.remainder = self.src.content(row).trim_end().to_string();
        true
    }

    // ------------------------------------------------------------------
    // Flow-context tokens
    // ------------------------------------------------------------------

    /// Fetch the next token inside an inline flow sequence. Termination
    /// characters are the unquoted `,`, `]` and `[`. Returns `None` at
    /// end of input (the caller reports the unclosed array).
    pub fn next_flow(&mut self) -> Result<Option<Token>> {
        loop {
            if !self.has_inline_value() {
                self.remainder.clear();
                if !self.refill() {
                    return Ok(None);
                }
                continue;
            }
            break;
        }

        let line0 = self.line;
        let indent0 = self.indent;
        let mut rest = strip_comment(&self.remainder).trim().to_string();
        self.remainder.clear();

        let mut tag: Option<Tag> = None;
        let mut anchor: Option<String> = None;

        loop {
            if rest.starts_with("!!") && tag.is_none() {
                let word_len = rest.find(' ').unwrap_or(rest.len());
                tag = Some(Tag::parse(&rest[..word_len], line0)?);
                rest = rest[word_len..].trim_start().to_string();
                continue;
            }
            if (rest.starts_with('&') || rest.starts_with('*')) && anchor.is_none() {
                let is_anchor = rest.starts_with('&');
                let (name, after) = scan_name(&rest[1..], line0)?;
                if is_anchor {
                    anchor = Some(name);
                    rest = after.trim_start().to_string();
                    continue;
                }
                let after = after.trim_start();
                if !after.is_empty() && !after.starts_with(',') && !after.starts_with(']') {
                    return Err(ParseError::AliasWithValue(line0));
                }
                self.remainder = after.to_string();
                let mut t = Token::new(TokenKind::Scalar, line0, indent0);
                t.alias = Some(name);
                t.tag = tag;
                return Ok(Some(t));
            }
            break;
        }

        let first = rest.chars().next().unwrap_or(' ');
        match first {
            '[' | ']' | ',' => {
                let kind = match first {
                    '[' => TokenKind::FlowOpen,
                    ']' => TokenKind::FlowClose,
                    _ => TokenKind::Comma,
                };
                self.remainder = rest[1..].to_string();
                let mut t = Token::new(kind, line0, indent0);
                t.tag = tag;
                t.anchor = anchor;
                Ok(Some(t))
            }
            '"' | '\'' => {
                let (text, _, leftover) = self.scan_quoted(&rest, line0)?;
                self.remainder = leftover;
                let mut t = Token::new(TokenKind::Scalar, line0, indent0);
                t.text = text;
                t.literal = true;
                t.tag = tag;
                t.anchor = anchor;
                Ok(Some(t))
            }
            '{' => {
                // A one-entry mapping inside a flow sequence; it must
                // close on the same line.
                let end = find_closing_brace(&rest)
                    .ok_or(ParseError::InvalidArray(line0))?;
                self.remainder = rest[end + 1..].to_string();
                let mut t = Token::new(TokenKind::Pair, line0, indent0);
                t.text = rest[1..end].trim().to_string();
                Ok(Some(t))
            }
            _ => {
                let end = find_flow_terminator(&rest);
                let chunk = rest[..end].trim_end();
                self.remainder = rest[end..].to_string();
                // A bare `key: value` chunk is a one-entry mapping.
                if find_key_split(chunk).is_some() {
                    let mut t = Token::new(TokenKind::Pair, line0, indent0);
                    t.text = chunk.to_string();
                    return Ok(Some(t));
                }
                let mut t = Token::new(TokenKind::Scalar, line0, indent0);
                t.text = escape_plain(chunk);
                t.tag = tag;
                t.anchor = anchor;
                Ok(Some(t))
            }
        }
    }
}

// ----------------------------------------------------------------------
// Text helpers
// ----------------------------------------------------------------------

/// Whether a line of text starts a collection item.
pub fn is_item_text(text: &str) -> bool {
    text == "-" || text.starts_with("- ")
}

/// Position of the `:` that splits a key from its value: an unquoted
/// colon followed by a space or at end of line.
pub fn find_key_split(text: &str) -> Option<usize> {
    let chars: Vec<char> = text.chars().collect();
    let mut in_double = false;
    let mut in_single = false;
    let mut byte = 0usize;
    for (i, &c) in chars.iter().enumerate() {
        if c == '"' && !in_single {
            in_double = !in_double;
        } else if c == '\'' && !in_double {
            in_single = !in_single;
        } else if c == ':' && !in_double && !in_single {
            let next = chars.get(i + 1);
            if next.is_none() || next == Some(&' ') {
                return Some(byte);
            }
        }
        byte += c.len_utf8();
    }
    None
}

/// Strip an unquoted ` #` comment (or a leading `#`) from a line.
pub fn strip_comment(text: &str) -> &str {
    let mut in_double = false;
    let mut in_single = false;
    let mut prev_blank = true;
    for (i, c) in text.char_indices() {
        if c == '"' && !in_single {
            in_double = !in_double;
        } else if c == '\'' && !in_double {
            in_single = !in_single;
        } else if c == '#' && !in_double && !in_single && prev_blank {
            return text[..i].trim_end();
        }
        prev_blank = c == ' ';
    }
    text
}

/// Scan an anchor or alias identifier: letters, digits and underscores,
/// not starting with a digit. A leading space (or anything else invalid)
/// is an error.
pub(crate) fn scan_name(text: &str, line: usize) -> Result<(String, String)> {
    let mut chars = text.char_indices();
    match chars.next() {
        Some((_, c)) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return Err(ParseError::InvalidName(line)),
    }
    let end = text
        .char_indices()
        .find(|(_, c)| !c.is_ascii_alphanumeric() && *c != '_')
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    Ok((text[..end].to_string(), text[end..].to_string()))
}

/// Index of the unquoted `}` closing the brace at position 0.
fn find_closing_brace(text: &str) -> Option<usize> {
    let mut in_double = false;
    let mut in_single = false;
    for (i, c) in text.char_indices() {
        if c == '"' && !in_single {
            in_double = !in_double;
        } else if c == '\'' && !in_double {
            in_single = !in_single;
        } else if c == '}' && !in_double && !in_single {
            return Some(i);
        }
    }
    None
}

/// Index of the first unquoted `,`, `]` or `[` (or end of text).
fn find_flow_terminator(text: &str) -> usize {
    let mut in_double = false;
    let mut in_single = false;
    for (i, c) in text.char_indices() {
        if c == '"' && !in_single {
            in_double = !in_double;
        } else if c == '\'' && !in_double {
            in_single = !in_single;
        } else if (c == ',' || c == ']' || c == '[') && !in_double && !in_single {
            return i;
        }
    }
    text.len()
}

// ----------------------------------------------------------------------
// Folding
// ----------------------------------------------------------------------

/// Fold plain or quoted multi-line text: consecutive non-empty segments
/// join with a single space, blank runs become one logical line break.
/// Edge blanks survive only for double-quoted literals.
fn fold_plain(segments: &[String], keep_edge_blanks: bool) -> String {
    let slice: &[String] = if keep_edge_blanks {
        segments
    } else {
        let start = segments
            .iter()
            .position(|s| !s.trim().is_empty())
            .unwrap_or(segments.len());
        let end = segments
            .iter()
            .rposition(|s| !s.trim().is_empty())
            .map(|i| i + 1)
            .unwrap_or(start);
        &segments[start..end]
    };

    let mut out = String::new();
    let mut last_was_text = false;
    let mut last_was_break = false;
    for seg in slice {
        let t = seg.trim();
        if t.is_empty() {
            if !last_was_break {
                out.push(LINE_BREAK);
                last_was_break = true;
                last_was_text = false;
            }
        } else {
            if last_was_text {
                out.push(' ');
            }
            out.push_str(t);
            last_was_text = true;
            last_was_break = false;
        }
    }
    out
}

/// Fold a block scalar body. Lines arrive with the common left margin
/// removed and blanks as empty strings.
fn fold_block(lines: &[String], folded: bool, chomp: Chomp) -> String {
    let content_end = lines
        .iter()
        .rposition(|l| !l.is_empty())
        .map(|i| i + 1)
        .unwrap_or(0);
    let body = match chomp {
        Chomp::Keep => lines,
        _ => &lines[..content_end],
    };

    let mut out = String::new();
    if folded {
        // Non-indented lines join with spaces; indented lines and blanks
        // keep hard breaks so they stay visually separate.
        #[derive(PartialEq)]
        enum Last {
            None,
            Text,
            Indented,
            Blank,
        }
        let mut last = Last::None;
        for l in body {
            if l.is_empty() {
                if last != Last::Blank {
                    out.push(LINE_BREAK);
                }
                last = Last::Blank;
            } else if l.starts_with(' ') {
                if matches!(last, Last::Text | Last::Indented) {
                    out.push(LINE_BREAK);
                }
                out.push_str(l);
                last = Last::Indented;
            } else {
                match last {
                    Last::Text => out.push(' '),
                    Last::Indented => out.push(LINE_BREAK),
                    _ => {}
                }
                out.push_str(l);
                last = Last::Text;
            }
        }
    } else {
        for (i, l) in body.iter().enumerate() {
            if i > 0 {
                out.push(LINE_BREAK);
            }
            out.push_str(l);
        }
    }

    match chomp {
        Chomp::Strip => {
            while out.ends_with(LINE_BREAK) {
                out.pop();
            }
        }
        Chomp::Clip => {
            if !out.is_empty() && !out.ends_with(LINE_BREAK) {
                out.push(LINE_BREAK);
            }
        }
        Chomp::Keep => {
            out.push(LINE_BREAK);
        }
    }
    out
}

// ----------------------------------------------------------------------
// JSON escaping
// ----------------------------------------------------------------------

/// JSON-escape text from plain, single-quoted or block scalars. The
/// logical line break sentinel passes through untouched.
pub fn escape_plain(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            _ => escape_common(c, &mut out),
        }
    }
    out
}

/// JSON-escape text from a double-quoted literal. Backslash sequences
/// authored by the user are already in JSON escape form and are kept
/// verbatim; only raw control characters and Unicode separators need
/// escaping.
pub(crate) fn escape_double_quoted(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        escape_common(c, &mut out);
    }
    out
}

fn escape_common(c: char, out: &mut String) {
    match c {
        LINE_BREAK => out.push(LINE_BREAK),
        '\x08' => out.push_str("\\b"),
        '\t' => out.push_str("\\t"),
        '\n' => out.push_str("\\n"),
        '\x0c' => out.push_str("\\f"),
        '\r' => out.push_str("\\r"),
        '\u{0085}' => out.push_str("\\u0085"),
        '\u{2028}' => out.push_str("\\u2028"),
        '\u{2029}' => out.push_str("\\u2029"),
        c if (c as u32) < 0x20 => {
            out.push_str(&format!("\\u{:04x}", c as u32));
        }
        c => out.push(c),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segs(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_find_key_split() {
        assert_eq!(find_key_split("a: 1"), Some(1));
        assert_eq!(find_key_split("a:"), Some(1));
        assert_eq!(find_key_split("http://example.com"), None);
        assert_eq!(find_key_split("\"a: b\" x"), None);
        assert_eq!(find_key_split("\"a: b\": 1"), Some(6));
    }

    #[test]
    fn test_strip_comment() {
        assert_eq!(strip_comment("value # note"), "value");
        assert_eq!(strip_comment("# whole line"), "");
        assert_eq!(strip_comment("a#b"), "a#b");
        assert_eq!(strip_comment("\"a # b\" # c"), "\"a # b\"");
    }

    #[test]
    fn test_fold_plain_joins_lines() {
        assert_eq!(fold_plain(&segs(&["one", "two"]), false), "one two");
        assert_eq!(
            fold_plain(&segs(&["one", "", "two"]), false),
            format!("one{}two", LINE_BREAK)
        );
    }

    #[test]
    fn test_fold_plain_edge_blanks() {
        assert_eq!(fold_plain(&segs(&["", "x", ""]), false), "x");
        assert_eq!(
            fold_plain(&segs(&["", "x", ""]), true),
            format!("{}x{}", LINE_BREAK, LINE_BREAK)
        );
    }

    #[test]
    fn test_fold_block_literal_clip() {
        let body = segs(&["one", "two"]);
        assert_eq!(
            fold_block(&body, false, Chomp::Clip),
            format!("one{}two{}", LINE_BREAK, LINE_BREAK)
        );
    }

    #[test]
    fn test_fold_block_literal_chomp() {
        let body = segs(&["one", "", ""]);
        assert_eq!(fold_block(&body, false, Chomp::Strip), "one");
        assert_eq!(
            fold_block(&body, false, Chomp::Keep),
            format!("one{b}{b}{b}", b = LINE_BREAK)
        );
    }

    #[test]
    fn test_fold_block_folded() {
        let body = segs(&["one", "two"]);
        assert_eq!(
            fold_block(&body, true, Chomp::Clip),
            format!("one two{}", LINE_BREAK)
        );
        let indented = segs(&["one", "  kept", "two"]);
        assert_eq!(
            fold_block(&indented, true, Chomp::Clip),
            format!("one{b}  kept{b}two{b}", b = LINE_BREAK)
        );
    }

    #[test]
    fn test_escape_plain() {
        assert_eq!(escape_plain("a\"b\\c"), "a\\\"b\\\\c");
        assert_eq!(escape_plain("tab\there"), "tab\\there");
        assert_eq!(escape_plain("\u{2028}"), "\\u2028");
    }

    #[test]
    fn test_scan_name() {
        assert_eq!(
            scan_name("base rest", 1).unwrap(),
            ("base".to_string(), " rest".to_string())
        );
        assert!(scan_name(" x", 1).is_err());
        assert!(scan_name("1x", 1).is_err());
    }

    #[test]
    fn test_tokenize_key_value() {
        let src = Source::new("name: value");
        let mut tok = Tokenizer::new(&src);
        let key = tok.next_block(0, false).unwrap().unwrap();
        assert_eq!(key.kind, TokenKind::Key);
        assert_eq!(key.text, "name");
        let val = tok.next_block(0, false).unwrap().unwrap();
        assert_eq!(val.kind, TokenKind::Scalar);
        assert_eq!(val.text, "value");
    }

    #[test]
    fn test_tokenize_anchor_and_alias() {
        let src = Source::new("base: &x 42\nother: *x");
        let mut tok = Tokenizer::new(&src);
        let _key = tok.next_block(0, false).unwrap().unwrap();
        let val = tok.next_block(0, false).unwrap().unwrap();
        assert_eq!(val.anchor.as_deref(), Some("x"));
        assert_eq!(val.text, "42");
        let _key = tok.next_block(0, false).unwrap().unwrap();
        let alias = tok.next_block(0, false).unwrap().unwrap();
        assert_eq!(alias.alias.as_deref(), Some("x"));
    }

    #[test]
    fn test_tokenize_item_marker() {
        let src = Source::new("- one");
        let mut tok = Tokenizer::new(&src);
        let marker = tok.next_block(0, false).unwrap().unwrap();
        assert_eq!(marker.kind, TokenKind::ItemMarker);
        assert_eq!(tok.indent, 2);
        let item = tok.next_block(0, true).unwrap().unwrap();
        assert_eq!(item.text, "one");
    }

    #[test]
    fn test_tokenize_multiline_plain() {
        let src = Source::new("key:\n  one\n  two\nnext: 1");
        let mut tok = Tokenizer::new(&src);
        let _key = tok.next_block(0, false).unwrap().unwrap();
        let val = tok.next_block(0, false).unwrap().unwrap();
        assert_eq!(val.text, "one two");
        let next = tok.next_block(0, false).unwrap().unwrap();
        assert_eq!(next.kind, TokenKind::Key);
        assert_eq!(next.text, "next");
    }

    #[test]
    fn test_tokenize_block_scalar() {
        let src = Source::new("a: |\n  one\n  two");
        let mut tok = Tokenizer::new(&src);
        let _key = tok.next_block(0, false).unwrap().unwrap();
        let val = tok.next_block(0, false).unwrap().unwrap();
        assert!(val.literal);
        assert_eq!(val.text, format!("one{b}two{b}", b = LINE_BREAK));
    }

    #[test]
    fn test_tokenize_quoted_key_and_value() {
        let src = Source::new("\"key name\": 'it''s'");
        let mut tok = Tokenizer::new(&src);
        let key = tok.next_block(0, false).unwrap().unwrap();
        assert_eq!(key.kind, TokenKind::Key);
        assert_eq!(key.text, "key name");
        let val = tok.next_block(0, false).unwrap().unwrap();
        assert!(val.literal);
        assert_eq!(val.text, "it's");
    }

    #[test]
    fn test_unterminated_literal() {
        let src = Source::new("a: \"never closed");
        let mut tok = Tokenizer::new(&src);
        let _key = tok.next_block(0, false).unwrap().unwrap();
        assert!(matches!(
            tok.next_block(0, false),
            Err(ParseError::UnclosedLiteral(1))
        ));
    }
}
