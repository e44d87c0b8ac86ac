//! Structural parser.
//!
//! Three mutually recursive routines — block mapping, block sequence and
//! inline flow sequence — share one tokenizer cursor and append to a
//! growing flat list. No tree is built: containers become opener/closer
//! bracket pairs interleaved with keyed and unkeyed scalars by logical
//! depth. Aliases and merge keys are recorded unresolved; the resolvers
//! rewrite them in a later pass.

use std::collections::HashSet;

use crate::error::{ParseError, Result};
use crate::flat::{FlatElement, Marker, Node, Tag};
use crate::source::Source;
use crate::token::{
    escape_double_quoted, escape_plain, find_key_split, is_item_text, scan_name, Token, TokenKind,
    Tokenizer,
};
use crate::Options;

/// Parse a document into its flat-element list.
pub fn parse(src: &Source, opts: &Options) -> Result<Vec<FlatElement>> {
    let mut parser = Parser {
        tok: Tokenizer::new(src),
        out: Vec::new(),
        anchors: HashSet::new(),
        opts,
    };
    parser.parse_document()?;
    Ok(parser.out)
}

/// Tag and anchor attachments carried onto a container opener.
#[derive(Default)]
struct Attach {
    tag: Option<Tag>,
    anchor: Option<String>,
}

impl Attach {
    fn from_token(t: &Token) -> Self {
        Self {
            tag: t.tag,
            anchor: t.anchor.clone(),
        }
    }
}

struct Parser<'a> {
    tok: Tokenizer<'a>,
    out: Vec<FlatElement>,
    /// Anchor names seen so far; duplicates are a document error.
    anchors: HashSet<String>,
    opts: &'a Options,
}

impl<'a> Parser<'a> {
    fn parse_document(&mut self) -> Result<()> {
        let Some(first) = self.tok.peek() else {
            // Empty document converts to null.
            self.push_scalar(None, String::new(), false, 0, 1, None, None, None);
            return Ok(());
        };

        if first.is_item() {
            self.parse_sequence(None, Attach::default(), 0, first.indent)?;
        } else if first.is_key() {
            self.parse_mapping(None, Attach::default(), 0, first.indent, false)?;
        } else {
            self.parse_inline_value(None, 0, first.indent, false, first.line)?;
        }

        match self.tok.peek() {
            Some(p) => Err(ParseError::UnconsumedContent(p.line)),
            None => Ok(()),
        }
    }

    // ------------------------------------------------------------------
    // Block mapping
    // ------------------------------------------------------------------

    /// Parse a key/value block whose keys sit at `src_indent`. The opener
    /// is emitted at `depth`, entries at `depth + 1`. `in_item` marks a
    /// mapping that is the direct content of a collection item, where the
    /// merge key is forbidden.
    fn parse_mapping(
        &mut self,
        key: Option<String>,
        attach: Attach,
        depth: usize,
        src_indent: usize,
        in_item: bool,
    ) -> Result<()> {
        let Some(first) = self.tok.peek() else {
            return Ok(());
        };
        self.register_anchor(attach.anchor.as_deref(), first.line)?;
        self.out.push(FlatElement {
            key,
            node: Node::Open(Marker::Map),
            indent: depth,
            line: first.line,
            tag: attach.tag,
            anchor: attach.anchor,
            alias: None,
        });

        let mut seen: HashSet<String> = HashSet::new();
        let mut last_line = first.line;

        loop {
            let Some(p) = self.tok.peek() else { break };
            if p.indent < src_indent {
                break;
            }
            if p.indent > src_indent {
                return Err(ParseError::InvalidIndentation(p.line));
            }
            if p.is_item() {
                // A collection sibling ends the mapping; the caller owns it.
                break;
            }
            last_line = p.line;

            let Some(t) = self.tok.next_block(src_indent, false)? else {
                break;
            };
            match t.kind {
                TokenKind::Key => {}
                TokenKind::Scalar if t.alias.is_some() || t.anchor.is_some() => {
                    return Err(ParseError::AliasOnKey(t.line));
                }
                _ => return Err(ParseError::ExpectedKey(t.line)),
            }

            // A quoted "<<" is an ordinary key; only the plain spelling merges.
            if t.text == "<<" && !t.literal {
                if in_item {
                    return Err(ParseError::MergeInCollection(t.line));
                }
                self.parse_merge_entry(depth + 1, src_indent, t.line)?;
                continue;
            }

            if !self.opts.allow_duplicate_keys && !seen.insert(t.text.clone()) {
                return Err(ParseError::DuplicatedKey(t.text, t.line));
            }

            self.parse_value(Some(t.text), depth + 1, src_indent, t.line)?;
        }

        self.out.push(FlatElement {
            key: None,
            node: Node::Close(Marker::Map),
            indent: depth,
            line: last_line,
            tag: None,
            anchor: None,
            alias: None,
        });
        Ok(())
    }

    /// Parse the `<<: *anchor` entry of a mapping. The merge key must be
    /// paired with an alias; anything else is malformed.
    fn parse_merge_entry(&mut self, depth: usize, src_indent: usize, line: usize) -> Result<()> {
        let v = self.tok.next_block(src_indent, false)?;
        let alias = match v {
            Some(ref t) if t.kind == TokenKind::Scalar && t.alias.is_some() => t.alias.clone(),
            Some(t) => return Err(ParseError::InvalidMerge(t.line)),
            None => return Err(ParseError::InvalidMerge(line)),
        };
        self.push_scalar(
            Some("<<".to_string()),
            String::new(),
            false,
            depth,
            line,
            None,
            None,
            alias,
        );
        Ok(())
    }

    /// Parse the value of a mapping entry. The key's line indent is
    /// `owner_indent`; a value on its own line must be deeper than it,
    /// otherwise the value is null.
    fn parse_value(
        &mut self,
        key: Option<String>,
        depth: usize,
        owner_indent: usize,
        owner_line: usize,
    ) -> Result<()> {
        if self.tok.has_inline_value() {
            return self.parse_inline_value(key, depth, owner_indent, false, owner_line);
        }
        match self.tok.peek() {
            Some(p) if p.indent > owner_indent => {
                if p.is_item() {
                    self.parse_sequence(key, Attach::default(), depth, p.indent)
                } else if p.is_key() {
                    self.parse_mapping(key, Attach::default(), depth, p.indent, false)
                } else {
                    self.parse_inline_value(key, depth, owner_indent, false, owner_line)
                }
            }
            _ => {
                self.push_scalar(key, String::new(), false, depth, owner_line, None, None, None);
                Ok(())
            }
        }
    }

    /// Consume one value token and turn it into elements: a scalar entry,
    /// an alias reference, a flow sequence, or an anchored/tagged block
    /// opening on the following lines.
    fn parse_inline_value(
        &mut self,
        key: Option<String>,
        depth: usize,
        owner_indent: usize,
        in_item: bool,
        owner_line: usize,
    ) -> Result<()> {
        let Some(t) = self.tok.next_block(owner_indent, in_item)? else {
            self.push_scalar(key, String::new(), false, depth, owner_line, None, None, None);
            return Ok(());
        };
        match t.kind {
            TokenKind::FlowOpen => {
                self.parse_flow(key, Attach::from_token(&t), depth, t.line)?;
                self.check_line_consumed()
            }
            TokenKind::Key => Err(ParseError::DoubleKey(t.line)),
            TokenKind::ItemMarker => Err(ParseError::CollectionItem(t.line)),
            TokenKind::Scalar => self.finish_scalar(key, t, depth, owner_indent, in_item),
            // Flow delimiters never surface in block context.
            _ => Err(ParseError::InvalidArray(t.line)),
        }
    }

    /// Place a scalar token. An empty token carrying an anchor or tag may
    /// instead open a nested block on the following lines.
    fn finish_scalar(
        &mut self,
        key: Option<String>,
        t: Token,
        depth: usize,
        owner_indent: usize,
        in_item: bool,
    ) -> Result<()> {
        if t.alias.is_some() {
            self.push_scalar(key, String::new(), false, depth, t.line, t.tag, None, t.alias);
            return Ok(());
        }

        if t.text.is_empty() && !t.literal && (t.anchor.is_some() || t.tag.is_some()) {
            if let Some(p) = self.tok.peek() {
                if p.indent > owner_indent {
                    let attach = Attach::from_token(&t);
                    if p.is_item() {
                        return self.parse_sequence(key, attach, depth, p.indent);
                    }
                    if p.is_key() {
                        return self.parse_mapping(key, attach, depth, p.indent, in_item);
                    }
                    // The anchored value is a scalar on the lines below.
                    let Some(v) = self.tok.next_block(owner_indent, in_item)? else {
                        self.register_anchor(t.anchor.as_deref(), t.line)?;
                        self.push_scalar(
                            key,
                            String::new(),
                            false,
                            depth,
                            t.line,
                            t.tag,
                            t.anchor,
                            None,
                        );
                        return Ok(());
                    };
                    if v.kind != TokenKind::Scalar {
                        return Err(ParseError::InvalidIndentation(v.line));
                    }
                    self.register_anchor(t.anchor.as_deref(), t.line)?;
                    self.push_scalar(
                        key,
                        v.text,
                        v.literal,
                        depth,
                        t.line,
                        t.tag.or(v.tag),
                        t.anchor,
                        v.alias,
                    );
                    return self.check_line_consumed();
                }
            }
            self.register_anchor(t.anchor.as_deref(), t.line)?;
            self.push_scalar(key, String::new(), false, depth, t.line, t.tag, t.anchor, None);
            return Ok(());
        }

        self.register_anchor(t.anchor.as_deref(), t.line)?;
        self.push_scalar(key, t.text, t.literal, depth, t.line, t.tag, t.anchor, None);
        self.check_line_consumed()
    }

    // ------------------------------------------------------------------
    // Block sequence
    // ------------------------------------------------------------------

    /// Parse a `- item` collection whose markers sit at `marker_indent`.
    fn parse_sequence(
        &mut self,
        key: Option<String>,
        attach: Attach,
        depth: usize,
        marker_indent: usize,
    ) -> Result<()> {
        let Some(first) = self.tok.peek() else {
            return Ok(());
        };
        self.register_anchor(attach.anchor.as_deref(), first.line)?;
        self.out.push(FlatElement {
            key,
            node: Node::Open(Marker::Seq),
            indent: depth,
            line: first.line,
            tag: attach.tag,
            anchor: attach.anchor,
            alias: None,
        });

        let mut last_line = first.line;
        loop {
            let Some(p) = self.tok.peek() else { break };
            if !(p.is_item() && p.indent == marker_indent) {
                if p.indent > marker_indent {
                    return Err(ParseError::InvalidIndentation(p.line));
                }
                break;
            }
            last_line = p.line;

            let Some(m) = self.tok.next_block(marker_indent, false)? else {
                break;
            };
            if m.kind != TokenKind::ItemMarker {
                return Err(ParseError::CollectionItem(m.line));
            }
            self.parse_item(depth + 1, marker_indent, m.line)?;
        }

        self.out.push(FlatElement {
            key: None,
            node: Node::Close(Marker::Seq),
            indent: depth,
            line: last_line,
            tag: None,
            anchor: None,
            alias: None,
        });
        Ok(())
    }

    /// Parse one collection item: the marker is consumed and its content
    /// is re-indented by the marker width.
    fn parse_item(&mut self, depth: usize, marker_indent: usize, marker_line: usize) -> Result<()> {
        let content_indent = self.tok.indent;

        if self.tok.has_inline_value() {
            let Some(p) = self.tok.peek() else {
                return Ok(());
            };
            if p.is_item() {
                return self.parse_sequence(None, Attach::default(), depth, content_indent);
            }
            if p.is_key() {
                return self.parse_mapping(None, Attach::default(), depth, content_indent, true);
            }
            return self.parse_inline_value(None, depth, marker_indent, true, marker_line);
        }

        // Bare `-`: the item is either a nested block or null.
        match self.tok.peek() {
            Some(p) if p.indent > marker_indent => {
                if p.is_item() {
                    self.parse_sequence(None, Attach::default(), depth, p.indent)
                } else if p.is_key() {
                    self.parse_mapping(None, Attach::default(), depth, p.indent, true)
                } else {
                    self.parse_inline_value(None, depth, marker_indent, true, marker_line)
                }
            }
            _ => {
                self.push_scalar(None, String::new(), false, depth, marker_line, None, None, None);
                Ok(())
            }
        }
    }

    // ------------------------------------------------------------------
    // Inline flow sequence
    // ------------------------------------------------------------------

    /// Parse `[ … ]` after its opener token has been absorbed. Elements
    /// are separated by commas; a missing element between commas is null.
    fn parse_flow(
        &mut self,
        key: Option<String>,
        attach: Attach,
        depth: usize,
        open_line: usize,
    ) -> Result<()> {
        self.register_anchor(attach.anchor.as_deref(), open_line)?;
        self.out.push(FlatElement {
            key,
            node: Node::Open(Marker::Seq),
            indent: depth,
            line: open_line,
            tag: attach.tag,
            anchor: attach.anchor,
            alias: None,
        });

        let mut saw_value = false;
        let mut last_line = open_line;
        loop {
            let Some(t) = self.tok.next_flow()? else {
                return Err(ParseError::UnclosedArray(open_line));
            };
            last_line = t.line;
            match t.kind {
                TokenKind::FlowClose => break,
                TokenKind::Comma => {
                    if !saw_value {
                        self.push_scalar(
                            None,
                            String::new(),
                            false,
                            depth + 1,
                            t.line,
                            None,
                            None,
                            None,
                        );
                    }
                    saw_value = false;
                }
                TokenKind::FlowOpen => {
                    if saw_value {
                        return Err(ParseError::InvalidArray(t.line));
                    }
                    self.parse_flow(None, Attach::from_token(&t), depth + 1, t.line)?;
                    saw_value = true;
                }
                TokenKind::Pair => {
                    if saw_value {
                        return Err(ParseError::InvalidArray(t.line));
                    }
                    self.parse_flow_pair(&t.text, depth + 1, t.line)?;
                    saw_value = true;
                }
                TokenKind::Scalar => {
                    if saw_value {
                        return Err(ParseError::InvalidArray(t.line));
                    }
                    if !t.literal && is_item_text(&t.text) {
                        return Err(ParseError::CollectionItem(t.line));
                    }
                    self.register_anchor(t.anchor.as_deref(), t.line)?;
                    self.push_scalar(
                        None,
                        t.text,
                        t.literal,
                        depth + 1,
                        t.line,
                        t.tag,
                        t.anchor,
                        t.alias,
                    );
                    saw_value = true;
                }
                _ => return Err(ParseError::InvalidArray(t.line)),
            }
        }

        self.out.push(FlatElement {
            key: None,
            node: Node::Close(Marker::Seq),
            indent: depth,
            line: last_line,
            tag: None,
            anchor: None,
            alias: None,
        });
        Ok(())
    }

    /// Parse a `key: value` chunk inside a flow sequence into a one-entry
    /// mapping one level deeper. `raw` is the unescaped chunk, braces
    /// already stripped when it was wrapped in them.
    fn parse_flow_pair(&mut self, raw: &str, depth: usize, line: usize) -> Result<()> {
        let raw = raw.trim();
        if raw.is_empty() {
            // `{}` — an empty mapping.
            self.push_bracket(Node::Open(Marker::Map), depth, line);
            self.push_bracket(Node::Close(Marker::Map), depth, line);
            return Ok(());
        }

        let idx = find_key_split(raw).ok_or(ParseError::InvalidArray(line))?;
        let (key_text, _) = pair_scalar(raw[..idx].trim(), line)?;
        if key_text.is_empty() {
            return Err(ParseError::EmptyKey(line));
        }
        if key_text == "<<" {
            return Err(ParseError::MergeInArray(line));
        }

        self.push_bracket(Node::Open(Marker::Map), depth, line);
        let val_raw = raw[idx + 1..].trim();
        if let Some(name) = val_raw.strip_prefix('*') {
            let (name, after) = scan_name(name, line)?;
            if !after.trim().is_empty() {
                return Err(ParseError::AliasWithValue(line));
            }
            self.push_scalar(
                Some(key_text),
                String::new(),
                false,
                depth + 1,
                line,
                None,
                None,
                Some(name),
            );
        } else {
            let (text, literal) = pair_scalar(val_raw, line)?;
            self.push_scalar(Some(key_text), text, literal, depth + 1, line, None, None, None);
        }
        self.push_bracket(Node::Close(Marker::Map), depth, line);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    #[allow(clippy::too_many_arguments)]
    fn push_scalar(
        &mut self,
        key: Option<String>,
        text: String,
        literal: bool,
        indent: usize,
        line: usize,
        tag: Option<Tag>,
        anchor: Option<String>,
        alias: Option<String>,
    ) {
        self.out.push(FlatElement {
            key,
            node: Node::Scalar { text, literal },
            indent,
            line,
            tag,
            anchor,
            alias,
        });
    }

    fn push_bracket(&mut self, node: Node, indent: usize, line: usize) {
        self.out.push(FlatElement {
            key: None,
            node,
            indent,
            line,
            tag: None,
            anchor: None,
            alias: None,
        });
    }

    fn register_anchor(&mut self, anchor: Option<&str>, line: usize) -> Result<()> {
        if let Some(name) = anchor {
            if !self.anchors.insert(name.to_string()) {
                return Err(ParseError::DuplicateAnchor(name.to_string(), line));
            }
        }
        Ok(())
    }

    /// A completed inline value must use up its line.
    fn check_line_consumed(&self) -> Result<()> {
        if self.tok.has_inline_value() {
            return Err(ParseError::UnconsumedContent(self.tok.line));
        }
        Ok(())
    }
}

/// Interpret one side of a flow pair: a quoted literal or a plain scalar.
fn pair_scalar(raw: &str, line: usize) -> Result<(String, bool)> {
    if raw.len() >= 2 && raw.starts_with('"') && raw.ends_with('"') {
        return Ok((escape_double_quoted(&raw[1..raw.len() - 1]), true));
    }
    if raw.len() >= 2 && raw.starts_with('\'') && raw.ends_with('\'') {
        return Ok((escape_plain(&raw[1..raw.len() - 1].replace("''", "'")), true));
    }
    if raw.starts_with('"') || raw.starts_with('\'') {
        return Err(ParseError::UnclosedLiteral(line));
    }
    Ok((escape_plain(raw), false))
}
