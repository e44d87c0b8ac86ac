//! Line-addressable text source.
//!
//! The tokenizer never touches the raw input directly; it reads an ordered,
//! zero-indexed sequence of lines through this type. Carriage returns are
//! stripped so that CRLF input behaves like LF input.

/// The input document as an indexable sequence of lines.
#[derive(Debug)]
pub struct Source {
    lines: Vec<String>,
}

impl Source {
    /// Split input text into lines.
    pub fn new(input: &str) -> Self {
        let lines = input
            .split('\n')
            .map(|l| l.strip_suffix('\r').unwrap_or(l).to_string())
            .collect();
        Self { lines }
    }

    /// Number of lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Returns `true` if the source has no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The full text of a line.
    pub fn line(&self, row: usize) -> &str {
        &self.lines[row]
    }

    /// Number of leading spaces on a line.
    pub fn indent(&self, row: usize) -> usize {
        self.lines[row].bytes().take_while(|&b| b == b' ').count()
    }

    /// Line content after the leading spaces.
    pub fn content(&self, row: usize) -> &str {
        let indent = self.indent(row);
        &self.lines[row][indent..]
    }

    /// Whether a line contains only whitespace.
    pub fn is_blank(&self, row: usize) -> bool {
        self.lines[row].trim().is_empty()
    }

    /// Whether a line is a comment line (first non-space character is `#`).
    pub fn is_comment(&self, row: usize) -> bool {
        self.content(row).starts_with('#')
    }
}
