//! Bidirectional converter between a YAML subset and JSON.
//!
//! The YAML → JSON direction is a pipeline over a flat intermediate
//! representation:
//!
//! 1. **Source**: the input as an indexable sequence of lines.
//!
//! 2. **Tokenizer**: produces key and value tokens from a `(row, indent)`
//!    cursor, consuming multi-line scalars, quoted literals, tags,
//!    anchors and block scalars along the way.
//!
//! 3. **Structural parser**: three mutually recursive routines (block
//!    mapping, block sequence, inline flow sequence) that emit brackets
//!    and entries into a flat element list.
//!
//! 4. **Resolvers**: a pass that substitutes alias references with their
//!    anchored values or subtrees, then a pass that expands `<<` merge
//!    keys with local keys taking precedence.
//!
//! 5. **Emitter**: classifies each scalar (null, boolean, integer,
//!    float, timestamp, binary, string) and writes indented JSON text.
//!
//! The JSON → YAML direction is a single tree walk over a
//! [`serde_json::Value`].

mod emitter;
mod encode;
mod error;
mod flat;
mod parser;
mod resolve;
mod source;
mod token;

pub use error::{ParseError, Result};

/// Conversion options.
#[derive(Debug, Clone)]
pub struct Options {
    /// Spaces per nesting level: 0..8 for JSON output, 2..8 for YAML
    /// output (clamped).
    pub indent_width: usize,
    /// Treat `yes`/`no` as booleans when parsing YAML, and render
    /// booleans as `yes`/`no` when emitting it.
    pub yes_no_bool: bool,
    /// Accept two sibling mapping entries with the same key.
    pub allow_duplicate_keys: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            indent_width: 2,
            yes_no_bool: true,
            allow_duplicate_keys: false,
        }
    }
}

/// Convert a YAML document to JSON text.
///
/// # Example
///
/// ```
/// use yamlite::{yaml_to_json, Options};
///
/// let json = yaml_to_json("a: 1", &Options::default()).unwrap();
/// assert_eq!(json, "{\n  \"a\": 1\n}");
/// ```
pub fn yaml_to_json(input: &str, opts: &Options) -> Result<String> {
    let src = source::Source::new(input);
    let mut elements = parser::parse(&src, opts)?;
    resolve::resolve_aliases(&mut elements)?;
    resolve::resolve_merges(&mut elements)?;
    emitter::emit_json(&elements, opts)
}

/// Convert a YAML document to a [`serde_json::Value`].
///
/// The emitted JSON text is re-parsed by `serde_json`, which doubles as
/// a well-formedness check on the emitter's output.
pub fn yaml_to_json_value(input: &str, opts: &Options) -> Result<serde_json::Value> {
    let text = yaml_to_json(input, opts)?;
    serde_json::from_str(&text).map_err(|e| ParseError::InvalidJson(e.to_string()))
}

/// Render a JSON value as YAML text.
pub fn json_to_yaml(value: &serde_json::Value, opts: &Options) -> String {
    encode::encode_yaml(value, opts)
}

/// Parse JSON text and render it as YAML.
pub fn json_text_to_yaml(input: &str, opts: &Options) -> Result<String> {
    let value: serde_json::Value =
        serde_json::from_str(input).map_err(|e| ParseError::InvalidJson(e.to_string()))?;
    Ok(encode::encode_yaml(&value, opts))
}
