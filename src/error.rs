//! Error types for YAML parsing and conversion.

use thiserror::Error;

/// Result type for conversion operations.
pub type Result<T> = std::result::Result<T, ParseError>;

/// Error type for YAML parsing and conversion.
///
/// Every parser fault carries the 1-based source line it was detected on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Malformed collection item (`- ` in a position where items are illegal).
    #[error("Invalid collection item at line {0}")]
    CollectionItem(usize),

    /// Malformed inline flow sequence.
    #[error("Invalid inline array at line {0}")]
    InvalidArray(usize),

    /// A line is indented where no deeper block is open.
    #[error("Invalid indentation at line {0}")]
    InvalidIndentation(usize),

    /// An inline flow sequence ran into end of input before `]`.
    #[error("Unclosed inline array at line {0}")]
    UnclosedArray(usize),

    /// A quoted literal ran into end of input before its closing quote.
    #[error("Unclosed quoted literal at line {0}")]
    UnclosedLiteral(usize),

    /// Text remained after a complete value.
    #[error("Unconsumed content at line {0}")]
    UnconsumedContent(usize),

    /// A key was empty after trimming.
    #[error("Empty key at line {0}")]
    EmptyKey(usize),

    /// A key spanned more than one source line.
    #[error("Multi-line key at line {0}")]
    MultiLineKey(usize),

    /// A second key appeared where a value was expected (`a: b: c`).
    #[error("Double key at line {0}")]
    DoubleKey(usize),

    /// Something other than a key appeared where a key was expected.
    #[error("Expected key at line {0}")]
    ExpectedKey(usize),

    /// Two sibling mapping entries share a key.
    #[error("Duplicated key \"{0}\" at line {1}")]
    DuplicatedKey(String, usize),

    /// A key began with a character reserved for YAML syntax.
    #[error("Invalid initial character \"{0}\" in key at line {1}")]
    InvalidInitialChar(char, usize),

    /// An anchor or alias name is not a valid identifier.
    #[error("Invalid anchor or alias name at line {0}")]
    InvalidName(usize),

    /// The same anchor name was defined twice.
    #[error("Duplicate anchor \"{0}\" at line {1}")]
    DuplicateAnchor(String, usize),

    /// An alias referenced an anchor that was not defined before it.
    #[error("Anchor \"{0}\" not found at line {1}")]
    AnchorNotFound(String, usize),

    /// An anchor's subtree references the anchor itself.
    #[error("Recursive alias \"{0}\" at line {1}")]
    RecursiveAlias(String, usize),

    /// An alias reference was followed by a value on the same line.
    #[error("Alias with value at line {0}")]
    AliasWithValue(usize),

    /// An anchor or alias was attached to a key.
    #[error("Alias or anchor on key at line {0}")]
    AliasOnKey(usize),

    /// The merge key appeared inside an inline flow sequence.
    #[error("Merge key inside inline array at line {0}")]
    MergeInArray(usize),

    /// The merge key appeared as (or directly inside) a collection item.
    #[error("Merge key inside collection at line {0}")]
    MergeInCollection(usize),

    /// The merge key referenced an anchor that is not a mapping.
    #[error("Merge of a single value at line {0}")]
    MergeOnScalar(usize),

    /// The merge key was not paired with a `*` alias.
    #[error("Invalid merge (expected alias) at line {0}")]
    InvalidMerge(usize),

    /// An explicit tag outside the supported set.
    #[error("Unknown tag \"{0}\" at line {1}")]
    UnknownTag(String, usize),

    /// A scalar does not satisfy its explicit tag.
    #[error("Invalid value for tag \"{0}\" at line {1}")]
    TagMismatch(String, usize),

    /// A block scalar modifier other than `+` or `-`.
    #[error("Invalid block modifier at line {0}")]
    InvalidBlockModifier(usize),

    /// A block scalar introducer immediately after a collection item marker.
    #[error("Block modifier on collection item at line {0}")]
    BlockModifierOnCollectionItem(usize),

    /// Input to the JSON side of the converter was not valid JSON.
    #[error("Invalid JSON input: {0}")]
    InvalidJson(String),
}
