//! Tokens passed from the scanner to the parser.

use crate::error::Mark;
use crate::reader::Encoding;

/// Presentation style of a scalar.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScalarStyle {
    Plain,
    SingleQuoted,
    DoubleQuoted,
    Literal,
    Folded,
}

/// Token type in the scanner output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TokenKind {
    StreamStart(Encoding),
    StreamEnd,
    /// `%NAME param param...`
    Directive { name: String, params: Vec<String> },
    /// `---`
    DocumentStart,
    /// `...`
    DocumentEnd,
    BlockSequenceStart,
    BlockMappingStart,
    BlockEnd,
    FlowSequenceStart,
    FlowSequenceEnd,
    FlowMappingStart,
    FlowMappingEnd,
    /// `,`
    FlowEntry,
    /// `-` in block context
    BlockEntry,
    /// `?`, or inserted before an implicit key
    Key,
    /// `:`
    Value,
    Anchor(String),
    Alias(String),
    /// The handle is empty for verbatim tags and the non-specific `!`.
    Tag { handle: String, suffix: String },
    Scalar { value: String, style: ScalarStyle },
}

/// A single token with its source span.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: Mark,
    pub end: Mark,
}

impl Token {
    pub fn new(kind: TokenKind, start: Mark, end: Mark) -> Self {
        Self { kind, start, end }
    }
}

impl TokenKind {
    /// Short description for error messages.
    pub fn describe(&self) -> &'static str {
        match self {
            TokenKind::StreamStart(_) => "<stream start>",
            TokenKind::StreamEnd => "<stream end>",
            TokenKind::Directive { .. } => "a directive",
            TokenKind::DocumentStart => "'---'",
            TokenKind::DocumentEnd => "'...'",
            TokenKind::BlockSequenceStart => "<block sequence start>",
            TokenKind::BlockMappingStart => "<block mapping start>",
            TokenKind::BlockEnd => "<block end>",
            TokenKind::FlowSequenceStart => "'['",
            TokenKind::FlowSequenceEnd => "']'",
            TokenKind::FlowMappingStart => "'{'",
            TokenKind::FlowMappingEnd => "'}'",
            TokenKind::FlowEntry => "','",
            TokenKind::BlockEntry => "'-'",
            TokenKind::Key => "a key",
            TokenKind::Value => "':'",
            TokenKind::Anchor(_) => "an anchor",
            TokenKind::Alias(_) => "an alias",
            TokenKind::Tag { .. } => "a tag",
            TokenKind::Scalar { .. } => "a scalar",
        }
    }
}
