//! Error types for YAML loading.

use std::fmt;
use thiserror::Error;

/// Result type for loader operations.
pub type Result<T> = std::result::Result<T, Error>;

/// A position in the decoded input.
///
/// `index` is a byte offset into the UTF-8 text the reader decoded;
/// `line` and `column` are 1-based and count code points.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Mark {
    pub index: usize,
    pub line: usize,
    pub column: usize,
}

impl Mark {
    /// The mark of the first character of a stream.
    pub fn start() -> Self {
        Self {
            index: 0,
            line: 1,
            column: 1,
        }
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {} column {}", self.line, self.column)
    }
}

/// Discriminant of an [`Error`], for matching without destructuring.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    MalformedEncoding,
    BadIndentation,
    LexicalError,
    InvalidMappingKey,
    UnexpectedToken,
    UnmatchedStructure,
    ParseError,
    UnknownAnchor,
    CyclicKey,
    DuplicateKey,
    BadTag,
    LimitExceeded,
    MultipleDocuments,
    EmptyStream,
}

impl ErrorKind {
    /// `true` for the kinds raised by the event parser's grammar checks.
    pub fn is_parse_error(self) -> bool {
        matches!(
            self,
            ErrorKind::UnexpectedToken | ErrorKind::UnmatchedStructure | ErrorKind::ParseError
        )
    }

    /// The kind's name, as used in `.error` fixture files.
    pub fn name(self) -> &'static str {
        match self {
            ErrorKind::MalformedEncoding => "MalformedEncoding",
            ErrorKind::BadIndentation => "BadIndentation",
            ErrorKind::LexicalError => "LexicalError",
            ErrorKind::InvalidMappingKey => "InvalidMappingKey",
            ErrorKind::UnexpectedToken => "UnexpectedToken",
            ErrorKind::UnmatchedStructure => "UnmatchedStructure",
            ErrorKind::ParseError => "ParseError",
            ErrorKind::UnknownAnchor => "UnknownAnchor",
            ErrorKind::CyclicKey => "CyclicKey",
            ErrorKind::DuplicateKey => "DuplicateKey",
            ErrorKind::BadTag => "BadTag",
            ErrorKind::LimitExceeded => "LimitExceeded",
            ErrorKind::MultipleDocuments => "MultipleDocuments",
            ErrorKind::EmptyStream => "EmptyStream",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error type for YAML loading.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// Bytes not decodable under the detected encoding, or a code point
    /// outside the printable set.
    #[error("Malformed encoding: {message} at {mark}")]
    MalformedEncoding { message: String, mark: Mark },

    /// Tab in indentation, or a block collection that does not line up.
    #[error("Bad indentation: {message} at {mark}")]
    BadIndentation { message: String, mark: Mark },

    /// Unterminated quoted scalar, bad escape, malformed block scalar header.
    #[error("Lexical error: {message} at {mark}")]
    Lexical { message: String, mark: Mark },

    /// A `:` whose implicit key cannot be recovered.
    #[error("Invalid mapping key: {message} at {mark}")]
    InvalidMappingKey { message: String, mark: Mark },

    /// The grammar does not allow this token here.
    #[error("Unexpected token: {message} at {mark}")]
    UnexpectedToken { message: String, mark: Mark },

    /// A flow collection still open at the end of the stream.
    #[error("Unmatched structure: {message} at {mark}")]
    UnmatchedStructure { message: String, mark: Mark },

    /// Directive problems: unsupported version, bad or undefined tag handles.
    #[error("Parse error: {message} at {mark}")]
    Parse { message: String, mark: Mark },

    /// Alias names an anchor that was never defined in this document.
    #[error("Unknown anchor: {message} at {mark}")]
    UnknownAnchor { message: String, mark: Mark },

    /// Alias refers to a node that encloses it.
    #[error("Cyclic key: {message} at {mark}")]
    CyclicKey { message: String, mark: Mark },

    /// Two keys of one mapping are equal.
    #[error("Duplicate key: {message} at {mark}")]
    DuplicateKey { message: String, mark: Mark },

    /// An explicit tag whose value predicate failed.
    #[error("Bad tag: {message} at {mark}")]
    BadTag { message: String, mark: Mark },

    /// A configured resource limit was hit.
    #[error("Limit exceeded: {message} at {mark}")]
    LimitExceeded { message: String, mark: Mark },

    /// `load_one` found a second document.
    #[error("Multiple documents: {message} at {mark}")]
    MultipleDocuments { message: String, mark: Mark },

    /// `load_one` found no document.
    #[error("Empty stream: {message} at {mark}")]
    EmptyStream { message: String, mark: Mark },
}

impl Error {
    /// Create an error of the given kind.
    pub fn new(kind: ErrorKind, message: impl Into<String>, mark: Mark) -> Self {
        let message = message.into();
        match kind {
            ErrorKind::MalformedEncoding => Error::MalformedEncoding { message, mark },
            ErrorKind::BadIndentation => Error::BadIndentation { message, mark },
            ErrorKind::LexicalError => Error::Lexical { message, mark },
            ErrorKind::InvalidMappingKey => Error::InvalidMappingKey { message, mark },
            ErrorKind::UnexpectedToken => Error::UnexpectedToken { message, mark },
            ErrorKind::UnmatchedStructure => Error::UnmatchedStructure { message, mark },
            ErrorKind::ParseError => Error::Parse { message, mark },
            ErrorKind::UnknownAnchor => Error::UnknownAnchor { message, mark },
            ErrorKind::CyclicKey => Error::CyclicKey { message, mark },
            ErrorKind::DuplicateKey => Error::DuplicateKey { message, mark },
            ErrorKind::BadTag => Error::BadTag { message, mark },
            ErrorKind::LimitExceeded => Error::LimitExceeded { message, mark },
            ErrorKind::MultipleDocuments => Error::MultipleDocuments { message, mark },
            ErrorKind::EmptyStream => Error::EmptyStream { message, mark },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::MalformedEncoding { .. } => ErrorKind::MalformedEncoding,
            Error::BadIndentation { .. } => ErrorKind::BadIndentation,
            Error::Lexical { .. } => ErrorKind::LexicalError,
            Error::InvalidMappingKey { .. } => ErrorKind::InvalidMappingKey,
            Error::UnexpectedToken { .. } => ErrorKind::UnexpectedToken,
            Error::UnmatchedStructure { .. } => ErrorKind::UnmatchedStructure,
            Error::Parse { .. } => ErrorKind::ParseError,
            Error::UnknownAnchor { .. } => ErrorKind::UnknownAnchor,
            Error::CyclicKey { .. } => ErrorKind::CyclicKey,
            Error::DuplicateKey { .. } => ErrorKind::DuplicateKey,
            Error::BadTag { .. } => ErrorKind::BadTag,
            Error::LimitExceeded { .. } => ErrorKind::LimitExceeded,
            Error::MultipleDocuments { .. } => ErrorKind::MultipleDocuments,
            Error::EmptyStream { .. } => ErrorKind::EmptyStream,
        }
    }

    /// Position of the offending token.
    pub fn mark(&self) -> Mark {
        match self {
            Error::MalformedEncoding { mark, .. }
            | Error::BadIndentation { mark, .. }
            | Error::Lexical { mark, .. }
            | Error::InvalidMappingKey { mark, .. }
            | Error::UnexpectedToken { mark, .. }
            | Error::UnmatchedStructure { mark, .. }
            | Error::Parse { mark, .. }
            | Error::UnknownAnchor { mark, .. }
            | Error::CyclicKey { mark, .. }
            | Error::DuplicateKey { mark, .. }
            | Error::BadTag { mark, .. }
            | Error::LimitExceeded { mark, .. }
            | Error::MultipleDocuments { mark, .. }
            | Error::EmptyStream { mark, .. } => *mark,
        }
    }

    /// The human-readable message without the position suffix.
    pub fn message(&self) -> &str {
        match self {
            Error::MalformedEncoding { message, .. }
            | Error::BadIndentation { message, .. }
            | Error::Lexical { message, .. }
            | Error::InvalidMappingKey { message, .. }
            | Error::UnexpectedToken { message, .. }
            | Error::UnmatchedStructure { message, .. }
            | Error::Parse { message, .. }
            | Error::UnknownAnchor { message, .. }
            | Error::CyclicKey { message, .. }
            | Error::DuplicateKey { message, .. }
            | Error::BadTag { message, .. }
            | Error::LimitExceeded { message, .. }
            | Error::MultipleDocuments { message, .. }
            | Error::EmptyStream { message, .. } => message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_position() {
        let mark = Mark {
            index: 10,
            line: 2,
            column: 5,
        };
        let err = Error::new(ErrorKind::DuplicateKey, "key \"hr\" already defined", mark);
        assert_eq!(
            err.to_string(),
            "Duplicate key: key \"hr\" already defined at line 2 column 5"
        );
    }

    #[test]
    fn test_kind_round_trip() {
        let kinds = [
            ErrorKind::MalformedEncoding,
            ErrorKind::BadIndentation,
            ErrorKind::LexicalError,
            ErrorKind::InvalidMappingKey,
            ErrorKind::UnexpectedToken,
            ErrorKind::UnmatchedStructure,
            ErrorKind::ParseError,
            ErrorKind::UnknownAnchor,
            ErrorKind::CyclicKey,
            ErrorKind::DuplicateKey,
            ErrorKind::BadTag,
            ErrorKind::LimitExceeded,
            ErrorKind::MultipleDocuments,
            ErrorKind::EmptyStream,
        ];
        for kind in kinds {
            let err = Error::new(kind, "x", Mark::start());
            assert_eq!(err.kind(), kind);
            assert_eq!(err.mark(), Mark::start());
            assert_eq!(err.message(), "x");
        }
    }

    #[test]
    fn test_parse_error_grouping() {
        assert!(ErrorKind::UnexpectedToken.is_parse_error());
        assert!(ErrorKind::UnmatchedStructure.is_parse_error());
        assert!(ErrorKind::ParseError.is_parse_error());
        assert!(!ErrorKind::DuplicateKey.is_parse_error());
    }
}
