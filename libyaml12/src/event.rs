//! Events produced by the parser.

use crate::error::Mark;
use crate::token::ScalarStyle;

/// A `%TAG` directive: handle and prefix.
pub type TagDirective = (String, String);

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EventKind {
    StreamStart,
    StreamEnd,
    DocumentStart {
        /// Whether the document began with `---`.
        explicit: bool,
        /// `%YAML` version as (major, minor).
        version: Option<(u32, u32)>,
        /// `%TAG` directives declared for this document.
        tags: Vec<TagDirective>,
    },
    DocumentEnd {
        /// Whether the document ended with `...`.
        explicit: bool,
    },
    Alias {
        name: String,
    },
    /// `tag` is already expanded through the tag directives.
    Scalar {
        anchor: Option<String>,
        tag: Option<String>,
        value: String,
        style: ScalarStyle,
    },
    SequenceStart {
        anchor: Option<String>,
        tag: Option<String>,
        flow: bool,
    },
    SequenceEnd,
    MappingStart {
        anchor: Option<String>,
        tag: Option<String>,
        flow: bool,
    },
    MappingEnd,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Event {
    pub kind: EventKind,
    pub start: Mark,
    pub end: Mark,
}

impl Event {
    pub fn new(kind: EventKind, start: Mark, end: Mark) -> Self {
        Self { kind, start, end }
    }

    /// A zero-width plain scalar standing for an empty node.
    pub fn empty_scalar(mark: Mark) -> Self {
        Self::new(
            EventKind::Scalar {
                anchor: None,
                tag: None,
                value: String::new(),
                style: ScalarStyle::Plain,
            },
            mark,
            mark,
        )
    }
}
