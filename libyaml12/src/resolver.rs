//! Phase 5: Tag Resolution
//!
//! Assigns every node an absolute tag. Explicit tags are kept; the
//! non-specific `!` and untagged non-plain scalars get the tag of their node
//! kind; untagged plain scalars go through the Core Schema cascade.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::timestamp::Timestamp;
use crate::token::ScalarStyle;

pub const NULL: &str = "tag:yaml.org,2002:null";
pub const BOOL: &str = "tag:yaml.org,2002:bool";
pub const INT: &str = "tag:yaml.org,2002:int";
pub const FLOAT: &str = "tag:yaml.org,2002:float";
pub const STR: &str = "tag:yaml.org,2002:str";
pub const TIMESTAMP: &str = "tag:yaml.org,2002:timestamp";
pub const BINARY: &str = "tag:yaml.org,2002:binary";
pub const SEQ: &str = "tag:yaml.org,2002:seq";
pub const MAP: &str = "tag:yaml.org,2002:map";
pub const SET: &str = "tag:yaml.org,2002:set";
pub const OMAP: &str = "tag:yaml.org,2002:omap";
pub const PAIRS: &str = "tag:yaml.org,2002:pairs";

/// The three node kinds of the representation graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Scalar,
    Sequence,
    Mapping,
}

static NULL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?:~|null|Null|NULL|)$").unwrap());
static BOOL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:true|True|TRUE|false|False|FALSE)$").unwrap());
static INT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:[-+]?[0-9]+|0o[0-7]+|0x[0-9a-fA-F]+)$").unwrap());
static FLOAT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[-+]?(?:\.[0-9]+|[0-9]+(?:\.[0-9]*)?)(?:[eE][-+]?[0-9]+)?|(?i:[-+]?\.inf|\.nan))$")
        .unwrap()
});
static TIMESTAMP_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"^(?:[0-9]{4}-[0-9]{2}-[0-9]{2}",
        r"|[0-9]{4}-[0-9]{1,2}-[0-9]{1,2}(?:[Tt]|[ \t]+)[0-9]{1,2}:[0-9]{2}:[0-9]{2}",
        r"(?:\.[0-9]*)?(?:[ \t]*(?:Z|[-+][0-9]{1,2}(?::[0-9]{2})?))?)$",
    ))
    .unwrap()
});

pub fn is_null(text: &str) -> bool {
    NULL_RE.is_match(text)
}

pub fn is_bool(text: &str) -> bool {
    BOOL_RE.is_match(text)
}

pub fn is_int(text: &str) -> bool {
    INT_RE.is_match(text)
}

pub fn is_float(text: &str) -> bool {
    FLOAT_RE.is_match(text)
}

pub fn is_timestamp(text: &str) -> bool {
    TIMESTAMP_RE.is_match(text)
}

/// Tag of an untagged plain scalar under the Core Schema.
pub fn resolve_plain(text: &str) -> &'static str {
    if is_null(text) {
        NULL
    } else if is_bool(text) {
        BOOL
    } else if is_int(text) {
        INT
    } else if is_float(text) {
        FLOAT
    } else if is_timestamp(text) && Timestamp::parse(text).is_some() {
        TIMESTAMP
    } else {
        STR
    }
}

/// The absolute tag for a node. `tag` is the tag from the event, already
/// expanded through the document's handles.
pub fn resolve(kind: NodeKind, tag: Option<&str>, value: &str, style: ScalarStyle) -> String {
    match (tag, kind) {
        (Some("!"), NodeKind::Scalar) => STR.to_string(),
        (Some(tag), _) if tag != "!" => tag.to_string(),
        (_, NodeKind::Sequence) => SEQ.to_string(),
        (_, NodeKind::Mapping) => MAP.to_string(),
        (_, NodeKind::Scalar) if style != ScalarStyle::Plain => STR.to_string(),
        (_, NodeKind::Scalar) => resolve_plain(value).to_string(),
    }
}

/// Shorten a core tag to `!!name` for messages.
pub fn short(tag: &str) -> String {
    match tag.strip_prefix("tag:yaml.org,2002:") {
        Some(name) => format!("!!{}", name),
        None => tag.to_string(),
    }
}
