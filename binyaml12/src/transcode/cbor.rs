//! CBOR transcoding: write loaded YAML values as CBOR binary data.
//!
//! A value is first lowered to an [`Item`], the CBOR data model, and the
//! item is then either written as bytes or rendered in diagnostic notation
//! (RFC 8949 §8). Both outputs come from the same item, so the notation
//! shows exactly what goes on the wire.
//!
//! Lowering:
//!   - null and booleans become simple values 22, 20 and 21
//!   - integers in -2^64..2^64 become major types 0 and 1; wider ones become
//!     tag 2 or tag 3 bignums over the big-endian magnitude
//!   - floats are always float64, never shortened
//!   - dates become tag 1004 text; date-times become tag 0 text, with local
//!     date-times written as UTC
//!   - sets become tag 258 arrays; pairs become arrays of two-element arrays
//!   - mappings keep document order and keys of any type
//!   - application tags are dropped in favor of the inner value

use libyaml12::{Timestamp, Value};
use num_bigint::{BigInt, Sign};
use num_traits::ToPrimitive;
use std::fmt::Write as FmtWrite;

const TAG_DATE_TIME: u64 = 0;
const TAG_POSITIVE_BIGNUM: u64 = 2;
const TAG_NEGATIVE_BIGNUM: u64 = 3;
const TAG_SET: u64 = 258;
const TAG_FULL_DATE: u64 = 1004;

const MAJOR_UNSIGNED: u8 = 0;
const MAJOR_NEGATIVE: u8 = 1;
const MAJOR_BYTES: u8 = 2;
const MAJOR_TEXT: u8 = 3;
const MAJOR_ARRAY: u8 = 4;
const MAJOR_MAP: u8 = 5;
const MAJOR_TAG: u8 = 6;

/// One CBOR data item.
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Unsigned(u64),
    /// The argument `n` of major type 1, standing for `-1 - n`.
    Negative(u64),
    Float(f64),
    Bytes(Vec<u8>),
    Text(String),
    Array(Vec<Item>),
    Map(Vec<(Item, Item)>),
    Tag(u64, Box<Item>),
    Null,
    Bool(bool),
}

impl Item {
    fn tagged(tag: u64, item: Item) -> Item {
        Item::Tag(tag, Box::new(item))
    }

    /// Whether the item renders on one line without nested containers.
    fn is_leaf(&self) -> bool {
        match self {
            Item::Array(_) | Item::Map(_) => false,
            Item::Tag(_, inner) => inner.is_leaf(),
            _ => true,
        }
    }
}

/// Lower a loaded value to the CBOR data model.
pub fn lower(value: &Value) -> Item {
    match value {
        Value::Null => Item::Null,
        Value::Bool(b) => Item::Bool(*b),
        Value::Integer(n) => lower_integer(n),
        Value::Float(f) => Item::Float(*f),
        Value::Timestamp(t) => lower_timestamp(t),
        Value::String(s) => Item::Text(s.clone()),
        Value::Bytes(b) => Item::Bytes(b.clone()),
        Value::Sequence(seq) => Item::Array(seq.iter().map(lower).collect()),
        Value::Mapping(map) => Item::Map(map.iter().map(|(k, v)| (lower(k), lower(v))).collect()),
        Value::Set(set) => Item::tagged(TAG_SET, Item::Array(set.iter().map(lower).collect())),
        Value::Pairs(pairs) => Item::Array(
            pairs
                .iter()
                .map(|(k, v)| Item::Array(vec![lower(k), lower(v)]))
                .collect(),
        ),
        Value::Tagged(tagged) => lower(&tagged.value),
    }
}

fn lower_integer(n: &BigInt) -> Item {
    let negative = n.sign() == Sign::Minus;
    // Major type 1 and tag 3 both carry -1 - n.
    let argument = if negative { -n - BigInt::from(1) } else { n.clone() };
    match (argument.to_u64(), negative) {
        (Some(arg), false) => Item::Unsigned(arg),
        (Some(arg), true) => Item::Negative(arg),
        (None, _) => {
            let (_, magnitude) = argument.to_bytes_be();
            let tag = if negative {
                TAG_NEGATIVE_BIGNUM
            } else {
                TAG_POSITIVE_BIGNUM
            };
            Item::tagged(tag, Item::Bytes(magnitude))
        }
    }
}

fn lower_timestamp(t: &Timestamp) -> Item {
    match t {
        Timestamp::Date(_) => Item::tagged(TAG_FULL_DATE, Item::Text(t.to_string())),
        Timestamp::Local(_) => Item::tagged(TAG_DATE_TIME, Item::Text(format!("{}Z", t))),
        Timestamp::Offset(_) => Item::tagged(TAG_DATE_TIME, Item::Text(t.to_string())),
    }
}

// ---------------------------------------------------------------------------
// Binary Encoding
// ---------------------------------------------------------------------------

/// Encode a value as one CBOR data item.
pub fn encode(value: &Value) -> Vec<u8> {
    let mut buf = Vec::new();
    write_item(&mut buf, &lower(value));
    buf
}

fn write_item(buf: &mut Vec<u8>, item: &Item) {
    match item {
        Item::Unsigned(n) => write_head(buf, MAJOR_UNSIGNED, *n),
        Item::Negative(n) => write_head(buf, MAJOR_NEGATIVE, *n),
        Item::Float(f) => {
            buf.push(0xfb);
            buf.extend_from_slice(&f.to_be_bytes());
        }
        Item::Bytes(b) => {
            write_head(buf, MAJOR_BYTES, b.len() as u64);
            buf.extend_from_slice(b);
        }
        Item::Text(s) => {
            write_head(buf, MAJOR_TEXT, s.len() as u64);
            buf.extend_from_slice(s.as_bytes());
        }
        Item::Array(items) => {
            write_head(buf, MAJOR_ARRAY, items.len() as u64);
            for item in items {
                write_item(buf, item);
            }
        }
        Item::Map(entries) => {
            write_head(buf, MAJOR_MAP, entries.len() as u64);
            for (k, v) in entries {
                write_item(buf, k);
                write_item(buf, v);
            }
        }
        Item::Tag(tag, inner) => {
            write_head(buf, MAJOR_TAG, *tag);
            write_item(buf, inner);
        }
        Item::Null => buf.push(0xf6),
        Item::Bool(false) => buf.push(0xf4),
        Item::Bool(true) => buf.push(0xf5),
    }
}

/// The initial byte plus the shortest big-endian argument that holds `argument`.
fn write_head(buf: &mut Vec<u8>, major: u8, argument: u64) {
    let initial = major << 5;
    if argument < 24 {
        buf.push(initial | argument as u8);
        return;
    }
    let (info, width) = if argument <= u8::MAX as u64 {
        (24, 1)
    } else if argument <= u16::MAX as u64 {
        (25, 2)
    } else if argument <= u32::MAX as u64 {
        (26, 4)
    } else {
        (27, 8)
    };
    buf.push(initial | info);
    buf.extend_from_slice(&argument.to_be_bytes()[8 - width..]);
}

// ---------------------------------------------------------------------------
// Diagnostic Notation
// ---------------------------------------------------------------------------

/// Render a value in CBOR diagnostic notation. Containers holding only
/// leaves stay on one line; others put each entry on its own line.
pub fn diagnostic(value: &Value) -> String {
    let mut out = String::new();
    render_item(&mut out, &lower(value), 0);
    out
}

fn render_item(out: &mut String, item: &Item, depth: usize) {
    match item {
        Item::Unsigned(n) => write!(out, "{}", n).unwrap(),
        Item::Negative(n) => write!(out, "{}", -1 - i128::from(*n)).unwrap(),
        Item::Float(f) => render_float(out, *f),
        Item::Bytes(b) => {
            out.push_str("h'");
            for byte in b {
                write!(out, "{:02x}", byte).unwrap();
            }
            out.push('\'');
        }
        Item::Text(s) => render_text(out, s),
        Item::Array(items) => {
            let all_leaves = items.iter().all(Item::is_leaf);
            render_entries(out, ('[', ']'), items.len(), all_leaves, depth, |out, i| {
                render_item(out, &items[i], depth + 1);
            });
        }
        Item::Map(entries) => {
            let all_leaves = entries.iter().all(|(k, v)| k.is_leaf() && v.is_leaf());
            render_entries(out, ('{', '}'), entries.len(), all_leaves, depth, |out, i| {
                render_item(out, &entries[i].0, depth + 1);
                out.push_str(": ");
                render_item(out, &entries[i].1, depth + 1);
            });
        }
        Item::Tag(tag, inner) => {
            write!(out, "{}(", tag).unwrap();
            render_item(out, inner, depth);
            out.push(')');
        }
        Item::Null => out.push_str("null"),
        Item::Bool(b) => write!(out, "{}", b).unwrap(),
    }
}

fn render_entries(
    out: &mut String,
    (open, close): (char, char),
    len: usize,
    inline: bool,
    depth: usize,
    mut entry: impl FnMut(&mut String, usize),
) {
    out.push(open);
    if inline {
        for i in 0..len {
            if i > 0 {
                out.push_str(", ");
            }
            entry(out, i);
        }
    } else {
        for i in 0..len {
            out.push_str(if i == 0 { "\n" } else { ",\n" });
            out.push_str(&"  ".repeat(depth + 1));
            entry(out, i);
        }
        out.push('\n');
        out.push_str(&"  ".repeat(depth));
    }
    out.push(close);
}

fn render_float(out: &mut String, f: f64) {
    if f.is_nan() {
        out.push_str("NaN");
    } else if f.is_infinite() {
        out.push_str(if f > 0.0 { "Infinity" } else { "-Infinity" });
    } else {
        // Debug always keeps a fraction or an exponent.
        write!(out, "{:?}", f).unwrap();
    }
}

fn render_text(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if c.is_control() => write!(out, "\\u{:04x}", c as u32).unwrap(),
            c => out.push(c),
        }
    }
    out.push('"');
}
