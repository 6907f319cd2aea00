//! Phase 6: Construction
//!
//! Turns a composed node graph into an owned [`Value`]. Each tag of the
//! type repository has a constructor that validates the node: a scalar
//! failing its tag's predicate, or a collection of the wrong kind, is
//! `BadTag`. Any other tag wraps the default value for its node kind.

use base64::Engine;
use indexmap::IndexSet;
use num_bigint::BigInt;
use num_traits::ToPrimitive;
use std::collections::HashMap;
use std::rc::Rc;

use crate::composer::{Node, NodeContent};
use crate::error::{Error, ErrorKind, Result};
use crate::resolver::{self, NodeKind};
use crate::timestamp::Timestamp;
use crate::value::{Mapping, TaggedValue, Value};

/// Construct the value of a document's root node.
pub fn construct(root: &Node) -> Result<Value> {
    Constructor::default().construct(root)
}

/// Parse the Core Schema integer forms.
pub fn parse_int(text: &str) -> Option<BigInt> {
    if !resolver::is_int(text) {
        return None;
    }
    if let Some(octal) = text.strip_prefix("0o") {
        BigInt::parse_bytes(octal.as_bytes(), 8)
    } else if let Some(hex) = text.strip_prefix("0x") {
        BigInt::parse_bytes(hex.as_bytes(), 16)
    } else {
        let digits = text.strip_prefix('+').unwrap_or(text);
        digits.parse().ok()
    }
}

/// Parse the Core Schema float forms, accepting integers too.
pub fn parse_float(text: &str) -> Option<f64> {
    if !resolver::is_float(text) {
        return parse_int(text).and_then(|n| n.to_f64());
    }
    match text.to_ascii_lowercase().as_str() {
        ".inf" | "+.inf" => Some(f64::INFINITY),
        "-.inf" => Some(f64::NEG_INFINITY),
        ".nan" => Some(f64::NAN),
        _ => text.parse().ok(),
    }
}

fn parse_bool(text: &str) -> Option<bool> {
    match text {
        "true" | "True" | "TRUE" => Some(true),
        "false" | "False" | "FALSE" => Some(false),
        _ => None,
    }
}

fn kind_name(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::Scalar => "scalar",
        NodeKind::Sequence => "sequence",
        NodeKind::Mapping => "mapping",
    }
}

fn bad_tag(node: &Node, message: String) -> Error {
    Error::new(ErrorKind::BadTag, message, node.mark)
}

fn wrong_kind(node: &Node) -> Error {
    bad_tag(
        node,
        format!(
            "{} cannot be applied to a {}",
            resolver::short(&node.tag),
            kind_name(node.kind())
        ),
    )
}

fn invalid_scalar(node: &Node, value: &str) -> Error {
    bad_tag(
        node,
        format!("{:?} is not a valid {}", value, resolver::short(&node.tag)),
    )
}

#[derive(Default)]
struct Constructor {
    /// Values of anchored nodes, keyed by composition index, so every alias
    /// of a node reuses one construction.
    anchored: HashMap<usize, Value>,
}

impl Constructor {
    fn construct(&mut self, node: &Node) -> Result<Value> {
        if node.anchor.is_some() {
            if let Some(value) = self.anchored.get(&node.index) {
                return Ok(value.clone());
            }
        }
        let value = self.construct_tagged(node)?;
        if node.anchor.is_some() {
            self.anchored.insert(node.index, value.clone());
        }
        Ok(value)
    }

    fn construct_tagged(&mut self, node: &Node) -> Result<Value> {
        match node.tag.as_str() {
            resolver::NULL => {
                let text = self.scalar(node)?;
                if resolver::is_null(text) {
                    Ok(Value::Null)
                } else {
                    Err(invalid_scalar(node, text))
                }
            }
            resolver::BOOL => {
                let text = self.scalar(node)?;
                parse_bool(text)
                    .map(Value::Bool)
                    .ok_or_else(|| invalid_scalar(node, text))
            }
            resolver::INT => {
                let text = self.scalar(node)?;
                parse_int(text)
                    .map(Value::Integer)
                    .ok_or_else(|| invalid_scalar(node, text))
            }
            resolver::FLOAT => {
                let text = self.scalar(node)?;
                parse_float(text)
                    .map(Value::Float)
                    .ok_or_else(|| invalid_scalar(node, text))
            }
            resolver::TIMESTAMP => {
                let text = self.scalar(node)?;
                Timestamp::parse(text.trim())
                    .map(Value::Timestamp)
                    .ok_or_else(|| invalid_scalar(node, text))
            }
            resolver::STR => Ok(Value::String(self.scalar(node)?.to_string())),
            resolver::BINARY => {
                let text = self.scalar(node)?;
                let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
                base64::engine::general_purpose::STANDARD
                    .decode(compact.as_bytes())
                    .map(Value::Bytes)
                    .map_err(|e| bad_tag(node, format!("invalid !!binary: {}", e)))
            }
            resolver::SEQ => match &node.content {
                NodeContent::Sequence(items) => self.construct_sequence(items),
                _ => Err(wrong_kind(node)),
            },
            resolver::MAP => match &node.content {
                NodeContent::Mapping(pairs) => self.construct_mapping(pairs).map(Value::Mapping),
                _ => Err(wrong_kind(node)),
            },
            resolver::SET => self.construct_set(node),
            resolver::OMAP => self.construct_omap(node),
            resolver::PAIRS => self.construct_pairs(node).map(Value::Pairs),
            tag => {
                let value = match &node.content {
                    NodeContent::Scalar(value) => Value::String(value.clone()),
                    NodeContent::Sequence(items) => self.construct_sequence(items)?,
                    NodeContent::Mapping(pairs) => Value::Mapping(self.construct_mapping(pairs)?),
                };
                Ok(Value::Tagged(Box::new(TaggedValue {
                    tag: tag.to_string(),
                    value,
                })))
            }
        }
    }

    fn scalar<'n>(&self, node: &'n Node) -> Result<&'n str> {
        match &node.content {
            NodeContent::Scalar(value) => Ok(value),
            _ => Err(wrong_kind(node)),
        }
    }

    fn construct_sequence(&mut self, items: &[Rc<Node>]) -> Result<Value> {
        let mut values = Vec::with_capacity(items.len());
        for item in items {
            values.push(self.construct(item)?);
        }
        Ok(Value::Sequence(values))
    }

    fn construct_mapping(&mut self, pairs: &[(Rc<Node>, Rc<Node>)]) -> Result<Mapping> {
        let mut map = Mapping::with_capacity(pairs.len());
        for (key_node, value_node) in pairs {
            let key = self.construct(key_node)?;
            if map.contains_key(&key) {
                return Err(duplicate_key(key_node, &key));
            }
            let value = self.construct(value_node)?;
            map.insert(key, value);
        }
        Ok(map)
    }

    fn construct_set(&mut self, node: &Node) -> Result<Value> {
        let pairs = match &node.content {
            NodeContent::Mapping(pairs) => pairs,
            _ => return Err(wrong_kind(node)),
        };
        let mut set = IndexSet::with_capacity(pairs.len());
        for (key_node, value_node) in pairs {
            let key = self.construct(key_node)?;
            if !self.construct(value_node)?.is_null() {
                return Err(bad_tag(
                    value_node,
                    "!!set entries must have null values".to_string(),
                ));
            }
            if set.contains(&key) {
                return Err(duplicate_key(key_node, &key));
            }
            set.insert(key);
        }
        Ok(Value::Set(set))
    }

    /// Entries of a sequence of single-pair mappings.
    fn construct_pairs(&mut self, node: &Node) -> Result<Vec<(Value, Value)>> {
        let items = match &node.content {
            NodeContent::Sequence(items) => items,
            _ => return Err(wrong_kind(node)),
        };
        let mut pairs = Vec::with_capacity(items.len());
        for item in items {
            match &item.content {
                NodeContent::Mapping(entry) if entry.len() == 1 => {
                    let (key, value) = &entry[0];
                    pairs.push((self.construct(key)?, self.construct(value)?));
                }
                _ => {
                    return Err(bad_tag(
                        item,
                        format!(
                            "{} entries must be single-pair mappings",
                            resolver::short(&node.tag)
                        ),
                    ))
                }
            }
        }
        Ok(pairs)
    }

    fn construct_omap(&mut self, node: &Node) -> Result<Value> {
        let items = match &node.content {
            NodeContent::Sequence(items) => items,
            _ => return Err(wrong_kind(node)),
        };
        let mut map = Mapping::with_capacity(items.len());
        for (item, (key, value)) in items.iter().zip(self.construct_pairs(node)?) {
            if map.contains_key(&key) {
                let key_node = match &item.content {
                    NodeContent::Mapping(entry) => &entry[0].0,
                    _ => item,
                };
                return Err(duplicate_key(key_node, &key));
            }
            map.insert(key, value);
        }
        Ok(Value::Mapping(map))
    }
}

fn duplicate_key(node: &Node, key: &Value) -> Error {
    Error::new(
        ErrorKind::DuplicateKey,
        format!("key {:?} is already defined", key),
        node.mark,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load_one;

    fn kind_of(input: &str) -> ErrorKind {
        load_one(input).unwrap_err().kind()
    }

    #[test]
    fn test_core_scalars() {
        let value = load_one("[~, true, 0o17, 0x1F, -3, 1e3, -.inf, .nan, 2002-12-14, 'x']").unwrap();
        let items = value.as_sequence().unwrap();
        assert!(items[0].is_null());
        assert_eq!(items[1], Value::Bool(true));
        assert_eq!(items[2].as_i64(), Some(15));
        assert_eq!(items[3].as_i64(), Some(31));
        assert_eq!(items[4].as_i64(), Some(-3));
        assert_eq!(items[5], Value::Float(1000.0));
        assert_eq!(items[6], Value::Float(f64::NEG_INFINITY));
        assert!(items[7].as_float().unwrap().is_nan());
        assert!(matches!(items[8], Value::Timestamp(Timestamp::Date(_))));
        assert_eq!(items[9], Value::from("x"));
    }

    #[test]
    fn test_big_integers() {
        let value = load_one("123456789012345678901234567890").unwrap();
        assert_eq!(
            value.as_integer().map(|n| n.to_string()),
            Some("123456789012345678901234567890".to_string())
        );
        assert_eq!(value.as_i64(), None);
    }

    #[test]
    fn test_explicit_tags() {
        let value = load_one("a: !!str 12\nb: !!float 3\nc: !!int \"7\"\n").unwrap();
        assert_eq!(value.get("a"), Some(&Value::from("12")));
        assert_eq!(value.get("b"), Some(&Value::Float(3.0)));
        assert_eq!(value.get("c").and_then(Value::as_i64), Some(7));
    }

    #[test]
    fn test_bad_tags() {
        assert_eq!(kind_of("!!int value-is-not-integer"), ErrorKind::BadTag);
        assert_eq!(kind_of("!!bool yes"), ErrorKind::BadTag);
        assert_eq!(kind_of("!!null 0"), ErrorKind::BadTag);
        assert_eq!(kind_of("!!map [a]"), ErrorKind::BadTag);
        assert_eq!(kind_of("!!str [a]"), ErrorKind::BadTag);
        assert_eq!(kind_of("!!timestamp 2001-02-30"), ErrorKind::BadTag);
        assert_eq!(kind_of("!!binary '%%%'"), ErrorKind::BadTag);
    }

    #[test]
    fn test_duplicate_keys() {
        let err = load_one("a: 1\nb: 2\na: 3\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateKey);
        assert_eq!(err.mark().line, 3);
        // 0x10 and 16 are the same integer.
        assert_eq!(kind_of("{0x10: a, 16: b}"), ErrorKind::DuplicateKey);
        assert_eq!(kind_of("{[a]: 1, [a]: 2}"), ErrorKind::DuplicateKey);
    }

    #[test]
    fn test_binary() {
        let value = load_one("!!binary |\n  R0lG\n  ODlh\n").unwrap();
        assert_eq!(value.as_bytes(), Some(&b"GIF89a"[..]));
    }

    #[test]
    fn test_set() {
        let value = load_one("--- !!set\n? Mark McGwire\n? Sammy Sosa\n").unwrap();
        let set = value.as_set().unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.contains(&Value::from("Sammy Sosa")));
        assert_eq!(kind_of("!!set {a: 1}"), ErrorKind::BadTag);
    }

    #[test]
    fn test_omap_and_pairs() {
        let value = load_one("!!omap\n- b: 1\n- a: 2\n").unwrap();
        let keys: Vec<&Value> = value.as_mapping().unwrap().keys().collect();
        assert_eq!(keys, vec![&Value::from("b"), &Value::from("a")]);
        assert_eq!(kind_of("!!omap\n- a: 1\n- a: 2\n"), ErrorKind::DuplicateKey);
        assert_eq!(kind_of("!!omap\n- a\n"), ErrorKind::BadTag);

        let value = load_one("!!pairs\n- a: 1\n- a: 2\n").unwrap();
        assert_eq!(value.as_pairs().map(Vec::len), Some(2));
    }

    #[test]
    fn test_application_tags() {
        let value = load_one("- !local x\n- !<tag:example.com,2000:app/foo> [1]\n").unwrap();
        let items = value.as_sequence().unwrap();
        let local = items[0].as_tagged().unwrap();
        assert_eq!(local.tag, "!local");
        assert_eq!(local.value, Value::from("x"));
        let global = items[1].as_tagged().unwrap();
        assert_eq!(global.tag, "tag:example.com,2000:app/foo");
        assert_eq!(global.value, Value::Sequence(vec![Value::from(1)]));
    }

    #[test]
    fn test_alias_values_are_equal() {
        let value = load_one("base: &b {x: 1}\ncopy: *b\n").unwrap();
        assert_eq!(value.get("base"), value.get("copy"));
    }

    #[test]
    fn test_parse_helpers() {
        assert_eq!(parse_int("+12").and_then(|n| n.to_i64()), Some(12));
        assert_eq!(parse_int("012").and_then(|n| n.to_i64()), Some(12));
        assert_eq!(parse_int("1.0"), None);
        assert_eq!(parse_float("+.INF"), Some(f64::INFINITY));
        assert_eq!(parse_float("10"), Some(10.0));
        assert_eq!(parse_float("abc"), None);
    }
}
