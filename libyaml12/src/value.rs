//! YAML value representation.

use indexmap::{IndexMap, IndexSet};
use num_bigint::BigInt;
use num_traits::ToPrimitive;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::timestamp::Timestamp;

/// Insertion-ordered mapping.
pub type Mapping = IndexMap<Value, Value>;

/// A constructed YAML value.
#[derive(Clone)]
pub enum Value {
    /// `!!null`
    Null,
    /// `!!bool`
    Bool(bool),
    /// `!!int`, arbitrary precision.
    Integer(BigInt),
    /// `!!float`
    Float(f64),
    /// `!!timestamp`
    Timestamp(Timestamp),
    /// `!!str`
    String(String),
    /// `!!binary`
    Bytes(Vec<u8>),
    /// `!!seq`
    Sequence(Vec<Value>),
    /// `!!map` and `!!omap`.
    Mapping(Mapping),
    /// `!!set`
    Set(IndexSet<Value>),
    /// `!!pairs`: ordered, duplicates allowed.
    Pairs(Vec<(Value, Value)>),
    /// A node with a tag outside the type repository.
    Tagged(Box<TaggedValue>),
}

/// A value carrying an application tag the loader does not interpret.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TaggedValue {
    pub tag: String,
    pub value: Value,
}

impl Value {
    /// Returns `true` if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the boolean value if this is a `Bool`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns a reference to the integer if this is an `Integer`.
    pub fn as_integer(&self) -> Option<&BigInt> {
        match self {
            Value::Integer(n) => Some(n),
            _ => None,
        }
    }

    /// Returns the integer if it fits in an `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        self.as_integer().and_then(|n| n.to_i64())
    }

    /// Returns the float value if this is a `Float`.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<&Timestamp> {
        match self {
            Value::Timestamp(t) => Some(t),
            _ => None,
        }
    }

    /// Returns a reference to the string if this is a `String`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Sequence(seq) => Some(seq),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Value::Mapping(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_set(&self) -> Option<&IndexSet<Value>> {
        match self {
            Value::Set(set) => Some(set),
            _ => None,
        }
    }

    pub fn as_pairs(&self) -> Option<&Vec<(Value, Value)>> {
        match self {
            Value::Pairs(pairs) => Some(pairs),
            _ => None,
        }
    }

    pub fn as_tagged(&self) -> Option<&TaggedValue> {
        match self {
            Value::Tagged(tagged) => Some(tagged),
            _ => None,
        }
    }

    /// Look up a string key in a mapping.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_mapping()?.get(&Value::from(key))
    }

    /// The value with any application tag removed.
    pub fn untagged(&self) -> &Value {
        match self {
            Value::Tagged(tagged) => tagged.value.untagged(),
            other => other,
        }
    }
}

/// Float bits with `-0.0` folded into `0.0` and every NaN into one pattern.
fn float_key(f: f64) -> u64 {
    if f.is_nan() {
        f64::NAN.to_bits()
    } else if f == 0.0 {
        0
    } else {
        f.to_bits()
    }
}

fn hash_one<T: Hash + ?Sized>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => float_key(*a) == float_key(*b),
            (Value::Timestamp(a), Value::Timestamp(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::Sequence(a), Value::Sequence(b)) => a == b,
            // IndexMap and IndexSet equality ignores order.
            (Value::Mapping(a), Value::Mapping(b)) => a == b,
            (Value::Set(a), Value::Set(b)) => a == b,
            (Value::Pairs(a), Value::Pairs(b)) => a == b,
            (Value::Tagged(a), Value::Tagged(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::Bool(b) => b.hash(state),
            Value::Integer(n) => n.hash(state),
            Value::Float(f) => float_key(*f).hash(state),
            Value::Timestamp(t) => t.hash(state),
            Value::String(s) => s.hash(state),
            Value::Bytes(b) => b.hash(state),
            Value::Sequence(seq) => seq.hash(state),
            Value::Mapping(map) => {
                // Order-independent, to agree with equality.
                let sum = map.iter().fold(0u64, |acc, entry| {
                    acc.wrapping_add(hash_one(&entry))
                });
                map.len().hash(state);
                sum.hash(state);
            }
            Value::Set(set) => {
                let sum = set
                    .iter()
                    .fold(0u64, |acc, item| acc.wrapping_add(hash_one(item)));
                set.len().hash(state);
                sum.hash(state);
            }
            Value::Pairs(pairs) => pairs.hash(state),
            Value::Tagged(tagged) => tagged.hash(state),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Integer(n) => write!(f, "{}", n),
            Value::Float(n) => {
                if n.is_nan() {
                    write!(f, ".nan")
                } else if n.is_infinite() {
                    if *n > 0.0 {
                        write!(f, ".inf")
                    } else {
                        write!(f, "-.inf")
                    }
                } else {
                    write!(f, "{:?}", n)
                }
            }
            Value::Timestamp(t) => write!(f, "{}", t),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Bytes(b) => {
                write!(f, "<")?;
                for byte in b {
                    write!(f, "{:02x}", byte)?;
                }
                write!(f, ">")
            }
            Value::Sequence(seq) => f.debug_list().entries(seq).finish(),
            Value::Mapping(map) => f.debug_map().entries(map).finish(),
            Value::Set(set) => f.debug_set().entries(set).finish(),
            Value::Pairs(pairs) => {
                write!(f, "!!pairs ")?;
                f.debug_list().entries(pairs).finish()
            }
            Value::Tagged(tagged) => write!(f, "!<{}> {:?}", tagged.tag, tagged.value),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<BigInt> for Value {
    fn from(n: BigInt) -> Self {
        Value::Integer(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(BigInt::from(n))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<Timestamp> for Value {
    fn from(t: Timestamp) -> Self {
        Value::Timestamp(t)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<Vec<Value>> for Value {
    fn from(seq: Vec<Value>) -> Self {
        Value::Sequence(seq)
    }
}

impl From<Mapping> for Value {
    fn from(map: Mapping) -> Self {
        Value::Mapping(map)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(b)
    }
}
