//! Dynamically-typed node identifier.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// A node name that may be text, a number, a boolean or null.
///
/// A float with an integral value is the same key as the matching `Int`,
/// so `1` and `1.0` name one node. Other floats hash and compare by bit
/// pattern, with `-0.0` folded into `0.0` and every NaN folded into one
/// canonical NaN, so any float used as a key can be found again.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeKey {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl NodeKey {
    fn float_bits(value: f64) -> u64 {
        if value == 0.0 {
            0.0f64.to_bits()
        } else if value.is_nan() {
            f64::NAN.to_bits()
        } else {
            value.to_bits()
        }
    }

    fn integral(value: f64) -> Option<i64> {
        const LIMIT: f64 = 9_223_372_036_854_775_808.0; // 2^63
        if value.fract() == 0.0 && (-LIMIT..LIMIT).contains(&value) {
            Some(value as i64)
        } else {
            None
        }
    }

    /// Text content, if this key is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            NodeKey::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, NodeKey::Null)
    }
}

impl PartialEq for NodeKey {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (NodeKey::Null, NodeKey::Null) => true,
            (NodeKey::Bool(a), NodeKey::Bool(b)) => a == b,
            (NodeKey::Int(a), NodeKey::Int(b)) => a == b,
            (NodeKey::Float(a), NodeKey::Float(b)) => Self::float_bits(*a) == Self::float_bits(*b),
            (NodeKey::Int(i), NodeKey::Float(x)) | (NodeKey::Float(x), NodeKey::Int(i)) => {
                Self::integral(*x) == Some(*i)
            }
            (NodeKey::Text(a), NodeKey::Text(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for NodeKey {}

impl Hash for NodeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            NodeKey::Null => 0u8.hash(state),
            NodeKey::Bool(b) => (1u8, b).hash(state),
            NodeKey::Int(i) => (2u8, i).hash(state),
            NodeKey::Float(x) => match Self::integral(*x) {
                Some(i) => (2u8, i).hash(state),
                None => (3u8, Self::float_bits(*x)).hash(state),
            },
            NodeKey::Text(s) => (4u8, s).hash(state),
        }
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKey::Null => write!(f, "null"),
            NodeKey::Bool(b) => write!(f, "{}", b),
            NodeKey::Int(i) => write!(f, "{}", i),
            NodeKey::Float(x) => write!(f, "{}", x),
            NodeKey::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for NodeKey {
    fn from(s: &str) -> Self {
        NodeKey::Text(s.to_string())
    }
}

impl From<String> for NodeKey {
    fn from(s: String) -> Self {
        NodeKey::Text(s)
    }
}

impl From<i64> for NodeKey {
    fn from(i: i64) -> Self {
        NodeKey::Int(i)
    }
}

impl From<i32> for NodeKey {
    fn from(i: i32) -> Self {
        NodeKey::Int(i64::from(i))
    }
}

impl From<f64> for NodeKey {
    fn from(x: f64) -> Self {
        NodeKey::Float(x)
    }
}

impl From<bool> for NodeKey {
    fn from(b: bool) -> Self {
        NodeKey::Bool(b)
    }
}

impl From<()> for NodeKey {
    fn from(_: ()) -> Self {
        NodeKey::Null
    }
}

impl<T: Into<NodeKey>> From<Option<T>> for NodeKey {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(NodeKey::Null)
    }
}
