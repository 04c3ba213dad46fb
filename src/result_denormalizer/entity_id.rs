use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde_json::Value;

/// Unique id of one entity instance as read from a row.
///
/// Numbers sort numerically, integers and floats alike, and before text. Booleans
/// are compared by their text form.
#[derive(Debug, Clone)]
pub enum EntityId {
    Integer(i128),
    /// Non-integral ids and numbers outside the 64-bit integer range
    Float(f64),
    Text(String),
}

impl EntityId {
    /// `Ok(None)` for null, the outer-join miss. Arrays and objects are not ids.
    pub fn from_value(value: &Value) -> Result<Option<Self>, Value> {
        let id = match value {
            Value::Null => return Ok(None),
            Value::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
                (Some(i), _, _) => EntityId::Integer(i as i128),
                (None, Some(u), _) => EntityId::Integer(u as i128),
                (None, None, Some(f)) => EntityId::Float(f),
                _ => EntityId::Text(n.to_string()),
            },
            Value::String(s) => EntityId::Text(s.clone()),
            Value::Bool(b) => EntityId::Text(b.to_string()),
            other => return Err(other.clone()),
        };
        Ok(Some(id))
    }

    fn numeric(&self) -> Option<f64> {
        match self {
            EntityId::Integer(i) => Some(*i as f64),
            EntityId::Float(f) => Some(*f),
            EntityId::Text(_) => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            EntityId::Integer(_) => 0,
            EntityId::Float(_) => 1,
            EntityId::Text(_) => 2,
        }
    }
}

impl Ord for EntityId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (EntityId::Integer(a), EntityId::Integer(b)) => a.cmp(b),
            (EntityId::Float(a), EntityId::Float(b)) => a.total_cmp(b),
            (EntityId::Text(a), EntityId::Text(b)) => a.cmp(b),
            _ => match (self.numeric(), other.numeric()) {
                // 10 and 10.0 stay distinct ids; the integer goes first
                (Some(a), Some(b)) => a
                    .total_cmp(&b)
                    .then_with(|| self.rank().cmp(&other.rank())),
                _ => self.rank().cmp(&other.rank()),
            },
        }
    }
}

impl PartialOrd for EntityId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for EntityId {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for EntityId {}

impl Hash for EntityId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            EntityId::Integer(i) => i.hash(state),
            EntityId::Float(f) => f.to_bits().hash(state),
            EntityId::Text(s) => s.hash(state),
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityId::Integer(i) => write!(f, "{}", i),
            EntityId::Float(x) => write!(f, "{}", x),
            EntityId::Text(s) => f.write_str(s),
        }
    }
}
