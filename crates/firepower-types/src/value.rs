use std::collections::BTreeMap;

use crate::error::TypeError;
use crate::kind::Kind;
use crate::path::{Path, PathSegment};
use crate::sentinel::Sentinel;

/// A mapping from text keys to values. Key order carries no meaning.
pub type Mapping = BTreeMap<String, Value>;

/// A node in a decoded document tree.
///
/// Values are owned trees, so they are always finite and acyclic. Nesting
/// depth is bounded only by the stack of whoever walks the tree.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    Sequence(Vec<Value>),
    Mapping(Mapping),
    Sentinel(Sentinel),
}

impl Value {
    /// An empty mapping (distinct from [`Value::Null`]).
    pub fn empty_mapping() -> Self {
        Self::Mapping(Mapping::new())
    }

    /// The single classification of this value.
    pub fn kind(&self) -> Kind {
        match self {
            Self::Null => Kind::Null,
            Self::Bool(_) => Kind::Boolean,
            Self::Number(_) => Kind::Number,
            Self::Text(_) => Kind::Text,
            Self::Sequence(_) => Kind::Sequence,
            Self::Mapping(_) => Kind::Mapping,
            Self::Sentinel(_) => Kind::Sentinel,
        }
    }

    /// Returns `true` for `Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The boolean, if this is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The number, if this is one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The text, if this is text.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// The elements, if this is a sequence.
    pub fn as_sequence(&self) -> Option<&Vec<Value>> {
        match self {
            Self::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// The entries, if this is a mapping.
    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Self::Mapping(map) => Some(map),
            _ => None,
        }
    }

    /// Mutable entries, if this is a mapping.
    pub fn as_mapping_mut(&mut self) -> Option<&mut Mapping> {
        match self {
            Self::Mapping(map) => Some(map),
            _ => None,
        }
    }

    /// The marker, if this is a sentinel.
    pub fn as_sentinel(&self) -> Option<&Sentinel> {
        match self {
            Self::Sentinel(s) => Some(s),
            _ => None,
        }
    }

    /// Look up a mapping field. `None` for missing keys and non-mappings.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_mapping()?.get(key)
    }

    /// Look up a sequence element. `None` when out of range or not a sequence.
    pub fn get_index(&self, index: usize) -> Option<&Value> {
        self.as_sequence()?.get(index)
    }

    /// Follow `path` from this value.
    ///
    /// Key segments descend into mappings and index segments into sequences;
    /// a key segment that parses as an index also descends into sequences.
    pub fn get_path(&self, path: &Path) -> Option<&Value> {
        path.segments()
            .iter()
            .try_fold(self, |node, segment| match (segment, node) {
                (PathSegment::Key(key), Self::Mapping(map)) => map.get(key),
                (PathSegment::Key(key), Self::Sequence(items)) => {
                    key.parse::<usize>().ok().and_then(|i| items.get(i))
                }
                (PathSegment::Index(i), Self::Sequence(items)) => items.get(*i),
                _ => None,
            })
    }

    /// Returns `true` if a sentinel appears anywhere in the tree.
    pub fn contains_sentinel(&self) -> bool {
        match self {
            Self::Sentinel(_) => true,
            Self::Sequence(items) => items.iter().any(Value::contains_sentinel),
            Self::Mapping(map) => map.values().any(Value::contains_sentinel),
            _ => false,
        }
    }

    /// Encode as JSON.
    ///
    /// Integral numbers within the exactly-representable range are emitted as
    /// JSON integers. Sentinels and non-finite numbers have no JSON form.
    pub fn to_json(&self) -> Result<serde_json::Value, TypeError> {
        let mut path = Path::root();
        self.to_json_at(&mut path)
    }

    fn to_json_at(&self, path: &mut Path) -> Result<serde_json::Value, TypeError> {
        use serde_json::Value as Json;

        Ok(match self {
            Self::Null => Json::Null,
            Self::Bool(b) => Json::Bool(*b),
            Self::Number(n) => number_to_json(*n).ok_or_else(|| TypeError::NonFiniteNumber {
                path: path.clone(),
            })?,
            Self::Text(s) => Json::String(s.clone()),
            Self::Sequence(items) => {
                let mut out = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    path.push(i);
                    out.push(item.to_json_at(path)?);
                    path.pop();
                }
                Json::Array(out)
            }
            Self::Mapping(map) => {
                let mut out = serde_json::Map::new();
                for (key, item) in map {
                    path.push(key.as_str());
                    out.insert(key.clone(), item.to_json_at(path)?);
                    path.pop();
                }
                Json::Object(out)
            }
            Self::Sentinel(s) => {
                return Err(TypeError::UnencodableSentinel {
                    kind: s.kind().to_string(),
                    path: path.clone(),
                })
            }
        })
    }
}

const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

fn number_to_json(n: f64) -> Option<serde_json::Value> {
    if !n.is_finite() {
        return None;
    }
    if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
        return Some(serde_json::Value::from(n as i64));
    }
    serde_json::Number::from_f64(n).map(serde_json::Value::Number)
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        use serde_json::Value as Json;

        match json {
            Json::Null => Self::Null,
            Json::Bool(b) => Self::Bool(b),
            Json::Number(n) => Self::Number(n.as_f64().unwrap_or(f64::NAN)),
            Json::String(s) => Self::Text(s),
            Json::Array(items) => Self::Sequence(items.into_iter().map(Value::from).collect()),
            Json::Object(map) => {
                Self::Mapping(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::Sequence(items)
    }
}

impl From<Mapping> for Value {
    fn from(map: Mapping) -> Self {
        Self::Mapping(map)
    }
}

impl From<Sentinel> for Value {
    fn from(s: Sentinel) -> Self {
        Self::Sentinel(s)
    }
}

impl FromIterator<(String, Value)> for Value {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self::Mapping(iter.into_iter().collect())
    }
}
