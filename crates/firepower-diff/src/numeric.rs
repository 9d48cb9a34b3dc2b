//! Sparse per-field numeric deltas between two mappings.

use std::collections::{btree_map, BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use firepower_types::{Kind, Mapping, Value};

/// The movement of one field: a number, or the deltas of a nested mapping.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumericDelta {
    Number(f64),
    Nested(NumericDiffTree),
}

impl NumericDelta {
    /// The delta if this field moved as a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Nested(_) => None,
        }
    }

    /// The nested tree if this field is a mapping.
    pub fn as_nested(&self) -> Option<&NumericDiffTree> {
        match self {
            Self::Number(_) => None,
            Self::Nested(tree) => Some(tree),
        }
    }

    /// The delta as a [`Value`].
    pub fn to_value(&self) -> Value {
        match self {
            Self::Number(n) => Value::Number(*n),
            Self::Nested(tree) => tree.to_value(),
        }
    }
}

/// Only fields that moved numerically appear; unchanged and non-numeric
/// fields are omitted. Serializes as plain nested JSON.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NumericDiffTree {
    entries: BTreeMap<String, NumericDelta>,
}

impl NumericDiffTree {
    /// An empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if no field moved.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of top-level fields that moved.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// The delta recorded for `key`.
    pub fn get(&self, key: &str) -> Option<&NumericDelta> {
        self.entries.get(key)
    }

    /// The delta at `key` if it is a number.
    pub fn number(&self, key: &str) -> Option<f64> {
        self.get(key)?.as_f64()
    }

    /// The nested tree at `key` if the field is a mapping.
    pub fn nested(&self, key: &str) -> Option<&NumericDiffTree> {
        self.get(key)?.as_nested()
    }

    /// Top-level entries in key order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, NumericDelta> {
        self.entries.iter()
    }

    /// The tree as a mapping of numbers and nested mappings.
    pub fn to_value(&self) -> Value {
        self.entries
            .iter()
            .map(|(key, delta)| (key.clone(), delta.to_value()))
            .collect()
    }
}

impl<'a> IntoIterator for &'a NumericDiffTree {
    type Item = (&'a String, &'a NumericDelta);
    type IntoIter = btree_map::Iter<'a, String, NumericDelta>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Compute the numeric movement from `old` to `new`.
///
/// For every key in either mapping, the kinds of the sides that are present
/// must agree:
///
/// - both (or the only present side) mappings: recurse, keep if non-empty;
/// - both (or the only present side) numbers: `new - old` with a missing side
///   as zero, keep if nonzero. NaN and infinite operands also count as
///   zero;
/// - anything else, including a kind change between sides, is dropped.
pub fn numeric_diff_between(old: &Mapping, new: &Mapping) -> NumericDiffTree {
    let empty = Mapping::new();
    let keys: BTreeSet<&String> = old.keys().chain(new.keys()).collect();

    let mut entries = BTreeMap::new();
    for key in keys {
        let (before, after) = (old.get(key), new.get(key));
        let kind = match (before.map(Value::kind), after.map(Value::kind)) {
            (Some(a), Some(b)) if a == b => a,
            (Some(k), None) | (None, Some(k)) => k,
            _ => continue,
        };

        match kind {
            Kind::Mapping => {
                let nested = numeric_diff_between(
                    before.and_then(Value::as_mapping).unwrap_or(&empty),
                    after.and_then(Value::as_mapping).unwrap_or(&empty),
                );
                if !nested.is_empty() {
                    entries.insert(key.clone(), NumericDelta::Nested(nested));
                }
            }
            Kind::Number => {
                let delta = finite_or_zero(after) - finite_or_zero(before);
                if delta != 0.0 {
                    entries.insert(key.clone(), NumericDelta::Number(delta));
                }
            }
            _ => {}
        }
    }

    NumericDiffTree { entries }
}

/// The numeric value of `side`, with absent and non-finite values as zero.
pub(crate) fn finite_or_zero(side: Option<&Value>) -> f64 {
    side.and_then(Value::as_f64)
        .filter(|n| n.is_finite())
        .unwrap_or(0.0)
}
