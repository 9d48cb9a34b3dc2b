//! Key-level diff of two mappings.
//!
//! Keys present only in the new mapping are `Added`, keys present only in the
//! old mapping are `Removed`, and keys whose values are not deep-equal are
//! `Modified`.

use std::collections::BTreeSet;

use firepower_types::{Mapping, Value};

use crate::equality::deep_equal;

/// The result of comparing two mappings.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MappingDiff {
    /// Changes ordered by key.
    pub changes: Vec<MappingChange>,
}

impl MappingDiff {
    /// An empty diff.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the mappings are equal.
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Number of changed keys.
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Number of added keys.
    pub fn additions(&self) -> usize {
        self.changes
            .iter()
            .filter(|c| matches!(c, MappingChange::Added { .. }))
            .count()
    }

    /// Number of removed keys.
    pub fn removals(&self) -> usize {
        self.changes
            .iter()
            .filter(|c| matches!(c, MappingChange::Removed { .. }))
            .count()
    }

    /// Number of modified keys.
    pub fn modifications(&self) -> usize {
        self.changes
            .iter()
            .filter(|c| matches!(c, MappingChange::Modified { .. }))
            .count()
    }

    /// The changed keys, in key order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.changes.iter().map(MappingChange::key)
    }
}

/// A single key-level change.
#[derive(Clone, Debug, PartialEq)]
pub enum MappingChange {
    Added { key: String, value: Value },
    Removed { key: String, value: Value },
    Modified { key: String, old: Value, new: Value },
}

impl MappingChange {
    /// The key this change is about.
    pub fn key(&self) -> &str {
        match self {
            Self::Added { key, .. } | Self::Removed { key, .. } | Self::Modified { key, .. } => key,
        }
    }
}

/// Compute the key-level diff between two mappings.
pub fn diff_mappings(old: &Mapping, new: &Mapping) -> MappingDiff {
    let keys: BTreeSet<&String> = old.keys().chain(new.keys()).collect();

    let changes = keys
        .into_iter()
        .filter_map(|key| match (old.get(key), new.get(key)) {
            (Some(old_val), Some(new_val)) => {
                (!deep_equal(old_val, new_val)).then(|| MappingChange::Modified {
                    key: key.clone(),
                    old: old_val.clone(),
                    new: new_val.clone(),
                })
            }
            (Some(old_val), None) => Some(MappingChange::Removed {
                key: key.clone(),
                value: old_val.clone(),
            }),
            (None, Some(new_val)) => Some(MappingChange::Added {
                key: key.clone(),
                value: new_val.clone(),
            }),
            (None, None) => None,
        })
        .collect();

    MappingDiff { changes }
}
