use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use firepower_diff::Comparison;
use firepower_store::{ChangeKind, DocPath};
use firepower_types::Value;

/// Metadata describing a single trigger invocation.
#[derive(Clone, Debug, PartialEq)]
pub struct EventContext {
    /// Unique, time-ordered id shared by every handler run for one change.
    pub event_id: Uuid,
    /// Parameters bound by the handler's path pattern.
    pub params: BTreeMap<String, String>,
    pub path: DocPath,
    pub kind: ChangeKind,
    pub timestamp: DateTime<Utc>,
}

impl EventContext {
    /// The value captured for the `{name}` wildcard.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }
}

/// What a trigger handler receives.
#[derive(Clone, Debug, PartialEq)]
pub struct TriggerEvent {
    pub context: EventContext,
    /// Document data before (`old`) and after (`new`) the write.
    pub change: Comparison,
}

impl TriggerEvent {
    /// Document data after the write; `None` for deletions.
    pub fn new_data(&self) -> Option<&Value> {
        self.change.new_value()
    }

    /// Document data before the write; `None` for creations.
    pub fn old_data(&self) -> Option<&Value> {
        self.change.old()
    }

    /// Shorthand for [`EventContext::param`].
    pub fn param(&self, name: &str) -> Option<&str> {
        self.context.param(name)
    }
}
