use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tracing::{debug, info, warn};
use uuid::Uuid;

use firepower_store::{ChangeKind, ChangeStream, DocumentChange};

use crate::error::{HandlerError, TriggerResult};
use crate::event::{EventContext, TriggerEvent};
use crate::pattern::PathPattern;

type Handler = Arc<dyn Fn(&TriggerEvent) -> Result<(), HandlerError> + Send + Sync>;

/// Which changes a trigger fires on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TriggerKind {
    Created,
    Updated,
    Deleted,
    /// Any create, update, or delete.
    Written,
}

impl TriggerKind {
    /// Whether a change of this kind fires the trigger.
    pub fn fires_on(&self, change: ChangeKind) -> bool {
        match self {
            Self::Created => change == ChangeKind::Created,
            Self::Updated => change == ChangeKind::Updated,
            Self::Deleted => change == ChangeKind::Deleted,
            Self::Written => true,
        }
    }
}

impl fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Created => "on_doc_created",
            Self::Updated => "on_doc_updated",
            Self::Deleted => "on_doc_deleted",
            Self::Written => "on_doc_written",
        };
        f.write_str(s)
    }
}

struct Trigger {
    pattern: PathPattern,
    kind: TriggerKind,
    handler: Handler,
}

/// Outcome of dispatching one or more changes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Changes examined.
    pub changes: usize,
    /// Handlers run.
    pub invoked: usize,
    /// Handlers that returned an error.
    pub failed: usize,
}

impl DispatchReport {
    /// Handlers that returned `Ok`.
    pub fn succeeded(&self) -> usize {
        self.invoked - self.failed
    }

    /// Returns `true` if no handler failed.
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }

    fn absorb(&mut self, other: DispatchReport) {
        self.changes += other.changes;
        self.invoked += other.invoked;
        self.failed += other.failed;
    }
}

/// Handlers keyed by path pattern and change kind.
///
/// Handlers run synchronously in registration order. A failing handler is
/// logged and counted; it never prevents the others from running.
#[derive(Default)]
pub struct TriggerRegistry {
    triggers: Vec<Trigger>,
}

impl TriggerRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `handler` when a matching document is created.
    pub fn on_doc_created<F>(&mut self, pattern: &str, handler: F) -> TriggerResult<&mut Self>
    where
        F: Fn(&TriggerEvent) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        self.register(pattern, TriggerKind::Created, handler)
    }

    /// Run `handler` when a matching document changes.
    pub fn on_doc_updated<F>(&mut self, pattern: &str, handler: F) -> TriggerResult<&mut Self>
    where
        F: Fn(&TriggerEvent) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        self.register(pattern, TriggerKind::Updated, handler)
    }

    /// Run `handler` when a matching document is deleted.
    pub fn on_doc_deleted<F>(&mut self, pattern: &str, handler: F) -> TriggerResult<&mut Self>
    where
        F: Fn(&TriggerEvent) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        self.register(pattern, TriggerKind::Deleted, handler)
    }

    /// Run `handler` on any write to a matching document.
    pub fn on_doc_written<F>(&mut self, pattern: &str, handler: F) -> TriggerResult<&mut Self>
    where
        F: Fn(&TriggerEvent) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        self.register(pattern, TriggerKind::Written, handler)
    }

    /// Register `handler` for `kind` changes under `pattern`.
    pub fn register<F>(&mut self, pattern: &str, kind: TriggerKind, handler: F) -> TriggerResult<&mut Self>
    where
        F: Fn(&TriggerEvent) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        let pattern = PathPattern::parse(pattern)?;
        debug!(pattern = %pattern, kind = %kind, "registered trigger");
        self.triggers.push(Trigger {
            pattern,
            kind,
            handler: Arc::new(handler),
        });
        Ok(self)
    }

    /// Number of registered triggers.
    pub fn len(&self) -> usize {
        self.triggers.len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty()
    }

    /// Run every handler whose pattern and kind match `change`.
    pub fn dispatch(&self, change: &DocumentChange) -> DispatchReport {
        let mut report = DispatchReport {
            changes: 1,
            ..DispatchReport::default()
        };
        let Some(kind) = change.kind() else {
            return report;
        };

        let event_id = Uuid::now_v7();
        let timestamp = Utc::now();
        let comparison = change.comparison();

        for trigger in &self.triggers {
            if !trigger.kind.fires_on(kind) {
                continue;
            }
            let Some(params) = trigger.pattern.matches(&change.path) else {
                continue;
            };

            let event = TriggerEvent {
                context: EventContext {
                    event_id,
                    params,
                    path: change.path.clone(),
                    kind,
                    timestamp,
                },
                change: comparison.clone(),
            };

            report.invoked += 1;
            if let Err(e) = (trigger.handler)(&event) {
                report.failed += 1;
                warn!(
                    event_id = %event_id,
                    path = %change.path,
                    pattern = %trigger.pattern,
                    trigger = %trigger.kind,
                    error = %e,
                    "trigger handler failed"
                );
            }
        }

        if report.invoked > 0 {
            info!(
                event_id = %event_id,
                path = %change.path,
                kind = %kind,
                invoked = report.invoked,
                failed = report.failed,
                "dispatched change"
            );
        }
        report
    }

    /// Dispatch every change already waiting on `stream` without blocking.
    pub fn drain(&self, stream: &mut ChangeStream) -> DispatchReport {
        let mut report = DispatchReport::default();
        loop {
            match stream.try_recv() {
                Ok(change) => report.absorb(self.dispatch(&change)),
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "change stream lagged; changes were dropped");
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
        report
    }

    /// Dispatch changes as they arrive until the store side of `stream` is
    /// dropped.
    pub async fn listen(&self, mut stream: ChangeStream) -> DispatchReport {
        let mut report = DispatchReport::default();
        loop {
            match stream.recv().await {
                Ok(change) => report.absorb(self.dispatch(&change)),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "change stream lagged; changes were dropped");
                }
                Err(RecvError::Closed) => break,
            }
        }
        report
    }
}

impl fmt::Debug for TriggerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.triggers.iter().map(|t| (t.kind, t.pattern.as_str())))
            .finish()
    }
}
