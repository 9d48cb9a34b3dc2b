//! Document triggers for Firepower.
//!
//! Handlers are registered against a [`PathPattern`] and a change kind.
//! Each [`DocumentChange`](firepower_store::DocumentChange) published by a
//! store is turned into a [`TriggerEvent`] carrying the extracted path
//! parameters and a [`Comparison`](firepower_diff::Comparison) of the
//! document before and after the write.
//!
//! # Key Types
//!
//! - [`PathPattern`] -- document path with `{param}` wildcard segments
//! - [`TriggerRegistry`] -- handler registration and dispatch
//! - [`TriggerEvent`] -- what a handler receives
//! - [`DispatchReport`] -- counts of handlers run and failed

pub mod error;
pub mod event;
pub mod pattern;
pub mod registry;

pub use error::{HandlerError, TriggerError, TriggerResult};
pub use event::{EventContext, TriggerEvent};
pub use pattern::PathPattern;
pub use registry::{DispatchReport, TriggerKind, TriggerRegistry};
