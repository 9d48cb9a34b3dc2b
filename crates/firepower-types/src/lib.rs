//! Foundation types for Firepower.
//!
//! This crate provides the data model that every other Firepower crate
//! consumes: decoded document-store data as a closed tree of values.
//!
//! # Key Types
//!
//! - [`Value`] -- Null, boolean, number, text, sequence, mapping, or sentinel
//! - [`Kind`] -- The classification of a [`Value`]
//! - [`Sentinel`] -- Opaque store marker (delete, increment, server timestamp, ...)
//! - [`Path`] / [`PathSegment`] -- Location of a node inside a value tree

pub mod error;
pub mod kind;
pub mod path;
pub mod sentinel;
pub mod value;

pub use error::TypeError;
pub use kind::Kind;
pub use path::{Path, PathSegment};
pub use sentinel::{Sentinel, SentinelKind};
pub use value::{Mapping, Value};
