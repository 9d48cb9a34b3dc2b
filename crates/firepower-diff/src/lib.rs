//! Structural comparison engine for Firepower.
//!
//! Compares decoded document trees ([`Value`](firepower_types::Value)) with
//! deep, key-order-independent, sequence-order-dependent equality, and
//! derives differences from an old/new pair.
//!
//! # Key Types
//!
//! - [`deep_equal`] / [`deep_equal_traced`] -- Structural equality oracle
//! - [`TraceSink`] / [`Divergence`] -- First point of divergence reporting
//! - [`Comparison`] -- Immutable old/new pair with projection and diff queries
//! - [`NumericDiffTree`] / [`NumericDelta`] -- Sparse per-field numeric deltas
//! - [`MappingDiff`] / [`MappingChange`] -- Key-level changes between mappings

pub mod comparison;
pub mod equality;
pub mod error;
pub mod mapping_diff;
pub mod numeric;

pub use comparison::Comparison;
pub use equality::{
    deep_equal, deep_equal_traced, Divergence, DivergenceRecorder, LogTrace, Side, TraceSink,
};
pub use error::{DiffError, DiffResult, Requirement};
pub use mapping_diff::{diff_mappings, MappingChange, MappingDiff};
pub use numeric::{numeric_diff_between, NumericDelta, NumericDiffTree};
