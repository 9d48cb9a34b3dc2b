//! Structural equality oracle.
//!
//! Two values are equal when they have the same [`Kind`] and:
//!
//! - both are null;
//! - both are sequences of the same length whose elements are pairwise equal
//!   by index (element order matters);
//! - both are mappings with the same key set whose values are pairwise equal
//!   by key (key order does not matter);
//! - both are scalars that are primitively equal, or sentinels that are the
//!   same marker (see [`Sentinel::same_as`](firepower_types::Sentinel::same_as)).
//!
//! Traversal is depth-first and stops at the first divergence. Mapping keys
//! are visited in sorted order.

use std::fmt;

use firepower_types::{Kind, Path, Value};

/// Which side of a comparison a divergence refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Left => f.write_str("left"),
            Self::Right => f.write_str("right"),
        }
    }
}

/// Why two values stopped being equal at some path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Divergence {
    /// The two values classify differently.
    KindMismatch { left: Kind, right: Kind },
    /// Two sequences have different lengths.
    LengthMismatch { left: usize, right: usize },
    /// A mapping key exists on one side only; `side` is the side lacking it.
    MissingKey { key: String, side: Side },
    /// Two scalars or sentinels of the same kind differ.
    ValueMismatch { kind: Kind },
    /// One side has no value at all.
    Absent { side: Side },
}

impl fmt::Display for Divergence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::KindMismatch { left, right } => {
                write!(f, "value kinds differ ({left} vs {right})")
            }
            Self::LengthMismatch { left, right } => {
                write!(f, "sequence lengths differ ({left} vs {right})")
            }
            Self::MissingKey { key, side } => write!(f, "key `{key}` not found in {side} value"),
            Self::ValueMismatch { kind } => write!(f, "{kind} values differ"),
            Self::Absent { side } => write!(f, "{side} value is absent"),
        }
    }
}

/// Receives the first point of divergence found by the oracle.
///
/// Called at most once per comparison, just before it returns `false`.
pub trait TraceSink {
    fn divergence(&mut self, path: &Path, divergence: &Divergence);
}

impl<F> TraceSink for F
where
    F: FnMut(&Path, &Divergence),
{
    fn divergence(&mut self, path: &Path, divergence: &Divergence) {
        self(path, divergence)
    }
}

/// Keeps the reported divergence for later inspection.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DivergenceRecorder {
    pub first: Option<(Path, Divergence)>,
}

impl DivergenceRecorder {
    /// A recorder that has seen nothing yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Where the first divergence happened.
    pub fn path(&self) -> Option<&Path> {
        self.first.as_ref().map(|(path, _)| path)
    }

    /// The first divergence, if any.
    pub fn divergence(&self) -> Option<&Divergence> {
        self.first.as_ref().map(|(_, divergence)| divergence)
    }
}

impl TraceSink for DivergenceRecorder {
    fn divergence(&mut self, path: &Path, divergence: &Divergence) {
        if self.first.is_none() {
            self.first = Some((path.clone(), divergence.clone()));
        }
    }
}

/// Emits the divergence as a `tracing` debug event.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogTrace;

impl TraceSink for LogTrace {
    fn divergence(&mut self, path: &Path, divergence: &Divergence) {
        tracing::debug!(path = %path, divergence = %divergence, "values diverge");
    }
}

/// Deep structural equality.
pub fn deep_equal(left: &Value, right: &Value) -> bool {
    Oracle { sink: None }.equal(left, right, &mut Path::root())
}

/// Deep structural equality, reporting the first divergence to `sink`.
pub fn deep_equal_traced(left: &Value, right: &Value, sink: &mut dyn TraceSink) -> bool {
    Oracle { sink: Some(sink) }.equal(left, right, &mut Path::root())
}

struct Oracle<'a> {
    sink: Option<&'a mut dyn TraceSink>,
}

impl Oracle<'_> {
    fn diverge(&mut self, path: &Path, divergence: Divergence) -> bool {
        if let Some(sink) = self.sink.as_deref_mut() {
            sink.divergence(path, &divergence);
        }
        false
    }

    fn equal(&mut self, left: &Value, right: &Value, path: &mut Path) -> bool {
        let (left_kind, right_kind) = (left.kind(), right.kind());
        if left_kind != right_kind {
            return self.diverge(
                path,
                Divergence::KindMismatch {
                    left: left_kind,
                    right: right_kind,
                },
            );
        }

        match (left, right) {
            (Value::Null, Value::Null) => true,
            (Value::Sequence(l), Value::Sequence(r)) => {
                if l.len() != r.len() {
                    return self.diverge(
                        path,
                        Divergence::LengthMismatch {
                            left: l.len(),
                            right: r.len(),
                        },
                    );
                }
                l.iter().zip(r).enumerate().all(|(i, (a, b))| {
                    path.push(i);
                    let eq = self.equal(a, b, path);
                    path.pop();
                    eq
                })
            }
            (Value::Mapping(l), Value::Mapping(r)) => {
                if let Some(key) = l.keys().find(|key| !r.contains_key(*key)) {
                    return self.diverge(
                        path,
                        Divergence::MissingKey {
                            key: key.clone(),
                            side: Side::Right,
                        },
                    );
                }
                if let Some(key) = r.keys().find(|key| !l.contains_key(*key)) {
                    return self.diverge(
                        path,
                        Divergence::MissingKey {
                            key: key.clone(),
                            side: Side::Left,
                        },
                    );
                }
                // Key sets match, so every lookup below succeeds.
                l.iter().all(|(key, a)| {
                    r.get(key).is_some_and(|b| {
                        path.push(key.as_str());
                        let eq = self.equal(a, b, path);
                        path.pop();
                        eq
                    })
                })
            }
            _ => {
                let same = match (left, right) {
                    (Value::Bool(a), Value::Bool(b)) => a == b,
                    (Value::Number(a), Value::Number(b)) => a == b,
                    (Value::Text(a), Value::Text(b)) => a == b,
                    (Value::Sentinel(a), Value::Sentinel(b)) => a.same_as(b),
                    _ => false,
                };
                same || self.diverge(path, Divergence::ValueMismatch { kind: left_kind })
            }
        }
    }
}
