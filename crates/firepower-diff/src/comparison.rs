//! Old/new value pairs and the differences derived from them.

use firepower_types::{Mapping, Path, Value};

use crate::equality::{deep_equal, deep_equal_traced, Divergence, Side, TraceSink};
use crate::error::{DiffError, DiffResult, Requirement};
use crate::mapping_diff::{diff_mappings, MappingDiff};
use crate::numeric::{finite_or_zero, numeric_diff_between, NumericDiffTree};

/// An immutable pair of an old and a new value.
///
/// Either side may be absent (`None`), e.g. a field missing from one version
/// of a document. Projections return new comparisons and never mutate this
/// one.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Comparison {
    old: Option<Value>,
    new: Option<Value>,
}

impl Comparison {
    /// A comparison from optional sides.
    pub fn new(old: Option<Value>, new: Option<Value>) -> Self {
        Self { old, new }
    }

    /// A comparison where both sides are present.
    pub fn between(old: impl Into<Value>, new: impl Into<Value>) -> Self {
        Self::new(Some(old.into()), Some(new.into()))
    }

    /// The old side, if present.
    pub fn old(&self) -> Option<&Value> {
        self.old.as_ref()
    }

    /// The new side, if present.
    pub fn new_value(&self) -> Option<&Value> {
        self.new.as_ref()
    }

    /// Consume the comparison, returning `(old, new)`.
    pub fn into_parts(self) -> (Option<Value>, Option<Value>) {
        (self.old, self.new)
    }

    /// Apply `f` to each side independently.
    ///
    /// `f` must be pure: it is called once for the old side and once for the
    /// new side, and must not carry state between the calls.
    pub fn transform<F>(&self, f: F) -> Comparison
    where
        F: Fn(Option<&Value>) -> Option<Value>,
    {
        Comparison::new(f(self.old.as_ref()), f(self.new.as_ref()))
    }

    /// Project both sides onto a mapping field.
    pub fn field(&self, key: &str) -> Comparison {
        self.transform(|side| side.and_then(|v| v.get(key)).cloned())
    }

    /// Project both sides along `path`.
    pub fn at(&self, path: &Path) -> Comparison {
        self.transform(|side| side.and_then(|v| v.get_path(path)).cloned())
    }

    /// Deep equality of the two sides; two absent sides are equal.
    pub fn is_equal(&self) -> bool {
        match (&self.old, &self.new) {
            (None, None) => true,
            (Some(old), Some(new)) => deep_equal(old, new),
            _ => false,
        }
    }

    /// Like [`is_equal`](Self::is_equal), reporting the first divergence.
    ///
    /// A missing side is reported at the root as [`Divergence::Absent`].
    pub fn is_equal_traced(&self, sink: &mut dyn TraceSink) -> bool {
        match (&self.old, &self.new) {
            (None, None) => true,
            (Some(old), Some(new)) => deep_equal_traced(old, new, sink),
            (None, Some(_)) => {
                sink.divergence(&Path::root(), &Divergence::Absent { side: Side::Left });
                false
            }
            (Some(_), None) => {
                sink.divergence(&Path::root(), &Divergence::Absent { side: Side::Right });
                false
            }
        }
    }

    /// Negation of [`Comparison::is_equal`].
    pub fn is_unequal(&self) -> bool {
        !self.is_equal()
    }

    /// Elements of the new sequence with no deep-equal element anywhere in
    /// the old sequence. Unmatched duplicates are all kept.
    pub fn added_array_values(&self) -> DiffResult<Vec<Value>> {
        let (old, new) = self.sequences("added_array_values")?;
        Ok(unmatched(new, old))
    }

    /// Elements of the old sequence with no deep-equal element anywhere in
    /// the new sequence.
    pub fn removed_array_values(&self) -> DiffResult<Vec<Value>> {
        let (old, new) = self.sequences("removed_array_values")?;
        Ok(unmatched(old, new))
    }

    /// `new - old`, with an absent side counted as zero.
    ///
    /// NaN and infinite operands also count as zero.
    pub fn numerical_diff(&self) -> DiffResult<f64> {
        let is_number = |side: Option<&Value>| side.map_or(true, |v| v.as_f64().is_some());
        if !is_number(self.old()) || !is_number(self.new_value()) {
            return Err(DiffError::TypePrecondition {
                operation: "numerical_diff",
                requirement: Requirement::Numbers,
            });
        }
        Ok(finite_or_zero(self.new_value()) - finite_or_zero(self.old()))
    }

    /// Per-field numeric movement between two mappings.
    ///
    /// An absent side counts as an empty mapping. See
    /// [`numeric_diff_between`] for the pruning rules.
    pub fn object_numerical_diff(&self) -> DiffResult<NumericDiffTree> {
        let (old, new) = self.mappings("object_numerical_diff")?;
        Ok(numeric_diff_between(old, new))
    }

    /// Key-level changes between two mappings (absent counts as empty).
    pub fn mapping_changes(&self) -> DiffResult<MappingDiff> {
        let (old, new) = self.mappings("mapping_changes")?;
        Ok(diff_mappings(old, new))
    }

    /// Keys present in the new mapping only.
    pub fn added_keys(&self) -> DiffResult<Vec<String>> {
        let (old, new) = self.mappings("added_keys")?;
        Ok(new.keys().filter(|k| !old.contains_key(*k)).cloned().collect())
    }

    /// Keys present in the old mapping only.
    pub fn removed_keys(&self) -> DiffResult<Vec<String>> {
        let (old, new) = self.mappings("removed_keys")?;
        Ok(old.keys().filter(|k| !new.contains_key(*k)).cloned().collect())
    }

    /// Keys whose value is missing on one side or not deep-equal, sorted.
    pub fn changed_keys(&self) -> DiffResult<Vec<String>> {
        let (old, new) = self.mappings("changed_keys")?;
        Ok(diff_mappings(old, new).keys().map(str::to_string).collect())
    }

    fn sequences(&self, operation: &'static str) -> DiffResult<(&[Value], &[Value])> {
        match (
            self.old.as_ref().and_then(Value::as_sequence),
            self.new.as_ref().and_then(Value::as_sequence),
        ) {
            (Some(old), Some(new)) => Ok((old.as_slice(), new.as_slice())),
            _ => Err(DiffError::TypePrecondition {
                operation,
                requirement: Requirement::Arrays,
            }),
        }
    }

    fn mappings(&self, operation: &'static str) -> DiffResult<(&Mapping, &Mapping)> {
        let err = || DiffError::TypePrecondition {
            operation,
            requirement: Requirement::Objects,
        };
        let old = mapping_or_empty(self.old.as_ref()).ok_or_else(err)?;
        let new = mapping_or_empty(self.new.as_ref()).ok_or_else(err)?;
        Ok((old, new))
    }
}

static EMPTY: Mapping = Mapping::new();

fn mapping_or_empty(side: Option<&Value>) -> Option<&Mapping> {
    match side {
        None => Some(&EMPTY),
        Some(value) => value.as_mapping(),
    }
}

fn unmatched(from: &[Value], against: &[Value]) -> Vec<Value> {
    from.iter()
        .filter(|item| !against.iter().any(|other| deep_equal(item, other)))
        .cloned()
        .collect()
}

impl From<(Value, Value)> for Comparison {
    fn from((old, new): (Value, Value)) -> Self {
        Self::between(old, new)
    }
}
