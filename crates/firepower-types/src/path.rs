use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// One step from a node to one of its children.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    /// A mapping key.
    Key(String),
    /// A sequence index.
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => f.write_str(key),
            Self::Index(index) => write!(f, "{index}"),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        Self::Key(key.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        Self::Key(key)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

/// Location of a node inside a value tree, as keys and indices from the root.
///
/// Displays as the segments joined with `.`; the empty path displays as
/// `<root>`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path(Vec<PathSegment>);

impl Path {
    /// The empty path, addressing the root itself.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a dotted field path such as `profile.address.city`.
    ///
    /// Every segment becomes a [`PathSegment::Key`], including numeric ones.
    pub fn from_dotted(dotted: &str) -> Result<Self, TypeError> {
        if dotted.is_empty() {
            return Err(TypeError::InvalidFieldPath(dotted.to_string()));
        }
        dotted
            .split('.')
            .map(|segment| {
                if segment.is_empty() {
                    Err(TypeError::InvalidFieldPath(dotted.to_string()))
                } else {
                    Ok(PathSegment::Key(segment.to_string()))
                }
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }

    /// Returns `true` for the root path.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the path has no segments.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The segments from the root.
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    /// A new path with `segment` appended.
    pub fn child(&self, segment: impl Into<PathSegment>) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        Self(segments)
    }

    /// Append a segment in place.
    pub fn push(&mut self, segment: impl Into<PathSegment>) {
        self.0.push(segment.into());
    }

    /// Remove the last segment.
    pub fn pop(&mut self) -> Option<PathSegment> {
        self.0.pop()
    }

    /// The last segment, if any.
    pub fn last(&self) -> Option<&PathSegment> {
        self.0.last()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("<root>");
        }
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl From<Vec<PathSegment>> for Path {
    fn from(segments: Vec<PathSegment>) -> Self {
        Self(segments)
    }
}

impl FromIterator<PathSegment> for Path {
    fn from_iter<I: IntoIterator<Item = PathSegment>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_displays_placeholder() {
        assert_eq!(Path::root().to_string(), "<root>");
        assert!(Path::root().is_root());
    }

    #[test]
    fn display_joins_with_dots() {
        let path = Path::root().child("c").child(3usize).child("c2");
        assert_eq!(path.to_string(), "c.3.c2");
        assert_eq!(path.len(), 3);
    }

    #[test]
    fn push_and_pop() {
        let mut path = Path::root();
        path.push("a");
        path.push(0usize);
        assert_eq!(path.pop(), Some(PathSegment::Index(0)));
        assert_eq!(path.last(), Some(&PathSegment::Key("a".into())));
    }

    #[test]
    fn dotted_paths_are_keys() {
        let path = Path::from_dotted("profile.0.city").unwrap();
        assert_eq!(
            path.segments(),
            &[
                PathSegment::Key("profile".into()),
                PathSegment::Key("0".into()),
                PathSegment::Key("city".into()),
            ]
        );
    }

    #[test]
    fn dotted_rejects_empty_segments() {
        assert!(Path::from_dotted("").is_err());
        assert!(Path::from_dotted("a..b").is_err());
        assert!(Path::from_dotted(".a").is_err());
    }

    #[test]
    fn serializes_as_array() {
        let path = Path::root().child("a").child(1usize);
        let json = serde_json::to_string(&path).unwrap();
        assert_eq!(json, r#"["a",1]"#);
    }
}
