use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use firepower_store::DocPath;

use crate::error::{TriggerError, TriggerResult};

#[derive(Clone, Debug, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// A document path whose segments are literal ids or `{name}` wildcards.
///
/// `users/{uid}/posts/{postId}` matches `users/alice/posts/p1` and binds
/// `uid = "alice"`, `postId = "p1"`. Patterns always name documents, so
/// they have an even number of segments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Parse a slash pattern such as `users/{uid}/posts/{postId}`.
    pub fn parse(raw: &str) -> TriggerResult<Self> {
        let invalid = |reason: &str| TriggerError::InvalidPattern {
            pattern: raw.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = raw.trim_matches('/');
        if trimmed.is_empty() {
            return Err(invalid("pattern is empty"));
        }

        let mut segments = Vec::new();
        let mut names = BTreeSet::new();
        for part in trimmed.split('/') {
            if part.is_empty() {
                return Err(invalid("empty segment"));
            }
            match part.strip_prefix('{').and_then(|p| p.strip_suffix('}')) {
                Some(name) => {
                    if name.is_empty() || name.contains(['{', '}']) {
                        return Err(invalid("malformed parameter"));
                    }
                    if !names.insert(name.to_string()) {
                        return Err(invalid(&format!("duplicate parameter `{name}`")));
                    }
                    segments.push(Segment::Param(name.to_string()));
                }
                None if part.contains(['{', '}']) => return Err(invalid("malformed parameter")),
                None => segments.push(Segment::Literal(part.to_string())),
            }
        }

        if segments.len() % 2 != 0 {
            return Err(invalid("pattern must name a document"));
        }
        Ok(Self {
            raw: trimmed.to_string(),
            segments,
        })
    }

    /// The pattern as written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Parameter names in the order they appear.
    pub fn params(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Param(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Match a document path, returning the bound parameters on success.
    pub fn matches(&self, path: &DocPath) -> Option<BTreeMap<String, String>> {
        let parts: Vec<&str> = path.as_str().split('/').collect();
        if parts.len() != self.segments.len() {
            return None;
        }

        let mut params = BTreeMap::new();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Literal(literal) if literal == part => {}
                Segment::Literal(_) => return None,
                Segment::Param(name) => {
                    params.insert(name.clone(), part.to_string());
                }
            }
        }
        Some(params)
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl std::str::FromStr for PathPattern {
    type Err = TriggerError;

    fn from_str(s: &str) -> TriggerResult<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(path: &str) -> DocPath {
        DocPath::parse(path).unwrap()
    }

    #[test]
    fn extracts_params() {
        let pattern = PathPattern::parse("users/{uid}/posts/{postId}").unwrap();
        let params = pattern.matches(&doc("users/alice/posts/p1")).unwrap();
        assert_eq!(params.get("uid").map(String::as_str), Some("alice"));
        assert_eq!(params.get("postId").map(String::as_str), Some("p1"));
        assert_eq!(pattern.params().collect::<Vec<_>>(), vec!["uid", "postId"]);
    }

    #[test]
    fn literal_pattern_matches_exactly() {
        let pattern = PathPattern::parse("config/main").unwrap();
        assert_eq!(pattern.matches(&doc("config/main")), Some(BTreeMap::new()));
        assert_eq!(pattern.matches(&doc("config/other")), None);
    }

    #[test]
    fn depth_must_match() {
        let pattern = PathPattern::parse("users/{uid}").unwrap();
        assert!(pattern.matches(&doc("users/alice/posts/p1")).is_none());
        assert!(pattern.matches(&doc("posts/p1")).is_none());
    }

    #[test]
    fn surrounding_slashes_are_ignored() {
        let pattern = PathPattern::parse("/users/{uid}/").unwrap();
        assert_eq!(pattern.as_str(), "users/{uid}");
        assert_eq!(pattern.to_string(), "users/{uid}");
    }

    #[test]
    fn rejects_malformed_patterns() {
        for raw in ["", "/", "users", "users//x", "users/{}", "users/{uid", "users/x}y", "a/{id}/b/{id}"] {
            let err = PathPattern::parse(raw).unwrap_err();
            assert!(matches!(err, TriggerError::InvalidPattern { .. }), "{raw}");
        }
    }
}
