use std::fmt;

use serde::{Deserialize, Serialize};

/// Classification of a [`Value`](crate::Value).
///
/// Every value has exactly one kind. `Null` is its own kind and is never
/// folded into `Mapping`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    Null,
    Boolean,
    Number,
    Text,
    Sequence,
    Mapping,
    Sentinel,
}

impl Kind {
    /// Lowercase name used in messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean => "boolean",
            Self::Number => "number",
            Self::Text => "text",
            Self::Sequence => "sequence",
            Self::Mapping => "mapping",
            Self::Sentinel => "sentinel",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_as_str() {
        assert_eq!(Kind::Mapping.to_string(), "mapping");
        assert_eq!(Kind::Null.to_string(), "null");
    }

    #[test]
    fn serde_uses_snake_case() {
        let json = serde_json::to_string(&Kind::Sequence).unwrap();
        assert_eq!(json, "\"sequence\"");
    }
}
