use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Number;

/// An identifier GitLab sends as a JSON number in some deliveries and as a
/// string in others.
///
/// Use `Option<FlexId>` for the field; an absent key or `null` is `None`.
/// Numbers that do not fit `i64` (floats, large unsigned) land in `Number`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlexId {
    Int(i64),
    Number(Number),
    Text(String),
}

impl FlexId {
    /// Numeric value, also for digit-only text.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FlexId::Int(n) => Some(*n),
            FlexId::Number(n) => n.as_i64(),
            FlexId::Text(s) => s.parse().ok(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FlexId::Int(_) | FlexId::Number(_) => None,
            FlexId::Text(s) => Some(s),
        }
    }
}

impl From<i64> for FlexId {
    fn from(n: i64) -> Self {
        FlexId::Int(n)
    }
}

impl From<&str> for FlexId {
    fn from(s: &str) -> Self {
        FlexId::Text(s.to_string())
    }
}

impl From<String> for FlexId {
    fn from(s: String) -> Self {
        FlexId::Text(s)
    }
}

impl fmt::Display for FlexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlexId::Int(n) => write!(f, "{}", n),
            FlexId::Number(n) => write!(f, "{}", n),
            FlexId::Text(s) => f.write_str(s),
        }
    }
}
