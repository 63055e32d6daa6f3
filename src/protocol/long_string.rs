//! Long string grips.
//!
//! The host sends strings that exceed its inline limit as a grip:
//!
//! ```json
//! { "type": "longString", "actor": "conn0.longString12", "length": 81920, "initial": "..." }
//! ```
//!
//! Any field that may carry such a grip is typed as [`LongString`], which
//! also accepts a plain JSON string.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};

// ============================================================================
// LongStringGrip
// ============================================================================

/// Reference to a string held by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LongStringGrip {
    /// Always `"longString"`.
    #[serde(rename = "type")]
    pub grip_type: String,

    /// Actor that serves the full text.
    pub actor: String,

    /// Full length of the string in characters.
    #[serde(default)]
    pub length: u64,

    /// Inline prefix of the text.
    #[serde(default)]
    pub initial: String,
}

impl LongStringGrip {
    /// Creates a grip for the given actor.
    #[must_use]
    pub fn new(actor: impl Into<String>, length: u64, initial: impl Into<String>) -> Self {
        Self {
            grip_type: "longString".to_string(),
            actor: actor.into(),
            length,
            initial: initial.into(),
        }
    }
}

// ============================================================================
// LongString
// ============================================================================

/// A string that may still have to be fetched from the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LongString {
    /// Text already available.
    Literal(String),

    /// Text held by the host.
    Reference(LongStringGrip),
}

impl LongString {
    /// Returns `true` if no host round-trip is needed.
    #[inline]
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Literal(_))
    }

    /// Returns the text if it is already available.
    #[inline]
    #[must_use]
    pub fn as_literal(&self) -> Option<&str> {
        match self {
            Self::Literal(text) => Some(text),
            Self::Reference(_) => None,
        }
    }
}

impl Default for LongString {
    fn default() -> Self {
        Self::Literal(String::new())
    }
}

impl From<&str> for LongString {
    #[inline]
    fn from(value: &str) -> Self {
        Self::Literal(value.to_string())
    }
}

impl From<String> for LongString {
    #[inline]
    fn from(value: String) -> Self {
        Self::Literal(value)
    }
}

impl From<LongStringGrip> for LongString {
    #[inline]
    fn from(value: LongStringGrip) -> Self {
        Self::Reference(value)
    }
}

// ============================================================================
// Tests
// ============================================================================
