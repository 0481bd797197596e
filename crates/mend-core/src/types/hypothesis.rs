//! Hypotheses and influence paths.

use serde::{Deserialize, Serialize};

/// Ranked suspicious locations: `(function name, 1-based line)`, most
/// suspicious first. Produced once per fault-localization pass and consumed
/// left to right.
pub type InfluencePath = Vec<(String, u32)>;

/// One candidate replacement statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hypothesis {
    /// Replacement statement text (single logical line, no indentation).
    pub text: String,
    /// 1-based line the replacement applies to.
    pub line: u32,
    /// Complexity of the pattern that produced it.
    pub complexity: usize,
}

impl Hypothesis {
    pub fn new(text: impl Into<String>, line: u32, complexity: usize) -> Self {
        Self {
            text: text.into(),
            line,
            complexity,
        }
    }
}
