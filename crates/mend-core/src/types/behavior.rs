//! Behavior classification of a tested hypothesis.

use serde::{Deserialize, Serialize};

/// Effect of a hypothesis relative to the previous observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Behavior {
    /// Strictly more tests pass than before.
    Improvement,
    /// Fewer tests pass, or the run was inconsistent with the previous
    /// observation.
    Worsened,
    /// Same explanatory power as before.
    Same,
    /// Every test passes: the repair is complete.
    Correct,
    /// The original program already passes every test; there is no defect
    /// to repair.
    Valid,
    /// No classification yet.
    Undefined,
}

impl std::fmt::Display for Behavior {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Improvement => "Improvement",
            Self::Worsened => "Worsened",
            Self::Same => "Same",
            Self::Correct => "Correct",
            Self::Valid => "Valid",
            Self::Undefined => "Undefined",
        };
        f.write_str(name)
    }
}
