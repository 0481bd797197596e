//! Test observations and explanatory power.

use serde::{Deserialize, Serialize};

/// Outcome of one test case within one model run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TestOutcome {
    Passed,
    Failed,
    /// The case was never reached (consistency halt, or the run ended
    /// before this position).
    Undefined,
}

/// One position of an observation: the case label and its outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestResult {
    pub case: String,
    pub outcome: TestOutcome,
}

impl TestResult {
    pub fn new(case: impl Into<String>, outcome: TestOutcome) -> Self {
        Self {
            case: case.into(),
            outcome,
        }
    }
}

/// Ordered outcomes of a whole suite run; positions correspond 1:1 to the
/// suite's declared order.
pub type Observation = Vec<TestResult>;

/// Fraction of the suite that passed; 0.0 for an empty observation.
/// Equals 1.0 exactly when every outcome is `Passed`.
pub fn explanatory_power(observation: &Observation) -> f64 {
    if observation.is_empty() {
        return 0.0;
    }
    let passed = observation
        .iter()
        .filter(|r| r.outcome == TestOutcome::Passed)
        .count();
    passed as f64 / observation.len() as f64
}

pub fn all_passed(observation: &Observation) -> bool {
    !observation.is_empty()
        && observation
            .iter()
            .all(|r| r.outcome == TestOutcome::Passed)
}

/// Pairwise consistency: a case that passed before must not fail now.
/// Observations of different lengths are inconsistent by definition.
pub fn is_consistent(prev: &Observation, curr: &Observation) -> bool {
    if prev.len() != curr.len() {
        return false;
    }
    prev.iter().zip(curr.iter()).all(|(p, c)| {
        !(p.outcome == TestOutcome::Passed && c.outcome == TestOutcome::Failed)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(outcomes: &[TestOutcome]) -> Observation {
        outcomes
            .iter()
            .enumerate()
            .map(|(i, o)| TestResult::new(format!("t{}", i + 1), *o))
            .collect()
    }

    #[test]
    fn power_is_one_iff_all_passed() {
        use TestOutcome::*;
        assert_eq!(explanatory_power(&obs(&[Passed, Passed])), 1.0);
        assert!(explanatory_power(&obs(&[Passed, Failed])) < 1.0);
        assert!(explanatory_power(&obs(&[Passed, Undefined])) < 1.0);
        assert_eq!(explanatory_power(&Vec::new()), 0.0);
    }

    #[test]
    fn consistency_flags_pass_to_fail_regressions() {
        use TestOutcome::*;
        assert!(is_consistent(&obs(&[Passed, Failed]), &obs(&[Passed, Passed])));
        assert!(!is_consistent(&obs(&[Passed, Passed]), &obs(&[Passed, Failed])));
        // Undefined is not a regression.
        assert!(is_consistent(&obs(&[Passed, Passed]), &obs(&[Passed, Undefined])));
        // Length mismatch is inconsistent.
        assert!(!is_consistent(&obs(&[Passed]), &obs(&[Passed, Passed])));
    }
}
