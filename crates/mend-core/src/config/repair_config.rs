//! Configuration for a repair pass.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Exploration order for improvement-candidate refinement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AbductionSchema {
    /// Recurse into an improvement candidate as soon as it appears.
    #[default]
    Dfs,
    /// Exhaust the ranked generator first, then refine candidates in
    /// discovery order.
    Bfs,
    /// Exhaust the ranked generator first, then refine candidates by
    /// descending explanatory power; equal-power candidates keep
    /// discovery order.
    AStar,
}

/// Configuration threaded through the repair engine's constructors.
///
/// The per-test-case wall-clock timeout has no default: candidate programs
/// are arbitrary user code and the caller must decide how long a single
/// invocation may run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepairConfig {
    /// Wall-clock budget for one test-case invocation, in milliseconds.
    pub test_timeout_ms: u64,
    /// Events below this suspiciousness are dropped before ranking.
    /// Default: 0.0 (keep everything Ochiai assigns a value to).
    #[serde(default)]
    pub susp_threshold: Option<f64>,
    /// Maximum fix-pattern complexity (abstracted identifier slots).
    /// Default: 3.
    #[serde(default)]
    pub max_complexity: Option<usize>,
    /// Refinement exploration order. Default: DFS.
    #[serde(default)]
    pub schema: Option<AbductionSchema>,
    /// Maximum depth of recursive refinement. Default: 3.
    #[serde(default)]
    pub max_refinement_depth: Option<u32>,
}

impl RepairConfig {
    /// Create a configuration with the required test timeout and defaults
    /// for everything else.
    pub fn new(test_timeout: Duration) -> Self {
        Self {
            test_timeout_ms: test_timeout.as_millis() as u64,
            susp_threshold: None,
            max_complexity: None,
            schema: None,
            max_refinement_depth: None,
        }
    }

    pub fn with_schema(mut self, schema: AbductionSchema) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn with_max_complexity(mut self, max_complexity: usize) -> Self {
        self.max_complexity = Some(max_complexity);
        self
    }

    pub fn with_susp_threshold(mut self, threshold: f64) -> Self {
        self.susp_threshold = Some(threshold);
        self
    }

    pub fn test_timeout(&self) -> Duration {
        Duration::from_millis(self.test_timeout_ms)
    }

    pub fn effective_susp_threshold(&self) -> f64 {
        self.susp_threshold.unwrap_or(0.0)
    }

    pub fn effective_max_complexity(&self) -> usize {
        self.max_complexity.unwrap_or(3)
    }

    pub fn effective_schema(&self) -> AbductionSchema {
        self.schema.unwrap_or_default()
    }

    pub fn effective_max_refinement_depth(&self) -> u32 {
        self.max_refinement_depth.unwrap_or(3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = RepairConfig::new(Duration::from_secs(2));
        assert_eq!(cfg.test_timeout(), Duration::from_secs(2));
        assert_eq!(cfg.effective_susp_threshold(), 0.0);
        assert_eq!(cfg.effective_max_complexity(), 3);
        assert_eq!(cfg.effective_schema(), AbductionSchema::Dfs);
        assert_eq!(cfg.effective_max_refinement_depth(), 3);
    }

    #[test]
    fn deserializes_with_only_timeout() {
        let cfg: RepairConfig = serde_json::from_str(r#"{"test_timeout_ms": 500}"#).unwrap();
        assert_eq!(cfg.test_timeout(), Duration::from_millis(500));
        assert_eq!(cfg.effective_schema(), AbductionSchema::Dfs);
    }
}
