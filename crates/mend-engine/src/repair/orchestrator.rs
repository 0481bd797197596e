//! The top-level auto-debugging search.
//!
//! Localize, generate, test, refine. Improvement candidates open recursive
//! refinement frames; a frame that dies decrements the shared depth
//! counter and leaves nothing behind in its parent's candidate list. Total
//! failure rolls the reported observation back to the pre-search one.

use mend_core::config::{AbductionSchema, RepairConfig};
use mend_core::errors::RepairError;
use mend_core::suite::TestSuite;
use mend_core::types::{
    all_passed, explanatory_power, Behavior, Hypothesis, InfluencePath, Observation,
    SourceProgram,
};
use mend_core::PatternStore;

use crate::syntax::normalize_program;

use super::generator::HypothesisGenerator;
use super::tester::{test_hypothesis, ModelTester};

/// Result of a fault-localization pass.
#[derive(Debug)]
pub struct LocalizationReport {
    /// The normalized program the observation refers to.
    pub program: SourceProgram,
    /// `Valid` when every test already passes, `Undefined` otherwise.
    pub behavior: Behavior,
    pub observation: Observation,
    pub influence_path: InfluencePath,
}

/// Final outcome of one auto-debug run.
#[derive(Debug)]
pub struct RepairOutcome {
    /// The repaired program, or `None` when the search failed (or when the
    /// input was already `Valid`).
    pub repaired: Option<SourceProgram>,
    pub behavior: Behavior,
    /// Observation of the original program before any hypothesis.
    pub prior_observation: Observation,
    /// Observation of the winning candidate; on failure this rolls back to
    /// the prior observation.
    pub final_observation: Observation,
    /// The hypothesis that produced the repair.
    pub hypothesis: Option<Hypothesis>,
    /// Improvement hypotheses on the successful refinement path, in
    /// application order. Dead branches leave no trace here.
    pub audit_trail: Vec<Hypothesis>,
    /// Depth of the successful refinement chain (0 = repaired in the root
    /// frame).
    pub refinement_depth: u32,
}

/// Localize the defect: run the suite with no prior observation and rank
/// suspicious statements.
pub fn localize(
    source: &str,
    target: &str,
    suite: &TestSuite,
    config: &RepairConfig,
) -> Result<LocalizationReport, RepairError> {
    if suite.is_empty() {
        return Err(RepairError::EmptyTestSuite);
    }
    let program = normalize_program(source)?;
    let report = ModelTester::new(program.clone(), target, suite, config).run(false);
    let behavior = if all_passed(&report.observation) {
        Behavior::Valid
    } else {
        Behavior::Undefined
    };
    tracing::info!(
        behavior = %behavior,
        suspicious_locations = report.influence_path.len(),
        "fault localization finished"
    );
    Ok(LocalizationReport {
        program,
        behavior,
        observation: report.observation,
        influence_path: report.influence_path,
    })
}

struct SearchSuccess {
    program: SourceProgram,
    observation: Observation,
    hypothesis: Hypothesis,
}

struct ImprovementCandidate {
    program: SourceProgram,
    observation: Observation,
    influence_path: InfluencePath,
    hypothesis: Hypothesis,
    power: f64,
}

/// The search loop state shared across refinement frames.
pub struct AutoDebugger<'a> {
    store: &'a dyn PatternStore,
    config: &'a RepairConfig,
    target: String,
    suite: &'a TestSuite,
    depth: u32,
    audit: Vec<Hypothesis>,
    last_behavior: Behavior,
}

impl<'a> AutoDebugger<'a> {
    pub fn new(
        store: &'a dyn PatternStore,
        config: &'a RepairConfig,
        target: impl Into<String>,
        suite: &'a TestSuite,
    ) -> Self {
        Self {
            store,
            config,
            target: target.into(),
            suite,
            depth: 0,
            audit: Vec::new(),
            last_behavior: Behavior::Undefined,
        }
    }

    /// Current refinement depth; after a successful run it reflects the
    /// depth of the winning chain.
    pub fn refinement_depth(&self) -> u32 {
        self.depth
    }

    pub fn run(&mut self, source: &str) -> Result<RepairOutcome, RepairError> {
        let localization = localize(source, &self.target, self.suite, self.config)?;
        if localization.behavior == Behavior::Valid {
            tracing::info!("no defect: the program already passes its suite");
            return Ok(RepairOutcome {
                repaired: None,
                behavior: Behavior::Valid,
                prior_observation: localization.observation.clone(),
                final_observation: localization.observation,
                hypothesis: None,
                audit_trail: Vec::new(),
                refinement_depth: 0,
            });
        }
        let prior_observation = localization.observation.clone();
        let success = self.search(
            localization.program,
            localization.observation,
            localization.influence_path,
        );
        match success {
            Some(success) => {
                tracing::info!(
                    hypothesis = %success.hypothesis.text,
                    line = success.hypothesis.line,
                    depth = self.depth,
                    "successful repair"
                );
                Ok(RepairOutcome {
                    repaired: Some(success.program),
                    behavior: Behavior::Correct,
                    prior_observation,
                    final_observation: success.observation,
                    hypothesis: Some(success.hypothesis),
                    audit_trail: std::mem::take(&mut self.audit),
                    refinement_depth: self.depth,
                })
            }
            None => {
                tracing::info!("unable to repair: every search avenue is exhausted");
                Ok(RepairOutcome {
                    repaired: None,
                    behavior: self.last_behavior,
                    prior_observation: prior_observation.clone(),
                    final_observation: prior_observation,
                    hypothesis: None,
                    audit_trail: Vec::new(),
                    refinement_depth: self.depth,
                })
            }
        }
    }

    /// One search frame over one program version.
    fn search(
        &mut self,
        program: SourceProgram,
        prev_observation: Observation,
        influence_path: InfluencePath,
    ) -> Option<SearchSuccess> {
        let mut generator = HypothesisGenerator::new(
            self.store,
            program.clone(),
            influence_path,
            self.config.effective_max_complexity(),
        );
        let mut improvements: Vec<ImprovementCandidate> = Vec::new();

        while let Some(hypothesis) = generator.next() {
            let verdict = test_hypothesis(
                &prev_observation,
                &program,
                &self.target,
                self.suite,
                &hypothesis,
                self.config,
            );
            self.last_behavior = verdict.behavior;
            tracing::info!(
                behavior = %verdict.behavior,
                line = hypothesis.line,
                hypothesis = %hypothesis.text,
                breadth = generator.abduction_breadth(),
                "tested hypothesis"
            );
            match verdict.behavior {
                Behavior::Correct => {
                    return Some(SearchSuccess {
                        program: verdict.program,
                        observation: verdict.observation,
                        hypothesis,
                    });
                }
                Behavior::Improvement => {
                    let power = explanatory_power(&verdict.observation);
                    improvements.push(ImprovementCandidate {
                        program: verdict.program,
                        observation: verdict.observation,
                        influence_path: verdict.influence_path,
                        hypothesis,
                        power,
                    });
                    if self.config.effective_schema() == AbductionSchema::Dfs {
                        if let Some(candidate) = improvements.pop() {
                            if let Some(success) = self.refine(candidate) {
                                return Some(success);
                            }
                        }
                    }
                }
                _ => {}
            }
        }

        // BFS/A* refine after the ranked generator is exhausted; the frame's
        // candidate list is consumed here and never leaks upward.
        if self.config.effective_schema() != AbductionSchema::Dfs {
            let mut batch = std::mem::take(&mut improvements);
            if self.config.effective_schema() == AbductionSchema::AStar {
                // Stable sort: equal explanatory power keeps discovery order.
                batch.sort_by(|a, b| {
                    b.power
                        .partial_cmp(&a.power)
                        .unwrap_or(std::cmp::Ordering::Equal)
                });
            }
            for candidate in batch {
                if let Some(success) = self.refine(candidate) {
                    return Some(success);
                }
            }
        }
        None
    }

    /// Open a refinement frame for an improvement candidate; on failure the
    /// branch is discarded and the shared depth counter backtracks.
    fn refine(&mut self, candidate: ImprovementCandidate) -> Option<SearchSuccess> {
        if self.depth >= self.config.effective_max_refinement_depth() {
            tracing::debug!(
                depth = self.depth,
                "refinement depth limit reached; dropping candidate"
            );
            return None;
        }
        self.depth += 1;
        self.audit.push(candidate.hypothesis.clone());
        tracing::info!(
            depth = self.depth,
            hypothesis = %candidate.hypothesis.text,
            "refining improvement candidate"
        );
        let result = self.search(
            candidate.program,
            candidate.observation,
            candidate.influence_path,
        );
        if result.is_none() {
            self.audit.pop();
            self.depth -= 1;
        }
        result
    }
}

/// Run one full auto-debug pass over `source`.
pub fn run_auto_debug(
    target: &str,
    source: &str,
    suite: &TestSuite,
    store: &dyn PatternStore,
    config: &RepairConfig,
) -> Result<RepairOutcome, RepairError> {
    AutoDebugger::new(store, config, target, suite).run(source)
}
