//! Model testing: run a candidate program against the suite, observe
//! outcomes, and classify hypothesis behavior.

use mend_core::config::RepairConfig;
use mend_core::suite::TestSuite;
use mend_core::types::{
    all_passed, explanatory_power, is_consistent, Behavior, Hypothesis, InfluencePath,
    Observation, SourceProgram, TestOutcome, TestResult,
};

use crate::coverage::{CoverageCollector, SpectrumDebugger};
use crate::runtime::{value_from_arg, Deadline, Interpreter, Module};
use crate::syntax::ast::Node;
use crate::syntax::parser::parse_module;

/// Result of one full suite run over one candidate.
#[derive(Debug)]
pub struct TestReport {
    pub observation: Observation,
    pub influence_path: InfluencePath,
}

/// Runs a candidate program's target function over the whole suite.
///
/// The candidate loads as a fresh module; each test case runs under its own
/// wall-clock deadline; every exception (import failure, runtime fault,
/// timeout) converts into a Failed outcome for that case and iteration
/// continues. With consistency checking on, a PASS->FAIL regression against
/// the prior observation halts the run, leaving later cases Undefined.
pub struct ModelTester<'a> {
    program: SourceProgram,
    target: String,
    suite: &'a TestSuite,
    config: &'a RepairConfig,
    prev_observation: Option<Observation>,
}

impl<'a> ModelTester<'a> {
    pub fn new(
        program: SourceProgram,
        target: impl Into<String>,
        suite: &'a TestSuite,
        config: &'a RepairConfig,
    ) -> Self {
        Self {
            program,
            target: target.into(),
            suite,
            config,
            prev_observation: None,
        }
    }

    pub fn with_prev_observation(mut self, observation: Observation) -> Self {
        self.prev_observation = Some(observation);
        self
    }

    pub fn run(&self, check_consistency: bool) -> TestReport {
        let mut observation: Observation = self
            .suite
            .cases()
            .iter()
            .map(|case| TestResult::new(case.name.clone(), TestOutcome::Undefined))
            .collect();
        let mut debugger = SpectrumDebugger::new();

        let module_ast: Option<Node> = match parse_module(&self.program.text()) {
            Ok(ast) => Some(ast),
            Err(error) => {
                tracing::warn!(error = %error, "candidate does not parse");
                None
            }
        };
        let mut module = match &module_ast {
            Some(ast) => match Module::load(ast) {
                Ok(module) => Some(module),
                Err(error) => {
                    tracing::warn!(error = %error, "candidate module failed to load");
                    None
                }
            },
            None => None,
        };

        tracing::info!(target = %self.target, cases = self.suite.len(), "starting model test");
        for (position, case) in self.suite.cases().iter().enumerate() {
            tracing::debug!(case = %case.name, "running test case");
            let mut collector = CoverageCollector::new();
            let passed = match &mut module {
                Some(module) => {
                    let args: Vec<_> = case.args.iter().map(value_from_arg).collect();
                    let deadline = Deadline::arm(self.config.test_timeout());
                    let mut interpreter =
                        Interpreter::new(module, &mut collector, Some(deadline.flag()));
                    let result = interpreter.call_function(&self.target, args);
                    deadline.disarm();
                    match result {
                        Ok(value) => {
                            let actual = value.str_value();
                            tracing::debug!(
                                case = %case.name,
                                actual = %actual,
                                expected = %case.expected,
                                "comparing result"
                            );
                            actual == case.expected
                        }
                        Err(error) => {
                            tracing::debug!(case = %case.name, error = %error, "test case raised");
                            false
                        }
                    }
                }
                None => false,
            };

            if passed {
                observation[position].outcome = TestOutcome::Passed;
                debugger.add_pass(collector.into_events());
            } else {
                observation[position].outcome = TestOutcome::Failed;
                debugger.add_fail(collector.into_events());
            }

            if check_consistency && !passed && self.prev_passed(position) {
                tracing::info!(
                    case = %case.name,
                    position = position + 1,
                    "result is inconsistent with the previous observation; halting run"
                );
                break;
            }
        }
        tracing::info!("model test finished");

        let influence_path = match &module_ast {
            Some(ast) if !all_passed(&observation) => debugger.influence_path(
                ast,
                &self.target,
                self.config.effective_susp_threshold(),
            ),
            _ => Vec::new(),
        };
        TestReport {
            observation,
            influence_path,
        }
    }

    fn prev_passed(&self, position: usize) -> bool {
        self.prev_observation
            .as_ref()
            .and_then(|prev| prev.get(position))
            .is_some_and(|result| result.outcome == TestOutcome::Passed)
    }
}

/// The outcome of testing one hypothesis against a program version.
#[derive(Debug)]
pub struct HypothesisVerdict {
    pub program: SourceProgram,
    pub behavior: Behavior,
    pub observation: Observation,
    pub influence_path: InfluencePath,
}

/// Splice a hypothesis into its line, preserving the line's indentation.
pub fn apply_hypothesis(program: &SourceProgram, hypothesis: &Hypothesis) -> SourceProgram {
    let indent: String = program
        .line(hypothesis.line)
        .map(|line| {
            line.chars()
                .take_while(|c| !(c.is_alphanumeric() || *c == '_'))
                .collect()
        })
        .unwrap_or_default();
    program.with_line_replaced(hypothesis.line, format!("{indent}{}", hypothesis.text))
}

/// Build the candidate program for a hypothesis, test it with consistency
/// checking against the prior observation, and classify the behavior.
pub fn test_hypothesis(
    prev_observation: &Observation,
    program: &SourceProgram,
    target: &str,
    suite: &TestSuite,
    hypothesis: &Hypothesis,
    config: &RepairConfig,
) -> HypothesisVerdict {
    let candidate = apply_hypothesis(program, hypothesis);
    let report = ModelTester::new(candidate.clone(), target, suite, config)
        .with_prev_observation(prev_observation.clone())
        .run(true);
    let behavior = classify_behavior(prev_observation, &report.observation);
    HypothesisVerdict {
        program: candidate,
        behavior,
        observation: report.observation,
        influence_path: report.influence_path,
    }
}

/// Correct at full explanatory power; otherwise compare against the prior
/// observation. Inconsistent runs classify as Worsened outright.
pub fn classify_behavior(prev: &Observation, curr: &Observation) -> Behavior {
    if !is_consistent(prev, curr) {
        return Behavior::Worsened;
    }
    let prev_power = explanatory_power(prev);
    let curr_power = explanatory_power(curr);
    if curr_power == 1.0 {
        Behavior::Correct
    } else if prev_power < curr_power {
        Behavior::Improvement
    } else if prev_power == curr_power {
        Behavior::Same
    } else {
        Behavior::Worsened
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use mend_core::suite::{ArgValue, TestCase};

    fn config() -> RepairConfig {
        RepairConfig::new(Duration::from_secs(2))
    }

    fn suite(cases: Vec<TestCase>) -> TestSuite {
        TestSuite::from_cases(cases)
    }

    #[test]
    fn observation_positions_follow_suite_order() {
        let program = SourceProgram::from_text("def double(x):\n    return x * 2");
        let suite = suite(vec![
            TestCase::new("t1", "4", [ArgValue::Int(2)]),
            TestCase::new("t2", "9", [ArgValue::Int(3)]),
        ]);
        let cfg = config();
        let report = ModelTester::new(program, "double", &suite, &cfg).run(false);
        assert_eq!(report.observation[0].outcome, TestOutcome::Passed);
        assert_eq!(report.observation[1].outcome, TestOutcome::Failed);
        assert!(!report.influence_path.is_empty());
    }

    #[test]
    fn all_passing_short_circuits_localization() {
        let program = SourceProgram::from_text("def double(x):\n    return x * 2");
        let suite = suite(vec![TestCase::new("t1", "4", [ArgValue::Int(2)])]);
        let cfg = config();
        let report = ModelTester::new(program, "double", &suite, &cfg).run(false);
        assert!(all_passed(&report.observation));
        assert!(report.influence_path.is_empty());
    }

    #[test]
    fn missing_target_fails_every_case() {
        let program = SourceProgram::from_text("def other(x):\n    return x");
        let suite = suite(vec![
            TestCase::new("t1", "1", [ArgValue::Int(1)]),
            TestCase::new("t2", "2", [ArgValue::Int(2)]),
        ]);
        let cfg = config();
        let report = ModelTester::new(program, "absent", &suite, &cfg).run(false);
        assert!(report
            .observation
            .iter()
            .all(|r| r.outcome == TestOutcome::Failed));
    }

    #[test]
    fn consistency_halt_leaves_later_cases_undefined() {
        // Candidate fails t1 although it previously passed; t2 never runs.
        let program = SourceProgram::from_text("def f(x):\n    return 0");
        let suite = suite(vec![
            TestCase::new("t1", "1", [ArgValue::Int(1)]),
            TestCase::new("t2", "2", [ArgValue::Int(2)]),
        ]);
        let prev = vec![
            TestResult::new("t1", TestOutcome::Passed),
            TestResult::new("t2", TestOutcome::Passed),
        ];
        let cfg = config();
        let report = ModelTester::new(program, "f", &suite, &cfg)
            .with_prev_observation(prev)
            .run(true);
        assert_eq!(report.observation[0].outcome, TestOutcome::Failed);
        assert_eq!(report.observation[1].outcome, TestOutcome::Undefined);
    }

    #[test]
    fn hypothesis_splicing_preserves_indentation() {
        let program = SourceProgram::from_text("def f(x):\n    if x >= 1:\n        return x\n    return 0");
        let hypothesis = Hypothesis::new("if (x > 1):", 2, 2);
        let candidate = apply_hypothesis(&program, &hypothesis);
        assert_eq!(candidate.line(2), Some("    if (x > 1):"));
    }

    #[test]
    fn behavior_classification_matches_the_contract() {
        use TestOutcome::*;
        let obs = |outcomes: &[TestOutcome]| -> Observation {
            outcomes
                .iter()
                .enumerate()
                .map(|(i, o)| TestResult::new(format!("t{i}"), *o))
                .collect()
        };
        assert_eq!(
            classify_behavior(&obs(&[Failed, Failed]), &obs(&[Passed, Passed])),
            Behavior::Correct
        );
        assert_eq!(
            classify_behavior(&obs(&[Failed, Failed]), &obs(&[Passed, Failed])),
            Behavior::Improvement
        );
        assert_eq!(
            classify_behavior(&obs(&[Passed, Failed]), &obs(&[Passed, Failed])),
            Behavior::Same
        );
        assert_eq!(
            classify_behavior(&obs(&[Passed, Passed]), &obs(&[Passed, Failed])),
            Behavior::Worsened
        );
        // Raw pass counts tie, but the pass->fail regression wins.
        assert_eq!(
            classify_behavior(&obs(&[Failed, Passed]), &obs(&[Passed, Failed])),
            Behavior::Worsened
        );
    }
}
