//! Timeout containment.
//!
//! A non-terminating target function must cost exactly one Failed outcome,
//! settle within the deadline plus scheduling slack, and leave the
//! following test cases untouched.

use std::time::{Duration, Instant};

use mend_core::config::RepairConfig;
use mend_core::suite::{ArgValue, TestCase, TestSuite};
use mend_core::types::TestOutcome;
use mend_core::types::SourceProgram;
use mend_engine::repair::ModelTester;

const SPINNER: &str = "\
def wait_for(n):
    while n < 0:
        pass
    return n
";

#[test]
fn timeout_fails_one_case_and_the_rest_still_run() {
    let suite = TestSuite::from_cases(vec![
        TestCase::new("hangs", "0", [ArgValue::Int(-1)]),
        TestCase::new("returns", "3", [ArgValue::Int(3)]),
    ]);
    let cfg = RepairConfig::new(Duration::from_millis(150));
    let program = SourceProgram::from_text(SPINNER);

    let start = Instant::now();
    let report = ModelTester::new(program, "wait_for", &suite, &cfg).run(false);
    let elapsed = start.elapsed();

    assert_eq!(report.observation[0].outcome, TestOutcome::Failed);
    assert_eq!(report.observation[1].outcome, TestOutcome::Passed);
    // Deadline plus generous scheduling slack; without the interrupt this
    // test would hang forever.
    assert!(elapsed < Duration::from_secs(5), "took {elapsed:?}");
}

#[test]
fn deadline_does_not_bleed_into_later_cases() {
    // Three fast cases after the hanging one: all must run and pass.
    let suite = TestSuite::from_cases(vec![
        TestCase::new("hangs", "0", [ArgValue::Int(-1)]),
        TestCase::new("a", "1", [ArgValue::Int(1)]),
        TestCase::new("b", "2", [ArgValue::Int(2)]),
        TestCase::new("c", "3", [ArgValue::Int(3)]),
    ]);
    let cfg = RepairConfig::new(Duration::from_millis(100));
    let program = SourceProgram::from_text(SPINNER);
    let report = ModelTester::new(program, "wait_for", &suite, &cfg).run(false);

    let outcomes: Vec<TestOutcome> = report.observation.iter().map(|r| r.outcome).collect();
    assert_eq!(
        outcomes,
        vec![
            TestOutcome::Failed,
            TestOutcome::Passed,
            TestOutcome::Passed,
            TestOutcome::Passed,
        ]
    );
}
