//! Recursive refinement: DFS backtracking, depth accounting, and the
//! audit trail.
//!
//! The fixture program needs two rounds of patching. At the root frame two
//! different patterns yield Improvement candidates: the first leads to a
//! dead end (no pattern matches the patched statement), the second opens a
//! branch whose follow-up pattern completes the repair at depth 1.

use std::time::Duration;

use mend_core::config::{AbductionSchema, RepairConfig};
use mend_core::suite::{ArgValue, TestCase, TestSuite};
use mend_core::types::Behavior;
use mend_engine::abstraction::pattern_from_sources;
use mend_engine::{AutoDebugger, InMemoryPatternStore};

const PROGRAM: &str = "\
def f(n):
    r = n
    return r
";

fn suite() -> TestSuite {
    TestSuite::from_cases(vec![
        TestCase::new("t1", "2", [ArgValue::Int(0)]),
        TestCase::new("t2", "3", [ArgValue::Int(1)]),
        TestCase::new("t3", "4", [ArgValue::Int(2)]),
    ])
}

/// Corpus: two patterns match the original statement, one matches only the
/// second pattern's output.
fn store() -> InMemoryPatternStore {
    let mut store = InMemoryPatternStore::new();
    // Dead end: constant assignment satisfies t1 only, and nothing in the
    // corpus matches `r = 2` afterwards.
    store.insert(pattern_from_sources(1, "x = a\n", 1, "x = 2\n").unwrap());
    // Stepping stone: `r = (n + n)` satisfies t3 only.
    store.insert(pattern_from_sources(1, "x = a\n", 1, "x = a + b\n").unwrap());
    // Finisher: rewrites the doubled form into `r = (n + 2)`.
    store.insert(pattern_from_sources(1, "x = a + a\n", 1, "x = a + 2\n").unwrap());
    store
}

#[test]
fn dfs_finds_the_two_step_repair_at_depth_one() {
    let store = store();
    let suite = suite();
    let cfg = RepairConfig::new(Duration::from_secs(2));
    let mut debugger = AutoDebugger::new(&store, &cfg, "f", &suite);
    let outcome = debugger.run(PROGRAM).unwrap();

    assert_eq!(outcome.behavior, Behavior::Correct);
    assert_eq!(outcome.refinement_depth, 1, "exactly one successful recursion");
    assert_eq!(debugger.refinement_depth(), 1);

    let repaired = outcome.repaired.expect("repaired program");
    assert_eq!(repaired.line(2), Some("    r = (n + 2)"));
    assert_eq!(
        outcome.hypothesis.expect("winning hypothesis").text,
        "r = (n + 2)"
    );

    // The audit trail holds only the successful branch's improvement; the
    // dead-end branch (`r = 2`) left nothing behind.
    assert_eq!(outcome.audit_trail.len(), 1);
    assert_eq!(outcome.audit_trail[0].text, "r = (n + n)");
    assert!(outcome.audit_trail.iter().all(|h| h.text != "r = 2"));
}

#[test]
fn astar_reaches_the_same_repair_after_generator_exhaustion() {
    let store = store();
    let suite = suite();
    let cfg = RepairConfig::new(Duration::from_secs(2)).with_schema(AbductionSchema::AStar);
    let mut debugger = AutoDebugger::new(&store, &cfg, "f", &suite);
    let outcome = debugger.run(PROGRAM).unwrap();

    assert_eq!(outcome.behavior, Behavior::Correct);
    assert_eq!(
        outcome.repaired.expect("repaired program").line(2),
        Some("    r = (n + 2)")
    );
}

#[test]
fn bfs_schema_also_terminates() {
    let store = store();
    let suite = suite();
    let cfg = RepairConfig::new(Duration::from_secs(2)).with_schema(AbductionSchema::Bfs);
    let outcome = AutoDebugger::new(&store, &cfg, "f", &suite)
        .run(PROGRAM)
        .unwrap();
    assert_eq!(outcome.behavior, Behavior::Correct);
}

#[test]
fn depth_limit_bounds_the_recursion() {
    let store = store();
    let suite = suite();
    let mut cfg = RepairConfig::new(Duration::from_secs(2));
    cfg.max_refinement_depth = Some(0);
    let outcome = AutoDebugger::new(&store, &cfg, "f", &suite)
        .run(PROGRAM)
        .unwrap();
    // With no recursion allowed, the two-step repair is out of reach.
    assert!(outcome.repaired.is_none());
    assert_eq!(outcome.final_observation, outcome.prior_observation);
}
