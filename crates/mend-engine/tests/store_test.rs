//! Pattern-store integration: a file-backed corpus survives reopening and
//! serves the search through the same trait seam as the in-memory store.

use std::time::Duration;

use mend_core::config::RepairConfig;
use mend_core::suite::{ArgValue, TestCase, TestSuite};
use mend_core::types::Behavior;
use mend_core::PatternStore;
use mend_engine::abstraction::pattern_from_sources;
use mend_engine::{run_auto_debug, SqlitePatternStore};

#[test]
fn file_backed_store_round_trips_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("patterns.db");

    let pattern =
        pattern_from_sources(1, "if a >= 1:\n    pass\n", 1, "if a > 1:\n    pass\n").unwrap();
    let digest = pattern.bug.hexdigest.clone();
    {
        let store = SqlitePatternStore::open(&path).unwrap();
        store.insert(&pattern).unwrap();
        assert_eq!(store.count().unwrap(), 1);
    }

    let reopened = SqlitePatternStore::open(&path).unwrap();
    let hits = reopened.find_matching(&digest, 10).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0], pattern);
}

#[test]
fn sqlite_store_drives_a_full_repair() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("patterns.db");
    let store = SqlitePatternStore::open(&path).unwrap();
    store
        .insert(
            &pattern_from_sources(1, "if a >= 1:\n    pass\n", 1, "if a > 1:\n    pass\n")
                .unwrap(),
        )
        .unwrap();

    let program = "\
def is_positive(a):
    if a >= 1:
        return True
    return False
";
    let suite = TestSuite::from_cases(vec![
        TestCase::new("boundary", "False", [ArgValue::Int(1)]),
        TestCase::new("above", "True", [ArgValue::Int(2)]),
    ]);
    let cfg = RepairConfig::new(Duration::from_secs(2));
    let outcome = run_auto_debug("is_positive", program, &suite, &store, &cfg).unwrap();
    assert_eq!(outcome.behavior, Behavior::Correct);
    assert_eq!(
        outcome.repaired.expect("repaired program").line(2),
        Some("    if (a > 1):")
    );
}
