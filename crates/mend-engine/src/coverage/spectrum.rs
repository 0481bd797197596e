//! Spectrum-based fault localization.
//!
//! Coverage sets from passing and failing runs feed the Ochiai metric;
//! ranked events become the influence path. The full tie-break chain —
//! suspiciousness, structural statement priority, proximity to the top
//! event, then `(function, line)` — makes the ranking a total order, so
//! identical inputs always produce identical paths.

use mend_core::types::InfluencePath;
use mend_core::FxHashSet;

use crate::syntax::ast::Node;

use super::call_graph::reachable_functions;
use super::collector::CoverageEvent;
use super::ranking::line_priorities;

/// Collects pass/fail coverage and ranks suspicious events.
#[derive(Debug, Default)]
pub struct SpectrumDebugger {
    pass_runs: Vec<FxHashSet<CoverageEvent>>,
    fail_runs: Vec<FxHashSet<CoverageEvent>>,
}

impl SpectrumDebugger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_pass(&mut self, events: FxHashSet<CoverageEvent>) {
        self.pass_runs.push(events);
    }

    pub fn add_fail(&mut self, events: FxHashSet<CoverageEvent>) {
        self.fail_runs.push(events);
    }

    pub fn fail_run_count(&self) -> usize {
        self.fail_runs.len()
    }

    /// Every distinct event observed in any run.
    pub fn all_events(&self) -> Vec<CoverageEvent> {
        let mut events: FxHashSet<CoverageEvent> = FxHashSet::default();
        for run in self.pass_runs.iter().chain(self.fail_runs.iter()) {
            events.extend(run.iter().cloned());
        }
        let mut events: Vec<CoverageEvent> = events.into_iter().collect();
        events.sort();
        events
    }

    /// Ochiai suspiciousness, or `None` when the denominator is zero.
    pub fn suspiciousness(&self, event: &CoverageEvent) -> Option<f64> {
        let failed = self.fail_runs.iter().filter(|run| run.contains(event)).count();
        let not_in_failed = self.fail_runs.len() - failed;
        let passed = self.pass_runs.iter().filter(|run| run.contains(event)).count();
        let denominator = ((failed + not_in_failed) * (failed + passed)) as f64;
        if denominator == 0.0 {
            return None;
        }
        Some(failed as f64 / denominator.sqrt())
    }

    /// Rank eligible events into an influence path.
    ///
    /// Eligibility: the event's function is reachable from `target` in the
    /// module's static call graph, and its suspiciousness clears the
    /// threshold. Events group by descending suspiciousness; within a
    /// group, the structural statement priority breaks ties, then absolute
    /// line distance to the most suspicious event, then the event itself.
    pub fn influence_path(
        &self,
        module: &Node,
        target: &str,
        susp_threshold: f64,
    ) -> InfluencePath {
        let reachable = reachable_functions(module, target);
        let priorities = line_priorities(module);

        let mut scored: Vec<(CoverageEvent, f64)> = self
            .all_events()
            .into_iter()
            .filter(|(function, _)| reachable.contains(function))
            .filter_map(|event| {
                self.suspiciousness(&event)
                    .filter(|s| *s >= susp_threshold)
                    .map(|s| (event, s))
            })
            .collect();
        if scored.is_empty() {
            return Vec::new();
        }

        let priority_of =
            |line: u32| -> u32 { priorities.get(&line).copied().unwrap_or(u32::MAX) };

        // Seed ordering to find the anchor line for the proximity key.
        scored.sort_by(|(ea, sa), (eb, sb)| {
            sb.partial_cmp(sa)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| priority_of(ea.1).cmp(&priority_of(eb.1)))
                .then_with(|| ea.cmp(eb))
        });
        let anchor_line = scored[0].0 .1;

        scored.sort_by(|(ea, sa), (eb, sb)| {
            sb.partial_cmp(sa)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| priority_of(ea.1).cmp(&priority_of(eb.1)))
                .then_with(|| {
                    ea.1.abs_diff(anchor_line).cmp(&eb.1.abs_diff(anchor_line))
                })
                .then_with(|| ea.cmp(eb))
        });

        scored.into_iter().map(|(event, _)| event).collect()
    }

    /// Group events by identical suspiciousness, ranked best first. Used by
    /// diagnostics and tests; `influence_path` is the consumer-facing form.
    pub fn rank(&self) -> Vec<(CoverageEvent, f64)> {
        let mut scored: Vec<(CoverageEvent, f64)> = self
            .all_events()
            .into_iter()
            .filter_map(|event| self.suspiciousness(&event).map(|s| (event, s)))
            .collect();
        scored.sort_by(|(ea, sa), (eb, sb)| {
            sb.partial_cmp(sa)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| ea.cmp(eb))
        });
        scored
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parser::parse_module;

    fn events(pairs: &[(&str, u32)]) -> FxHashSet<CoverageEvent> {
        pairs.iter().map(|(f, l)| (f.to_string(), *l)).collect()
    }

    #[test]
    fn ochiai_matches_the_formula() {
        let mut debugger = SpectrumDebugger::new();
        debugger.add_fail(events(&[("f", 2), ("f", 3)]));
        debugger.add_pass(events(&[("f", 2)]));
        // Line 3: failed=1, not_in_failed=0, passed=0 -> 1.0
        assert_eq!(debugger.suspiciousness(&("f".into(), 3)), Some(1.0));
        // Line 2: failed=1, not_in_failed=0, passed=1 -> 1/sqrt(2)
        let susp = debugger.suspiciousness(&("f".into(), 2)).unwrap();
        assert!((susp - 1.0 / 2f64.sqrt()).abs() < 1e-12);
        // Unseen event has no score.
        assert_eq!(debugger.suspiciousness(&("f".into(), 99)), None);
    }

    #[test]
    fn influence_path_filters_by_reachability() {
        let src = "def target(x):\n    return helper(x)\ndef helper(x):\n    return x + 1\ndef unrelated(x):\n    return x\n";
        let module = parse_module(src).unwrap();
        let mut debugger = SpectrumDebugger::new();
        debugger.add_fail(events(&[("target", 2), ("helper", 4), ("unrelated", 6)]));
        let path = debugger.influence_path(&module, "target", 0.0);
        assert!(path.iter().any(|(f, _)| f == "helper"));
        assert!(!path.iter().any(|(f, _)| f == "unrelated"));
    }

    #[test]
    fn threshold_discards_weak_events() {
        let src = "def f(x):\n    y = x + 1\n    return y\n";
        let module = parse_module(src).unwrap();
        let mut debugger = SpectrumDebugger::new();
        debugger.add_fail(events(&[("f", 2), ("f", 3)]));
        debugger.add_pass(events(&[("f", 2)]));
        let path = debugger.influence_path(&module, "f", 0.9);
        // Only line 3 (susp 1.0) clears the 0.9 threshold.
        assert_eq!(path, vec![("f".to_string(), 3)]);
    }

    #[test]
    fn equal_suspiciousness_breaks_on_statement_kind() {
        // Line 2 is an assignment, line 3 an if; both covered only by the
        // failing run, so suspiciousness ties at 1.0 and Assign wins.
        let src = "def f(x):\n    y = x\n    if y:\n        return y\n    return 0\n";
        let module = parse_module(src).unwrap();
        let mut debugger = SpectrumDebugger::new();
        debugger.add_fail(events(&[("f", 3), ("f", 2)]));
        let path = debugger.influence_path(&module, "f", 0.0);
        assert_eq!(path[0], ("f".to_string(), 2));
        assert_eq!(path[1], ("f".to_string(), 3));
    }
}
