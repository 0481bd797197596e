//! Pull-based hypothesis generation.
//!
//! Iteration order is innermost-first: exhaust every instantiation of the
//! current pattern, then the next matching pattern (ascending complexity),
//! then the next bug candidate from the influence path. Exhausting the
//! path ends the generator for good. Every candidate advance re-extracts
//! the logical statement, re-abstracts it, and re-queries the corpus.

use mend_core::types::fingerprint::IdentifierPools;
use mend_core::types::{BugfixPattern, Hypothesis, InfluencePath, SourceProgram};
use mend_core::PatternStore;

use crate::abstraction::AbstractedNode;
use crate::lexer::LogicalStatement;
use crate::repair::abductor::HypothesisAbductor;
use crate::syntax::ast::Node;

struct CandidateSite {
    line: u32,
    elif_continuation: bool,
    bug_statement: Node,
    available: IdentifierPools,
}

pub struct HypothesisGenerator<'a> {
    store: &'a dyn PatternStore,
    program: SourceProgram,
    max_complexity: usize,
    candidates: std::vec::IntoIter<(String, u32)>,
    patterns: std::vec::IntoIter<BugfixPattern>,
    instantiations: Option<HypothesisAbductor>,
    site: Option<CandidateSite>,
    current_complexity: usize,
    abduction_depth: u32,
    abduction_breadth: u32,
}

impl<'a> HypothesisGenerator<'a> {
    pub fn new(
        store: &'a dyn PatternStore,
        program: SourceProgram,
        influence_path: InfluencePath,
        max_complexity: usize,
    ) -> Self {
        Self {
            store,
            program,
            max_complexity,
            candidates: influence_path.into_iter(),
            patterns: Vec::new().into_iter(),
            instantiations: None,
            site: None,
            current_complexity: 0,
            abduction_depth: 0,
            abduction_breadth: 0,
        }
    }

    /// Hypotheses tried at the current bug candidate; resets per candidate.
    pub fn abduction_depth(&self) -> u32 {
        self.abduction_depth
    }

    /// Hypotheses emitted across this generator's lifetime.
    pub fn abduction_breadth(&self) -> u32 {
        self.abduction_breadth
    }

    /// Move to the next candidate that yields a usable site. Extraction or
    /// abstraction failures abandon the candidate and continue with the
    /// next one.
    fn advance_candidate(&mut self) -> bool {
        loop {
            let Some((function, line)) = self.candidates.next() else {
                tracing::info!("no more bug candidates to abstract; hypothesis stream exhausted");
                return false;
            };
            match self.prepare_site(line) {
                Some((site, patterns)) => {
                    tracing::info!(
                        candidate_function = %function,
                        candidate_line = line,
                        patterns_found = patterns.len(),
                        "advancing to bug candidate"
                    );
                    self.abduction_depth = 0;
                    self.site = Some(site);
                    self.patterns = patterns.into_iter();
                    return true;
                }
                None => {
                    tracing::warn!(
                        candidate_function = %function,
                        candidate_line = line,
                        "cannot abstract candidate; skipping"
                    );
                }
            }
        }
    }

    fn prepare_site(&self, line: u32) -> Option<(CandidateSite, Vec<BugfixPattern>)> {
        let source = self.program.text();
        let lloc = LogicalStatement::new(line, &source);
        let bug_statement = lloc.ast_node()?;
        let abstracted = AbstractedNode::new(bug_statement.clone());
        let digest = abstracted.hexdigest();
        let mut patterns = match self.store.find_matching(&digest, self.max_complexity) {
            Ok(patterns) => patterns,
            Err(error) => {
                tracing::warn!(error = %error, "corpus lookup failed; treating as zero matches");
                Vec::new()
            }
        };
        // The store contract sorts ascending by complexity; keep the
        // guarantee local regardless of the backend.
        patterns.sort_by_key(BugfixPattern::complexity);
        let site = CandidateSite {
            line,
            elif_continuation: lloc.is_elif_continuation(),
            bug_statement,
            available: lloc.available_identifiers(),
        };
        Some((site, patterns))
    }
}

impl Iterator for HypothesisGenerator<'_> {
    type Item = Hypothesis;

    fn next(&mut self) -> Option<Hypothesis> {
        loop {
            if let Some(instantiations) = &mut self.instantiations {
                if let Some(mut text) = instantiations.next() {
                    let site = self.site.as_ref()?;
                    if site.elif_continuation && text.starts_with("if") {
                        text = format!("el{text}");
                    }
                    self.abduction_depth += 1;
                    self.abduction_breadth += 1;
                    return Some(Hypothesis::new(text, site.line, self.current_complexity));
                }
                self.instantiations = None;
            }

            if let Some(pattern) = self.patterns.next() {
                let site = self.site.as_ref()?;
                self.current_complexity = pattern.complexity();
                match HypothesisAbductor::new(
                    site.bug_statement.clone(),
                    &pattern,
                    &site.available,
                ) {
                    Ok(abductor) => self.instantiations = Some(abductor),
                    Err(error) => {
                        tracing::warn!(error = %error, "pattern instantiation failed; skipping pattern");
                    }
                }
                continue;
            }

            if !self.advance_candidate() {
                return None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abstraction::pattern_from_sources;
    use crate::store::InMemoryPatternStore;
    use crate::syntax::normalize_program;

    fn dict_iteration_pattern() -> mend_core::types::BugfixPattern {
        let bug = "def f(prices):\n    t = 0\n    for v in prices:\n        t += v\n    return t\n";
        let fix = "def f(prices):\n    t = 0\n    for v in prices.values():\n        t += v\n    return t\n";
        pattern_from_sources(3, bug, 3, fix).unwrap()
    }

    #[test]
    fn yields_hypotheses_for_matching_candidates() {
        let mut store = InMemoryPatternStore::new();
        store.insert(dict_iteration_pattern());
        let program = normalize_program(
            "def get_profit(sales, margin):\n    total = 0\n    for cost in sales:\n        total += cost\n    return total * margin\n",
        )
        .unwrap();
        let path = vec![("get_profit".to_string(), 3)];
        let mut generator = HypothesisGenerator::new(&store, program, path, 3);
        let hypothesis = generator.next().expect("one hypothesis");
        assert_eq!(hypothesis.line, 3);
        assert_eq!(hypothesis.text, "for cost in sales.values():");
        assert_eq!(generator.abduction_breadth(), 1);
    }

    #[test]
    fn unmatched_candidates_produce_nothing() {
        let store = InMemoryPatternStore::new();
        let program = normalize_program("def f(x):\n    return x\n").unwrap();
        let path = vec![("f".to_string(), 2)];
        let mut generator = HypothesisGenerator::new(&store, program, path, 3);
        assert!(generator.next().is_none());
        // Exhaustion is permanent.
        assert!(generator.next().is_none());
    }

    #[test]
    fn elif_sites_get_their_prefix_back() {
        let mut store = InMemoryPatternStore::new();
        store.insert(
            pattern_from_sources(1, "if a >= 1:\n    pass\n", 1, "if a > 1:\n    pass\n").unwrap(),
        );
        let program = normalize_program(
            "def grade(n):\n    if n > 10:\n        return 'big'\n    elif n >= 1:\n        return 'small'\n    else:\n        return 'none'\n",
        )
        .unwrap();
        assert_eq!(program.line(4), Some("    elif (n >= 1):"));
        let path = vec![("grade".to_string(), 4)];
        let mut generator = HypothesisGenerator::new(&store, program, path, 3);
        let hypothesis = generator.next().expect("one hypothesis");
        assert_eq!(hypothesis.text, "elif (n > 1):");
        assert_eq!(hypothesis.line, 4);
    }

    #[test]
    fn candidates_advance_in_path_order() {
        let mut store = InMemoryPatternStore::new();
        store.insert(
            pattern_from_sources(1, "x = a\n", 1, "x = a + 1\n").unwrap(),
        );
        let program =
            normalize_program("def f(p):\n    y = p\n    z = y\n    return z\n").unwrap();
        // Both lines share the assign shape; line 3 ranks first here.
        let path = vec![("f".to_string(), 3), ("f".to_string(), 2)];
        let generator = HypothesisGenerator::new(&store, program, path, 3);
        let lines: Vec<u32> = generator.map(|h| h.line).collect();
        let first_line_3 = lines.iter().position(|&l| l == 3);
        let first_line_2 = lines.iter().position(|&l| l == 2);
        assert!(first_line_3 < first_line_2, "{lines:?}");
        assert!(first_line_2.is_some());
    }
}
