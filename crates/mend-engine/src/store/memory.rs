//! In-memory pattern store, digest-indexed.

use mend_core::errors::StoreError;
use mend_core::types::BugfixPattern;
use mend_core::{FxHashMap, PatternStore};

/// A corpus held in memory; the fixture store for tests and small runs.
#[derive(Debug, Default)]
pub struct InMemoryPatternStore {
    patterns: Vec<BugfixPattern>,
    by_bug_digest: FxHashMap<String, Vec<usize>>,
}

impl InMemoryPatternStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, pattern: BugfixPattern) {
        let digest = pattern.bug.hexdigest.clone();
        let index = self.patterns.len();
        self.patterns.push(pattern);
        self.by_bug_digest.entry(digest).or_default().push(index);
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

impl PatternStore for InMemoryPatternStore {
    fn find_matching(
        &self,
        bug_hexdigest: &str,
        max_complexity: usize,
    ) -> Result<Vec<BugfixPattern>, StoreError> {
        let mut matches: Vec<BugfixPattern> = self
            .by_bug_digest
            .get(bug_hexdigest)
            .into_iter()
            .flatten()
            .map(|&index| self.patterns[index].clone())
            .filter(|pattern| pattern.complexity() <= max_complexity)
            .collect();
        matches.sort_by_key(BugfixPattern::complexity);
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abstraction::pattern_from_sources;

    #[test]
    fn lookup_filters_by_digest_and_complexity() {
        let mut store = InMemoryPatternStore::new();
        let pattern = pattern_from_sources(1, "if a >= 1:\n    pass\n", 1, "if a > 1:\n    pass\n")
            .unwrap();
        let digest = pattern.bug.hexdigest.clone();
        let complexity = pattern.complexity();
        store.insert(pattern);

        let hits = store.find_matching(&digest, complexity).unwrap();
        assert_eq!(hits.len(), 1);
        assert!(store.find_matching(&digest, complexity - 1).unwrap().is_empty());
        assert!(store.find_matching("0000", 10).unwrap().is_empty());
    }
}
