//! The corpus as a keyed lookup service.

use crate::errors::StoreError;
use crate::types::BugfixPattern;

/// Lookup interface over the bug-fix corpus.
///
/// The core only ever reads: given a bug-shape digest and a complexity
/// ceiling, return every matching pattern sorted ascending by complexity.
/// Implementations decide what "stored" means (memory, SQLite, a remote
/// service); mining patterns into the store is a producer-side concern.
pub trait PatternStore {
    fn find_matching(
        &self,
        bug_hexdigest: &str,
        max_complexity: usize,
    ) -> Result<Vec<BugfixPattern>, StoreError>;
}
