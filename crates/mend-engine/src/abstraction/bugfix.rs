//! Bug-fix pattern construction.
//!
//! Given a (line, source) pair for the bug and for the fix, abstract both
//! sides — the fix seeded with the bug's slot mapping — and package them as
//! a storable pattern. Mining these pairs out of version control history is
//! a producer-side concern; this is the ingestion seam it feeds.

use mend_core::errors::AbstractionError;
use mend_core::types::BugfixPattern;

use crate::lexer::LogicalStatement;
use crate::syntax::ast::Node;

use super::abstractor::AbstractedNode;
use super::identifiers::{collect_statement_pools, merge_pools};

/// Build a pattern from a bug site and its fixed counterpart.
pub fn pattern_from_sources(
    bug_line: u32,
    bug_source: &str,
    fix_line: u32,
    fix_source: &str,
) -> Result<BugfixPattern, AbstractionError> {
    let bug_node = statement_at(bug_line, bug_source)?;
    let fix_node = statement_at(fix_line, fix_source)?;

    let available_identifiers = merge_pools(
        &collect_statement_pools(&bug_node),
        &collect_statement_pools(&fix_node),
    );

    let bug = AbstractedNode::new(bug_node);
    let fix = AbstractedNode::with_seed(fix_node, bug.seed());

    if bug.hexdigest() == fix.hexdigest() {
        return Err(AbstractionError::EqualShapes {
            hexdigest: bug.hexdigest(),
        });
    }

    Ok(BugfixPattern {
        origin: None,
        available_identifiers,
        bug: bug.metadata(),
        fix: fix.metadata(),
    })
}

fn statement_at(line: u32, source: &str) -> Result<Node, AbstractionError> {
    LogicalStatement::new(line, source)
        .ast_node()
        .ok_or(AbstractionError::NoStatement { line })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_the_dict_values_pattern() {
        let bug_src = "def f(prices):\n    total = 0\n    for v in prices:\n        total += v\n    return total\n";
        let fix_src = "def f(prices):\n    total = 0\n    for v in prices.values():\n        total += v\n    return total\n";
        let pattern = pattern_from_sources(3, bug_src, 3, fix_src).unwrap();
        assert_eq!(pattern.bug.ast_kind, "For");
        assert_eq!(pattern.fix.ast_kind, "For");
        assert_ne!(pattern.bug.hexdigest, pattern.fix.hexdigest);
        // Bug slots: v, prices. Fix adds the method-name slot.
        assert_eq!(pattern.bug.slot_identifiers.len(), 2);
        assert_eq!(pattern.complexity(), 3);
        assert!(pattern.available_identifiers["Name"].contains("prices"));
    }

    #[test]
    fn equal_shapes_are_rejected() {
        let src = "x = a + b\n";
        let err = pattern_from_sources(1, src, 1, src).unwrap_err();
        assert!(matches!(err, AbstractionError::EqualShapes { .. }));
    }

    #[test]
    fn missing_statement_is_reported() {
        let err = pattern_from_sources(9, "x = 1\n", 1, "x = 2\n").unwrap_err();
        assert!(matches!(err, AbstractionError::NoStatement { line: 9 }));
    }
}
