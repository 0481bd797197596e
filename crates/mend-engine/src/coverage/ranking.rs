//! Structural statement ranking.
//!
//! The fixed priority table used to break suspiciousness ties: statement
//! kinds that historically carry defects more often sort first (lower
//! integer). Kinds missing from the table sort last.

use mend_core::FxHashMap;

use crate::syntax::ast::Node;

/// `(kind, priority)` pairs, priority ascending.
pub const STATEMENT_RANKING: &[(&str, u32)] = &[
    ("Assign", 1),
    ("Expr", 2),
    ("If", 3),
    ("Return", 4),
    ("FunctionDef", 5),
    ("ImportFrom", 6),
    ("Raise", 7),
    ("Assert", 8),
    ("ExceptHandler", 9),
    ("For", 10),
    ("AugAssign", 11),
    ("With", 12),
    ("ClassDef", 13),
    ("Import", 14),
    ("Call", 15),
    ("AnnAssign", 16),
    ("While", 17),
    ("AsyncFunctionDef", 18),
    ("Pass", 19),
    ("Delete", 20),
    ("arg", 21),
    ("Subscript", 22),
    ("Name", 23),
    ("Break", 24),
    ("Attribute", 25),
    ("Global", 26),
    ("Try", 27),
    ("NameConstant", 28),
    ("AsyncFor", 29),
];

const UNRANKED: u32 = u32::MAX;

pub fn kind_priority(kind: &str) -> u32 {
    STATEMENT_RANKING
        .iter()
        .find(|(name, _)| *name == kind)
        .map(|(_, priority)| *priority)
        .unwrap_or(UNRANKED)
}

/// Map each source line to the priority of the statement that starts
/// there. Lines without a statement stay unranked.
pub fn line_priorities(module: &Node) -> FxHashMap<u32, u32> {
    let mut priorities = FxHashMap::default();
    module.walk(&mut |node| {
        if node.is_statement() {
            let priority = kind_priority(node.kind_name());
            priorities
                .entry(node.line)
                .and_modify(|existing: &mut u32| {
                    if priority < *existing {
                        *existing = priority;
                    }
                })
                .or_insert(priority);
        }
    });
    priorities
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parser::parse_module;

    #[test]
    fn assignments_outrank_loops() {
        assert!(kind_priority("Assign") < kind_priority("For"));
        assert_eq!(kind_priority("NoSuchKind"), u32::MAX);
    }

    #[test]
    fn line_priorities_pick_the_statement_kind() {
        let module = parse_module("def f(x):\n    y = x\n    if y:\n        return y\n").unwrap();
        let priorities = line_priorities(&module);
        assert_eq!(priorities[&2], kind_priority("Assign"));
        assert_eq!(priorities[&3], kind_priority("If"));
        assert_eq!(priorities[&4], kind_priority("Return"));
    }
}
