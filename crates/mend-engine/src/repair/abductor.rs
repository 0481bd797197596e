//! Hypothesis abduction: instantiating a fix pattern at a bug site.
//!
//! The fix template's slots that also occur in the bug shape take the
//! site's own identifiers. Each *additional* slot the fix needs draws from
//! the merged identifier pools, one pool per slot, and the cartesian
//! product over those pools enumerates every concrete instantiation.

use std::collections::BTreeMap;

use mend_core::errors::AbstractionError;
use mend_core::types::fingerprint::IdentifierPools;
use mend_core::types::BugfixPattern;
use smallvec::SmallVec;

use crate::abstraction::abstractor::{for_each_child_mut, AbstractedNode};
use crate::abstraction::identifiers::identifier_values_mut;
use crate::abstraction::merge_pools;
use crate::syntax::ast::Node;
use crate::syntax::unparse::unparse_statement;

/// Iterator over the concrete hypothesis texts one pattern yields at one
/// bug site.
pub struct HypothesisAbductor {
    fix_template: Node,
    /// Slot -> concrete identifier, from abstracting the site's statement.
    base_slots: BTreeMap<String, String>,
    /// Kind -> highest ordinal the site's abstraction allocated.
    base_counters: BTreeMap<String, u32>,
    /// One kind entry per additional slot the fix needs, sorted by kind.
    needed_kinds: SmallVec<[String; 4]>,
    product: CartesianProduct,
}

impl HypothesisAbductor {
    /// `bug_statement` is consumed (and mutated) as the abstraction copy.
    pub fn new(
        bug_statement: Node,
        pattern: &BugfixPattern,
        site_identifiers: &IdentifierPools,
    ) -> Result<Self, AbstractionError> {
        let fix_template: Node =
            serde_json::from_value(pattern.fix.tree.clone()).map_err(|e| {
                AbstractionError::MalformedTree {
                    message: format!("stored fix tree does not deserialize: {e}"),
                }
            })?;
        let available = merge_pools(site_identifiers, &pattern.available_identifiers);
        let bug = AbstractedNode::new(bug_statement);

        let bug_counters: BTreeMap<String, u32> = bug
            .map_nodes()
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect();
        let needed = slot_deltas(&pattern.fix.slot_counters, &bug_counters);

        let mut needed_kinds: SmallVec<[String; 4]> = SmallVec::new();
        let mut pools = Vec::new();
        for (kind, count) in &needed {
            let pool: Vec<String> = available
                .get(kind)
                .map(|ids| ids.iter().cloned().collect())
                .unwrap_or_default();
            for _ in 0..*count {
                needed_kinds.push(kind.clone());
                pools.push(pool.clone());
            }
        }

        Ok(Self {
            fix_template,
            base_slots: bug.slot_identifiers(),
            base_counters: bug_counters,
            needed_kinds,
            product: CartesianProduct::new(pools),
        })
    }
}

impl Iterator for HypothesisAbductor {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let assignment = self.product.next()?;
        let mut mapping = self.base_slots.clone();
        let mut counters = self.base_counters.clone();
        for (kind, concrete) in self.needed_kinds.iter().zip(assignment.into_iter()) {
            let ordinal = counters.get(kind).map(|c| c + 1).unwrap_or(0);
            counters.insert(kind.clone(), ordinal);
            mapping.insert(format!("{kind}{ordinal}"), concrete);
        }
        let mut instantiated = self.fix_template.clone();
        substitute(&mut instantiated, &mapping);
        Some(unparse_statement(&instantiated))
    }
}

/// How many slots, per kind, the fix needs beyond what the bug site's own
/// abstraction supplies. Kinds the bug has and the fix lacks contribute
/// nothing; equal counters cancel.
fn slot_deltas(
    fix_counters: &BTreeMap<String, u32>,
    bug_counters: &BTreeMap<String, u32>,
) -> BTreeMap<String, u32> {
    let mut deltas = BTreeMap::new();
    for (kind, fix_count) in fix_counters {
        match bug_counters.get(kind) {
            None => {
                deltas.insert(kind.clone(), fix_count + 1);
            }
            Some(bug_count) if bug_count != fix_count => {
                deltas.insert(kind.clone(), fix_count.abs_diff(*bug_count));
            }
            Some(_) => {}
        }
    }
    deltas
}

/// Replace slot names with their concrete identifiers across the template.
fn substitute(node: &mut Node, mapping: &BTreeMap<String, String>) {
    for value in identifier_values_mut(&mut node.kind) {
        if let Some(concrete) = mapping.get(value.as_str()) {
            let slot_kind: String = value
                .chars()
                .take_while(|c| !c.is_ascii_digit())
                .collect();
            if slot_kind == "Num" && !is_numeric_literal(concrete) {
                tracing::debug!(slot = %value, token = %concrete, "non-numeric token in numeric slot");
            }
            *value = concrete.clone();
        }
    }
    for_each_child_mut(&mut node.kind, &mut |child| substitute(child, mapping));
}

fn is_numeric_literal(token: &str) -> bool {
    if token.parse::<i64>().is_ok() || token.parse::<f64>().is_ok() {
        return true;
    }
    // Complex literals end in `j` with a numeric mantissa.
    token
        .strip_suffix(['j', 'J'])
        .is_some_and(|mantissa| mantissa.is_empty() || mantissa.parse::<f64>().is_ok())
}

/// Deterministic odometer over one pool per slot. With zero slots it
/// yields exactly one empty assignment; with any empty pool it yields
/// nothing.
struct CartesianProduct {
    pools: Vec<Vec<String>>,
    indices: SmallVec<[usize; 4]>,
    done: bool,
}

impl CartesianProduct {
    fn new(pools: Vec<Vec<String>>) -> Self {
        let done = pools.iter().any(Vec::is_empty);
        let indices = SmallVec::from_elem(0, pools.len());
        Self {
            pools,
            indices,
            done,
        }
    }
}

impl Iterator for CartesianProduct {
    type Item = Vec<String>;

    fn next(&mut self) -> Option<Vec<String>> {
        if self.done {
            return None;
        }
        let assignment: Vec<String> = self
            .indices
            .iter()
            .zip(self.pools.iter())
            .map(|(&i, pool)| pool[i].clone())
            .collect();
        // Advance the odometer, least significant slot last.
        self.done = true;
        for position in (0..self.indices.len()).rev() {
            self.indices[position] += 1;
            if self.indices[position] < self.pools[position].len() {
                self.done = false;
                break;
            }
            self.indices[position] = 0;
        }
        if self.indices.is_empty() {
            self.done = true;
        }
        Some(assignment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abstraction::pattern_from_sources;
    use crate::lexer::LogicalStatement;

    fn site_statement(source: &str, line: u32) -> Node {
        LogicalStatement::new(line, source).ast_node().unwrap()
    }

    #[test]
    fn shared_slot_fix_yields_one_hypothesis() {
        // Pattern: `a >= 1` -> `a > 1`; every fix slot already exists at
        // the bug site, so exactly one instantiation comes out.
        let pattern =
            pattern_from_sources(1, "if a >= 1:\n    pass\n", 1, "if a > 1:\n    pass\n").unwrap();
        let site_src = "def check(n):\n    if n >= 1:\n        return True\n    return False\n";
        let site = site_statement(site_src, 2);
        let lloc = LogicalStatement::new(2, site_src);
        let hypotheses: Vec<String> =
            HypothesisAbductor::new(site, &pattern, &lloc.available_identifiers())
                .unwrap()
                .collect();
        assert_eq!(hypotheses, vec!["if (n > 1):"]);
    }

    #[test]
    fn added_slots_enumerate_the_identifier_pool() {
        // Fix introduces one extra Name slot; every Name at the site (and
        // from the pattern) becomes a candidate filler.
        let pattern =
            pattern_from_sources(1, "x = a\n", 1, "x = a + b\n").unwrap();
        let site_src = "def f(p, q):\n    y = p\n    return y\n";
        let site = site_statement(site_src, 2);
        let lloc = LogicalStatement::new(2, site_src);
        let hypotheses: Vec<String> =
            HypothesisAbductor::new(site, &pattern, &lloc.available_identifiers())
                .unwrap()
                .collect();
        // Pool is sorted, so the order is reproducible.
        assert!(!hypotheses.is_empty());
        assert!(hypotheses.iter().all(|h| h.starts_with("y = (p + ")));
        let mut sorted = hypotheses.clone();
        sorted.sort();
        assert_ne!(hypotheses.iter().filter(|h| *h == "y = (p + q)").count(), 0);
        assert_eq!(sorted.len(), hypotheses.len());
    }

    #[test]
    fn dict_values_pattern_instantiates_at_a_new_site() {
        let bug_src = "def f(prices):\n    t = 0\n    for v in prices:\n        t += v\n    return t\n";
        let fix_src = "def f(prices):\n    t = 0\n    for v in prices.values():\n        t += v\n    return t\n";
        let pattern = pattern_from_sources(3, bug_src, 3, fix_src).unwrap();

        let site_src = "def get_profit(sales, margin):\n    total = 0\n    for cost in sales:\n        total += cost\n    return total * margin\n";
        let site = site_statement(site_src, 3);
        let lloc = LogicalStatement::new(3, site_src);
        let hypotheses: Vec<String> =
            HypothesisAbductor::new(site, &pattern, &lloc.available_identifiers())
                .unwrap()
                .collect();
        assert!(
            hypotheses.contains(&"for cost in sales.values():".to_string()),
            "{hypotheses:?}"
        );
    }

    #[test]
    fn empty_pool_yields_no_hypotheses() {
        let mut product = CartesianProduct::new(vec![vec![], vec!["a".into()]]);
        assert!(product.next().is_none());
    }

    #[test]
    fn zero_slots_yield_exactly_one_assignment() {
        let mut product = CartesianProduct::new(vec![]);
        assert_eq!(product.next(), Some(vec![]));
        assert!(product.next().is_none());
    }
}
