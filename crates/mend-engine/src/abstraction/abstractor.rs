//! Statement abstraction.
//!
//! Depth-first over the supplied statement (the caller's copy — the tree is
//! mutated in place), every identifier-bearing attribute is replaced with a
//! slot name `<Kind><ordinal>`. Ordinals count per kind from 0 within one
//! abstraction pass; a repeated concrete identifier reuses its slot.
//! Builtin names allocate under the `Built-in` kind.

use std::collections::BTreeMap;

use mend_core::types::fingerprint::NodeMetadata;
use mend_core::FxHashMap;
use sha2::{Digest, Sha256};

use crate::syntax::ast::{dump, Node, NodeKind};

use super::builtins::is_builtin;
use super::identifiers::identifier_values_mut;

/// Slot mapping carried between related abstraction passes: the concrete
/// identifier -> slot map and the per-kind ordinal high-water marks.
pub type SlotSeed = (FxHashMap<String, String>, FxHashMap<String, u32>);

/// An abstracted statement with its mappings.
#[derive(Debug, Clone)]
pub struct AbstractedNode {
    node: Node,
    map_ids: FxHashMap<String, String>,
    map_nodes: FxHashMap<String, u32>,
}

impl AbstractedNode {
    /// Abstract a statement with fresh mappings.
    pub fn new(statement: Node) -> Self {
        Self::with_seed(statement, (FxHashMap::default(), FxHashMap::default()))
    }

    /// Abstract a statement continuing from an earlier pass's mappings,
    /// so shared identifiers keep their slots (the fix side of a pattern
    /// is seeded with the bug side's mapping).
    pub fn with_seed(mut statement: Node, seed: SlotSeed) -> Self {
        let (map_ids, map_nodes) = seed;
        let mut abstractor = Abstractor { map_ids, map_nodes };
        statement.strip_bodies();
        abstractor.visit(&mut statement);
        Self {
            node: statement,
            map_ids: abstractor.map_ids,
            map_nodes: abstractor.map_nodes,
        }
    }

    pub fn node(&self) -> &Node {
        &self.node
    }

    /// Canonical textual dump of the abstracted tree.
    pub fn dump(&self) -> String {
        dump(&self.node)
    }

    /// SHA-256 over the canonical dump, hex-encoded. Structurally identical
    /// shapes collide; differing shapes do not, within overwhelming
    /// probability.
    pub fn hexdigest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.dump().as_bytes());
        let digest = hasher.finalize();
        digest.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// The mapping continuation for a dependent pass.
    pub fn seed(&self) -> SlotSeed {
        (self.map_ids.clone(), self.map_nodes.clone())
    }

    /// Concrete identifier -> slot.
    pub fn map_ids(&self) -> &FxHashMap<String, String> {
        &self.map_ids
    }

    /// Kind -> highest ordinal allocated.
    pub fn map_nodes(&self) -> &FxHashMap<String, u32> {
        &self.map_nodes
    }

    /// Slot -> concrete identifier, sorted.
    pub fn slot_identifiers(&self) -> BTreeMap<String, String> {
        self.map_ids
            .iter()
            .map(|(concrete, slot)| (slot.clone(), concrete.clone()))
            .collect()
    }

    /// Package the abstraction as storable metadata.
    pub fn metadata(&self) -> NodeMetadata {
        NodeMetadata {
            hexdigest: self.hexdigest(),
            ast_kind: self.node.kind_name().to_string(),
            dump: self.dump(),
            tree: serde_json::to_value(&self.node).unwrap_or(serde_json::Value::Null),
            slot_identifiers: self.slot_identifiers(),
            slot_counters: self
                .map_nodes
                .iter()
                .map(|(k, v)| (k.clone(), *v))
                .collect(),
        }
    }
}

struct Abstractor {
    map_ids: FxHashMap<String, String>,
    map_nodes: FxHashMap<String, u32>,
}

impl Abstractor {
    fn visit(&mut self, node: &mut Node) {
        self.abstract_attributes(node);
        for_each_child_mut(&mut node.kind, &mut |child| self.visit(child));
    }

    fn abstract_attributes(&mut self, node: &mut Node) {
        let kind_name = node.kind.kind_name();
        for value in identifier_values_mut(&mut node.kind) {
            self.replace(kind_name, value);
        }
    }

    fn replace(&mut self, kind_name: &'static str, value: &mut String) {
        if let Some(slot) = self.map_ids.get(value.as_str()) {
            *value = slot.clone();
            return;
        }
        let kind = if is_builtin(value) { "Built-in" } else { kind_name };
        let ordinal = match self.map_nodes.get_mut(kind) {
            Some(counter) => {
                *counter += 1;
                *counter
            }
            None => {
                self.map_nodes.insert(kind.to_string(), 0);
                0
            }
        };
        let slot = format!("{kind}{ordinal}");
        self.map_ids.insert(std::mem::take(value), slot.clone());
        *value = slot;
    }
}

/// Mutable pre-order child traversal for the abstraction pass.
pub(crate) fn for_each_child_mut(kind: &mut NodeKind, visit: &mut impl FnMut(&mut Node)) {
    fn all(nodes: &mut [Node], visit: &mut impl FnMut(&mut Node)) {
        for node in nodes {
            visit(node);
        }
    }
    fn opt(node: &mut Option<Box<Node>>, visit: &mut impl FnMut(&mut Node)) {
        if let Some(n) = node {
            visit(n);
        }
    }
    match kind {
        NodeKind::Module { body } => all(body, visit),
        NodeKind::FunctionDef { args, body, .. } | NodeKind::AsyncFunctionDef { args, body, .. } => {
            all(args, visit);
            all(body, visit);
        }
        NodeKind::ClassDef { bases, body, .. } => {
            all(bases, visit);
            all(body, visit);
        }
        NodeKind::Return { value } => opt(value, visit),
        NodeKind::Delete { targets } => all(targets, visit),
        NodeKind::Assign { targets, value } => {
            all(targets, visit);
            visit(value);
        }
        NodeKind::AugAssign { target, value, .. } => {
            visit(target);
            visit(value);
        }
        NodeKind::AnnAssign {
            target,
            annotation,
            value,
        } => {
            visit(target);
            visit(annotation);
            opt(value, visit);
        }
        NodeKind::For {
            target,
            iter,
            body,
            orelse,
        }
        | NodeKind::AsyncFor {
            target,
            iter,
            body,
            orelse,
        } => {
            visit(target);
            visit(iter);
            all(body, visit);
            all(orelse, visit);
        }
        NodeKind::While { test, body, orelse } | NodeKind::If { test, body, orelse } => {
            visit(test);
            all(body, visit);
            all(orelse, visit);
        }
        NodeKind::With { items, body } => {
            all(items, visit);
            all(body, visit);
        }
        NodeKind::Raise { exc } => opt(exc, visit),
        NodeKind::Try {
            body,
            handlers,
            orelse,
            finalbody,
        } => {
            all(body, visit);
            all(handlers, visit);
            all(orelse, visit);
            all(finalbody, visit);
        }
        NodeKind::ExceptHandler { typ, body, .. } => {
            opt(typ, visit);
            all(body, visit);
        }
        NodeKind::Assert { test, msg } => {
            visit(test);
            opt(msg, visit);
        }
        NodeKind::Import { names } | NodeKind::ImportFrom { names, .. } => all(names, visit),
        NodeKind::Expr { value } => visit(value),
        NodeKind::BoolOp { values, .. } => all(values, visit),
        NodeKind::BinOp { left, right, .. } => {
            visit(left);
            visit(right);
        }
        NodeKind::UnaryOp { operand, .. } => visit(operand),
        NodeKind::IfExp { test, body, orelse } => {
            visit(body);
            visit(test);
            visit(orelse);
        }
        NodeKind::Compare {
            left, comparators, ..
        } => {
            visit(left);
            all(comparators, visit);
        }
        NodeKind::Call { func, args } => {
            visit(func);
            all(args, visit);
        }
        NodeKind::Attribute { value, .. } => visit(value),
        NodeKind::Subscript { value, index } => {
            visit(value);
            visit(index);
        }
        NodeKind::Slice { lower, upper, step } => {
            opt(lower, visit);
            opt(upper, visit);
            opt(step, visit);
        }
        NodeKind::List { elts } | NodeKind::Tuple { elts } => all(elts, visit),
        NodeKind::Dict { keys, values } => {
            for (k, v) in keys.iter_mut().zip(values.iter_mut()) {
                visit(k);
                visit(v);
            }
        }
        NodeKind::Arg { default, .. } => opt(default, visit),
        NodeKind::Global { .. }
        | NodeKind::Pass
        | NodeKind::Break
        | NodeKind::Continue
        | NodeKind::Num { .. }
        | NodeKind::Str { .. }
        | NodeKind::Bytes { .. }
        | NodeKind::NameConstant { .. }
        | NodeKind::Name { .. }
        | NodeKind::Alias { .. } => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::LogicalStatement;
    use crate::syntax::parser::parse_module;

    fn statement(src: &str, line: u32) -> Node {
        LogicalStatement::new(line, src).ast_node().unwrap()
    }

    #[test]
    fn identical_shapes_share_a_digest() {
        let a = AbstractedNode::new(statement("if a >= 1:\n    pass\n", 1));
        let b = AbstractedNode::new(statement("if counter >= 10:\n    pass\n", 1));
        assert_eq!(a.hexdigest(), b.hexdigest());
        assert_eq!(a.dump(), b.dump());
    }

    #[test]
    fn different_shapes_do_not_collide() {
        let a = AbstractedNode::new(statement("if a >= 1:\n    pass\n", 1));
        let b = AbstractedNode::new(statement("if a > 1:\n    pass\n", 1));
        let c = AbstractedNode::new(statement("while a >= 1:\n    pass\n", 1));
        assert_ne!(a.hexdigest(), b.hexdigest());
        assert_ne!(a.hexdigest(), c.hexdigest());
    }

    #[test]
    fn repeated_identifiers_reuse_their_slot() {
        let node = statement("total = total + step\n", 1);
        let abstracted = AbstractedNode::new(node);
        assert_eq!(abstracted.dump(), "Assign([Name('Name0')], BinOp(Name('Name0'), '+', Name('Name1')))");
    }

    #[test]
    fn builtins_get_their_own_kind() {
        let node = statement("n = len(items)\n", 1);
        let abstracted = AbstractedNode::new(node);
        assert!(abstracted.dump().contains("Built-in0"));
        assert_eq!(abstracted.slot_identifiers()["Built-in0"], "len");
    }

    #[test]
    fn abstraction_is_idempotent_on_shapes_without_builtins() {
        let first = AbstractedNode::new(statement("profit = profit + value\n", 1));
        let second = AbstractedNode::new(first.node().clone());
        assert_eq!(first.hexdigest(), second.hexdigest());
    }

    #[test]
    fn bodies_are_stripped_before_abstraction() {
        let module = parse_module("for v in prices:\n    total += v\n").unwrap();
        let crate::syntax::ast::NodeKind::Module { body } = &module.kind else {
            panic!("expected module");
        };
        let abstracted = AbstractedNode::new(body[0].clone());
        assert_eq!(abstracted.dump(), "For(Name('Name0'), Name('Name1'), [], [])");
    }

    #[test]
    fn seeded_abstraction_keeps_shared_slots() {
        let bug = AbstractedNode::new(statement("for v in prices:\n    pass\n", 1));
        let fix = AbstractedNode::with_seed(
            statement("for v in prices.values():\n    pass\n", 1),
            bug.seed(),
        );
        // `prices` and `v` keep the slots the bug side allocated; only the
        // method name is new.
        assert_eq!(
            fix.dump(),
            "For(Name('Name0'), Call(Attribute(Name('Name1'), 'Attribute0'), []), [], [])"
        );
    }
}
