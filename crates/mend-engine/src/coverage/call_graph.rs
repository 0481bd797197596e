//! Static call graph over a candidate module.
//!
//! Nodes are the module's function definitions; an edge runs from a
//! function to every defined function it calls by name. Coverage events are
//! only eligible for ranking when their function is reachable from the
//! repair target.

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Bfs;

use mend_core::{FxHashMap, FxHashSet};

use crate::syntax::ast::{Node, NodeKind};

/// Functions reachable from `target` (including `target` itself). An
/// unknown target yields the empty set.
pub fn reachable_functions(module: &Node, target: &str) -> FxHashSet<String> {
    let mut graph: DiGraph<String, ()> = DiGraph::new();
    let mut indices: FxHashMap<String, NodeIndex> = FxHashMap::default();

    let mut functions: Vec<(&str, &[Node])> = Vec::new();
    collect_functions(module, &mut functions);
    for (name, _) in &functions {
        let index = graph.add_node(name.to_string());
        indices.insert(name.to_string(), index);
    }

    for (name, body) in &functions {
        let caller = indices[*name];
        let mut callees: FxHashSet<&str> = FxHashSet::default();
        for statement in *body {
            statement.walk(&mut |node| {
                if let NodeKind::Call { func, .. } = &node.kind {
                    if let NodeKind::Name { id } = &func.kind {
                        callees.insert(id.as_str());
                    }
                }
            });
        }
        for callee in callees {
            if let Some(&callee_index) = indices.get(callee) {
                graph.add_edge(caller, callee_index, ());
            }
        }
    }

    let mut reachable = FxHashSet::default();
    let Some(&start) = indices.get(target) else {
        return reachable;
    };
    let mut bfs = Bfs::new(&graph, start);
    while let Some(index) = bfs.next(&graph) {
        reachable.insert(graph[index].clone());
    }
    reachable
}

fn collect_functions<'a>(node: &'a Node, out: &mut Vec<(&'a str, &'a [Node])>) {
    node.walk(&mut |n| {
        if let NodeKind::FunctionDef { name, body, .. }
        | NodeKind::AsyncFunctionDef { name, body, .. } = &n.kind
        {
            out.push((name.as_str(), body.as_slice()));
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parser::parse_module;

    const SRC: &str = "def helper(x):\n    return x\ndef target(x):\n    return helper(x)\ndef unrelated(x):\n    return x\n";

    #[test]
    fn reachability_follows_call_edges() {
        let module = parse_module(SRC).unwrap();
        let reachable = reachable_functions(&module, "target");
        assert!(reachable.contains("target"));
        assert!(reachable.contains("helper"));
        assert!(!reachable.contains("unrelated"));
    }

    #[test]
    fn unknown_target_reaches_nothing() {
        let module = parse_module(SRC).unwrap();
        assert!(reachable_functions(&module, "absent").is_empty());
    }

    #[test]
    fn cycles_terminate() {
        let src = "def a(n):\n    return b(n)\ndef b(n):\n    return a(n)\n";
        let module = parse_module(src).unwrap();
        let reachable = reachable_functions(&module, "a");
        assert_eq!(reachable.len(), 2);
    }
}
