//! Identifier access and pooling.
//!
//! The closed set of identifier-bearing attributes, in a fixed scan order:
//! a name's id, a literal's value, a definition's name, an import alias's
//! name and asname, an import-from's module, an attribute's attr, and a
//! parameter's name. The exception handler's capture name rides along the
//! same way.

use mend_core::types::fingerprint::IdentifierPools;

use crate::syntax::ast::{Node, NodeKind};

use super::builtins::is_builtin;

/// Read-only views of a node's identifier attributes, in scan order.
pub fn identifier_values(kind: &NodeKind) -> Vec<&str> {
    match kind {
        NodeKind::Name { id } => vec![id],
        NodeKind::Num { value }
        | NodeKind::Str { value }
        | NodeKind::Bytes { value } => vec![value],
        NodeKind::FunctionDef { name, .. }
        | NodeKind::AsyncFunctionDef { name, .. }
        | NodeKind::ClassDef { name, .. } => vec![name],
        NodeKind::Alias { name, asname } => {
            let mut out = vec![name.as_str()];
            if let Some(asname) = asname {
                out.push(asname);
            }
            out
        }
        NodeKind::ImportFrom { module, .. } => vec![module],
        NodeKind::Attribute { attr, .. } => vec![attr],
        NodeKind::Arg { arg, .. } => vec![arg],
        NodeKind::ExceptHandler { name: Some(name), .. } => vec![name],
        _ => Vec::new(),
    }
}

/// Mutable views of the same attributes, for in-place abstraction.
pub fn identifier_values_mut(kind: &mut NodeKind) -> Vec<&mut String> {
    match kind {
        NodeKind::Name { id } => vec![id],
        NodeKind::Num { value }
        | NodeKind::Str { value }
        | NodeKind::Bytes { value } => vec![value],
        NodeKind::FunctionDef { name, .. }
        | NodeKind::AsyncFunctionDef { name, .. }
        | NodeKind::ClassDef { name, .. } => vec![name],
        NodeKind::Alias { name, asname } => {
            let mut out = vec![name];
            if let Some(asname) = asname {
                out.push(asname);
            }
            out
        }
        NodeKind::ImportFrom { module, .. } => vec![module],
        NodeKind::Attribute { attr, .. } => vec![attr],
        NodeKind::Arg { arg, .. } => vec![arg],
        NodeKind::ExceptHandler { name: Some(name), .. } => vec![name],
        _ => Vec::new(),
    }
}

/// Collect every identifier in the tree into per-kind pools; builtins pool
/// under `Built-in`. Sorted containers keep downstream instantiation
/// deterministic.
pub fn collect_identifier_pools(root: &Node) -> IdentifierPools {
    let mut pools = IdentifierPools::new();
    root.walk(&mut |node| {
        let kind_name = node.kind_name();
        for value in identifier_values(&node.kind) {
            let key = if is_builtin(value) { "Built-in" } else { kind_name };
            pools
                .entry(key.to_string())
                .or_default()
                .insert(value.to_string());
        }
    });
    pools
}

/// Collect pools from a statement with its compound bodies stripped, the
/// form used when recording a pattern's own identifiers.
pub fn collect_statement_pools(statement: &Node) -> IdentifierPools {
    let mut stripped = statement.clone();
    stripped.strip_bodies();
    collect_identifier_pools(&stripped)
}

/// Union two pool maps.
pub fn merge_pools(a: &IdentifierPools, b: &IdentifierPools) -> IdentifierPools {
    let mut merged = a.clone();
    for (kind, ids) in b {
        merged
            .entry(kind.clone())
            .or_default()
            .extend(ids.iter().cloned());
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parser::parse_module;

    #[test]
    fn pools_split_builtins_from_names() {
        let module = parse_module("total = len(prices)\n").unwrap();
        let pools = collect_identifier_pools(&module);
        assert!(pools["Built-in"].contains("len"));
        assert!(pools["Name"].contains("total"));
        assert!(pools["Name"].contains("prices"));
    }

    #[test]
    fn literals_pool_under_their_kinds() {
        let module = parse_module("x = 3 + y\nlabel = 'hi'\n").unwrap();
        let pools = collect_identifier_pools(&module);
        assert!(pools["Num"].contains("3"));
        assert!(pools["Str"].contains("hi"));
    }

    #[test]
    fn merge_unions_per_kind() {
        let module_a = parse_module("a = 1\n").unwrap();
        let module_b = parse_module("b = 2\n").unwrap();
        let merged = merge_pools(
            &collect_identifier_pools(&module_a),
            &collect_identifier_pools(&module_b),
        );
        assert!(merged["Name"].contains("a"));
        assert!(merged["Name"].contains("b"));
        assert_eq!(merged["Num"].len(), 2);
    }
}
