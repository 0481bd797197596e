//! Candidate-program normalization.
//!
//! Before localization the input program is parsed, docstrings are dropped,
//! and the tree is re-rendered one logical statement per line. After this
//! pass, influence-path line numbers and hypothesis splice positions refer
//! to the same thing.

use mend_core::errors::ParseError;
use mend_core::types::SourceProgram;

use super::ast::{Node, NodeKind};
use super::parser::parse_module;
use super::unparse::unparse_module;

/// Normalize raw source into the flattened program the search operates on.
pub fn normalize_program(source: &str) -> Result<SourceProgram, ParseError> {
    let mut module = parse_module(source)?;
    strip_docstrings(&mut module);
    Ok(SourceProgram::from_lines(unparse_module(&module)))
}

/// Remove a leading string-expression statement from module, function, and
/// class bodies. Bodies holding nothing but the docstring keep it, so the
/// rendered block stays non-empty.
fn strip_docstrings(node: &mut Node) {
    if let Some(body) = body_of(&mut node.kind) {
        if body.len() > 1 && is_docstring(&body[0]) {
            body.remove(0);
        }
    }
    for_each_child_mut(&mut node.kind, &mut |child| strip_docstrings(child));
}

fn body_of(kind: &mut NodeKind) -> Option<&mut Vec<Node>> {
    match kind {
        NodeKind::Module { body }
        | NodeKind::FunctionDef { body, .. }
        | NodeKind::AsyncFunctionDef { body, .. }
        | NodeKind::ClassDef { body, .. } => Some(body),
        _ => None,
    }
}

fn is_docstring(node: &Node) -> bool {
    matches!(
        &node.kind,
        NodeKind::Expr { value } if matches!(value.kind, NodeKind::Str { .. })
    )
}

/// Mutable child traversal, restricted to the kinds that can nest bodies.
fn for_each_child_mut(kind: &mut NodeKind, visit: &mut impl FnMut(&mut Node)) {
    match kind {
        NodeKind::Module { body } => body.iter_mut().for_each(&mut *visit),
        NodeKind::FunctionDef { body, .. }
        | NodeKind::AsyncFunctionDef { body, .. }
        | NodeKind::ClassDef { body, .. }
        | NodeKind::With { body, .. } => body.iter_mut().for_each(&mut *visit),
        NodeKind::For { body, orelse, .. }
        | NodeKind::AsyncFor { body, orelse, .. }
        | NodeKind::While { body, orelse, .. }
        | NodeKind::If { body, orelse, .. } => {
            body.iter_mut().for_each(&mut *visit);
            orelse.iter_mut().for_each(&mut *visit);
        }
        NodeKind::Try {
            body,
            handlers,
            orelse,
            finalbody,
        } => {
            body.iter_mut().for_each(&mut *visit);
            handlers.iter_mut().for_each(&mut *visit);
            orelse.iter_mut().for_each(&mut *visit);
            finalbody.iter_mut().for_each(&mut *visit);
        }
        NodeKind::ExceptHandler { body, .. } => body.iter_mut().for_each(&mut *visit),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn docstrings_are_dropped_and_statements_flattened() {
        let src = "\"\"\"module doc\"\"\"\ndef f(x):\n    '''doc'''\n    y = (x +\n         1)\n    return y\n";
        let program = normalize_program(src).unwrap();
        assert_eq!(
            program.lines(),
            ["def f(x):", "    y = (x + 1)", "    return y"]
        );
    }

    #[test]
    fn docstring_only_bodies_are_preserved() {
        let src = "def f():\n    '''doc'''\n";
        let program = normalize_program(src).unwrap();
        assert_eq!(program.lines(), ["def f():", "    'doc'"]);
    }
}
