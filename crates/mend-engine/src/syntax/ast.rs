//! Owned syntax tree for the subject language.
//!
//! Node kinds carry the classic Python `ast` class names (`Assign`, `If`,
//! `Num`, `arg`, ...) because the statistical ranking table, the abstraction
//! slots, and the stored patterns are all keyed by those names.

use serde::{Deserialize, Serialize};

/// One syntax node: 1-based source line plus the kind payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub line: u32,
    pub kind: NodeKind,
}

impl Node {
    pub fn new(line: u32, kind: NodeKind) -> Self {
        Self { line, kind }
    }

    pub fn kind_name(&self) -> &'static str {
        self.kind.kind_name()
    }

    /// True for statement-level kinds (the ones the ranking table scores).
    pub fn is_statement(&self) -> bool {
        self.kind.is_statement()
    }

    /// Strip compound bodies (`body`, `orelse`, `finalbody`) from this node
    /// only, leaving nested statements out of the abstraction.
    pub fn strip_bodies(&mut self) {
        self.kind.strip_bodies();
    }

    /// Pre-order traversal over this node and all descendants.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Node)) {
        visit(self);
        self.kind.for_each_child(&mut |child| child.walk(visit));
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    Module {
        body: Vec<Node>,
    },
    FunctionDef {
        name: String,
        args: Vec<Node>,
        body: Vec<Node>,
    },
    AsyncFunctionDef {
        name: String,
        args: Vec<Node>,
        body: Vec<Node>,
    },
    ClassDef {
        name: String,
        bases: Vec<Node>,
        body: Vec<Node>,
    },
    Return {
        value: Option<Box<Node>>,
    },
    Delete {
        targets: Vec<Node>,
    },
    Assign {
        targets: Vec<Node>,
        value: Box<Node>,
    },
    AugAssign {
        target: Box<Node>,
        op: String,
        value: Box<Node>,
    },
    AnnAssign {
        target: Box<Node>,
        annotation: Box<Node>,
        value: Option<Box<Node>>,
    },
    For {
        target: Box<Node>,
        iter: Box<Node>,
        body: Vec<Node>,
        orelse: Vec<Node>,
    },
    AsyncFor {
        target: Box<Node>,
        iter: Box<Node>,
        body: Vec<Node>,
        orelse: Vec<Node>,
    },
    While {
        test: Box<Node>,
        body: Vec<Node>,
        orelse: Vec<Node>,
    },
    If {
        test: Box<Node>,
        body: Vec<Node>,
        orelse: Vec<Node>,
    },
    With {
        items: Vec<Node>,
        body: Vec<Node>,
    },
    Raise {
        exc: Option<Box<Node>>,
    },
    Try {
        body: Vec<Node>,
        handlers: Vec<Node>,
        orelse: Vec<Node>,
        finalbody: Vec<Node>,
    },
    ExceptHandler {
        typ: Option<Box<Node>>,
        name: Option<String>,
        body: Vec<Node>,
    },
    Assert {
        test: Box<Node>,
        msg: Option<Box<Node>>,
    },
    Import {
        names: Vec<Node>,
    },
    ImportFrom {
        module: String,
        names: Vec<Node>,
    },
    Alias {
        name: String,
        asname: Option<String>,
    },
    Global {
        names: Vec<String>,
    },
    Expr {
        value: Box<Node>,
    },
    Pass,
    Break,
    Continue,
    BoolOp {
        op: String,
        values: Vec<Node>,
    },
    BinOp {
        left: Box<Node>,
        op: String,
        right: Box<Node>,
    },
    UnaryOp {
        op: String,
        operand: Box<Node>,
    },
    IfExp {
        test: Box<Node>,
        body: Box<Node>,
        orelse: Box<Node>,
    },
    Compare {
        left: Box<Node>,
        ops: Vec<String>,
        comparators: Vec<Node>,
    },
    Call {
        func: Box<Node>,
        args: Vec<Node>,
    },
    Num {
        value: String,
    },
    Str {
        value: String,
    },
    Bytes {
        value: String,
    },
    NameConstant {
        value: String,
    },
    Name {
        id: String,
    },
    Attribute {
        value: Box<Node>,
        attr: String,
    },
    Subscript {
        value: Box<Node>,
        index: Box<Node>,
    },
    Slice {
        lower: Option<Box<Node>>,
        upper: Option<Box<Node>>,
        step: Option<Box<Node>>,
    },
    List {
        elts: Vec<Node>,
    },
    Tuple {
        elts: Vec<Node>,
    },
    Dict {
        keys: Vec<Node>,
        values: Vec<Node>,
    },
    Arg {
        arg: String,
        default: Option<Box<Node>>,
    },
}

impl NodeKind {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Module { .. } => "Module",
            Self::FunctionDef { .. } => "FunctionDef",
            Self::AsyncFunctionDef { .. } => "AsyncFunctionDef",
            Self::ClassDef { .. } => "ClassDef",
            Self::Return { .. } => "Return",
            Self::Delete { .. } => "Delete",
            Self::Assign { .. } => "Assign",
            Self::AugAssign { .. } => "AugAssign",
            Self::AnnAssign { .. } => "AnnAssign",
            Self::For { .. } => "For",
            Self::AsyncFor { .. } => "AsyncFor",
            Self::While { .. } => "While",
            Self::If { .. } => "If",
            Self::With { .. } => "With",
            Self::Raise { .. } => "Raise",
            Self::Try { .. } => "Try",
            Self::ExceptHandler { .. } => "ExceptHandler",
            Self::Assert { .. } => "Assert",
            Self::Import { .. } => "Import",
            Self::ImportFrom { .. } => "ImportFrom",
            Self::Alias { .. } => "alias",
            Self::Global { .. } => "Global",
            Self::Expr { .. } => "Expr",
            Self::Pass => "Pass",
            Self::Break => "Break",
            Self::Continue => "Continue",
            Self::BoolOp { .. } => "BoolOp",
            Self::BinOp { .. } => "BinOp",
            Self::UnaryOp { .. } => "UnaryOp",
            Self::IfExp { .. } => "IfExp",
            Self::Compare { .. } => "Compare",
            Self::Call { .. } => "Call",
            Self::Num { .. } => "Num",
            Self::Str { .. } => "Str",
            Self::Bytes { .. } => "Bytes",
            Self::NameConstant { .. } => "NameConstant",
            Self::Name { .. } => "Name",
            Self::Attribute { .. } => "Attribute",
            Self::Subscript { .. } => "Subscript",
            Self::Slice { .. } => "Slice",
            Self::List { .. } => "List",
            Self::Tuple { .. } => "Tuple",
            Self::Dict { .. } => "Dict",
            Self::Arg { .. } => "arg",
        }
    }

    pub fn is_statement(&self) -> bool {
        matches!(
            self,
            Self::FunctionDef { .. }
                | Self::AsyncFunctionDef { .. }
                | Self::ClassDef { .. }
                | Self::Return { .. }
                | Self::Delete { .. }
                | Self::Assign { .. }
                | Self::AugAssign { .. }
                | Self::AnnAssign { .. }
                | Self::For { .. }
                | Self::AsyncFor { .. }
                | Self::While { .. }
                | Self::If { .. }
                | Self::With { .. }
                | Self::Raise { .. }
                | Self::Try { .. }
                | Self::ExceptHandler { .. }
                | Self::Assert { .. }
                | Self::Import { .. }
                | Self::ImportFrom { .. }
                | Self::Global { .. }
                | Self::Expr { .. }
                | Self::Pass
                | Self::Break
                | Self::Continue
        )
    }

    pub fn strip_bodies(&mut self) {
        match self {
            Self::Module { body }
            | Self::With { body, .. }
            | Self::ExceptHandler { body, .. } => body.clear(),
            Self::FunctionDef { body, .. }
            | Self::AsyncFunctionDef { body, .. }
            | Self::ClassDef { body, .. } => body.clear(),
            Self::For { body, orelse, .. }
            | Self::AsyncFor { body, orelse, .. }
            | Self::While { body, orelse, .. }
            | Self::If { body, orelse, .. } => {
                body.clear();
                orelse.clear();
            }
            Self::Try {
                body,
                orelse,
                finalbody,
                ..
            } => {
                body.clear();
                orelse.clear();
                finalbody.clear();
            }
            _ => {}
        }
    }

    /// Visit every direct child node, in field order.
    pub fn for_each_child<'a>(&'a self, visit: &mut impl FnMut(&'a Node)) {
        fn all<'a>(nodes: &'a [Node], visit: &mut impl FnMut(&'a Node)) {
            for node in nodes {
                visit(node);
            }
        }
        match self {
            Self::Module { body } => all(body, visit),
            Self::FunctionDef { args, body, .. } | Self::AsyncFunctionDef { args, body, .. } => {
                all(args, visit);
                all(body, visit);
            }
            Self::ClassDef { bases, body, .. } => {
                all(bases, visit);
                all(body, visit);
            }
            Self::Return { value } => {
                if let Some(v) = value {
                    visit(v);
                }
            }
            Self::Delete { targets } => all(targets, visit),
            Self::Assign { targets, value } => {
                all(targets, visit);
                visit(value);
            }
            Self::AugAssign { target, value, .. } => {
                visit(target);
                visit(value);
            }
            Self::AnnAssign {
                target,
                annotation,
                value,
            } => {
                visit(target);
                visit(annotation);
                if let Some(v) = value {
                    visit(v);
                }
            }
            Self::For {
                target,
                iter,
                body,
                orelse,
            }
            | Self::AsyncFor {
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
            Self::While { test, body, orelse } => {
                visit(test);
                all(body, visit);
                all(orelse, visit);
            }
            Self::If { test, body, orelse } => {
                visit(test);
                all(body, visit);
                all(orelse, visit);
            }
            Self::With { items, body } => {
                all(items, visit);
                all(body, visit);
            }
            Self::Raise { exc } => {
                if let Some(e) = exc {
                    visit(e);
                }
            }
            Self::Try {
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
            Self::ExceptHandler { typ, body, .. } => {
                if let Some(t) = typ {
                    visit(t);
                }
                all(body, visit);
            }
            Self::Assert { test, msg } => {
                visit(test);
                if let Some(m) = msg {
                    visit(m);
                }
            }
            Self::Import { names } | Self::ImportFrom { names, .. } => all(names, visit),
            Self::Expr { value } => visit(value),
            Self::BoolOp { values, .. } => all(values, visit),
            Self::BinOp { left, right, .. } => {
                visit(left);
                visit(right);
            }
            Self::UnaryOp { operand, .. } => visit(operand),
            Self::IfExp { test, body, orelse } => {
                visit(body);
                visit(test);
                visit(orelse);
            }
            Self::Compare {
                left, comparators, ..
            } => {
                visit(left);
                all(comparators, visit);
            }
            Self::Call { func, args } => {
                visit(func);
                all(args, visit);
            }
            Self::Attribute { value, .. } => visit(value),
            Self::Subscript { value, index } => {
                visit(value);
                visit(index);
            }
            Self::Slice { lower, upper, step } => {
                for part in [lower, upper, step].into_iter().flatten() {
                    visit(part);
                }
            }
            Self::List { elts } | Self::Tuple { elts } => all(elts, visit),
            Self::Dict { keys, values } => {
                for (k, v) in keys.iter().zip(values.iter()) {
                    visit(k);
                    visit(v);
                }
            }
            Self::Arg { default, .. } => {
                if let Some(d) = default {
                    visit(d);
                }
            }
            Self::Global { .. }
            | Self::Pass
            | Self::Break
            | Self::Continue
            | Self::Num { .. }
            | Self::Str { .. }
            | Self::Bytes { .. }
            | Self::NameConstant { .. }
            | Self::Name { .. }
            | Self::Alias { .. } => {}
        }
    }
}

/// Canonical textual dump of a tree, identifiers included.
///
/// The dump ignores source lines, so two abstracted statements with the
/// same shape dump identically; this text is the fingerprint digest input.
pub fn dump(node: &Node) -> String {
    let mut out = String::new();
    dump_into(node, &mut out);
    out
}

fn dump_into(node: &Node, out: &mut String) {
    let kind = &node.kind;
    out.push_str(node.kind_name());
    out.push('(');
    let mut first = true;
    let mut field = |out: &mut String, text: String| {
        if !std::mem::take(&mut first) {
            out.push_str(", ");
        }
        out.push_str(&text);
    };
    match kind {
        NodeKind::Module { body } => field(out, dump_list(body)),
        NodeKind::FunctionDef { name, args, body }
        | NodeKind::AsyncFunctionDef { name, args, body } => {
            field(out, quoted(name));
            field(out, dump_list(args));
            field(out, dump_list(body));
        }
        NodeKind::ClassDef { name, bases, body } => {
            field(out, quoted(name));
            field(out, dump_list(bases));
            field(out, dump_list(body));
        }
        NodeKind::Return { value } => field(out, dump_opt(value)),
        NodeKind::Delete { targets } => field(out, dump_list(targets)),
        NodeKind::Assign { targets, value } => {
            field(out, dump_list(targets));
            field(out, dump(value));
        }
        NodeKind::AugAssign { target, op, value } => {
            field(out, dump(target));
            field(out, quoted(op));
            field(out, dump(value));
        }
        NodeKind::AnnAssign {
            target,
            annotation,
            value,
        } => {
            field(out, dump(target));
            field(out, dump(annotation));
            field(out, dump_opt(value));
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
            field(out, dump(target));
            field(out, dump(iter));
            field(out, dump_list(body));
            field(out, dump_list(orelse));
        }
        NodeKind::While { test, body, orelse } | NodeKind::If { test, body, orelse } => {
            field(out, dump(test));
            field(out, dump_list(body));
            field(out, dump_list(orelse));
        }
        NodeKind::With { items, body } => {
            field(out, dump_list(items));
            field(out, dump_list(body));
        }
        NodeKind::Raise { exc } => field(out, dump_opt(exc)),
        NodeKind::Try {
            body,
            handlers,
            orelse,
            finalbody,
        } => {
            field(out, dump_list(body));
            field(out, dump_list(handlers));
            field(out, dump_list(orelse));
            field(out, dump_list(finalbody));
        }
        NodeKind::ExceptHandler { typ, name, body } => {
            field(out, dump_opt(typ));
            field(out, name.as_deref().map(quoted).unwrap_or_else(|| "None".into()));
            field(out, dump_list(body));
        }
        NodeKind::Assert { test, msg } => {
            field(out, dump(test));
            field(out, dump_opt(msg));
        }
        NodeKind::Import { names } => field(out, dump_list(names)),
        NodeKind::ImportFrom { module, names } => {
            field(out, quoted(module));
            field(out, dump_list(names));
        }
        NodeKind::Alias { name, asname } => {
            field(out, quoted(name));
            field(
                out,
                asname.as_deref().map(quoted).unwrap_or_else(|| "None".into()),
            );
        }
        NodeKind::Global { names } => {
            let items: Vec<String> = names.iter().map(|n| quoted(n)).collect();
            field(out, format!("[{}]", items.join(", ")));
        }
        NodeKind::Expr { value } => field(out, dump(value)),
        NodeKind::Pass | NodeKind::Break | NodeKind::Continue => {}
        NodeKind::BoolOp { op, values } => {
            field(out, quoted(op));
            field(out, dump_list(values));
        }
        NodeKind::BinOp { left, op, right } => {
            field(out, dump(left));
            field(out, quoted(op));
            field(out, dump(right));
        }
        NodeKind::UnaryOp { op, operand } => {
            field(out, quoted(op));
            field(out, dump(operand));
        }
        NodeKind::IfExp { test, body, orelse } => {
            field(out, dump(test));
            field(out, dump(body));
            field(out, dump(orelse));
        }
        NodeKind::Compare {
            left,
            ops,
            comparators,
        } => {
            field(out, dump(left));
            let items: Vec<String> = ops.iter().map(|o| quoted(o)).collect();
            field(out, format!("[{}]", items.join(", ")));
            field(out, dump_list(comparators));
        }
        NodeKind::Call { func, args } => {
            field(out, dump(func));
            field(out, dump_list(args));
        }
        NodeKind::Num { value }
        | NodeKind::Str { value }
        | NodeKind::Bytes { value }
        | NodeKind::NameConstant { value } => field(out, quoted(value)),
        NodeKind::Name { id } => field(out, quoted(id)),
        NodeKind::Attribute { value, attr } => {
            field(out, dump(value));
            field(out, quoted(attr));
        }
        NodeKind::Subscript { value, index } => {
            field(out, dump(value));
            field(out, dump(index));
        }
        NodeKind::Slice { lower, upper, step } => {
            field(out, dump_opt(lower));
            field(out, dump_opt(upper));
            field(out, dump_opt(step));
        }
        NodeKind::List { elts } | NodeKind::Tuple { elts } => field(out, dump_list(elts)),
        NodeKind::Dict { keys, values } => {
            field(out, dump_list(keys));
            field(out, dump_list(values));
        }
        NodeKind::Arg { arg, default } => {
            field(out, quoted(arg));
            field(out, dump_opt(default));
        }
    }
    out.push(')');
}

fn dump_list(nodes: &[Node]) -> String {
    let items: Vec<String> = nodes.iter().map(dump).collect();
    format!("[{}]", items.join(", "))
}

fn dump_opt(node: &Option<Box<Node>>) -> String {
    node.as_deref().map(dump).unwrap_or_else(|| "None".into())
}

fn quoted(text: &str) -> String {
    format!("'{}'", text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(id: &str) -> Node {
        Node::new(1, NodeKind::Name { id: id.into() })
    }

    #[test]
    fn dump_ignores_source_lines() {
        let a = Node::new(3, NodeKind::Name { id: "x".into() });
        let b = Node::new(9, NodeKind::Name { id: "x".into() });
        assert_eq!(dump(&a), dump(&b));
        assert_eq!(dump(&a), "Name('x')");
    }

    #[test]
    fn strip_bodies_clears_compound_blocks_only() {
        let mut node = Node::new(
            1,
            NodeKind::If {
                test: Box::new(name("flag")),
                body: vec![Node::new(2, NodeKind::Pass)],
                orelse: vec![Node::new(3, NodeKind::Pass)],
            },
        );
        node.strip_bodies();
        assert_eq!(dump(&node), "If(Name('flag'), [], [])");
    }

    #[test]
    fn walk_is_pre_order() {
        let node = Node::new(
            1,
            NodeKind::Assign {
                targets: vec![name("a")],
                value: Box::new(Node::new(
                    1,
                    NodeKind::BinOp {
                        left: Box::new(name("b")),
                        op: "+".into(),
                        right: Box::new(name("c")),
                    },
                )),
            },
        );
        let mut kinds = Vec::new();
        node.walk(&mut |n| kinds.push(n.kind_name()));
        assert_eq!(kinds, vec!["Assign", "Name", "BinOp", "Name", "Name"]);
    }
}
