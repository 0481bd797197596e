//! tree-sitter-python front end.
//!
//! Converts the tree-sitter CST into the owned [`Node`] tree. Only the
//! statement and expression forms the repair engine understands are
//! accepted; anything else fails fast as an unsupported-syntax parse error.

use tree_sitter::{Node as TsNode, Parser};

use mend_core::errors::ParseError;

use super::ast::{Node, NodeKind};

/// Parse a whole program into a `Module` node.
pub fn parse_module(source: &str) -> Result<Node, ParseError> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_python::LANGUAGE.into())
        .map_err(|e| ParseError::GrammarNotFound {
            message: e.to_string(),
        })?;
    let tree = parser
        .parse(source.as_bytes(), None)
        .ok_or(ParseError::TreeUnavailable)?;
    let root = tree.root_node();
    if root.has_error() {
        let (line, message) = first_error(root, source.as_bytes());
        return Err(ParseError::Syntax { line, message });
    }
    let converter = Converter {
        source: source.as_bytes(),
    };
    converter.convert_module(root)
}

fn first_error(root: TsNode, source: &[u8]) -> (u32, String) {
    let mut cursor = root.walk();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            let text = node.utf8_text(source).unwrap_or("").trim().to_string();
            return (line_of(&node), format!("near `{}`", text));
        }
        for child in node.children(&mut cursor) {
            stack.push(child);
        }
    }
    (line_of(&root), "unknown error".to_string())
}

fn line_of(node: &TsNode) -> u32 {
    node.start_position().row as u32 + 1
}

struct Converter<'a> {
    source: &'a [u8],
}

impl<'a> Converter<'a> {
    fn text(&self, node: TsNode) -> String {
        node.utf8_text(self.source).unwrap_or("").to_string()
    }

    fn unsupported(&self, node: TsNode) -> ParseError {
        ParseError::UnsupportedSyntax {
            kind: node.kind().to_string(),
            line: line_of(&node),
        }
    }

    fn convert_module(&self, node: TsNode) -> Result<Node, ParseError> {
        let body = self.convert_body(node)?;
        Ok(Node::new(line_of(&node), NodeKind::Module { body }))
    }

    /// Convert the named statement children of a module/block node.
    fn convert_body(&self, node: TsNode) -> Result<Vec<Node>, ParseError> {
        let mut body = Vec::new();
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            if child.kind() == "comment" {
                continue;
            }
            body.push(self.convert_statement(child)?);
        }
        Ok(body)
    }

    fn convert_block_field(&self, node: TsNode, field: &str) -> Result<Vec<Node>, ParseError> {
        match node.child_by_field_name(field) {
            Some(block) => self.convert_body(block),
            None => Ok(Vec::new()),
        }
    }

    fn convert_statement(&self, node: TsNode) -> Result<Node, ParseError> {
        let line = line_of(&node);
        let kind = match node.kind() {
            "expression_statement" => {
                let inner = node
                    .named_child(0)
                    .ok_or_else(|| self.unsupported(node))?;
                match inner.kind() {
                    "assignment" => return self.convert_assignment(inner),
                    "augmented_assignment" => {
                        let target = self.convert_field_expr(inner, "left")?;
                        let value = self.convert_field_expr(inner, "right")?;
                        let op = inner
                            .child_by_field_name("operator")
                            .map(|o| self.text(o))
                            .unwrap_or_default();
                        // `x += 1` carries the bare operator in the tree.
                        let op = op.trim_end_matches('=').to_string();
                        return Ok(Node::new(
                            line,
                            NodeKind::AugAssign {
                                target: Box::new(target),
                                op,
                                value: Box::new(value),
                            },
                        ));
                    }
                    _ => NodeKind::Expr {
                        value: Box::new(self.convert_expr(inner)?),
                    },
                }
            }
            "function_definition" => return self.convert_function(node),
            "decorated_definition" => {
                let inner = node
                    .child_by_field_name("definition")
                    .ok_or_else(|| self.unsupported(node))?;
                return self.convert_statement(inner);
            }
            "class_definition" => {
                let name = self.field_text(node, "name")?;
                let bases = match node.child_by_field_name("superclasses") {
                    Some(args) => self.convert_args(args)?,
                    None => Vec::new(),
                };
                let body = self.convert_block_field(node, "body")?;
                NodeKind::ClassDef { name, bases, body }
            }
            "return_statement" => NodeKind::Return {
                value: self.optional_named_expr(node)?,
            },
            "delete_statement" => {
                let mut targets = Vec::new();
                let mut cursor = node.walk();
                for child in node.named_children(&mut cursor) {
                    if child.kind() == "expression_list" {
                        let mut inner = child.walk();
                        for item in child.named_children(&mut inner) {
                            targets.push(self.convert_expr(item)?);
                        }
                    } else {
                        targets.push(self.convert_expr(child)?);
                    }
                }
                NodeKind::Delete { targets }
            }
            "for_statement" => {
                let target = self.convert_field_expr(node, "left")?;
                let iter = self.convert_field_expr(node, "right")?;
                let body = self.convert_block_field(node, "body")?;
                let orelse = match node.child_by_field_name("alternative") {
                    Some(alt) => self.convert_block_field(alt, "body")?,
                    None => Vec::new(),
                };
                let is_async = self.has_keyword(node, "async");
                let (target, iter) = (Box::new(target), Box::new(iter));
                if is_async {
                    NodeKind::AsyncFor {
                        target,
                        iter,
                        body,
                        orelse,
                    }
                } else {
                    NodeKind::For {
                        target,
                        iter,
                        body,
                        orelse,
                    }
                }
            }
            "while_statement" => {
                let test = self.convert_field_expr(node, "condition")?;
                let body = self.convert_block_field(node, "body")?;
                let orelse = match node.child_by_field_name("alternative") {
                    Some(alt) => self.convert_block_field(alt, "body")?,
                    None => Vec::new(),
                };
                NodeKind::While {
                    test: Box::new(test),
                    body,
                    orelse,
                }
            }
            "if_statement" => return self.convert_if(node),
            "with_statement" => {
                let mut items = Vec::new();
                let mut cursor = node.walk();
                for child in node.named_children(&mut cursor) {
                    if child.kind() == "with_clause" {
                        let mut inner = child.walk();
                        for item in child.named_children(&mut inner) {
                            if let Some(value) = item.child_by_field_name("value") {
                                items.push(self.convert_expr(value)?);
                            }
                        }
                    }
                }
                let body = self.convert_block_field(node, "body")?;
                NodeKind::With { items, body }
            }
            "raise_statement" => NodeKind::Raise {
                exc: self.optional_named_expr(node)?,
            },
            "try_statement" => {
                let body = self.convert_block_field(node, "body")?;
                let mut handlers = Vec::new();
                let mut orelse = Vec::new();
                let mut finalbody = Vec::new();
                let mut cursor = node.walk();
                for child in node.named_children(&mut cursor) {
                    match child.kind() {
                        "except_clause" => handlers.push(self.convert_except(child)?),
                        "else_clause" => orelse = self.convert_block_field(child, "body")?,
                        "finally_clause" => {
                            // finally has a bare block child
                            let mut inner = child.walk();
                            for block in child.named_children(&mut inner) {
                                if block.kind() == "block" {
                                    finalbody = self.convert_body(block)?;
                                }
                            }
                        }
                        _ => {}
                    }
                }
                NodeKind::Try {
                    body,
                    handlers,
                    orelse,
                    finalbody,
                }
            }
            "assert_statement" => {
                let mut cursor = node.walk();
                let mut exprs = node.named_children(&mut cursor);
                let test = exprs.next().ok_or_else(|| self.unsupported(node))?;
                let test = Box::new(self.convert_expr(test)?);
                let msg = exprs
                    .next()
                    .map(|m| self.convert_expr(m))
                    .transpose()?
                    .map(Box::new);
                NodeKind::Assert { test, msg }
            }
            "import_statement" => NodeKind::Import {
                names: self.convert_import_names(node)?,
            },
            "import_from_statement" => {
                let module = node
                    .child_by_field_name("module_name")
                    .map(|m| self.text(m))
                    .unwrap_or_default();
                NodeKind::ImportFrom {
                    module,
                    names: self.convert_import_names(node)?,
                }
            }
            "global_statement" => {
                let mut names = Vec::new();
                let mut cursor = node.walk();
                for child in node.named_children(&mut cursor) {
                    if child.kind() == "identifier" {
                        names.push(self.text(child));
                    }
                }
                NodeKind::Global { names }
            }
            "pass_statement" => NodeKind::Pass,
            "break_statement" => NodeKind::Break,
            "continue_statement" => NodeKind::Continue,
            _ => return Err(self.unsupported(node)),
        };
        Ok(Node::new(line, kind))
    }

    /// `assignment` covers plain, annotated, and chained targets.
    fn convert_assignment(&self, node: TsNode) -> Result<Node, ParseError> {
        let line = line_of(&node);
        let target = self.convert_field_expr(node, "left")?;
        let annotation = node
            .child_by_field_name("type")
            .map(|t| self.convert_expr(t))
            .transpose()?;
        let right = node.child_by_field_name("right");
        // Chained assignment (`a = b = 1`) nests another assignment on the
        // right; flatten its targets into one statement.
        let value = match right {
            Some(r) if r.kind() == "assignment" => {
                let inner = self.convert_assignment(r)?;
                if let NodeKind::Assign {
                    targets: mut inner_targets,
                    value: inner_value,
                } = inner.kind
                {
                    let mut targets = vec![target];
                    targets.append(&mut inner_targets);
                    return Ok(Node::new(
                        line,
                        NodeKind::Assign {
                            targets,
                            value: inner_value,
                        },
                    ));
                }
                return Err(self.unsupported(node));
            }
            Some(r) => Some(self.convert_expr(r)?),
            None => None,
        };
        if let Some(annotation) = annotation {
            return Ok(Node::new(
                line,
                NodeKind::AnnAssign {
                    target: Box::new(target),
                    annotation: Box::new(annotation),
                    value: value.map(Box::new),
                },
            ));
        }
        match value {
            Some(value) => Ok(Node::new(
                line,
                NodeKind::Assign {
                    targets: vec![target],
                    value: Box::new(value),
                },
            )),
            None => Err(self.unsupported(node)),
        }
    }

    fn convert_function(&self, node: TsNode) -> Result<Node, ParseError> {
        let line = line_of(&node);
        let name = self.field_text(node, "name")?;
        let args = match node.child_by_field_name("parameters") {
            Some(params) => self.convert_parameters(params)?,
            None => Vec::new(),
        };
        let body = self.convert_block_field(node, "body")?;
        // `async def` parses as function_definition with a leading keyword.
        let is_async = self.has_keyword(node, "async");
        let kind = if is_async {
            NodeKind::AsyncFunctionDef { name, args, body }
        } else {
            NodeKind::FunctionDef { name, args, body }
        };
        Ok(Node::new(line, kind))
    }

    fn convert_parameters(&self, params: TsNode) -> Result<Vec<Node>, ParseError> {
        let mut args = Vec::new();
        let mut cursor = params.walk();
        for child in params.named_children(&mut cursor) {
            let line = line_of(&child);
            match child.kind() {
                "identifier" => args.push(Node::new(
                    line,
                    NodeKind::Arg {
                        arg: self.text(child),
                        default: None,
                    },
                )),
                "typed_parameter" => {
                    let name = child
                        .named_child(0)
                        .filter(|n| n.kind() == "identifier")
                        .map(|n| self.text(n))
                        .ok_or_else(|| self.unsupported(child))?;
                    args.push(Node::new(
                        line,
                        NodeKind::Arg {
                            arg: name,
                            default: None,
                        },
                    ));
                }
                "default_parameter" | "typed_default_parameter" => {
                    let name = self.field_text(child, "name")?;
                    let default = child
                        .child_by_field_name("value")
                        .map(|v| self.convert_expr(v))
                        .transpose()?
                        .map(Box::new);
                    args.push(Node::new(line, NodeKind::Arg { arg: name, default }));
                }
                _ => return Err(self.unsupported(child)),
            }
        }
        Ok(args)
    }

    fn convert_if(&self, node: TsNode) -> Result<Node, ParseError> {
        let line = line_of(&node);
        let test = self.convert_field_expr(node, "condition")?;
        let body = self.convert_block_field(node, "consequence")?;

        // elif chains become nested If nodes in orelse, each keeping the
        // elif clause's own source line.
        let mut elifs: Vec<(u32, Node, Vec<Node>)> = Vec::new();
        let mut else_body: Vec<Node> = Vec::new();
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            match child.kind() {
                "elif_clause" => {
                    let cond = self.convert_field_expr(child, "condition")?;
                    let clause_body = self.convert_block_field(child, "consequence")?;
                    elifs.push((line_of(&child), cond, clause_body));
                }
                "else_clause" => {
                    else_body = self.convert_block_field(child, "body")?;
                }
                _ => {}
            }
        }
        let mut orelse = else_body;
        for (elif_line, cond, clause_body) in elifs.into_iter().rev() {
            orelse = vec![Node::new(
                elif_line,
                NodeKind::If {
                    test: Box::new(cond),
                    body: clause_body,
                    orelse,
                },
            )];
        }
        Ok(Node::new(
            line,
            NodeKind::If {
                test: Box::new(test),
                body,
                orelse,
            },
        ))
    }

    fn convert_except(&self, node: TsNode) -> Result<Node, ParseError> {
        let line = line_of(&node);
        let mut typ = None;
        let mut name = None;
        let mut body = Vec::new();
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            match child.kind() {
                "comment" => {}
                "block" => body = self.convert_body(child)?,
                "as_pattern" => {
                    let mut inner = child.walk();
                    let parts: Vec<TsNode> = child.named_children(&mut inner).collect();
                    if let Some(value) = parts.first() {
                        typ = Some(Box::new(self.convert_expr(*value)?));
                    }
                    if let Some(alias) = parts.get(1) {
                        name = Some(self.text(*alias));
                    }
                }
                _ => typ = Some(Box::new(self.convert_expr(child)?)),
            }
        }
        Ok(Node::new(line, NodeKind::ExceptHandler { typ, name, body }))
    }

    fn convert_import_names(&self, node: TsNode) -> Result<Vec<Node>, ParseError> {
        let mut names = Vec::new();
        let module_name = node.child_by_field_name("module_name").map(|m| m.id());
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            if Some(child.id()) == module_name {
                continue;
            }
            let line = line_of(&child);
            match child.kind() {
                "dotted_name" | "relative_import" => names.push(Node::new(
                    line,
                    NodeKind::Alias {
                        name: self.text(child),
                        asname: None,
                    },
                )),
                "aliased_import" => {
                    let name = self.field_text(child, "name")?;
                    let asname = child.child_by_field_name("alias").map(|a| self.text(a));
                    names.push(Node::new(line, NodeKind::Alias { name, asname }));
                }
                "wildcard_import" => names.push(Node::new(
                    line,
                    NodeKind::Alias {
                        name: "*".to_string(),
                        asname: None,
                    },
                )),
                _ => {}
            }
        }
        Ok(names)
    }

    fn convert_expr(&self, node: TsNode) -> Result<Node, ParseError> {
        let line = line_of(&node);
        let kind = match node.kind() {
            "identifier" => NodeKind::Name {
                id: self.text(node),
            },
            "integer" | "float" => NodeKind::Num {
                value: self.text(node),
            },
            "true" => NodeKind::NameConstant {
                value: "True".to_string(),
            },
            "false" => NodeKind::NameConstant {
                value: "False".to_string(),
            },
            "none" => NodeKind::NameConstant {
                value: "None".to_string(),
            },
            "string" | "concatenated_string" => {
                if self.text(node).starts_with('b') {
                    NodeKind::Bytes {
                        value: self.string_value(node),
                    }
                } else {
                    NodeKind::Str {
                        value: self.string_value(node),
                    }
                }
            }
            "binary_operator" => {
                let left = self.convert_field_expr(node, "left")?;
                let right = self.convert_field_expr(node, "right")?;
                let op = self
                    .field_text(node, "operator")
                    .unwrap_or_else(|_| "+".to_string());
                NodeKind::BinOp {
                    left: Box::new(left),
                    op,
                    right: Box::new(right),
                }
            }
            "boolean_operator" => {
                let left = self.convert_field_expr(node, "left")?;
                let right = self.convert_field_expr(node, "right")?;
                let op = self.field_text(node, "operator")?;
                NodeKind::BoolOp {
                    op,
                    values: vec![left, right],
                }
            }
            "not_operator" => {
                let operand = self.convert_field_expr(node, "argument")?;
                NodeKind::UnaryOp {
                    op: "not".to_string(),
                    operand: Box::new(operand),
                }
            }
            "unary_operator" => {
                let operand = self.convert_field_expr(node, "argument")?;
                let op = self.field_text(node, "operator")?;
                NodeKind::UnaryOp {
                    op,
                    operand: Box::new(operand),
                }
            }
            "comparison_operator" => {
                let mut operands = Vec::new();
                let mut ops = Vec::new();
                let mut cursor = node.walk();
                for child in node.children(&mut cursor) {
                    if child.is_named() {
                        operands.push(self.convert_expr(child)?);
                    } else {
                        let text = self.text(child);
                        if !text.is_empty() {
                            ops.push(text);
                        }
                    }
                }
                if operands.is_empty() {
                    return Err(self.unsupported(node));
                }
                let left = operands.remove(0);
                // `not in` / `is not` arrive as two sibling tokens.
                let ops = merge_compound_ops(ops);
                NodeKind::Compare {
                    left: Box::new(left),
                    ops,
                    comparators: operands,
                }
            }
            "conditional_expression" => {
                let mut cursor = node.walk();
                let parts: Vec<TsNode> = node.named_children(&mut cursor).collect();
                if parts.len() != 3 {
                    return Err(self.unsupported(node));
                }
                NodeKind::IfExp {
                    body: Box::new(self.convert_expr(parts[0])?),
                    test: Box::new(self.convert_expr(parts[1])?),
                    orelse: Box::new(self.convert_expr(parts[2])?),
                }
            }
            "call" => {
                let func = self.convert_field_expr(node, "function")?;
                let args = match node.child_by_field_name("arguments") {
                    Some(arguments) => self.convert_args(arguments)?,
                    None => Vec::new(),
                };
                NodeKind::Call {
                    func: Box::new(func),
                    args,
                }
            }
            "attribute" => {
                let value = self.convert_field_expr(node, "object")?;
                let attr = self.field_text(node, "attribute")?;
                NodeKind::Attribute {
                    value: Box::new(value),
                    attr,
                }
            }
            "subscript" => {
                let value = self.convert_field_expr(node, "value")?;
                let mut indices = Vec::new();
                let mut cursor = node.walk();
                for child in node.children_by_field_name("subscript", &mut cursor) {
                    indices.push(self.convert_expr(child)?);
                }
                let index = match indices.len() {
                    0 => return Err(self.unsupported(node)),
                    1 => indices.pop().expect("one index"),
                    _ => Node::new(line, NodeKind::Tuple { elts: indices }),
                };
                NodeKind::Subscript {
                    value: Box::new(value),
                    index: Box::new(index),
                }
            }
            "slice" => {
                let mut parts: [Option<Box<Node>>; 3] = [None, None, None];
                let mut slot = 0usize;
                let mut cursor = node.walk();
                for child in node.children(&mut cursor) {
                    if child.is_named() {
                        if slot < 3 {
                            parts[slot] = Some(Box::new(self.convert_expr(child)?));
                        }
                    } else if self.text(child) == ":" {
                        slot += 1;
                    }
                }
                let [lower, upper, step] = parts;
                NodeKind::Slice { lower, upper, step }
            }
            "list" => NodeKind::List {
                elts: self.convert_named_children(node)?,
            },
            "tuple" => NodeKind::Tuple {
                elts: self.convert_named_children(node)?,
            },
            "pattern_list" | "tuple_pattern" | "list_pattern" => NodeKind::Tuple {
                elts: self.convert_named_children(node)?,
            },
            "expression_list" => NodeKind::Tuple {
                elts: self.convert_named_children(node)?,
            },
            "dictionary" => {
                let mut keys = Vec::new();
                let mut values = Vec::new();
                let mut cursor = node.walk();
                for child in node.named_children(&mut cursor) {
                    if child.kind() == "pair" {
                        keys.push(self.convert_field_expr(child, "key")?);
                        values.push(self.convert_field_expr(child, "value")?);
                    }
                }
                NodeKind::Dict { keys, values }
            }
            "parenthesized_expression" => {
                let inner = node
                    .named_child(0)
                    .ok_or_else(|| self.unsupported(node))?;
                return self.convert_expr(inner);
            }
            _ => return Err(self.unsupported(node)),
        };
        Ok(Node::new(line, kind))
    }

    fn convert_args(&self, arguments: TsNode) -> Result<Vec<Node>, ParseError> {
        let mut args = Vec::new();
        let mut cursor = arguments.walk();
        for child in arguments.named_children(&mut cursor) {
            if child.kind() == "keyword_argument" {
                // Positional calls only; keyword arguments are outside the
                // supported subset and are skipped from the argument list.
                tracing::debug!(line = line_of(&child), "skipping keyword argument");
                continue;
            }
            if child.kind() == "comment" {
                continue;
            }
            args.push(self.convert_expr(child)?);
        }
        Ok(args)
    }

    fn convert_named_children(&self, node: TsNode) -> Result<Vec<Node>, ParseError> {
        let mut out = Vec::new();
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            if child.kind() == "comment" {
                continue;
            }
            out.push(self.convert_expr(child)?);
        }
        Ok(out)
    }

    fn convert_field_expr(&self, node: TsNode, field: &str) -> Result<Node, ParseError> {
        let child = node
            .child_by_field_name(field)
            .ok_or_else(|| self.unsupported(node))?;
        self.convert_expr(child)
    }

    fn field_text(&self, node: TsNode, field: &str) -> Result<String, ParseError> {
        node.child_by_field_name(field)
            .map(|n| self.text(n))
            .ok_or_else(|| self.unsupported(node))
    }

    fn optional_named_expr(&self, node: TsNode) -> Result<Option<Box<Node>>, ParseError> {
        let mut cursor = node.walk();
        let child = node.named_children(&mut cursor).find(|c| c.kind() != "comment");
        match child {
            Some(c) => Ok(Some(Box::new(self.convert_expr(c)?))),
            None => Ok(None),
        }
    }

    fn has_keyword(&self, node: TsNode, keyword: &str) -> bool {
        let mut cursor = node.walk();
        let found = node
            .children(&mut cursor)
            .any(|c| !c.is_named() && c.kind() == keyword);
        found
    }

    /// Inner text of a string literal, escape sequences decoded.
    fn string_value(&self, node: TsNode) -> String {
        let mut content = String::new();
        let mut cursor = node.walk();
        let mut found = false;
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            if current.kind() == "string_content" {
                content.push_str(&self.text(current));
                found = true;
                continue;
            }
            if current.kind() == "escape_sequence" {
                content.push_str(&self.text(current));
                found = true;
                continue;
            }
            let children: Vec<TsNode> = current.children(&mut cursor).collect();
            for child in children.into_iter().rev() {
                stack.push(child);
            }
        }
        if !found {
            // Fallback: strip the quote characters from the raw text.
            let raw = self.text(node);
            content = raw
                .trim_start_matches(|c| c == 'b' || c == 'r' || c == 'f' || c == 'u')
                .trim_matches(|c| c == '"' || c == '\'')
                .to_string();
        }
        unescape(&content)
    }
}

fn merge_compound_ops(ops: Vec<String>) -> Vec<String> {
    let mut merged: Vec<String> = Vec::new();
    for op in ops {
        match (merged.last().map(String::as_str), op.as_str()) {
            (Some("not"), "in") => {
                merged.pop();
                merged.push("not in".to_string());
            }
            (Some("is"), "not") => {
                merged.pop();
                merged.push("is not".to_string());
            }
            _ => merged.push(op),
        }
    }
    merged
}

/// Decode the standard escape sequences of a string literal.
fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('\\') => out.push('\\'),
            Some('\'') => out.push('\''),
            Some('"') => out.push('"'),
            Some('0') => out.push('\0'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::ast::dump;

    #[test]
    fn parses_a_simple_function() {
        let module = parse_module("def double(x):\n    return x * 2\n").unwrap();
        let NodeKind::Module { body } = &module.kind else {
            panic!("expected module");
        };
        assert_eq!(body.len(), 1);
        assert_eq!(body[0].kind_name(), "FunctionDef");
        assert_eq!(body[0].line, 1);
    }

    #[test]
    fn elif_becomes_nested_if_with_its_own_line() {
        let src = "if a:\n    pass\nelif b:\n    pass\nelse:\n    pass\n";
        let module = parse_module(src).unwrap();
        let NodeKind::Module { body } = &module.kind else {
            panic!("expected module");
        };
        let NodeKind::If { orelse, .. } = &body[0].kind else {
            panic!("expected if");
        };
        assert_eq!(orelse.len(), 1);
        assert_eq!(orelse[0].kind_name(), "If");
        assert_eq!(orelse[0].line, 3);
    }

    #[test]
    fn comparison_chains_keep_all_operators() {
        let module = parse_module("x = 1 < a <= 10\n").unwrap();
        let text = dump(&module);
        assert!(text.contains("Compare"), "{text}");
        assert!(text.contains("'<'"), "{text}");
        assert!(text.contains("'<='"), "{text}");
    }

    #[test]
    fn syntax_errors_fail_fast() {
        let err = parse_module("def broken(:\n").unwrap_err();
        assert!(matches!(err, ParseError::Syntax { .. }));
    }

    #[test]
    fn membership_operators_merge() {
        let module = parse_module("found = key not in table\n").unwrap();
        let text = dump(&module);
        assert!(text.contains("'not in'"), "{text}");
    }
}
