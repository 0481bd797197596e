//! Syntax layer: owned AST, tree-sitter front end, rendering, normalization.

pub mod ast;
pub mod normalize;
pub mod parser;
pub mod unparse;

pub use ast::{dump, Node, NodeKind};
pub use normalize::normalize_program;
pub use parser::parse_module;
pub use unparse::{unparse_expr, unparse_module, unparse_statement};
