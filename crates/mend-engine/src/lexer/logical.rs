//! Logical-statement extraction.
//!
//! Given a 1-based line number and full source text, find the logical
//! statement whose token span covers that line. Comments, string tokens,
//! and non-terminating newlines never contribute to the statement text but
//! do not break statement continuation.

use mend_core::types::fingerprint::IdentifierPools;

use crate::abstraction::identifiers::collect_identifier_pools;
use crate::syntax::ast::Node;
use crate::syntax::parser::parse_module;

use super::token::TokenKind;
use super::tokenizer::tokenize;

/// Result of scanning for the statement covering a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractedStatement {
    /// The first token on the requested line is a comment: there is no
    /// statement at all there.
    CommentOnly,
    /// Tokens covered the line but contributed no statement text (a
    /// docstring or other bare string expression).
    Empty { start: u32, end: u32 },
    /// A real statement.
    Statement { text: String, start: u32, end: u32 },
}

/// A logical line of code resolved against its source.
pub struct LogicalStatement<'a> {
    line: u32,
    source: &'a str,
}

impl<'a> LogicalStatement<'a> {
    pub fn new(line: u32, source: &'a str) -> Self {
        Self { line, source }
    }

    /// Scan the token stream for the statement covering the target line.
    pub fn extract(&self) -> ExtractedStatement {
        let tokens = tokenize(self.source);
        let mut text = String::new();
        let mut start: u32 = 0;
        let mut end: u32 = 0;
        let mut found = false;
        let mut first_token_on_line = true;

        for token in &tokens {
            end = token.end_line;
            if first_token_on_line && token.start_line == self.line {
                first_token_on_line = false;
                if token.kind == TokenKind::Comment {
                    return ExtractedStatement::CommentOnly;
                }
            }
            if token.start_line <= self.line && self.line <= token.end_line {
                found = true;
            }
            match token.kind {
                TokenKind::Newline => {
                    if found {
                        break;
                    }
                    text.clear();
                    start = token.start_line + 1;
                }
                TokenKind::Comment | TokenKind::Str | TokenKind::Nl => {}
                TokenKind::EndMarker => break,
                _ => {
                    text.push_str(&token.text);
                    text.push(' ');
                }
            }
        }

        if text.trim().is_empty() {
            ExtractedStatement::Empty { start, end }
        } else {
            ExtractedStatement::Statement {
                text: text.trim_end().to_string(),
                start,
                end,
            }
        }
    }

    /// The parsed node whose line falls inside the statement span; first
    /// match in a pre-order walk of the full tree.
    pub fn ast_node(&self) -> Option<Node> {
        let (start, end) = match self.extract() {
            ExtractedStatement::Statement { start, end, .. } => (start, end),
            _ => return None,
        };
        let module = match parse_module(self.source) {
            Ok(module) => module,
            Err(e) => {
                tracing::warn!(line = self.line, error = %e, "cannot parse source for statement lookup");
                return None;
            }
        };
        // The scan starts line 0 when the statement opens the file.
        let start = start.max(1);
        let mut hit: Option<Node> = None;
        module.walk(&mut |node| {
            if hit.is_none()
                && node.kind_name() != "Module"
                && start <= node.line
                && node.line <= end
            {
                hit = Some(node.clone());
            }
        });
        hit
    }

    /// True when the covered statement is a bare `elif` continuation, which
    /// cannot be re-inserted as a standalone statement without an `el`
    /// prefix.
    pub fn is_elif_continuation(&self) -> bool {
        match self.extract() {
            ExtractedStatement::Statement { text, .. } => text.starts_with("elif"),
            _ => false,
        }
    }

    /// All identifiers visible in the full tree, keyed by node kind, for
    /// use as substitution pools during pattern instantiation.
    pub fn available_identifiers(&self) -> IdentifierPools {
        match parse_module(self.source) {
            Ok(module) => collect_identifier_pools(&module),
            Err(e) => {
                tracing::warn!(error = %e, "cannot collect identifiers");
                IdentifierPools::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SRC: &str = "def f(x):\n    # guard\n    if x > 1:\n        return x\n    return 0\n";

    #[test]
    fn finds_the_statement_covering_a_line() {
        let lloc = LogicalStatement::new(3, SRC);
        match lloc.extract() {
            ExtractedStatement::Statement { text, start, end } => {
                assert_eq!(text, "if x > 1 :");
                // The scan restarts after the previous logical newline, so
                // the recorded span opens at the line after it.
                assert_eq!(start, 2);
                assert_eq!(end, 3);
            }
            other => panic!("expected statement, got {other:?}"),
        }
    }

    #[test]
    fn comment_first_line_is_no_statement() {
        let lloc = LogicalStatement::new(2, SRC);
        assert_eq!(lloc.extract(), ExtractedStatement::CommentOnly);
    }

    #[test]
    fn docstring_line_is_empty_statement() {
        let src = "def f():\n    '''doc'''\n    return 1\n";
        let lloc = LogicalStatement::new(2, src);
        assert!(matches!(lloc.extract(), ExtractedStatement::Empty { .. }));
    }

    #[test]
    fn multi_line_statement_has_full_span() {
        let src = "total = (1 +\n         2)\nx = 3\n";
        let lloc = LogicalStatement::new(2, src);
        match lloc.extract() {
            ExtractedStatement::Statement { text, start, end } => {
                assert_eq!(start, 0);
                assert_eq!(end, 2);
                assert!(text.starts_with("total"));
            }
            other => panic!("expected statement, got {other:?}"),
        }
    }

    #[test]
    fn resolves_the_covering_node() {
        let lloc = LogicalStatement::new(3, SRC);
        let node = lloc.ast_node().unwrap();
        assert_eq!(node.kind_name(), "If");
        assert_eq!(node.line, 3);
    }

    #[test]
    fn elif_continuation_is_flagged() {
        let src = "if a:\n    pass\nelif b:\n    pass\n";
        assert!(LogicalStatement::new(3, src).is_elif_continuation());
        assert!(!LogicalStatement::new(1, src).is_elif_continuation());
    }
}
