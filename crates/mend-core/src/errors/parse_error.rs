//! Candidate-source parsing errors.

use super::error_code::MendErrorCode;

/// Errors raised while turning candidate source text into a syntax tree.
///
/// A `ParseError` on a candidate is never retried; it surfaces as a
/// localization failure with an empty fingerprint.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("syntax error at line {line}: {message}")]
    Syntax { line: u32, message: String },

    #[error("unsupported syntax `{kind}` at line {line}")]
    UnsupportedSyntax { kind: String, line: u32 },

    #[error("grammar could not be loaded: {message}")]
    GrammarNotFound { message: String },

    #[error("parser produced no tree")]
    TreeUnavailable,
}

impl MendErrorCode for ParseError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Syntax { .. } => "PARSE_SYNTAX",
            Self::UnsupportedSyntax { .. } => "PARSE_UNSUPPORTED_SYNTAX",
            Self::GrammarNotFound { .. } => "PARSE_GRAMMAR_NOT_FOUND",
            Self::TreeUnavailable => "PARSE_TREE_UNAVAILABLE",
        }
    }
}
