//! Syntax-abstraction errors.

use super::error_code::MendErrorCode;

/// Errors raised while abstracting a statement into a fingerprint or while
/// building a bug-fix pattern from a source pair.
#[derive(Debug, thiserror::Error)]
pub enum AbstractionError {
    #[error("malformed tree: {message}")]
    MalformedTree { message: String },

    #[error("no logical statement covers line {line}")]
    NoStatement { line: u32 },

    #[error("bug and fix abstract to the same shape ({hexdigest})")]
    EqualShapes { hexdigest: String },
}

impl MendErrorCode for AbstractionError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::MalformedTree { .. } => "ABSTRACT_MALFORMED_TREE",
            Self::NoStatement { .. } => "ABSTRACT_NO_STATEMENT",
            Self::EqualShapes { .. } => "ABSTRACT_EQUAL_SHAPES",
        }
    }
}
