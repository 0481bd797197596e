//! Errors raised by candidate programs while they execute.
//!
//! These mirror the exception classes a small Python program can raise.
//! Inside the model tester every one of them converts into a Failed test
//! outcome; none of them is fatal to the surrounding search.

use super::error_code::MendErrorCode;

#[derive(Debug, Clone, thiserror::Error)]
pub enum RuntimeError {
    #[error("TypeError: {0}")]
    Type(String),

    #[error("NameError: name '{0}' is not defined")]
    Name(String),

    #[error("AttributeError: {0}")]
    Attribute(String),

    #[error("IndexError: {0}")]
    Index(String),

    #[error("KeyError: {0}")]
    Key(String),

    #[error("ValueError: {0}")]
    Value(String),

    #[error("ZeroDivisionError: {0}")]
    ZeroDivision(String),

    #[error("ImportError: {0}")]
    Import(String),

    #[error("AssertionError: {0}")]
    Assertion(String),

    /// Raised by an explicit `raise` statement in the candidate.
    #[error("{0}")]
    Raised(String),

    /// The wall-clock deadline for the current test case elapsed.
    #[error("TimeoutError: test deadline elapsed")]
    Timeout,

    #[error("RecursionError: maximum call depth exceeded")]
    RecursionLimit,
}

impl RuntimeError {
    /// True when this error is the deadline interrupt rather than a fault
    /// of the candidate's own logic.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }
}

impl MendErrorCode for RuntimeError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Type(_) => "RUNTIME_TYPE",
            Self::Name(_) => "RUNTIME_NAME",
            Self::Attribute(_) => "RUNTIME_ATTRIBUTE",
            Self::Index(_) => "RUNTIME_INDEX",
            Self::Key(_) => "RUNTIME_KEY",
            Self::Value(_) => "RUNTIME_VALUE",
            Self::ZeroDivision(_) => "RUNTIME_ZERO_DIVISION",
            Self::Import(_) => "RUNTIME_IMPORT",
            Self::Assertion(_) => "RUNTIME_ASSERTION",
            Self::Raised(_) => "RUNTIME_RAISED",
            Self::Timeout => "RUNTIME_TIMEOUT",
            Self::RecursionLimit => "RUNTIME_RECURSION_LIMIT",
        }
    }
}
