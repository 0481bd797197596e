//! Top-level repair error.

use super::abstraction_error::AbstractionError;
use super::error_code::MendErrorCode;
use super::parse_error::ParseError;
use super::runtime_error::RuntimeError;
use super::store_error::StoreError;
use super::suite_error::SuiteError;

/// Umbrella error for the public entry points. Only conditions that make a
/// whole repair pass meaningless appear here; per-candidate failures stay
/// inside the search.
#[derive(Debug, thiserror::Error)]
pub enum RepairError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("abstraction error: {0}")]
    Abstraction(#[from] AbstractionError),

    #[error("runtime error: {0}")]
    Runtime(#[from] RuntimeError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("suite error: {0}")]
    Suite(#[from] SuiteError),

    #[error("test suite is empty")]
    EmptyTestSuite,

    #[error("target function `{name}` is empty")]
    EmptyTargetFunction { name: String },
}

impl MendErrorCode for RepairError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Parse(e) => e.error_code(),
            Self::Abstraction(e) => e.error_code(),
            Self::Runtime(e) => e.error_code(),
            Self::Store(e) => e.error_code(),
            Self::Suite(e) => e.error_code(),
            Self::EmptyTestSuite => "REPAIR_EMPTY_TEST_SUITE",
            Self::EmptyTargetFunction { .. } => "REPAIR_EMPTY_TARGET_FUNCTION",
        }
    }
}
