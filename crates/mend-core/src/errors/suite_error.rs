//! Test-suite table parsing errors.

use super::error_code::MendErrorCode;

#[derive(Debug, thiserror::Error)]
pub enum SuiteError {
    #[error("test suite needs a label column and an expected-output column, got {columns}")]
    MissingColumns { columns: usize },

    #[error("argument column `{header}` is not in `name:type` form")]
    BadHeader { header: String },

    #[error("unknown argument type `{cast}` in column `{header}`")]
    UnknownCast { header: String, cast: String },

    #[error("row {row}: cannot cast `{cell}` to {cast}: {message}")]
    BadCast {
        row: usize,
        cell: String,
        cast: String,
        message: String,
    },

    #[error("row {row} has {got} cells, expected {expected}")]
    RaggedRow { row: usize, got: usize, expected: usize },
}

impl MendErrorCode for SuiteError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::MissingColumns { .. } => "SUITE_MISSING_COLUMNS",
            Self::BadHeader { .. } => "SUITE_BAD_HEADER",
            Self::UnknownCast { .. } => "SUITE_UNKNOWN_CAST",
            Self::BadCast { .. } => "SUITE_BAD_CAST",
            Self::RaggedRow { .. } => "SUITE_RAGGED_ROW",
        }
    }
}
