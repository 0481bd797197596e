//! Pattern-store errors.

use super::error_code::MendErrorCode;

/// Errors from the corpus lookup service. The hypothesis generator treats
/// every one of these as "zero matching patterns".
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store backend error: {message}")]
    Backend { message: String },

    #[error("pattern document error: {0}")]
    Document(#[from] serde_json::Error),
}

impl MendErrorCode for StoreError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Backend { .. } => "STORE_BACKEND",
            Self::Document(_) => "STORE_DOCUMENT",
        }
    }
}
