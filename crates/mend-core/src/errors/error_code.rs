//! Stable string codes for every error variant.

/// Trait implemented by all Mend error enums to expose a stable,
/// machine-readable error code independent of the display message.
pub trait MendErrorCode {
    fn error_code(&self) -> &'static str;
}
