//! Error taxonomy for the repair engine.
//!
//! One enum per subsystem, chained into [`RepairError`] at the top.
//! Per-candidate failures never escape the search loop: the engine catches,
//! logs, and treats them as "this hypothesis did not help".

pub mod error_code;
pub mod parse_error;
pub mod abstraction_error;
pub mod runtime_error;
pub mod store_error;
pub mod suite_error;
pub mod repair_error;

pub use error_code::MendErrorCode;
pub use parse_error::ParseError;
pub use abstraction_error::AbstractionError;
pub use runtime_error::RuntimeError;
pub use store_error::StoreError;
pub use suite_error::SuiteError;
pub use repair_error::RepairError;
