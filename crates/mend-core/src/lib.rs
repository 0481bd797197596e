//! # mend-core
//!
//! Foundation crate for the Mend abductive repair engine.
//! Defines the data model (observations, behaviors, programs, fingerprints,
//! bug-fix patterns), the error taxonomy, configuration, test-suite parsing,
//! and the pattern-store trait. The engine crate depends on this.

pub mod config;
pub mod errors;
pub mod suite;
pub mod traits;
pub mod types;

// Re-export the most commonly used items at the crate root.
pub use config::{AbductionSchema, RepairConfig};
pub use errors::MendErrorCode;
pub use traits::PatternStore;
pub use types::collections::{FxHashMap, FxHashSet};
