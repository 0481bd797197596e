//! Data model shared between the core and the engine.

pub mod behavior;
pub mod collections;
pub mod fingerprint;
pub mod hypothesis;
pub mod observation;
pub mod source_program;

pub use behavior::Behavior;
pub use fingerprint::{BugfixPattern, IdentifierPools, NodeMetadata};
pub use hypothesis::{Hypothesis, InfluencePath};
pub use observation::{
    all_passed, explanatory_power, is_consistent, Observation, TestOutcome, TestResult,
};
pub use source_program::SourceProgram;
