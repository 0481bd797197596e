//! # mend-engine
//!
//! Repair engine for the Mend abductive debugger: subject-language lexing
//! and parsing, statement abstraction and fingerprints, spectrum-based
//! fault localization, a tree-walking interpreter with deadline
//! cancellation, pattern-driven hypothesis generation, and the recursive
//! refinement search.

pub mod abstraction;
pub mod coverage;
pub mod lexer;
pub mod repair;
pub mod runtime;
pub mod store;
pub mod syntax;

// The public entry points.
pub use repair::{
    localize, run_auto_debug, test_hypothesis, AutoDebugger, HypothesisGenerator,
    LocalizationReport, RepairOutcome,
};
pub use store::{InMemoryPatternStore, SqlitePatternStore};
pub use syntax::normalize_program;

use mend_core::types::{InfluencePath, SourceProgram};
use mend_core::PatternStore;

/// Stream hypotheses for a ranked influence path over a program version.
pub fn generate_hypotheses<'a>(
    influence_path: InfluencePath,
    program: &SourceProgram,
    store: &'a dyn PatternStore,
    max_complexity: usize,
) -> HypothesisGenerator<'a> {
    HypothesisGenerator::new(store, program.clone(), influence_path, max_complexity)
}
