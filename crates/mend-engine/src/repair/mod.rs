//! Hypothesis abduction, generation, testing, and the search orchestrator.

pub mod abductor;
pub mod generator;
pub mod orchestrator;
pub mod tester;

pub use abductor::HypothesisAbductor;
pub use generator::HypothesisGenerator;
pub use orchestrator::{
    localize, run_auto_debug, AutoDebugger, LocalizationReport, RepairOutcome,
};
pub use tester::{
    apply_hypothesis, classify_behavior, test_hypothesis, HypothesisVerdict, ModelTester,
    TestReport,
};
