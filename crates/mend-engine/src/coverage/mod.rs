//! Coverage collection and spectrum-based fault localization.

pub mod call_graph;
pub mod collector;
pub mod ranking;
pub mod spectrum;

pub use call_graph::reachable_functions;
pub use collector::{CoverageCollector, CoverageEvent};
pub use ranking::{kind_priority, line_priorities, STATEMENT_RANKING};
pub use spectrum::SpectrumDebugger;
