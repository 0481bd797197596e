//! Syntax abstraction: slots, fingerprints, identifier pools, patterns.

pub mod abstractor;
pub mod bugfix;
pub mod builtins;
pub mod identifiers;

pub use abstractor::{AbstractedNode, SlotSeed};
pub use bugfix::pattern_from_sources;
pub use builtins::is_builtin;
pub use identifiers::{collect_identifier_pools, collect_statement_pools, merge_pools};
