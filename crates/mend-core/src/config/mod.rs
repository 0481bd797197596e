//! Repair configuration.

pub mod repair_config;

pub use repair_config::{AbductionSchema, RepairConfig};
