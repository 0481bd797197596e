//! Test suites: typed argument values and the table/CSV front ends.

pub mod table;
pub mod value;

pub use table::TestSuite;
pub use value::{ArgValue, TestCase};
