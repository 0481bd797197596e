//! Shared collection aliases.
//!
//! FxHashMap iteration order is arbitrary; anything that feeds hypothesis
//! enumeration or ranking must go through `BTreeMap`/`BTreeSet` instead.

pub use rustc_hash::{FxHashMap, FxHashSet};
