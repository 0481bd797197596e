//! Statement fingerprints and bug-fix patterns.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Identifier pools keyed by node kind (`Name`, `Num`, `Built-in`, ...).
/// Sorted maps/sets keep hypothesis enumeration deterministic.
pub type IdentifierPools = BTreeMap<String, BTreeSet<String>>;

/// The identifier-erased shape of one logical statement.
///
/// Two statements with identical structure (ignoring identifier and literal
/// spellings) produce equal `hexdigest` values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeMetadata {
    /// SHA-256 of `dump`, hex-encoded.
    pub hexdigest: String,
    /// Kind of the statement's root node (`If`, `Assign`, ...).
    pub ast_kind: String,
    /// Canonical textual dump of the abstracted tree; the digest input.
    pub dump: String,
    /// The abstracted tree itself, as a JSON document the engine can
    /// rehydrate for instantiation.
    pub tree: serde_json::Value,
    /// Slot name -> the concrete identifier observed at the original site.
    pub slot_identifiers: BTreeMap<String, String>,
    /// Node kind -> highest slot ordinal allocated (0-based); the per-kind
    /// slot count is `counter + 1`.
    pub slot_counters: BTreeMap<String, u32>,
}

/// A stored bug -> fix transformation.
///
/// The fix side is abstracted with the bug side's slot mapping as its seed,
/// so slot names shared between the two shapes line up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BugfixPattern {
    /// Provenance of the pattern (commit id, corpus tag), if known.
    #[serde(default)]
    pub origin: Option<String>,
    /// Identifiers visible at the original bug/fix site, merged.
    pub available_identifiers: IdentifierPools,
    pub bug: NodeMetadata,
    pub fix: NodeMetadata,
}

impl BugfixPattern {
    /// Number of distinct identifier slots in the fix mapping. Patterns are
    /// served and explored in ascending complexity order.
    pub fn complexity(&self) -> usize {
        self.fix.slot_identifiers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_round_trips_through_json() {
        let meta = NodeMetadata {
            hexdigest: "ab".into(),
            ast_kind: "If".into(),
            dump: "If()".into(),
            tree: serde_json::json!({"line": 1}),
            slot_identifiers: BTreeMap::from([("Name0".to_string(), "a".to_string())]),
            slot_counters: BTreeMap::from([("Name".to_string(), 0)]),
        };
        let pattern = BugfixPattern {
            origin: None,
            available_identifiers: BTreeMap::new(),
            bug: meta.clone(),
            fix: meta,
        };
        let text = serde_json::to_string(&pattern).unwrap();
        let back: BugfixPattern = serde_json::from_str(&text).unwrap();
        assert_eq!(back, pattern);
        assert_eq!(back.complexity(), 1);
    }
}
