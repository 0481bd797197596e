//! Typed test-case argument values.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// A positional argument for a test-case invocation.
///
/// Dicts are kept as ordered pairs so stringified output is reproducible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ArgValue {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    None,
    List(Vec<ArgValue>),
    Tuple(Vec<ArgValue>),
    Dict(Vec<(ArgValue, ArgValue)>),
}

impl ArgValue {
    /// Build an argument from a JSON document (the `dict`/`json`/`list`
    /// column casts).
    pub fn from_json(value: &serde_json::Value) -> ArgValue {
        match value {
            serde_json::Value::Null => ArgValue::None,
            serde_json::Value::Bool(b) => ArgValue::Bool(*b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    ArgValue::Int(i)
                } else {
                    ArgValue::Float(n.as_f64().unwrap_or(0.0))
                }
            }
            serde_json::Value::String(s) => ArgValue::Str(s.clone()),
            serde_json::Value::Array(items) => {
                ArgValue::List(items.iter().map(ArgValue::from_json).collect())
            }
            serde_json::Value::Object(map) => ArgValue::Dict(
                map.iter()
                    .map(|(k, v)| (ArgValue::Str(k.clone()), ArgValue::from_json(v)))
                    .collect(),
            ),
        }
    }
}

/// One test case: label, positional arguments, expected output.
///
/// The expected output is compared by string equality against the
/// stringified actual result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    pub name: String,
    pub expected: String,
    pub args: SmallVec<[ArgValue; 4]>,
}

impl TestCase {
    pub fn new(
        name: impl Into<String>,
        expected: impl Into<String>,
        args: impl IntoIterator<Item = ArgValue>,
    ) -> Self {
        Self {
            name: name.into(),
            expected: expected.into(),
            args: args.into_iter().collect(),
        }
    }
}
