//! Execution of candidate programs: values, modules, the interpreter, and
//! the deadline primitive.

pub mod builtins;
pub mod deadline;
pub mod interpreter;
pub mod module;
pub mod value;

pub use deadline::Deadline;
pub use interpreter::{Interpreter, NoopSink, TraceSink};
pub use module::{Function, Module, Param};
pub use value::Value;

use mend_core::suite::ArgValue;

/// Convert a suite argument into a runtime value.
pub fn value_from_arg(arg: &ArgValue) -> Value {
    match arg {
        ArgValue::Int(i) => Value::Int(*i),
        ArgValue::Float(f) => Value::Float(*f),
        ArgValue::Str(s) => Value::str(s.clone()),
        ArgValue::Bool(b) => Value::Bool(*b),
        ArgValue::None => Value::None,
        ArgValue::List(items) => Value::list(items.iter().map(value_from_arg).collect()),
        ArgValue::Tuple(items) => Value::tuple(items.iter().map(value_from_arg).collect()),
        ArgValue::Dict(pairs) => Value::dict(
            pairs
                .iter()
                .map(|(k, v)| (value_from_arg(k), value_from_arg(v)))
                .collect(),
        ),
    }
}
