//! In-memory executable units.
//!
//! A candidate program loads into a fresh [`Module`]: its top-level
//! statements execute once, function definitions register by name, and no
//! state survives from one candidate to the next.

use std::rc::Rc;

use mend_core::errors::RuntimeError;
use mend_core::FxHashMap;

use crate::syntax::ast::{Node, NodeKind};

use super::interpreter::{Interpreter, NoopSink};
use super::value::Value;

/// A callable defined by the candidate program.
#[derive(Debug, Clone)]
pub struct Function {
    pub name: String,
    pub params: Rc<Vec<Param>>,
    pub body: Rc<Vec<Node>>,
}

#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub default: Option<Node>,
}

/// A loaded candidate program: its functions and module globals.
#[derive(Debug, Default)]
pub struct Module {
    pub functions: FxHashMap<String, Function>,
    pub globals: FxHashMap<String, Value>,
}

impl Module {
    /// Execute the module body in fresh state.
    pub fn load(module_ast: &Node) -> Result<Module, RuntimeError> {
        let NodeKind::Module { body } = &module_ast.kind else {
            return Err(RuntimeError::Import("not a module".into()));
        };
        let mut module = Module::default();
        let mut sink = NoopSink;
        let mut interpreter = Interpreter::new(&mut module, &mut sink, None);
        interpreter.exec_module_body(body)?;
        Ok(module)
    }

    pub fn function(&self, name: &str) -> Option<Function> {
        self.functions.get(name).cloned()
    }

    pub fn function_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.functions.keys().cloned().collect();
        names.sort();
        names
    }

    pub(crate) fn register(&mut self, node: &Node) -> Result<(), RuntimeError> {
        let (name, args, body) = match &node.kind {
            NodeKind::FunctionDef { name, args, body }
            | NodeKind::AsyncFunctionDef { name, args, body } => (name, args, body),
            _ => return Err(RuntimeError::Import("not a function definition".into())),
        };
        let params = args
            .iter()
            .map(|arg| match &arg.kind {
                NodeKind::Arg { arg, default } => Ok(Param {
                    name: arg.clone(),
                    default: default.as_deref().cloned(),
                }),
                other => Err(RuntimeError::Import(format!(
                    "unsupported parameter form '{}'",
                    other.kind_name()
                ))),
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.functions.insert(
            name.clone(),
            Function {
                name: name.clone(),
                params: Rc::new(params),
                body: Rc::new(body.clone()),
            },
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parser::parse_module;

    #[test]
    fn loading_registers_functions_and_globals() {
        let ast = parse_module("LIMIT = 3\ndef f(x):\n    return x\n").unwrap();
        let module = Module::load(&ast).unwrap();
        assert!(module.function("f").is_some());
        assert!(module.globals.contains_key("LIMIT"));
    }

    #[test]
    fn each_load_is_isolated() {
        let ast = parse_module("counter = 0\n").unwrap();
        let first = Module::load(&ast).unwrap();
        let second = Module::load(&ast).unwrap();
        assert!(first.globals.contains_key("counter"));
        assert!(second.globals.contains_key("counter"));
    }
}
