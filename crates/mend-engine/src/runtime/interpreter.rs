//! Tree-walking interpreter with coverage tracing and cooperative
//! cancellation.
//!
//! Every executed statement reports a `(function, line)` event to the trace
//! sink, and the interrupt flag is polled at every statement so a pending
//! deadline converts the in-flight call into a timeout error instead of
//! hanging the search.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use mend_core::errors::RuntimeError;
use mend_core::{FxHashMap, FxHashSet};

use crate::syntax::ast::{Node, NodeKind};

use super::builtins::{call_builtin, method_call};
use super::module::{Function, Module};
use super::value::{binary_op, compare_op, Value};

/// Receives one event per executed statement.
pub trait TraceSink {
    fn event(&mut self, function: &str, line: u32);
}

/// Sink for untraced execution (module loading).
pub struct NoopSink;

impl TraceSink for NoopSink {
    fn event(&mut self, _function: &str, _line: u32) {}
}

const MAX_CALL_DEPTH: usize = 200;

enum Flow {
    Normal,
    Break,
    Continue,
    Return(Value),
}

struct Frame {
    function: String,
    locals: FxHashMap<String, Value>,
    global_names: FxHashSet<String>,
    is_module: bool,
}

impl Frame {
    fn module_level() -> Self {
        Self {
            function: "<module>".to_string(),
            locals: FxHashMap::default(),
            global_names: FxHashSet::default(),
            is_module: true,
        }
    }

    fn for_call(function: &str) -> Self {
        Self {
            function: function.to_string(),
            locals: FxHashMap::default(),
            global_names: FxHashSet::default(),
            is_module: false,
        }
    }
}

pub struct Interpreter<'a> {
    module: &'a mut Module,
    sink: &'a mut dyn TraceSink,
    interrupt: Option<Arc<AtomicBool>>,
    depth: usize,
}

impl<'a> Interpreter<'a> {
    pub fn new(
        module: &'a mut Module,
        sink: &'a mut dyn TraceSink,
        interrupt: Option<Arc<AtomicBool>>,
    ) -> Self {
        Self {
            module,
            sink,
            interrupt,
            depth: 0,
        }
    }

    /// Execute a module body at module scope.
    pub fn exec_module_body(&mut self, body: &[Node]) -> Result<(), RuntimeError> {
        let mut frame = Frame::module_level();
        self.exec_block(body, &mut frame)?;
        Ok(())
    }

    /// Invoke a module function with positional arguments.
    pub fn call_function(&mut self, name: &str, args: Vec<Value>) -> Result<Value, RuntimeError> {
        let function = self.module.function(name).ok_or_else(|| {
            RuntimeError::Import(format!("cannot import name '{name}' from candidate module"))
        })?;
        self.call(&function, args)
    }

    fn call(&mut self, function: &Function, args: Vec<Value>) -> Result<Value, RuntimeError> {
        if self.depth >= MAX_CALL_DEPTH {
            return Err(RuntimeError::RecursionLimit);
        }
        if args.len() > function.params.len() {
            return Err(RuntimeError::Type(format!(
                "{}() takes {} positional arguments but {} were given",
                function.name,
                function.params.len(),
                args.len()
            )));
        }
        let mut frame = Frame::for_call(&function.name);
        let mut args = args.into_iter();
        for param in function.params.iter() {
            match args.next() {
                Some(value) => {
                    frame.locals.insert(param.name.clone(), value);
                }
                None => match &param.default {
                    Some(default) => {
                        let value = self.eval(default, &mut Frame::for_call(&function.name))?;
                        frame.locals.insert(param.name.clone(), value);
                    }
                    None => {
                        return Err(RuntimeError::Type(format!(
                            "{}() missing required positional argument: '{}'",
                            function.name, param.name
                        )));
                    }
                },
            }
        }
        self.depth += 1;
        let flow = self.exec_block(&function.body, &mut frame);
        self.depth -= 1;
        match flow? {
            Flow::Return(value) => Ok(value),
            _ => Ok(Value::None),
        }
    }

    fn check_interrupt(&self) -> Result<(), RuntimeError> {
        if let Some(flag) = &self.interrupt {
            if flag.load(Ordering::SeqCst) {
                return Err(RuntimeError::Timeout);
            }
        }
        Ok(())
    }

    fn trace(&mut self, frame: &Frame, line: u32) {
        self.sink.event(&frame.function, line);
    }

    fn exec_block(&mut self, body: &[Node], frame: &mut Frame) -> Result<Flow, RuntimeError> {
        for statement in body {
            match self.exec_stmt(statement, frame)? {
                Flow::Normal => {}
                other => return Ok(other),
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_stmt(&mut self, stmt: &Node, frame: &mut Frame) -> Result<Flow, RuntimeError> {
        self.check_interrupt()?;
        self.trace(frame, stmt.line);
        match &stmt.kind {
            NodeKind::Expr { value } => {
                self.eval(value, frame)?;
                Ok(Flow::Normal)
            }
            NodeKind::Assign { targets, value } => {
                let value = self.eval(value, frame)?;
                for target in targets {
                    self.assign(target, value.clone(), frame)?;
                }
                Ok(Flow::Normal)
            }
            NodeKind::AugAssign { target, op, value } => {
                let current = self.eval(target, frame)?;
                let rhs = self.eval(value, frame)?;
                let result = binary_op(op, &current, &rhs)?;
                self.assign(target, result, frame)?;
                Ok(Flow::Normal)
            }
            NodeKind::AnnAssign { target, value, .. } => {
                if let Some(value) = value {
                    let value = self.eval(value, frame)?;
                    self.assign(target, value, frame)?;
                }
                Ok(Flow::Normal)
            }
            NodeKind::If { test, body, orelse } => {
                if self.eval(test, frame)?.is_truthy() {
                    self.exec_block(body, frame)
                } else {
                    self.exec_block(orelse, frame)
                }
            }
            NodeKind::While { test, body, orelse } => {
                loop {
                    self.check_interrupt()?;
                    self.trace(frame, stmt.line);
                    if !self.eval(test, frame)?.is_truthy() {
                        return self.exec_block(orelse, frame);
                    }
                    match self.exec_block(body, frame)? {
                        Flow::Normal | Flow::Continue => {}
                        Flow::Break => return Ok(Flow::Normal),
                        flow @ Flow::Return(_) => return Ok(flow),
                    }
                }
            }
            NodeKind::For {
                target,
                iter,
                body,
                orelse,
            }
            | NodeKind::AsyncFor {
                target,
                iter,
                body,
                orelse,
            } => {
                let items = self.eval(iter, frame)?.iter_items()?;
                for item in items {
                    self.check_interrupt()?;
                    self.trace(frame, stmt.line);
                    self.assign(target, item, frame)?;
                    match self.exec_block(body, frame)? {
                        Flow::Normal | Flow::Continue => {}
                        Flow::Break => return Ok(Flow::Normal),
                        flow @ Flow::Return(_) => return Ok(flow),
                    }
                }
                self.exec_block(orelse, frame)
            }
            NodeKind::Return { value } => {
                let value = match value {
                    Some(v) => self.eval(v, frame)?,
                    None => Value::None,
                };
                Ok(Flow::Return(value))
            }
            NodeKind::Raise { exc } => Err(self.raised_error(exc.as_deref(), frame)),
            NodeKind::Assert { test, msg } => {
                if self.eval(test, frame)?.is_truthy() {
                    Ok(Flow::Normal)
                } else {
                    let message = match msg {
                        Some(m) => self.eval(m, frame)?.str_value(),
                        None => "assertion failed".to_string(),
                    };
                    Err(RuntimeError::Assertion(message))
                }
            }
            NodeKind::Try {
                body,
                handlers,
                orelse,
                finalbody,
            } => self.exec_try(body, handlers, orelse, finalbody, frame),
            NodeKind::FunctionDef { .. } | NodeKind::AsyncFunctionDef { .. } => {
                self.module.register(stmt)?;
                Ok(Flow::Normal)
            }
            NodeKind::ClassDef { .. } => {
                // Class bodies are outside the supported subset; their
                // methods are not reachable as plain functions.
                tracing::debug!(line = stmt.line, "skipping class definition");
                Ok(Flow::Normal)
            }
            NodeKind::Global { names } => {
                for name in names {
                    frame.global_names.insert(name.clone());
                }
                Ok(Flow::Normal)
            }
            NodeKind::Import { .. } | NodeKind::ImportFrom { .. } => {
                tracing::debug!(line = stmt.line, "ignoring import in candidate module");
                Ok(Flow::Normal)
            }
            NodeKind::Delete { targets } => {
                for target in targets {
                    self.delete(target, frame)?;
                }
                Ok(Flow::Normal)
            }
            NodeKind::With { items, body } => {
                for item in items {
                    self.eval(item, frame)?;
                }
                self.exec_block(body, frame)
            }
            NodeKind::Pass => Ok(Flow::Normal),
            NodeKind::Break => Ok(Flow::Break),
            NodeKind::Continue => Ok(Flow::Continue),
            other => Err(RuntimeError::Type(format!(
                "unsupported statement '{}'",
                other.kind_name()
            ))),
        }
    }

    fn exec_try(
        &mut self,
        body: &[Node],
        handlers: &[Node],
        orelse: &[Node],
        finalbody: &[Node],
        frame: &mut Frame,
    ) -> Result<Flow, RuntimeError> {
        let result = self.exec_block(body, frame);
        let outcome = match result {
            Ok(flow) => {
                let flow = match flow {
                    Flow::Normal => self.exec_block(orelse, frame)?,
                    other => other,
                };
                Ok(flow)
            }
            Err(error) => {
                if !error_is_catchable(&error) {
                    self.exec_block(finalbody, frame)?;
                    return Err(error);
                }
                let mut handled = None;
                for handler in handlers {
                    let NodeKind::ExceptHandler { typ, name, body } = &handler.kind else {
                        continue;
                    };
                    if self.handler_matches(typ.as_deref(), &error, frame)? {
                        self.trace(frame, handler.line);
                        if let Some(name) = name {
                            frame
                                .locals
                                .insert(name.clone(), Value::str(error.to_string()));
                        }
                        handled = Some(self.exec_block(body, frame)?);
                        break;
                    }
                }
                match handled {
                    Some(flow) => Ok(flow),
                    None => Err(error),
                }
            }
        };
        match outcome {
            Ok(flow) => {
                match self.exec_block(finalbody, frame)? {
                    Flow::Normal => Ok(flow),
                    final_flow => Ok(final_flow),
                }
            }
            Err(error) => {
                self.exec_block(finalbody, frame)?;
                Err(error)
            }
        }
    }

    fn handler_matches(
        &mut self,
        typ: Option<&Node>,
        error: &RuntimeError,
        _frame: &mut Frame,
    ) -> Result<bool, RuntimeError> {
        let Some(typ) = typ else {
            return Ok(true);
        };
        match &typ.kind {
            NodeKind::Name { id } => Ok(exception_matches(error, id)),
            NodeKind::Tuple { elts } => Ok(elts.iter().any(|e| match &e.kind {
                NodeKind::Name { id } => exception_matches(error, id),
                _ => false,
            })),
            _ => Ok(false),
        }
    }

    fn raised_error(&mut self, exc: Option<&Node>, frame: &mut Frame) -> RuntimeError {
        let Some(exc) = exc else {
            return RuntimeError::Raised("RuntimeError: no active exception to re-raise".into());
        };
        match &exc.kind {
            NodeKind::Call { func, args } => {
                if let NodeKind::Name { id } = &func.kind {
                    let message = args
                        .first()
                        .and_then(|a| self.eval(a, frame).ok())
                        .map(|v| v.str_value())
                        .unwrap_or_default();
                    return raise_by_name(id, &message);
                }
                RuntimeError::Raised("RuntimeError: unsupported raise form".into())
            }
            NodeKind::Name { id } => raise_by_name(id, ""),
            _ => match self.eval(exc, frame) {
                Ok(value) => RuntimeError::Raised(value.str_value()),
                Err(error) => error,
            },
        }
    }

    fn assign(&mut self, target: &Node, value: Value, frame: &mut Frame) -> Result<(), RuntimeError> {
        match &target.kind {
            NodeKind::Name { id } => {
                self.bind_name(id, value, frame);
                Ok(())
            }
            NodeKind::Tuple { elts } | NodeKind::List { elts } => {
                let items = value.iter_items()?;
                if items.len() != elts.len() {
                    return Err(RuntimeError::Value(format!(
                        "cannot unpack {} values into {} targets",
                        items.len(),
                        elts.len()
                    )));
                }
                for (element, item) in elts.iter().zip(items.into_iter()) {
                    self.assign(element, item, frame)?;
                }
                Ok(())
            }
            NodeKind::Subscript { value: obj, index } => {
                let container = self.eval(obj, frame)?;
                let key = self.eval(index, frame)?;
                set_item(&container, &key, value)
            }
            NodeKind::Attribute { .. } => Err(RuntimeError::Attribute(
                "attribute assignment is not supported".into(),
            )),
            other => Err(RuntimeError::Type(format!(
                "cannot assign to '{}'",
                other.kind_name()
            ))),
        }
    }

    fn bind_name(&mut self, name: &str, value: Value, frame: &mut Frame) {
        if frame.is_module || frame.global_names.contains(name) {
            self.module.globals.insert(name.to_string(), value);
        } else {
            frame.locals.insert(name.to_string(), value);
        }
    }

    fn delete(&mut self, target: &Node, frame: &mut Frame) -> Result<(), RuntimeError> {
        match &target.kind {
            NodeKind::Name { id } => {
                let removed = if frame.is_module || frame.global_names.contains(id) {
                    self.module.globals.remove(id).is_some()
                } else {
                    frame.locals.remove(id).is_some()
                };
                if removed {
                    Ok(())
                } else {
                    Err(RuntimeError::Name(id.clone()))
                }
            }
            NodeKind::Subscript { value, index } => {
                let container = self.eval(value, frame)?;
                let key = self.eval(index, frame)?;
                delete_item(&container, &key)
            }
            other => Err(RuntimeError::Type(format!(
                "cannot delete '{}'",
                other.kind_name()
            ))),
        }
    }

    fn eval(&mut self, expr: &Node, frame: &mut Frame) -> Result<Value, RuntimeError> {
        match &expr.kind {
            NodeKind::Name { id } => self.lookup(id, frame),
            NodeKind::Num { value } => parse_number(value),
            NodeKind::Str { value } | NodeKind::Bytes { value } => Ok(Value::str(value.clone())),
            NodeKind::NameConstant { value } => Ok(match value.as_str() {
                "True" => Value::Bool(true),
                "False" => Value::Bool(false),
                _ => Value::None,
            }),
            NodeKind::BoolOp { op, values } => {
                let mut last = Value::None;
                for value in values {
                    last = self.eval(value, frame)?;
                    let truthy = last.is_truthy();
                    if (op == "and" && !truthy) || (op == "or" && truthy) {
                        return Ok(last);
                    }
                }
                Ok(last)
            }
            NodeKind::BinOp { left, op, right } => {
                let left = self.eval(left, frame)?;
                let right = self.eval(right, frame)?;
                binary_op(op, &left, &right)
            }
            NodeKind::UnaryOp { op, operand } => {
                let value = self.eval(operand, frame)?;
                match op.as_str() {
                    "not" => Ok(Value::Bool(!value.is_truthy())),
                    "-" => match value {
                        Value::Int(i) => Ok(Value::Int(-i)),
                        Value::Float(f) => Ok(Value::Float(-f)),
                        Value::Bool(b) => Ok(Value::Int(if b { -1 } else { 0 })),
                        other => Err(RuntimeError::Type(format!(
                            "bad operand type for unary -: '{}'",
                            other.type_name()
                        ))),
                    },
                    "+" => match value {
                        v @ (Value::Int(_) | Value::Float(_)) => Ok(v),
                        Value::Bool(b) => Ok(Value::Int(if b { 1 } else { 0 })),
                        other => Err(RuntimeError::Type(format!(
                            "bad operand type for unary +: '{}'",
                            other.type_name()
                        ))),
                    },
                    "~" => match value.as_int() {
                        Some(i) => Ok(Value::Int(!i)),
                        None => Err(RuntimeError::Type(format!(
                            "bad operand type for unary ~: '{}'",
                            value.type_name()
                        ))),
                    },
                    other => Err(RuntimeError::Type(format!(
                        "unsupported unary operator '{other}'"
                    ))),
                }
            }
            NodeKind::Compare {
                left,
                ops,
                comparators,
            } => {
                let mut current = self.eval(left, frame)?;
                for (op, comparator) in ops.iter().zip(comparators.iter()) {
                    let next = self.eval(comparator, frame)?;
                    if !compare_op(op, &current, &next)? {
                        return Ok(Value::Bool(false));
                    }
                    current = next;
                }
                Ok(Value::Bool(true))
            }
            NodeKind::IfExp { test, body, orelse } => {
                if self.eval(test, frame)?.is_truthy() {
                    self.eval(body, frame)
                } else {
                    self.eval(orelse, frame)
                }
            }
            NodeKind::Call { func, args } => self.eval_call(func, args, frame),
            NodeKind::Attribute { attr, .. } => Err(RuntimeError::Attribute(format!(
                "attribute '{attr}' is only supported in call position"
            ))),
            NodeKind::Subscript { value, index } => {
                let container = self.eval(value, frame)?;
                if let NodeKind::Slice { lower, upper, step } = &index.kind {
                    let lower = self.eval_opt_int(lower.as_deref(), frame)?;
                    let upper = self.eval_opt_int(upper.as_deref(), frame)?;
                    let step = self.eval_opt_int(step.as_deref(), frame)?;
                    return slice_value(&container, lower, upper, step);
                }
                let key = self.eval(index, frame)?;
                get_item(&container, &key)
            }
            NodeKind::List { elts } => {
                let items = elts
                    .iter()
                    .map(|e| self.eval(e, frame))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::list(items))
            }
            NodeKind::Tuple { elts } => {
                let items = elts
                    .iter()
                    .map(|e| self.eval(e, frame))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::tuple(items))
            }
            NodeKind::Dict { keys, values } => {
                let mut pairs = Vec::with_capacity(keys.len());
                for (k, v) in keys.iter().zip(values.iter()) {
                    pairs.push((self.eval(k, frame)?, self.eval(v, frame)?));
                }
                Ok(Value::dict(pairs))
            }
            other => Err(RuntimeError::Type(format!(
                "unsupported expression '{}'",
                other.kind_name()
            ))),
        }
    }

    fn eval_opt_int(
        &mut self,
        node: Option<&Node>,
        frame: &mut Frame,
    ) -> Result<Option<i64>, RuntimeError> {
        match node {
            Some(n) => {
                let value = self.eval(n, frame)?;
                value
                    .as_int()
                    .map(Some)
                    .ok_or_else(|| {
                        RuntimeError::Type(format!(
                            "slice indices must be integers, not '{}'",
                            value.type_name()
                        ))
                    })
            }
            None => Ok(None),
        }
    }

    fn eval_call(
        &mut self,
        func: &Node,
        args: &[Node],
        frame: &mut Frame,
    ) -> Result<Value, RuntimeError> {
        let arg_values = args
            .iter()
            .map(|a| self.eval(a, frame))
            .collect::<Result<Vec<_>, _>>()?;
        match &func.kind {
            NodeKind::Name { id } => {
                if let Some(function) = self.module.function(id) {
                    return self.call(&function, arg_values);
                }
                if let Some(result) = call_builtin(id, &arg_values) {
                    return result;
                }
                if frame.locals.contains_key(id) || self.module.globals.contains_key(id) {
                    return Err(RuntimeError::Type(format!("'{id}' object is not callable")));
                }
                Err(RuntimeError::Name(id.clone()))
            }
            NodeKind::Attribute { value, attr } => {
                let receiver = self.eval(value, frame)?;
                method_call(&receiver, attr, &arg_values)
            }
            other => Err(RuntimeError::Type(format!(
                "'{}' object is not callable",
                other.kind_name()
            ))),
        }
    }

    fn lookup(&self, name: &str, frame: &Frame) -> Result<Value, RuntimeError> {
        if !frame.is_module {
            if let Some(value) = frame.locals.get(name) {
                return Ok(value.clone());
            }
        }
        if let Some(value) = self.module.globals.get(name) {
            return Ok(value.clone());
        }
        Err(RuntimeError::Name(name.to_string()))
    }
}

/// Timeout and recursion exhaustion are interpreter-level interrupts; the
/// candidate's own `except` clauses never see them.
fn error_is_catchable(error: &RuntimeError) -> bool {
    !matches!(error, RuntimeError::Timeout | RuntimeError::RecursionLimit)
}

fn exception_matches(error: &RuntimeError, class_name: &str) -> bool {
    if !error_is_catchable(error) {
        return false;
    }
    if matches!(class_name, "Exception" | "BaseException") {
        return true;
    }
    error_class(error) == class_name
}

fn error_class(error: &RuntimeError) -> &str {
    match error {
        RuntimeError::Type(_) => "TypeError",
        RuntimeError::Name(_) => "NameError",
        RuntimeError::Attribute(_) => "AttributeError",
        RuntimeError::Index(_) => "IndexError",
        RuntimeError::Key(_) => "KeyError",
        RuntimeError::Value(_) => "ValueError",
        RuntimeError::ZeroDivision(_) => "ZeroDivisionError",
        RuntimeError::Import(_) => "ImportError",
        RuntimeError::Assertion(_) => "AssertionError",
        RuntimeError::Raised(message) => message.split(':').next().unwrap_or("RuntimeError").trim(),
        RuntimeError::Timeout => "TimeoutError",
        RuntimeError::RecursionLimit => "RecursionError",
    }
}

fn raise_by_name(class_name: &str, message: &str) -> RuntimeError {
    let message = message.to_string();
    match class_name {
        "TypeError" => RuntimeError::Type(message),
        "ValueError" => RuntimeError::Value(message),
        "KeyError" => RuntimeError::Key(message),
        "IndexError" => RuntimeError::Index(message),
        "NameError" => RuntimeError::Name(message),
        "AttributeError" => RuntimeError::Attribute(message),
        "ZeroDivisionError" => RuntimeError::ZeroDivision(message),
        "ImportError" => RuntimeError::Import(message),
        "AssertionError" => RuntimeError::Assertion(message),
        other => RuntimeError::Raised(format!("{other}: {message}")),
    }
}

fn parse_number(text: &str) -> Result<Value, RuntimeError> {
    let cleaned = text.replace('_', "");
    if let Some(hex) = cleaned.strip_prefix("0x").or_else(|| cleaned.strip_prefix("0X")) {
        return i64::from_str_radix(hex, 16)
            .map(Value::Int)
            .map_err(|e| RuntimeError::Value(e.to_string()));
    }
    if let Some(oct) = cleaned.strip_prefix("0o").or_else(|| cleaned.strip_prefix("0O")) {
        return i64::from_str_radix(oct, 8)
            .map(Value::Int)
            .map_err(|e| RuntimeError::Value(e.to_string()));
    }
    if let Some(bin) = cleaned.strip_prefix("0b").or_else(|| cleaned.strip_prefix("0B")) {
        return i64::from_str_radix(bin, 2)
            .map(Value::Int)
            .map_err(|e| RuntimeError::Value(e.to_string()));
    }
    if !cleaned.contains(['.', 'e', 'E']) {
        if let Ok(i) = cleaned.parse::<i64>() {
            return Ok(Value::Int(i));
        }
    }
    cleaned
        .parse::<f64>()
        .map(Value::Float)
        .map_err(|e| RuntimeError::Value(format!("invalid numeric literal '{text}': {e}")))
}

fn get_item(container: &Value, key: &Value) -> Result<Value, RuntimeError> {
    match container {
        Value::List(items) => {
            let items = items.borrow();
            let idx = normalize_index(key, items.len(), "list")?;
            Ok(items[idx].clone())
        }
        Value::Tuple(items) => {
            let idx = normalize_index(key, items.len(), "tuple")?;
            Ok(items[idx].clone())
        }
        Value::Str(s) => {
            let chars: Vec<char> = s.chars().collect();
            let idx = normalize_index(key, chars.len(), "string")?;
            Ok(Value::str(chars[idx].to_string()))
        }
        Value::Dict(pairs) => pairs
            .borrow()
            .iter()
            .find(|(k, _)| k.py_eq(key))
            .map(|(_, v)| v.clone())
            .ok_or_else(|| RuntimeError::Key(key.repr())),
        other => Err(RuntimeError::Type(format!(
            "'{}' object is not subscriptable",
            other.type_name()
        ))),
    }
}

fn set_item(container: &Value, key: &Value, value: Value) -> Result<(), RuntimeError> {
    match container {
        Value::List(items) => {
            let mut items = items.borrow_mut();
            let len = items.len();
            let idx = normalize_index(key, len, "list")?;
            items[idx] = value;
            Ok(())
        }
        Value::Dict(pairs) => {
            let mut pairs = pairs.borrow_mut();
            if let Some(slot) = pairs.iter_mut().find(|(k, _)| k.py_eq(key)) {
                slot.1 = value;
            } else {
                pairs.push((key.clone(), value));
            }
            Ok(())
        }
        other => Err(RuntimeError::Type(format!(
            "'{}' object does not support item assignment",
            other.type_name()
        ))),
    }
}

fn delete_item(container: &Value, key: &Value) -> Result<(), RuntimeError> {
    match container {
        Value::List(items) => {
            let mut items = items.borrow_mut();
            let len = items.len();
            let idx = normalize_index(key, len, "list")?;
            items.remove(idx);
            Ok(())
        }
        Value::Dict(pairs) => {
            let mut pairs = pairs.borrow_mut();
            let position = pairs.iter().position(|(k, _)| k.py_eq(key));
            match position {
                Some(idx) => {
                    pairs.remove(idx);
                    Ok(())
                }
                None => Err(RuntimeError::Key(key.repr())),
            }
        }
        other => Err(RuntimeError::Type(format!(
            "'{}' object does not support item deletion",
            other.type_name()
        ))),
    }
}

fn normalize_index(key: &Value, len: usize, what: &str) -> Result<usize, RuntimeError> {
    let raw = key.as_int().ok_or_else(|| {
        RuntimeError::Type(format!(
            "{what} indices must be integers, not '{}'",
            key.type_name()
        ))
    })?;
    let idx = if raw < 0 { raw + len as i64 } else { raw };
    if idx < 0 || idx as usize >= len {
        return Err(RuntimeError::Index(format!("{what} index out of range")));
    }
    Ok(idx as usize)
}

fn slice_value(
    container: &Value,
    lower: Option<i64>,
    upper: Option<i64>,
    step: Option<i64>,
) -> Result<Value, RuntimeError> {
    let step = step.unwrap_or(1);
    if step == 0 {
        return Err(RuntimeError::Value("slice step cannot be zero".into()));
    }
    let slice_indices = |len: usize| -> Vec<usize> {
        let len = len as i64;
        let clamp = |v: i64| v.clamp(if step > 0 { 0 } else { -1 }, len);
        let (default_lower, default_upper) = if step > 0 { (0, len) } else { (len - 1, -1) };
        let resolve = |bound: Option<i64>, default: i64| match bound {
            Some(b) if b < 0 => clamp(b + len),
            Some(b) => clamp(b),
            None => default,
        };
        let (mut current, stop) = (resolve(lower, default_lower), resolve(upper, default_upper));
        let mut out = Vec::new();
        if step > 0 {
            while current < stop {
                out.push(current as usize);
                current += step;
            }
        } else {
            while current > stop {
                if current >= 0 && current < len {
                    out.push(current as usize);
                }
                current += step;
            }
        }
        out
    };
    match container {
        Value::Str(s) => {
            let chars: Vec<char> = s.chars().collect();
            let text: String = slice_indices(chars.len()).into_iter().map(|i| chars[i]).collect();
            Ok(Value::str(text))
        }
        Value::List(items) => {
            let items = items.borrow();
            let out: Vec<Value> = slice_indices(items.len())
                .into_iter()
                .map(|i| items[i].clone())
                .collect();
            Ok(Value::list(out))
        }
        Value::Tuple(items) => {
            let out: Vec<Value> = slice_indices(items.len())
                .into_iter()
                .map(|i| items[i].clone())
                .collect();
            Ok(Value::tuple(out))
        }
        other => Err(RuntimeError::Type(format!(
            "'{}' object is not sliceable",
            other.type_name()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parser::parse_module;

    fn run(source: &str, function: &str, args: Vec<Value>) -> Result<Value, RuntimeError> {
        let ast = parse_module(source).unwrap();
        let mut module = Module::load(&ast).unwrap();
        let mut sink = NoopSink;
        let mut interp = Interpreter::new(&mut module, &mut sink, None);
        interp.call_function(function, args)
    }

    #[test]
    fn arithmetic_and_control_flow_work() {
        let src = "def fact(n):\n    total = 1\n    while n > 1:\n        total = total * n\n        n = n - 1\n    return total\n";
        let out = run(src, "fact", vec![Value::Int(5)]).unwrap();
        assert_eq!(out.str_value(), "120");
    }

    #[test]
    fn iterating_a_dict_yields_keys_and_plus_fails() {
        let src = "def total(prices):\n    acc = 0\n    for v in prices:\n        acc += v\n    return acc\n";
        let dict = Value::dict(vec![(Value::str("a"), Value::Int(1))]);
        let err = run(src, "total", vec![dict]).unwrap_err();
        assert!(matches!(err, RuntimeError::Type(_)), "{err}");
    }

    #[test]
    fn dict_values_method_fixes_the_iteration() {
        let src = "def total(prices):\n    acc = 0\n    for v in prices.values():\n        acc += v\n    return acc\n";
        let dict = Value::dict(vec![
            (Value::str("a"), Value::Int(1)),
            (Value::str("b"), Value::Int(2)),
        ]);
        let out = run(src, "total", vec![dict]).unwrap();
        assert_eq!(out.str_value(), "3");
    }

    #[test]
    fn for_else_runs_when_no_break() {
        let src = "def check(n):\n    for j in range(2, n):\n        if n % j == 0:\n            return False\n    else:\n        return True\n";
        assert_eq!(run(src, "check", vec![Value::Int(7)]).unwrap().str_value(), "True");
        assert_eq!(run(src, "check", vec![Value::Int(8)]).unwrap().str_value(), "False");
    }

    #[test]
    fn try_except_catches_matching_class() {
        let src = "def guard(d):\n    try:\n        return d['missing']\n    except KeyError:\n        return 'fallback'\n";
        let out = run(src, "guard", vec![Value::dict(vec![])]).unwrap();
        assert_eq!(out.str_value(), "fallback");
    }

    #[test]
    fn missing_function_is_an_import_error() {
        let err = run("x = 1\n", "absent", vec![]).unwrap_err();
        assert!(matches!(err, RuntimeError::Import(_)));
    }

    #[test]
    fn deep_recursion_is_cut_off() {
        let src = "def loop(n):\n    return loop(n + 1)\n";
        let err = run(src, "loop", vec![Value::Int(0)]).unwrap_err();
        assert!(matches!(err, RuntimeError::RecursionLimit));
    }

    #[test]
    fn interrupt_flag_converts_to_timeout() {
        let ast = parse_module("def spin():\n    while True:\n        pass\n").unwrap();
        let mut module = Module::load(&ast).unwrap();
        let flag = Arc::new(AtomicBool::new(false));
        let mut sink = NoopSink;
        let mut interp = Interpreter::new(&mut module, &mut sink, Some(Arc::clone(&flag)));
        flag.store(true, Ordering::SeqCst);
        let err = interp.call_function("spin", vec![]).unwrap_err();
        assert!(matches!(err, RuntimeError::Timeout));
    }

    #[test]
    fn global_statement_reaches_module_scope() {
        let src = "count = 0\ndef bump():\n    global count\n    count = count + 1\n    return count\n";
        let ast = parse_module(src).unwrap();
        let mut module = Module::load(&ast).unwrap();
        let mut sink = NoopSink;
        let mut interp = Interpreter::new(&mut module, &mut sink, None);
        assert_eq!(interp.call_function("bump", vec![]).unwrap().str_value(), "1");
        assert_eq!(interp.call_function("bump", vec![]).unwrap().str_value(), "2");
    }

    #[test]
    fn slices_behave_like_the_subject_language() {
        let src = "def cut(s):\n    return s[1:3]\ndef rev(s):\n    return s[::-1]\n";
        assert_eq!(
            run(src, "cut", vec![Value::str("hello")]).unwrap().str_value(),
            "el"
        );
        assert_eq!(
            run(src, "rev", vec![Value::str("abc")]).unwrap().str_value(),
            "cba"
        );
    }
}
