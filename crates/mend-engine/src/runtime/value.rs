//! Runtime values of the subject language.
//!
//! Stringification matters more than speed here: test outcomes compare the
//! `str()` form of the actual result against the expected-output column, so
//! formatting follows the subject language (True/None capitalization, `3.0`
//! for whole floats, repr-quoted strings inside containers).

use std::cell::RefCell;
use std::cmp::Ordering;
use std::rc::Rc;

use mend_core::errors::RuntimeError;

#[derive(Debug, Clone)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(Rc<String>),
    None,
    List(Rc<RefCell<Vec<Value>>>),
    Tuple(Rc<Vec<Value>>),
    Dict(Rc<RefCell<Vec<(Value, Value)>>>),
    Range { start: i64, stop: i64, step: i64 },
}

impl Value {
    pub fn str(text: impl Into<String>) -> Value {
        Value::Str(Rc::new(text.into()))
    }

    pub fn list(items: Vec<Value>) -> Value {
        Value::List(Rc::new(RefCell::new(items)))
    }

    pub fn tuple(items: Vec<Value>) -> Value {
        Value::Tuple(Rc::new(items))
    }

    pub fn dict(pairs: Vec<(Value, Value)>) -> Value {
        Value::Dict(Rc::new(RefCell::new(pairs)))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Bool(_) => "bool",
            Value::Str(_) => "str",
            Value::None => "NoneType",
            Value::List(_) => "list",
            Value::Tuple(_) => "tuple",
            Value::Dict(_) => "dict",
            Value::Range { .. } => "range",
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Bool(b) => *b,
            Value::Str(s) => !s.is_empty(),
            Value::None => false,
            Value::List(items) => !items.borrow().is_empty(),
            Value::Tuple(items) => !items.is_empty(),
            Value::Dict(pairs) => !pairs.borrow().is_empty(),
            Value::Range { start, stop, step } => range_len(*start, *stop, *step) > 0,
        }
    }

    /// Numeric view for arithmetic coercion; bools count as 0/1.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Bool(b) => Some(if *b { 1 } else { 0 }),
            _ => None,
        }
    }

    /// Equality with numeric coercion and deep containers; dict equality is
    /// order-insensitive.
    pub fn py_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::None, Value::None) => true,
            (Value::List(a), Value::List(b)) => seq_eq(&a.borrow(), &b.borrow()),
            (Value::Tuple(a), Value::Tuple(b)) => seq_eq(a, b),
            (Value::Dict(a), Value::Dict(b)) => {
                let (a, b) = (a.borrow(), b.borrow());
                a.len() == b.len()
                    && a.iter().all(|(k, v)| {
                        b.iter().any(|(bk, bv)| bk.py_eq(k) && bv.py_eq(v))
                    })
            }
            (
                Value::Range { start, stop, step },
                Value::Range {
                    start: s2,
                    stop: e2,
                    step: st2,
                },
            ) => start == s2 && stop == e2 && step == st2,
            _ => match (self.as_number(), other.as_number()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
        }
    }

    /// Ordering for `<`/`>`/`sorted`; mixed incomparable types raise.
    pub fn py_cmp(&self, other: &Value) -> Result<Ordering, RuntimeError> {
        match (self, other) {
            (Value::Str(a), Value::Str(b)) => Ok(a.cmp(b)),
            (Value::List(a), Value::List(b)) => seq_cmp(&a.borrow(), &b.borrow()),
            (Value::Tuple(a), Value::Tuple(b)) => seq_cmp(a, b),
            _ => match (self.as_number(), other.as_number()) {
                (Some(a), Some(b)) => Ok(a.partial_cmp(&b).unwrap_or(Ordering::Equal)),
                _ => Err(RuntimeError::Type(format!(
                    "'<' not supported between instances of '{}' and '{}'",
                    self.type_name(),
                    other.type_name()
                ))),
            },
        }
    }

    /// `str()` form.
    pub fn str_value(&self) -> String {
        match self {
            Value::Str(s) => s.to_string(),
            _ => self.repr(),
        }
    }

    /// `repr()` form.
    pub fn repr(&self) -> String {
        match self {
            Value::Int(i) => i.to_string(),
            Value::Float(f) => format_float(*f),
            Value::Bool(true) => "True".to_string(),
            Value::Bool(false) => "False".to_string(),
            Value::Str(s) => quote(s),
            Value::None => "None".to_string(),
            Value::List(items) => {
                let parts: Vec<String> = items.borrow().iter().map(Value::repr).collect();
                format!("[{}]", parts.join(", "))
            }
            Value::Tuple(items) => {
                let parts: Vec<String> = items.iter().map(Value::repr).collect();
                if parts.len() == 1 {
                    format!("({},)", parts[0])
                } else {
                    format!("({})", parts.join(", "))
                }
            }
            Value::Dict(pairs) => {
                let parts: Vec<String> = pairs
                    .borrow()
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k.repr(), v.repr()))
                    .collect();
                format!("{{{}}}", parts.join(", "))
            }
            Value::Range { start, stop, step } => {
                if *step == 1 {
                    format!("range({}, {})", start, stop)
                } else {
                    format!("range({}, {}, {})", start, stop, step)
                }
            }
        }
    }

    /// Materialize the value as an iteration sequence; dicts yield keys,
    /// strings yield one-character strings.
    pub fn iter_items(&self) -> Result<Vec<Value>, RuntimeError> {
        match self {
            Value::List(items) => Ok(items.borrow().clone()),
            Value::Tuple(items) => Ok(items.as_ref().clone()),
            Value::Str(s) => Ok(s.chars().map(|c| Value::str(c.to_string())).collect()),
            Value::Dict(pairs) => Ok(pairs.borrow().iter().map(|(k, _)| k.clone()).collect()),
            Value::Range { start, stop, step } => {
                let mut items = Vec::new();
                let (mut current, stop, step) = (*start, *stop, *step);
                if step > 0 {
                    while current < stop {
                        items.push(Value::Int(current));
                        current += step;
                    }
                } else if step < 0 {
                    while current > stop {
                        items.push(Value::Int(current));
                        current += step;
                    }
                }
                Ok(items)
            }
            other => Err(RuntimeError::Type(format!(
                "'{}' object is not iterable",
                other.type_name()
            ))),
        }
    }

    /// Membership (`in`).
    pub fn contains(&self, needle: &Value) -> Result<bool, RuntimeError> {
        match self {
            Value::Str(haystack) => match needle {
                Value::Str(sub) => Ok(haystack.contains(sub.as_str())),
                other => Err(RuntimeError::Type(format!(
                    "'in <string>' requires string as left operand, not {}",
                    other.type_name()
                ))),
            },
            Value::Dict(pairs) => Ok(pairs.borrow().iter().any(|(k, _)| k.py_eq(needle))),
            _ => Ok(self.iter_items()?.iter().any(|item| item.py_eq(needle))),
        }
    }
}

fn seq_eq(a: &[Value], b: &[Value]) -> bool {
    a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.py_eq(y))
}

fn seq_cmp(a: &[Value], b: &[Value]) -> Result<Ordering, RuntimeError> {
    for (x, y) in a.iter().zip(b.iter()) {
        if !x.py_eq(y) {
            return x.py_cmp(y);
        }
    }
    Ok(a.len().cmp(&b.len()))
}

fn range_len(start: i64, stop: i64, step: i64) -> i64 {
    if step > 0 && stop > start {
        (stop - start + step - 1) / step
    } else if step < 0 && stop < start {
        (start - stop - step - 1) / (-step)
    } else {
        0
    }
}

/// Whole floats print with a trailing `.0`, the way the subject language
/// writes them.
pub fn format_float(f: f64) -> String {
    if f.is_nan() {
        return "nan".to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if f == f.trunc() && f.abs() < 1e16 {
        format!("{:.1}", f)
    } else {
        format!("{}", f)
    }
}

fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('\'');
    for c in text.chars() {
        match c {
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out.push('\'');
    out
}

// ---- Operators ----

/// Apply a binary arithmetic/sequence operator.
pub fn binary_op(op: &str, left: &Value, right: &Value) -> Result<Value, RuntimeError> {
    match op {
        "+" => add(left, right),
        "-" => arith(op, left, right),
        "*" => mul(left, right),
        "/" | "//" | "%" | "**" => arith(op, left, right),
        "&" | "|" | "^" | "<<" | ">>" => bitwise(op, left, right),
        _ => Err(RuntimeError::Type(format!("unsupported operator '{op}'"))),
    }
}

fn type_error(op: &str, left: &Value, right: &Value) -> RuntimeError {
    RuntimeError::Type(format!(
        "unsupported operand type(s) for {}: '{}' and '{}'",
        op,
        left.type_name(),
        right.type_name()
    ))
}

fn add(left: &Value, right: &Value) -> Result<Value, RuntimeError> {
    match (left, right) {
        (Value::Str(a), Value::Str(b)) => Ok(Value::str(format!("{a}{b}"))),
        (Value::List(a), Value::List(b)) => {
            let mut items = a.borrow().clone();
            items.extend(b.borrow().iter().cloned());
            Ok(Value::list(items))
        }
        (Value::Tuple(a), Value::Tuple(b)) => {
            let mut items = a.as_ref().clone();
            items.extend(b.iter().cloned());
            Ok(Value::tuple(items))
        }
        _ => arith("+", left, right),
    }
}

fn mul(left: &Value, right: &Value) -> Result<Value, RuntimeError> {
    let repeat = |seq: &Value, n: i64| -> Option<Value> {
        let n = n.max(0) as usize;
        match seq {
            Value::Str(s) => Some(Value::str(s.repeat(n))),
            Value::List(items) => {
                let base = items.borrow().clone();
                let mut out = Vec::with_capacity(base.len() * n);
                for _ in 0..n {
                    out.extend(base.iter().cloned());
                }
                Some(Value::list(out))
            }
            _ => None,
        }
    };
    if let (Some(n), seq @ (Value::Str(_) | Value::List(_))) = (left.as_int(), right) {
        if let Some(v) = repeat(seq, n) {
            return Ok(v);
        }
    }
    if let (seq @ (Value::Str(_) | Value::List(_)), Some(n)) = (left, right.as_int()) {
        if let Some(v) = repeat(seq, n) {
            return Ok(v);
        }
    }
    arith("*", left, right)
}

fn arith(op: &str, left: &Value, right: &Value) -> Result<Value, RuntimeError> {
    // Integer path preserves exactness for everything except true division.
    if let (Some(a), Some(b)) = (left.as_int(), right.as_int()) {
        if matches!(left, Value::Int(_) | Value::Bool(_))
            && matches!(right, Value::Int(_) | Value::Bool(_))
        {
            return int_arith(op, a, b, left, right);
        }
    }
    let (Some(a), Some(b)) = (left.as_number(), right.as_number()) else {
        return Err(type_error(op, left, right));
    };
    let out = match op {
        "+" => a + b,
        "-" => a - b,
        "*" => a * b,
        "/" => {
            if b == 0.0 {
                return Err(RuntimeError::ZeroDivision("float division by zero".into()));
            }
            a / b
        }
        "//" => {
            if b == 0.0 {
                return Err(RuntimeError::ZeroDivision("float floor division by zero".into()));
            }
            (a / b).floor()
        }
        "%" => {
            if b == 0.0 {
                return Err(RuntimeError::ZeroDivision("float modulo".into()));
            }
            a - b * (a / b).floor()
        }
        "**" => a.powf(b),
        _ => return Err(type_error(op, left, right)),
    };
    Ok(Value::Float(out))
}

fn int_arith(op: &str, a: i64, b: i64, left: &Value, right: &Value) -> Result<Value, RuntimeError> {
    match op {
        "+" => Ok(overflowing(a.checked_add(b), a as f64 + b as f64)),
        "-" => Ok(overflowing(a.checked_sub(b), a as f64 - b as f64)),
        "*" => Ok(overflowing(a.checked_mul(b), a as f64 * b as f64)),
        "/" => {
            if b == 0 {
                return Err(RuntimeError::ZeroDivision("division by zero".into()));
            }
            Ok(Value::Float(a as f64 / b as f64))
        }
        "//" => {
            if b == 0 {
                return Err(RuntimeError::ZeroDivision(
                    "integer division or modulo by zero".into(),
                ));
            }
            Ok(Value::Int(floor_div(a, b)))
        }
        "%" => {
            if b == 0 {
                return Err(RuntimeError::ZeroDivision(
                    "integer division or modulo by zero".into(),
                ));
            }
            Ok(Value::Int(floor_mod(a, b)))
        }
        "**" => {
            if b >= 0 {
                match u32::try_from(b).ok().and_then(|e| a.checked_pow(e)) {
                    Some(v) => Ok(Value::Int(v)),
                    None => Ok(Value::Float((a as f64).powf(b as f64))),
                }
            } else {
                Ok(Value::Float((a as f64).powf(b as f64)))
            }
        }
        _ => Err(type_error(op, left, right)),
    }
}

/// Quotient rounded toward negative infinity.
fn floor_div(a: i64, b: i64) -> i64 {
    let q = a / b;
    let r = a % b;
    if r != 0 && ((r < 0) != (b < 0)) {
        q - 1
    } else {
        q
    }
}

/// Remainder with the divisor's sign.
fn floor_mod(a: i64, b: i64) -> i64 {
    let r = a % b;
    if r != 0 && ((r < 0) != (b < 0)) {
        r + b
    } else {
        r
    }
}

fn overflowing(checked: Option<i64>, fallback: f64) -> Value {
    match checked {
        Some(v) => Value::Int(v),
        None => Value::Float(fallback),
    }
}

fn bitwise(op: &str, left: &Value, right: &Value) -> Result<Value, RuntimeError> {
    let (Some(a), Some(b)) = (left.as_int(), right.as_int()) else {
        return Err(type_error(op, left, right));
    };
    let out = match op {
        "&" => a & b,
        "|" => a | b,
        "^" => a ^ b,
        "<<" => a.checked_shl(b.max(0) as u32).unwrap_or(0),
        ">>" => a.checked_shr(b.max(0) as u32).unwrap_or(0),
        _ => return Err(type_error(op, left, right)),
    };
    Ok(Value::Int(out))
}

/// Apply one comparison operator.
pub fn compare_op(op: &str, left: &Value, right: &Value) -> Result<bool, RuntimeError> {
    match op {
        "==" => Ok(left.py_eq(right)),
        "!=" => Ok(!left.py_eq(right)),
        "<" => Ok(left.py_cmp(right)? == Ordering::Less),
        "<=" => Ok(left.py_cmp(right)? != Ordering::Greater),
        ">" => Ok(left.py_cmp(right)? == Ordering::Greater),
        ">=" => Ok(left.py_cmp(right)? != Ordering::Less),
        "in" => right.contains(left),
        "not in" => Ok(!right.contains(left)?),
        "is" => Ok(match (left, right) {
            (Value::None, Value::None) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            _ => left.py_eq(right),
        }),
        "is not" => Ok(!compare_op("is", left, right)?),
        _ => Err(RuntimeError::Type(format!("unsupported comparison '{op}'"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn str_forms_follow_the_subject_language() {
        assert_eq!(Value::Bool(true).str_value(), "True");
        assert_eq!(Value::None.str_value(), "None");
        assert_eq!(Value::Float(3.0).str_value(), "3.0");
        assert_eq!(Value::Float(2.5).str_value(), "2.5");
        let list = Value::list(vec![Value::Int(1), Value::str("a")]);
        assert_eq!(list.str_value(), "[1, 'a']");
        let dict = Value::dict(vec![(Value::str("k"), Value::Int(1))]);
        assert_eq!(dict.str_value(), "{'k': 1}");
        assert_eq!(Value::tuple(vec![Value::Int(1)]).str_value(), "(1,)");
    }

    #[test]
    fn int_plus_str_is_a_type_error() {
        let err = binary_op("+", &Value::Int(1), &Value::str("a")).unwrap_err();
        assert!(matches!(err, RuntimeError::Type(_)));
    }

    #[test]
    fn floor_division_and_modulo_floor_toward_negative_infinity() {
        let v = binary_op("//", &Value::Int(-7), &Value::Int(2)).unwrap();
        assert_eq!(v.str_value(), "-4");
        let m = binary_op("%", &Value::Int(-7), &Value::Int(3)).unwrap();
        assert_eq!(m.str_value(), "2");
    }

    #[test]
    fn dict_iteration_yields_keys() {
        let dict = Value::dict(vec![
            (Value::str("a"), Value::Int(1)),
            (Value::str("b"), Value::Int(2)),
        ]);
        let keys: Vec<String> = dict.iter_items().unwrap().iter().map(Value::str_value).collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn range_iterates_like_the_builtin() {
        let r = Value::Range {
            start: 2,
            stop: 8,
            step: 2,
        };
        let items: Vec<String> = r.iter_items().unwrap().iter().map(Value::str_value).collect();
        assert_eq!(items, vec!["2", "4", "6"]);
    }

    #[test]
    fn membership_checks_strings_and_dicts() {
        let s = Value::str("hello");
        assert!(s.contains(&Value::str("ell")).unwrap());
        let dict = Value::dict(vec![(Value::str("k"), Value::Int(1))]);
        assert!(dict.contains(&Value::str("k")).unwrap());
        assert!(!dict.contains(&Value::Int(1)).unwrap());
    }
}
