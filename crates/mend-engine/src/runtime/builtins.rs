//! Builtin functions and value methods available to candidate programs.

use mend_core::errors::RuntimeError;

use super::value::{format_float, Value};

/// Dispatch a builtin call. Returns `None` when the name is not a builtin,
/// so the caller can report a NameError instead.
pub fn call_builtin(name: &str, args: &[Value]) -> Option<Result<Value, RuntimeError>> {
    let result = match name {
        "len" => builtin_len(args),
        "str" => one_arg("str", args).map(|v| Value::str(v.str_value())),
        "repr" => one_arg("repr", args).map(|v| Value::str(v.repr())),
        "int" => builtin_int(args),
        "float" => builtin_float(args),
        "bool" => one_arg("bool", args).map(|v| Value::Bool(v.is_truthy())),
        "abs" => builtin_abs(args),
        "min" => builtin_min_max("min", args, false),
        "max" => builtin_min_max("max", args, true),
        "sum" => builtin_sum(args),
        "range" => builtin_range(args),
        "sorted" => builtin_sorted(args),
        "reversed" => one_arg("reversed", args).and_then(|v| {
            let mut items = v.iter_items()?;
            items.reverse();
            Ok(Value::list(items))
        }),
        "list" => match args {
            [] => Ok(Value::list(Vec::new())),
            [v] => v.iter_items().map(Value::list),
            _ => Err(arity("list", "at most 1", args.len())),
        },
        "tuple" => match args {
            [] => Ok(Value::tuple(Vec::new())),
            [v] => v.iter_items().map(Value::tuple),
            _ => Err(arity("tuple", "at most 1", args.len())),
        },
        "dict" => match args {
            [] => Ok(Value::dict(Vec::new())),
            [Value::Dict(pairs)] => Ok(Value::dict(pairs.borrow().clone())),
            _ => Err(RuntimeError::Type("dict() expects a dict argument".into())),
        },
        "round" => builtin_round(args),
        "ord" => one_arg("ord", args).and_then(|v| match v {
            Value::Str(s) if s.chars().count() == 1 => {
                Ok(Value::Int(s.chars().next().unwrap_or('\0') as i64))
            }
            other => Err(RuntimeError::Type(format!(
                "ord() expected a character, got '{}'",
                other.type_name()
            ))),
        }),
        "chr" => one_arg("chr", args).and_then(|v| match v.as_int() {
            Some(i) => char::from_u32(i as u32)
                .map(|c| Value::str(c.to_string()))
                .ok_or_else(|| RuntimeError::Value("chr() arg not in range".into())),
            None => Err(RuntimeError::Type("an integer is required".into())),
        }),
        "any" => one_arg("any", args)
            .and_then(|v| v.iter_items())
            .map(|items| Value::Bool(items.iter().any(Value::is_truthy))),
        "all" => one_arg("all", args)
            .and_then(|v| v.iter_items())
            .map(|items| Value::Bool(items.iter().all(Value::is_truthy))),
        "enumerate" => one_arg("enumerate", args).and_then(|v| {
            let items = v.iter_items()?;
            Ok(Value::list(
                items
                    .into_iter()
                    .enumerate()
                    .map(|(i, item)| Value::tuple(vec![Value::Int(i as i64), item]))
                    .collect(),
            ))
        }),
        "print" => {
            let line: Vec<String> = args.iter().map(Value::str_value).collect();
            tracing::debug!(target: "mend::candidate", output = %line.join(" "));
            Ok(Value::None)
        }
        _ => return None,
    };
    Some(result)
}

fn arity(name: &str, expected: &str, got: usize) -> RuntimeError {
    RuntimeError::Type(format!("{name}() takes {expected} arguments ({got} given)"))
}

fn one_arg(name: &str, args: &[Value]) -> Result<Value, RuntimeError> {
    match args {
        [v] => Ok(v.clone()),
        _ => Err(arity(name, "exactly 1", args.len())),
    }
}

fn builtin_len(args: &[Value]) -> Result<Value, RuntimeError> {
    let value = one_arg("len", args)?;
    let len = match &value {
        Value::Str(s) => s.chars().count(),
        Value::List(items) => items.borrow().len(),
        Value::Tuple(items) => items.len(),
        Value::Dict(pairs) => pairs.borrow().len(),
        other => {
            return Err(RuntimeError::Type(format!(
                "object of type '{}' has no len()",
                other.type_name()
            )))
        }
    };
    Ok(Value::Int(len as i64))
}

fn builtin_int(args: &[Value]) -> Result<Value, RuntimeError> {
    let value = one_arg("int", args)?;
    match &value {
        Value::Int(i) => Ok(Value::Int(*i)),
        Value::Bool(b) => Ok(Value::Int(if *b { 1 } else { 0 })),
        Value::Float(f) => Ok(Value::Int(f.trunc() as i64)),
        Value::Str(s) => s
            .trim()
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| {
                RuntimeError::Value(format!(
                    "invalid literal for int() with base 10: {}",
                    Value::str(s.as_str().to_string()).repr()
                ))
            }),
        other => Err(RuntimeError::Type(format!(
            "int() argument must be a string or a number, not '{}'",
            other.type_name()
        ))),
    }
}

fn builtin_float(args: &[Value]) -> Result<Value, RuntimeError> {
    let value = one_arg("float", args)?;
    match &value {
        Value::Int(i) => Ok(Value::Float(*i as f64)),
        Value::Bool(b) => Ok(Value::Float(if *b { 1.0 } else { 0.0 })),
        Value::Float(f) => Ok(Value::Float(*f)),
        Value::Str(s) => s
            .trim()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| RuntimeError::Value(format!("could not convert string to float: '{s}'"))),
        other => Err(RuntimeError::Type(format!(
            "float() argument must be a string or a number, not '{}'",
            other.type_name()
        ))),
    }
}

fn builtin_abs(args: &[Value]) -> Result<Value, RuntimeError> {
    match one_arg("abs", args)? {
        Value::Int(i) => Ok(Value::Int(i.abs())),
        Value::Float(f) => Ok(Value::Float(f.abs())),
        Value::Bool(b) => Ok(Value::Int(if b { 1 } else { 0 })),
        other => Err(RuntimeError::Type(format!(
            "bad operand type for abs(): '{}'",
            other.type_name()
        ))),
    }
}

fn builtin_min_max(name: &str, args: &[Value], want_max: bool) -> Result<Value, RuntimeError> {
    let items = match args {
        [] => return Err(arity(name, "at least 1", 0)),
        [single] => single.iter_items()?,
        many => many.to_vec(),
    };
    let mut iter = items.into_iter();
    let mut best = iter
        .next()
        .ok_or_else(|| RuntimeError::Value(format!("{name}() arg is an empty sequence")))?;
    for item in iter {
        let replace = match item.py_cmp(&best)? {
            std::cmp::Ordering::Greater => want_max,
            std::cmp::Ordering::Less => !want_max,
            std::cmp::Ordering::Equal => false,
        };
        if replace {
            best = item;
        }
    }
    Ok(best)
}

fn builtin_sum(args: &[Value]) -> Result<Value, RuntimeError> {
    let (items, start) = match args {
        [seq] => (seq.iter_items()?, Value::Int(0)),
        [seq, start] => (seq.iter_items()?, start.clone()),
        _ => return Err(arity("sum", "1 or 2", args.len())),
    };
    let mut total = start;
    for item in items {
        total = super::value::binary_op("+", &total, &item)?;
    }
    Ok(total)
}

fn builtin_range(args: &[Value]) -> Result<Value, RuntimeError> {
    let as_int = |v: &Value| {
        v.as_int().ok_or_else(|| {
            RuntimeError::Type(format!(
                "'{}' object cannot be interpreted as an integer",
                v.type_name()
            ))
        })
    };
    let (start, stop, step) = match args {
        [stop] => (0, as_int(stop)?, 1),
        [start, stop] => (as_int(start)?, as_int(stop)?, 1),
        [start, stop, step] => (as_int(start)?, as_int(stop)?, as_int(step)?),
        _ => return Err(arity("range", "1 to 3", args.len())),
    };
    if step == 0 {
        return Err(RuntimeError::Value("range() arg 3 must not be zero".into()));
    }
    Ok(Value::Range { start, stop, step })
}

fn builtin_round(args: &[Value]) -> Result<Value, RuntimeError> {
    match args {
        [v] => match v {
            Value::Float(f) => Ok(Value::Int(round_half_even(*f))),
            Value::Int(i) => Ok(Value::Int(*i)),
            other => Err(RuntimeError::Type(format!(
                "type {} doesn't define round()",
                other.type_name()
            ))),
        },
        [v, digits] => {
            let n = digits
                .as_int()
                .ok_or_else(|| RuntimeError::Type("round() digits must be an integer".into()))?;
            let factor = 10f64.powi(n as i32);
            match v.as_number() {
                Some(f) => Ok(Value::Float((f * factor).round() / factor)),
                None => Err(RuntimeError::Type("round() expects a number".into())),
            }
        }
        _ => Err(arity("round", "1 or 2", args.len())),
    }
}

fn round_half_even(f: f64) -> i64 {
    let floor = f.floor();
    let diff = f - floor;
    if (diff - 0.5).abs() < f64::EPSILON {
        let below = floor as i64;
        if below % 2 == 0 {
            below
        } else {
            below + 1
        }
    } else {
        f.round() as i64
    }
}

/// Dispatch a method call on a receiver value.
pub fn method_call(receiver: &Value, method: &str, args: &[Value]) -> Result<Value, RuntimeError> {
    match receiver {
        Value::Dict(_) => dict_method(receiver, method, args),
        Value::List(_) => list_method(receiver, method, args),
        Value::Str(_) => str_method(receiver, method, args),
        other => Err(RuntimeError::Attribute(format!(
            "'{}' object has no attribute '{}'",
            other.type_name(),
            method
        ))),
    }
}

fn no_method(type_name: &str, method: &str) -> RuntimeError {
    RuntimeError::Attribute(format!("'{type_name}' object has no attribute '{method}'"))
}

fn dict_method(receiver: &Value, method: &str, args: &[Value]) -> Result<Value, RuntimeError> {
    let Value::Dict(pairs) = receiver else {
        return Err(no_method(receiver.type_name(), method));
    };
    match method {
        "values" => Ok(Value::list(
            pairs.borrow().iter().map(|(_, v)| v.clone()).collect(),
        )),
        "keys" => Ok(Value::list(
            pairs.borrow().iter().map(|(k, _)| k.clone()).collect(),
        )),
        "items" => Ok(Value::list(
            pairs
                .borrow()
                .iter()
                .map(|(k, v)| Value::tuple(vec![k.clone(), v.clone()]))
                .collect(),
        )),
        "get" => {
            let (key, default) = match args {
                [key] => (key, Value::None),
                [key, default] => (key, default.clone()),
                _ => return Err(arity("get", "1 or 2", args.len())),
            };
            Ok(pairs
                .borrow()
                .iter()
                .find(|(k, _)| k.py_eq(key))
                .map(|(_, v)| v.clone())
                .unwrap_or(default))
        }
        "pop" => match args {
            [key] => {
                let mut pairs = pairs.borrow_mut();
                let position = pairs.iter().position(|(k, _)| k.py_eq(key));
                match position {
                    Some(idx) => Ok(pairs.remove(idx).1),
                    None => Err(RuntimeError::Key(key.repr())),
                }
            }
            _ => Err(arity("pop", "exactly 1", args.len())),
        },
        _ => Err(no_method("dict", method)),
    }
}

fn list_method(receiver: &Value, method: &str, args: &[Value]) -> Result<Value, RuntimeError> {
    let Value::List(items) = receiver else {
        return Err(no_method(receiver.type_name(), method));
    };
    match method {
        "append" => {
            let value = one_arg("append", args)?;
            items.borrow_mut().push(value);
            Ok(Value::None)
        }
        "extend" => {
            let value = one_arg("extend", args)?;
            let extra = value.iter_items()?;
            items.borrow_mut().extend(extra);
            Ok(Value::None)
        }
        "insert" => match args {
            [idx, value] => {
                let mut items = items.borrow_mut();
                let len = items.len();
                let raw = idx
                    .as_int()
                    .ok_or_else(|| RuntimeError::Type("insert index must be an integer".into()))?;
                let pos = if raw < 0 {
                    (raw + len as i64).max(0) as usize
                } else {
                    (raw as usize).min(len)
                };
                items.insert(pos, value.clone());
                Ok(Value::None)
            }
            _ => Err(arity("insert", "exactly 2", args.len())),
        },
        "pop" => {
            let mut items = items.borrow_mut();
            let len = items.len();
            if len == 0 {
                return Err(RuntimeError::Index("pop from empty list".into()));
            }
            let idx = match args {
                [] => len - 1,
                [i] => {
                    let raw = i.as_int().ok_or_else(|| {
                        RuntimeError::Type("pop index must be an integer".into())
                    })?;
                    let idx = if raw < 0 { raw + len as i64 } else { raw };
                    if idx < 0 || idx as usize >= len {
                        return Err(RuntimeError::Index("pop index out of range".into()));
                    }
                    idx as usize
                }
                _ => return Err(arity("pop", "at most 1", args.len())),
            };
            Ok(items.remove(idx))
        }
        "remove" => {
            let value = one_arg("remove", args)?;
            let mut items = items.borrow_mut();
            let position = items.iter().position(|item| item.py_eq(&value));
            match position {
                Some(idx) => {
                    items.remove(idx);
                    Ok(Value::None)
                }
                None => Err(RuntimeError::Value("list.remove(x): x not in list".into())),
            }
        }
        "index" => {
            let value = one_arg("index", args)?;
            items
                .borrow()
                .iter()
                .position(|item| item.py_eq(&value))
                .map(|i| Value::Int(i as i64))
                .ok_or_else(|| RuntimeError::Value(format!("{} is not in list", value.repr())))
        }
        "count" => {
            let value = one_arg("count", args)?;
            Ok(Value::Int(
                items.borrow().iter().filter(|item| item.py_eq(&value)).count() as i64,
            ))
        }
        "sort" => {
            let sorted = sort_values(items.borrow().clone())?;
            *items.borrow_mut() = sorted;
            Ok(Value::None)
        }
        "reverse" => {
            items.borrow_mut().reverse();
            Ok(Value::None)
        }
        "clear" => {
            items.borrow_mut().clear();
            Ok(Value::None)
        }
        "copy" => Ok(Value::list(items.borrow().clone())),
        _ => Err(no_method("list", method)),
    }
}

fn str_method(receiver: &Value, method: &str, args: &[Value]) -> Result<Value, RuntimeError> {
    let Value::Str(s) = receiver else {
        return Err(no_method(receiver.type_name(), method));
    };
    let expect_str = |name: &str, v: &Value| -> Result<String, RuntimeError> {
        match v {
            Value::Str(s) => Ok(s.to_string()),
            other => Err(RuntimeError::Type(format!(
                "{name}() argument must be str, not '{}'",
                other.type_name()
            ))),
        }
    };
    match method {
        "lower" => Ok(Value::str(s.to_lowercase())),
        "upper" => Ok(Value::str(s.to_uppercase())),
        "strip" => Ok(Value::str(s.trim().to_string())),
        "lstrip" => Ok(Value::str(s.trim_start().to_string())),
        "rstrip" => Ok(Value::str(s.trim_end().to_string())),
        "capitalize" => {
            let mut chars = s.chars();
            let text = match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            };
            Ok(Value::str(text))
        }
        "split" => {
            let parts: Vec<Value> = match args {
                [] => s.split_whitespace().map(|p| Value::str(p.to_string())).collect(),
                [sep] => {
                    let sep = expect_str("split", sep)?;
                    s.split(sep.as_str()).map(|p| Value::str(p.to_string())).collect()
                }
                _ => return Err(arity("split", "at most 1", args.len())),
            };
            Ok(Value::list(parts))
        }
        "join" => {
            let value = one_arg("join", args)?;
            let items = value.iter_items()?;
            let parts = items
                .iter()
                .map(|item| match item {
                    Value::Str(s) => Ok(s.to_string()),
                    other => Err(RuntimeError::Type(format!(
                        "sequence item: expected str instance, {} found",
                        other.type_name()
                    ))),
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::str(parts.join(s.as_str())))
        }
        "replace" => match args {
            [from, to] => {
                let from = expect_str("replace", from)?;
                let to = expect_str("replace", to)?;
                Ok(Value::str(s.replace(from.as_str(), &to)))
            }
            _ => Err(arity("replace", "exactly 2", args.len())),
        },
        "startswith" => {
            let prefix = expect_str("startswith", &one_arg("startswith", args)?)?;
            Ok(Value::Bool(s.starts_with(prefix.as_str())))
        }
        "endswith" => {
            let suffix = expect_str("endswith", &one_arg("endswith", args)?)?;
            Ok(Value::Bool(s.ends_with(suffix.as_str())))
        }
        "find" => {
            let needle = expect_str("find", &one_arg("find", args)?)?;
            Ok(Value::Int(
                s.find(needle.as_str())
                    .map(|byte| s[..byte].chars().count() as i64)
                    .unwrap_or(-1),
            ))
        }
        "index" => {
            let needle = expect_str("index", &one_arg("index", args)?)?;
            s.find(needle.as_str())
                .map(|byte| Value::Int(s[..byte].chars().count() as i64))
                .ok_or_else(|| RuntimeError::Value("substring not found".into()))
        }
        "count" => {
            let needle = expect_str("count", &one_arg("count", args)?)?;
            if needle.is_empty() {
                return Ok(Value::Int(s.chars().count() as i64 + 1));
            }
            Ok(Value::Int(s.matches(needle.as_str()).count() as i64))
        }
        "isdigit" => Ok(Value::Bool(
            !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()),
        )),
        "isalpha" => Ok(Value::Bool(!s.is_empty() && s.chars().all(char::is_alphabetic))),
        "isalnum" => Ok(Value::Bool(!s.is_empty() && s.chars().all(char::is_alphanumeric))),
        "isupper" => Ok(Value::Bool(
            s.chars().any(char::is_alphabetic)
                && s.chars().filter(|c| c.is_alphabetic()).all(char::is_uppercase),
        )),
        "islower" => Ok(Value::Bool(
            s.chars().any(char::is_alphabetic)
                && s.chars().filter(|c| c.is_alphabetic()).all(char::is_lowercase),
        )),
        "isspace" => Ok(Value::Bool(!s.is_empty() && s.chars().all(char::is_whitespace))),
        _ => Err(no_method("str", method)),
    }
}

/// Sort after confirming the elements are mutually comparable.
fn sort_values(mut items: Vec<Value>) -> Result<Vec<Value>, RuntimeError> {
    for window in items.windows(2) {
        window[0].py_cmp(&window[1])?;
    }
    items.sort_by(|a, b| a.py_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    Ok(items)
}

fn builtin_sorted(args: &[Value]) -> Result<Value, RuntimeError> {
    let value = one_arg("sorted", args)?;
    sort_values(value.iter_items()?).map(Value::list)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn len_and_str_cover_the_core_types() {
        assert_eq!(
            call_builtin("len", &[Value::str("abc")]).unwrap().unwrap().str_value(),
            "3"
        );
        assert_eq!(
            call_builtin("str", &[Value::Float(2.0)]).unwrap().unwrap().str_value(),
            "2.0"
        );
        assert!(call_builtin("no_such_builtin", &[]).is_none());
    }

    #[test]
    fn sorted_rejects_mixed_types() {
        let mixed = Value::list(vec![Value::Int(1), Value::str("a")]);
        let err = call_builtin("sorted", &[mixed]).unwrap().unwrap_err();
        assert!(matches!(err, RuntimeError::Type(_)));
    }

    #[test]
    fn string_methods_mirror_the_subject_language() {
        let s = Value::str("Hello World");
        assert_eq!(
            method_call(&s, "lower", &[]).unwrap().str_value(),
            "hello world"
        );
        assert_eq!(
            method_call(&s, "split", &[]).unwrap().str_value(),
            "['Hello', 'World']"
        );
        assert_eq!(
            method_call(&s, "find", &[Value::str("World")]).unwrap().str_value(),
            "6"
        );
    }

    #[test]
    fn list_methods_mutate_in_place() {
        let list = Value::list(vec![Value::Int(2), Value::Int(1)]);
        method_call(&list, "append", &[Value::Int(3)]).unwrap();
        method_call(&list, "sort", &[]).unwrap();
        assert_eq!(list.str_value(), "[1, 2, 3]");
    }

    #[test]
    fn round_is_banker_style_on_halves() {
        assert_eq!(builtin_round(&[Value::Float(0.5)]).unwrap().str_value(), "0");
        assert_eq!(builtin_round(&[Value::Float(1.5)]).unwrap().str_value(), "2");
        assert_eq!(builtin_round(&[Value::Float(2.3)]).unwrap().str_value(), "2");
    }
}
