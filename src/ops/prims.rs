// src/ops/prims.rs

// Pure operator bodies. Each receives its arguments in parameter order.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::EvalError;
use crate::value::Value;

// --- Argument helpers ---

pub(crate) fn bad_args(op: &str, expected: usize, args: &[Value]) -> EvalError {
    EvalError::ArityMismatch {
        operator: op.to_string(),
        expected,
        got: args.len(),
    }
}

pub(crate) fn failed(op: &str, message: impl Into<String>) -> EvalError {
    EvalError::OperatorFailed {
        operator: op.to_string(),
        message: message.into(),
    }
}

pub(crate) fn expect_list<'a>(op: &str, value: &'a Value) -> Result<&'a [Value], EvalError> {
    value.as_list().ok_or_else(|| {
        EvalError::TypeError(format!("'{}' expects a list, but got {}", op, value.type_name()))
    })
}

/// Scalars as text; numbers are rendered in their display form.
pub(crate) fn expect_text(op: &str, value: &Value) -> Result<String, EvalError> {
    match value {
        Value::Str(s) => Ok(s.clone()),
        Value::Int(_) | Value::Float(_) => Ok(value.to_string()),
        other => Err(EvalError::TypeError(format!(
            "'{}' expects text, but got {}",
            op,
            other.type_name()
        ))),
    }
}

fn expect_int(op: &str, value: &Value) -> Result<i64, EvalError> {
    match value {
        Value::Int(n) => Ok(*n),
        Value::Str(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| failed(op, format!("invalid integer: {:?}", s))),
        other => Err(EvalError::TypeError(format!(
            "'{}' expects an integer, but got {}",
            op,
            other.type_name()
        ))),
    }
}

// Numeric view used by `sum` and `+`.
#[derive(Clone, Copy)]
enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    fn as_f64(self) -> f64 {
        match self {
            Number::Int(n) => n as f64,
            Number::Float(x) => x,
        }
    }

    fn into_value(self) -> Value {
        match self {
            Number::Int(n) => Value::Int(n),
            Number::Float(x) => Value::Float(x),
        }
    }
}

fn to_number(op: &str, value: &Value) -> Result<Number, EvalError> {
    match value {
        Value::Int(n) => Ok(Number::Int(*n)),
        Value::Float(x) => Ok(Number::Float(*x)),
        Value::Str(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .map(Number::Int)
                .or_else(|_| s.parse::<f64>().map(Number::Float))
                .map_err(|_| failed(op, format!("not a number: {:?}", s)))
        }
        other => Err(EvalError::TypeError(format!(
            "'{}' expects a number, but got {}",
            op,
            other.type_name()
        ))),
    }
}

fn add_numbers(op: &str, a: Number, b: Number) -> Result<Number, EvalError> {
    match (a, b) {
        (Number::Int(x), Number::Int(y)) => x
            .checked_add(y)
            .map(Number::Int)
            .ok_or_else(|| failed(op, "integer overflow")),
        (x, y) => Ok(Number::Float(x.as_f64() + y.as_f64())),
    }
}

// --- Operators ---

pub fn op_join(args: &[Value]) -> Result<Value, EvalError> {
    let [v, sep] = args else { return Err(bad_args("join", 2, args)) };
    let items = expect_list("join", v)?;
    let sep = expect_text("join", sep)?;
    let parts: Vec<String> = items.iter().map(Value::to_string).collect();
    Ok(Value::Str(parts.join(&sep)))
}

pub fn op_split(args: &[Value]) -> Result<Value, EvalError> {
    let [v, sep] = args else { return Err(bad_args("split", 2, args)) };
    let text = expect_text("split", v)?;
    let sep = expect_text("split", sep)?;
    if sep.is_empty() {
        return Err(failed("split", "empty separator"));
    }
    Ok(Value::List(text.split(sep.as_str()).map(Value::from).collect()))
}

pub fn op_sum(args: &[Value]) -> Result<Value, EvalError> {
    let [v] = args else { return Err(bad_args("sum", 1, args)) };
    let items = expect_list("sum", v)?;
    let mut total = Number::Int(0);
    for item in items {
        total = add_numbers("sum", total, to_number("sum", item)?)?;
    }
    Ok(total.into_value())
}

pub fn op_int(args: &[Value]) -> Result<Value, EvalError> {
    let [v] = args else { return Err(bad_args("int", 1, args)) };
    match v {
        // `i64::MAX as f64` rounds up to 2^63, so the upper bound is exclusive.
        Value::Float(x) if (i64::MIN as f64..i64::MAX as f64).contains(&x.trunc()) => {
            Ok(Value::Int(x.trunc() as i64))
        }
        Value::Float(x) => Err(failed("int", format!("{} is out of integer range", x))),
        other => expect_int("int", other).map(Value::Int),
    }
}

pub fn op_float(args: &[Value]) -> Result<Value, EvalError> {
    let [v] = args else { return Err(bad_args("float", 1, args)) };
    to_number("float", v).map(|n| Value::Float(n.as_f64()))
}

pub fn op_format(args: &[Value]) -> Result<Value, EvalError> {
    let [fmt, v] = args else { return Err(bad_args("format", 2, args)) };
    let fmt = expect_text("format", fmt)?;
    Ok(Value::Str(fmt.replace("{}", &v.to_string())))
}

pub fn op_add(args: &[Value]) -> Result<Value, EvalError> {
    let [a, v] = args else { return Err(bad_args("+", 2, args)) };
    match (a, v) {
        (Value::Str(x), Value::Str(y)) => Ok(Value::Str(format!("{}{}", x, y))),
        (Value::List(x), Value::List(y)) => Ok(Value::List(x.iter().chain(y).cloned().collect())),
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            add_numbers("+", to_number("+", a)?, to_number("+", v)?).map(Number::into_value)
        }
        _ => Err(EvalError::TypeError(format!(
            "cannot add {} and {}",
            a.type_name(),
            v.type_name()
        ))),
    }
}

pub fn op_choice(args: &[Value]) -> Result<Value, EvalError> {
    let [v] = args else { return Err(bad_args("choice", 1, args)) };
    let items = expect_list("choice", v)?;
    items
        .choose(&mut rand::thread_rng())
        .cloned()
        .ok_or_else(|| failed("choice", "cannot choose from an empty list"))
}

pub fn op_randint(args: &[Value]) -> Result<Value, EvalError> {
    let [a, b] = args else { return Err(bad_args("randint", 2, args)) };
    let low = expect_int("randint", a)?;
    let high = expect_int("randint", b)?;
    if low > high {
        return Err(failed("randint", format!("empty range {}..={}", low, high)));
    }
    Ok(Value::Int(rand::thread_rng().gen_range(low..=high)))
}
