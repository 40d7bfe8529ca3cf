//! Operator semantics: arithmetic, ordering, membership and identity.

use std::cmp::Ordering;
use std::rc::Rc;

use crate::interp::ast::{BinOp, CmpOp, UnaryOp};
use crate::interp::error::{ErrorKind, EvalError, EvalResult};
use crate::interp::value::{Number, Value};

/// Upper bound on sequences built by repetition or `range` materialisation.
pub const MAX_SEQUENCE_LEN: usize = 1_000_000;

pub fn unary(op: UnaryOp, operand: &Value) -> EvalResult<Value> {
    match op {
        UnaryOp::Not => Ok(Value::Bool(!operand.truthy())),
        UnaryOp::Pos => match operand.as_number() {
            Some(Number::Int(value)) => Ok(Value::Int(value)),
            Some(Number::Float(value)) => Ok(Value::Float(value)),
            None => Err(bad_unary("+", operand)),
        },
        UnaryOp::Neg => match operand.as_number() {
            Some(Number::Int(value)) => value
                .checked_neg()
                .map(Value::Int)
                .ok_or_else(EvalError::overflow),
            Some(Number::Float(value)) => Ok(Value::Float(-value)),
            None => Err(bad_unary("-", operand)),
        },
    }
}

fn bad_unary(symbol: &str, operand: &Value) -> EvalError {
    EvalError::type_error(format!(
        "bad operand type for unary {symbol}: '{}'",
        operand.type_name()
    ))
}

pub fn binary(op: BinOp, left: &Value, right: &Value) -> EvalResult<Value> {
    if let (Some(a), Some(b)) = (left.as_number(), right.as_number()) {
        return numeric(op, a, b);
    }
    match (op, left, right) {
        (BinOp::Add, Value::Str(a), Value::Str(b)) => Ok(Value::Str(format!("{a}{b}"))),
        (BinOp::Add, Value::List(a), Value::List(b)) => {
            let mut items = a.borrow().clone();
            items.extend(b.borrow().iter().cloned());
            Ok(Value::list(items))
        }
        (BinOp::Add, Value::Tuple(a), Value::Tuple(b)) => {
            let mut items = a.as_ref().clone();
            items.extend(b.iter().cloned());
            Ok(Value::tuple(items))
        }
        (BinOp::Mul, sequence, count) | (BinOp::Mul, count, sequence)
            if count.as_int().is_some() && is_sequence(sequence) =>
        {
            repeat(sequence, count.as_int().unwrap_or(0))
        }
        _ => Err(EvalError::type_error(format!(
            "unsupported operand type(s) for {}: '{}' and '{}'",
            op.symbol(),
            left.type_name(),
            right.type_name()
        ))),
    }
}

fn is_sequence(value: &Value) -> bool {
    matches!(value, Value::Str(_) | Value::List(_) | Value::Tuple(_))
}

fn repeat(sequence: &Value, count: i64) -> EvalResult<Value> {
    let count = usize::try_from(count).unwrap_or(0);
    let len = match sequence {
        Value::Str(text) => text.chars().count(),
        Value::List(items) => items.borrow().len(),
        Value::Tuple(items) => items.len(),
        _ => 0,
    };
    if len.saturating_mul(count) > MAX_SEQUENCE_LEN {
        return Err(EvalError::new(ErrorKind::MemoryError, "sequence too large"));
    }
    Ok(match sequence {
        Value::Str(text) => Value::Str(text.repeat(count)),
        Value::List(items) => Value::list(repeated(&items.borrow(), count)),
        Value::Tuple(items) => Value::tuple(repeated(items, count)),
        other => other.clone(),
    })
}

fn repeated(items: &[Value], count: usize) -> Vec<Value> {
    let mut out = Vec::with_capacity(items.len() * count);
    for _ in 0..count {
        out.extend(items.iter().cloned());
    }
    out
}

fn numeric(op: BinOp, left: Number, right: Number) -> EvalResult<Value> {
    if let (Number::Int(a), Number::Int(b)) = (left, right) {
        return integer(op, a, b);
    }
    let (a, b) = (left.as_f64(), right.as_f64());
    let value = match op {
        BinOp::Add => a + b,
        BinOp::Sub => a - b,
        BinOp::Mul => a * b,
        BinOp::Div => {
            if b == 0.0 {
                return Err(EvalError::zero_division("float division by zero"));
            }
            a / b
        }
        BinOp::FloorDiv => {
            if b == 0.0 {
                return Err(EvalError::zero_division("float floor division by zero"));
            }
            (a / b).floor()
        }
        BinOp::Mod => {
            if b == 0.0 {
                return Err(EvalError::zero_division("float modulo"));
            }
            let rem = a % b;
            if rem != 0.0 && (rem < 0.0) != (b < 0.0) {
                rem + b
            } else {
                rem
            }
        }
        BinOp::Pow => float_pow(a, b)?,
    };
    Ok(Value::Float(value))
}

fn float_pow(base: f64, exponent: f64) -> EvalResult<f64> {
    if base == 0.0 && exponent < 0.0 {
        return Err(EvalError::zero_division(
            "0.0 cannot be raised to a negative power",
        ));
    }
    if base < 0.0 && exponent.fract() != 0.0 {
        return Err(EvalError::value_error("complex results are not supported"));
    }
    Ok(base.powf(exponent))
}

fn integer(op: BinOp, a: i64, b: i64) -> EvalResult<Value> {
    let value = match op {
        BinOp::Add => a.checked_add(b),
        BinOp::Sub => a.checked_sub(b),
        BinOp::Mul => a.checked_mul(b),
        BinOp::Div => {
            if b == 0 {
                return Err(EvalError::zero_division("division by zero"));
            }
            return Ok(Value::Float(a as f64 / b as f64));
        }
        BinOp::FloorDiv => {
            if b == 0 {
                return Err(EvalError::zero_division(
                    "integer division or modulo by zero",
                ));
            }
            a.checked_div(b).map(|quotient| {
                if a % b != 0 && ((a < 0) != (b < 0)) {
                    quotient - 1
                } else {
                    quotient
                }
            })
        }
        BinOp::Mod => {
            if b == 0 {
                return Err(EvalError::zero_division("integer modulo by zero"));
            }
            a.checked_rem(b).map(|rem| {
                if rem != 0 && ((rem < 0) != (b < 0)) {
                    rem + b
                } else {
                    rem
                }
            })
        }
        BinOp::Pow => {
            if b < 0 {
                return float_pow(a as f64, b as f64).map(Value::Float);
            }
            u32::try_from(b).ok().and_then(|exp| a.checked_pow(exp))
        }
    };
    value.map(Value::Int).ok_or_else(EvalError::overflow)
}

/// Ordering for `< <= > >=`, `min`, `max` and `sorted`.
pub fn compare(left: &Value, right: &Value) -> EvalResult<Ordering> {
    if let (Some(a), Some(b)) = (left.as_number(), right.as_number()) {
        return match (a, b) {
            (Number::Int(a), Number::Int(b)) => Ok(a.cmp(&b)),
            (a, b) => Ok(a
                .as_f64()
                .partial_cmp(&b.as_f64())
                .unwrap_or(Ordering::Equal)),
        };
    }
    match (left, right) {
        (Value::Str(a), Value::Str(b)) => Ok(a.cmp(b)),
        (Value::List(a), Value::List(b)) => compare_sequences(&a.borrow(), &b.borrow()),
        (Value::Tuple(a), Value::Tuple(b)) => compare_sequences(a, b),
        _ => Err(EvalError::type_error(format!(
            "'<' not supported between instances of '{}' and '{}'",
            left.type_name(),
            right.type_name()
        ))),
    }
}

/// One `< <= > >=` comparison; NaN is unordered against everything.
pub fn ordering(op: CmpOp, left: &Value, right: &Value) -> EvalResult<bool> {
    if let (Some(a), Some(b)) = (left.as_number(), right.as_number()) {
        let ordering = match (a, b) {
            (Number::Int(a), Number::Int(b)) => Some(a.cmp(&b)),
            (a, b) => a.as_f64().partial_cmp(&b.as_f64()),
        };
        return Ok(ordering.is_some_and(|ordering| holds(op, ordering)));
    }
    let ordering = compare(left, right).map_err(|_| {
        EvalError::type_error(format!(
            "'{}' not supported between instances of '{}' and '{}'",
            op.symbol(),
            left.type_name(),
            right.type_name()
        ))
    })?;
    Ok(holds(op, ordering))
}

fn holds(op: CmpOp, ordering: Ordering) -> bool {
    match op {
        CmpOp::Lt => ordering.is_lt(),
        CmpOp::LtE => ordering.is_le(),
        CmpOp::Gt => ordering.is_gt(),
        CmpOp::GtE => ordering.is_ge(),
        _ => false,
    }
}

fn compare_sequences(left: &[Value], right: &[Value]) -> EvalResult<Ordering> {
    for (a, b) in left.iter().zip(right) {
        if a != b {
            return compare(a, b);
        }
    }
    Ok(left.len().cmp(&right.len()))
}

/// Membership test for `in`.
pub fn contains(container: &Value, item: &Value) -> EvalResult<bool> {
    match container {
        Value::Str(text) => match item {
            Value::Str(needle) => Ok(text.contains(needle.as_str())),
            other => Err(EvalError::type_error(format!(
                "'in <string>' requires string as left operand, not {}",
                other.type_name()
            ))),
        },
        Value::List(items) => Ok(items.borrow().iter().any(|candidate| candidate == item)),
        Value::Tuple(items) => Ok(items.iter().any(|candidate| candidate == item)),
        Value::Dict(dict) => Ok(dict.borrow().contains_key(item)),
        Value::Range(range) => Ok(match item.as_number() {
            Some(Number::Int(value)) => range.contains(value),
            Some(Number::Float(value)) => {
                value.fract() == 0.0 && range.contains(value as i64)
            }
            None => false,
        }),
        other => Err(EvalError::type_error(format!(
            "argument of type '{}' is not iterable",
            other.type_name()
        ))),
    }
}

/// Approximation of `is`: shared objects by pointer, singletons and small
/// interned scalars by value.
pub fn identical(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::None, Value::None) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Int(a), Value::Int(b)) => a == b && (-5..=256).contains(a),
        (Value::Str(a), Value::Str(b)) => a == b,
        (Value::List(a), Value::List(b)) => Rc::ptr_eq(a, b),
        (Value::Tuple(a), Value::Tuple(b)) => Rc::ptr_eq(a, b),
        (Value::Dict(a), Value::Dict(b)) => Rc::ptr_eq(a, b),
        (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
        (Value::Method(a), Value::Method(b)) => Rc::ptr_eq(a, b),
        (Value::Exception(a), Value::Exception(b)) => Rc::ptr_eq(a, b),
        (Value::Builtin(_), Value::Builtin(_))
        | (Value::Module(_), Value::Module(_))
        | (Value::ExceptionType(_), Value::ExceptionType(_)) => left == right,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(value: i64) -> Value {
        Value::Int(value)
    }

    #[test]
    fn true_division_always_yields_float() {
        assert_eq!(
            binary(BinOp::Div, &int(6), &int(2)).expect("div"),
            Value::Float(3.0)
        );
        assert!(matches!(
            binary(BinOp::Div, &int(6), &int(2)).expect("div"),
            Value::Float(_)
        ));
    }

    #[test]
    fn floor_division_and_modulo_follow_the_divisor_sign() {
        assert_eq!(binary(BinOp::FloorDiv, &int(-7), &int(2)).expect("fd"), int(-4));
        assert_eq!(binary(BinOp::Mod, &int(-7), &int(2)).expect("mod"), int(1));
        assert_eq!(binary(BinOp::Mod, &int(7), &int(-2)).expect("mod"), int(-1));
    }

    #[test]
    fn division_by_zero_messages() {
        let err = binary(BinOp::Div, &int(1), &int(0)).expect_err("zero");
        assert_eq!(err.to_string(), "division by zero");
        assert_eq!(err.kind(), Some(ErrorKind::ZeroDivisionError));
        let err = binary(BinOp::Mod, &Value::Float(1.0), &int(0)).expect_err("zero");
        assert_eq!(err.to_string(), "float modulo");
    }

    #[test]
    fn integer_power_and_negative_exponent() {
        assert_eq!(binary(BinOp::Pow, &int(2), &int(10)).expect("pow"), int(1024));
        assert_eq!(
            binary(BinOp::Pow, &int(2), &int(-1)).expect("pow"),
            Value::Float(0.5)
        );
        let err = binary(BinOp::Pow, &int(10), &int(100)).expect_err("overflow");
        assert_eq!(err.kind(), Some(ErrorKind::OverflowError));
    }

    #[test]
    fn sequences_concatenate_and_repeat() {
        assert_eq!(
            binary(BinOp::Add, &Value::str("ab"), &Value::str("cd")).expect("add"),
            Value::str("abcd")
        );
        assert_eq!(
            binary(BinOp::Mul, &int(3), &Value::str("ab")).expect("mul"),
            Value::str("ababab")
        );
        let list = Value::list(vec![int(0)]);
        assert_eq!(
            binary(BinOp::Mul, &list, &int(2)).expect("mul").repr(),
            "[0, 0]"
        );
        let pair = Value::tuple(vec![int(1), Value::str("a")]);
        assert_eq!(
            binary(BinOp::Mul, &int(2), &pair).expect("mul").repr(),
            "(1, 'a', 1, 'a')"
        );
        assert_eq!(binary(BinOp::Mul, &list, &int(-1)).expect("mul").repr(), "[]");
        let err = binary(BinOp::Mul, &Value::str("x"), &int(10_000_000)).expect_err("cap");
        assert_eq!(err.kind(), Some(ErrorKind::MemoryError));
    }

    #[test]
    fn mixing_strings_and_numbers_is_a_type_error() {
        let err = binary(BinOp::Add, &Value::str("a"), &int(1)).expect_err("type");
        assert_eq!(
            err.to_string(),
            "unsupported operand type(s) for +: 'str' and 'int'"
        );
    }

    #[test]
    fn ordering_across_types() {
        assert_eq!(compare(&int(1), &Value::Float(1.5)).expect("cmp"), Ordering::Less);
        assert_eq!(
            compare(&Value::str("b"), &Value::str("a")).expect("cmp"),
            Ordering::Greater
        );
        assert!(compare(&Value::str("a"), &int(1)).is_err());
        let short = Value::list(vec![int(1)]);
        let long = Value::list(vec![int(1), int(0)]);
        assert_eq!(compare(&short, &long).expect("cmp"), Ordering::Less);
    }

    #[test]
    fn ordering_operators_name_themselves_in_errors() {
        assert!(ordering(CmpOp::GtE, &int(2), &Value::Float(2.0)).expect("cmp"));
        assert!(!ordering(CmpOp::Lt, &Value::Float(f64::NAN), &int(1)).expect("nan"));
        let err = ordering(CmpOp::Gt, &Value::str("a"), &int(1)).expect_err("type");
        assert_eq!(
            err.to_string(),
            "'>' not supported between instances of 'str' and 'int'"
        );
    }

    #[test]
    fn membership() {
        assert!(contains(&Value::str("hello"), &Value::str("ell")).expect("in"));
        assert!(contains(&Value::list(vec![int(1), int(2)]), &Value::Float(2.0)).expect("in"));
        assert!(contains(&int(1), &int(1)).is_err());
    }

    #[test]
    fn identity_for_shared_objects() {
        let list = Value::list(Vec::new());
        assert!(identical(&list, &list.clone()));
        assert!(!identical(&list, &Value::list(Vec::new())));
        assert!(identical(&Value::None, &Value::None));
    }
}
