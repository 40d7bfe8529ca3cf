//! Namespaces that can be injected into a workspace by name.

use std::f64::consts;
use std::fmt;

use crate::interp::builtins::{Args, Builtin, as_integer, float_to_int};
use crate::interp::error::{ErrorKind, EvalError, EvalResult};
use crate::interp::eval::Machine;
use crate::interp::value::{Number, Value};

pub struct Namespace {
    pub name: &'static str,
    member: fn(&str) -> Option<Value>,
}

impl Namespace {
    pub fn member(&self, name: &str) -> Option<Value> {
        (self.member)(name)
    }
}

impl fmt::Debug for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Namespace").field("name", &self.name).finish()
    }
}

pub static MATH: Namespace = Namespace {
    name: "math",
    member: math_member,
};

static NAMESPACES: &[&Namespace] = &[&MATH];

pub fn lookup(name: &str) -> Option<&'static Namespace> {
    NAMESPACES
        .iter()
        .copied()
        .find(|namespace| namespace.name == name)
}

/// Names accepted by [`lookup`].
pub fn names() -> impl Iterator<Item = &'static str> {
    NAMESPACES.iter().map(|namespace| namespace.name)
}

fn math_member(name: &str) -> Option<Value> {
    let constant = match name {
        "pi" => Some(consts::PI),
        "e" => Some(consts::E),
        "tau" => Some(consts::TAU),
        "inf" => Some(f64::INFINITY),
        "nan" => Some(f64::NAN),
        _ => None,
    };
    if let Some(constant) = constant {
        return Some(Value::Float(constant));
    }
    MATH_FUNCTIONS
        .iter()
        .find(|function| function.name == name)
        .copied()
        .map(Value::Builtin)
}

fn float_arg(value: &Value) -> EvalResult<f64> {
    value.as_number().map(Number::as_f64).ok_or_else(|| {
        EvalError::type_error(format!(
            "must be real number, not {}",
            value.type_name()
        ))
    })
}

fn domain_error() -> EvalError {
    EvalError::value_error("math domain error")
}

/// NaN out of non-NaN input is a domain error, infinity out of finite input
/// a range error.
fn checked(result: f64, inputs: &[f64]) -> EvalResult<Value> {
    if result.is_nan() && !inputs.iter().any(|input| input.is_nan()) {
        return Err(domain_error());
    }
    if result.is_infinite() && inputs.iter().all(|input| input.is_finite()) {
        return Err(EvalError::new(ErrorKind::OverflowError, "math range error"));
    }
    Ok(Value::Float(result))
}

macro_rules! unary_functions {
    ($($name:ident => $op:expr),* $(,)?) => {
        $(
            fn $name(_: &mut Machine<'_>, args: Args) -> EvalResult<Value> {
                let [x] = args.exactly::<1>(stringify!($name))?;
                let x = float_arg(&x)?;
                let op: fn(f64) -> f64 = $op;
                checked(op(x), &[x])
            }
        )*
    };
}

unary_functions! {
    sqrt => f64::sqrt,
    exp => f64::exp,
    cos => f64::cos,
    sin => f64::sin,
    tan => f64::tan,
    acos => f64::acos,
    asin => f64::asin,
    atan => f64::atan,
    fabs => f64::abs,
    degrees => f64::to_degrees,
    radians => f64::to_radians,
    log10 => |x| if x > 0.0 { x.log10() } else { f64::NAN },
    log2 => |x| if x > 0.0 { x.log2() } else { f64::NAN },
}

fn log(_: &mut Machine<'_>, args: Args) -> EvalResult<Value> {
    let values = args.into_positional("log", 1, 2)?;
    let x = float_arg(&values[0])?;
    if x <= 0.0 {
        return Err(domain_error());
    }
    match values.get(1) {
        None => checked(x.ln(), &[x]),
        Some(base) => {
            let base = float_arg(base)?;
            if base <= 0.0 {
                return Err(domain_error());
            }
            if base == 1.0 {
                return Err(EvalError::zero_division("float division by zero"));
            }
            checked(x.ln() / base.ln(), &[x, base])
        }
    }
}

fn pow(_: &mut Machine<'_>, args: Args) -> EvalResult<Value> {
    let [x, y] = args.exactly::<2>("pow")?;
    let (x, y) = (float_arg(&x)?, float_arg(&y)?);
    if x == 0.0 && y < 0.0 {
        return Err(domain_error());
    }
    checked(x.powf(y), &[x, y])
}

fn atan2(_: &mut Machine<'_>, args: Args) -> EvalResult<Value> {
    let [y, x] = args.exactly::<2>("atan2")?;
    let (y, x) = (float_arg(&y)?, float_arg(&x)?);
    checked(y.atan2(x), &[y, x])
}

fn hypot(_: &mut Machine<'_>, args: Args) -> EvalResult<Value> {
    let coordinates = args
        .into_positional("hypot", 0, usize::MAX)?
        .iter()
        .map(float_arg)
        .collect::<EvalResult<Vec<_>>>()?;
    let length = coordinates.iter().map(|c| c * c).sum::<f64>().sqrt();
    checked(length, &coordinates)
}

fn floor(_: &mut Machine<'_>, args: Args) -> EvalResult<Value> {
    let [x] = args.exactly::<1>("floor")?;
    match x.as_number() {
        Some(Number::Int(value)) => Ok(Value::Int(value)),
        _ => float_to_int(float_arg(&x)?.floor()),
    }
}

fn ceil(_: &mut Machine<'_>, args: Args) -> EvalResult<Value> {
    let [x] = args.exactly::<1>("ceil")?;
    match x.as_number() {
        Some(Number::Int(value)) => Ok(Value::Int(value)),
        _ => float_to_int(float_arg(&x)?.ceil()),
    }
}

fn isclose(_: &mut Machine<'_>, mut args: Args) -> EvalResult<Value> {
    let rel_tol = args
        .take_keyword("rel_tol")
        .map(|tol| float_arg(&tol))
        .transpose()?
        .unwrap_or(1e-9);
    let abs_tol = args
        .take_keyword("abs_tol")
        .map(|tol| float_arg(&tol))
        .transpose()?
        .unwrap_or(0.0);
    let [a, b] = args.exactly::<2>("isclose")?;
    let (a, b) = (float_arg(&a)?, float_arg(&b)?);
    if rel_tol < 0.0 || abs_tol < 0.0 {
        return Err(EvalError::value_error("tolerances must be non-negative"));
    }
    if a == b {
        return Ok(Value::Bool(true));
    }
    if a.is_infinite() || b.is_infinite() {
        return Ok(Value::Bool(false));
    }
    let diff = (a - b).abs();
    Ok(Value::Bool(
        diff <= (rel_tol * b.abs()).max(rel_tol * a.abs()).max(abs_tol),
    ))
}

fn factorial(_: &mut Machine<'_>, args: Args) -> EvalResult<Value> {
    let [n] = args.exactly::<1>("factorial")?;
    let n = as_integer(&n)?;
    if n < 0 {
        return Err(EvalError::value_error(
            "factorial() not defined for negative values",
        ));
    }
    (2..=n)
        .try_fold(1i64, |product, k| product.checked_mul(k))
        .map(Value::Int)
        .ok_or_else(EvalError::overflow)
}

fn gcd(_: &mut Machine<'_>, args: Args) -> EvalResult<Value> {
    let mut result: i64 = 0;
    for value in args.into_positional("gcd", 0, usize::MAX)? {
        let mut a = result;
        let mut b = as_integer(&value)?;
        while b != 0 {
            (a, b) = (b, a.wrapping_rem(b));
        }
        result = a.checked_abs().ok_or_else(EvalError::overflow)?;
    }
    Ok(Value::Int(result))
}

static MATH_FUNCTIONS: &[Builtin] = &[
    Builtin { name: "sqrt", func: sqrt },
    Builtin { name: "exp", func: exp },
    Builtin { name: "cos", func: cos },
    Builtin { name: "sin", func: sin },
    Builtin { name: "tan", func: tan },
    Builtin { name: "acos", func: acos },
    Builtin { name: "asin", func: asin },
    Builtin { name: "atan", func: atan },
    Builtin { name: "atan2", func: atan2 },
    Builtin { name: "fabs", func: fabs },
    Builtin { name: "degrees", func: degrees },
    Builtin { name: "radians", func: radians },
    Builtin { name: "log", func: log },
    Builtin { name: "log10", func: log10 },
    Builtin { name: "log2", func: log2 },
    Builtin { name: "pow", func: pow },
    Builtin { name: "hypot", func: hypot },
    Builtin { name: "floor", func: floor },
    Builtin { name: "ceil", func: ceil },
    Builtin { name: "isclose", func: isclose },
    Builtin { name: "factorial", func: factorial },
    Builtin { name: "gcd", func: gcd },
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::workspace::Workspace;
    use crate::interp;

    fn eval_with_math(src: &str) -> EvalResult<Value> {
        let mut ws = Workspace::new();
        ws.inject_namespace("math");
        interp::eval(src, &mut ws, &mut std::io::sink())
    }

    #[test]
    fn lookup_finds_registered_namespaces_only() {
        assert_eq!(lookup("math").map(|ns| ns.name), Some("math"));
        assert!(lookup("os").is_none());
        assert_eq!(names().collect::<Vec<_>>(), vec!["math"]);
    }

    #[test]
    fn cosine_matches_the_host_library() {
        assert_eq!(
            eval_with_math("math.cos(5)").expect("cos"),
            Value::Float(5f64.cos())
        );
        assert_eq!(eval_with_math("math.pi").expect("pi"), Value::Float(consts::PI));
    }

    #[test]
    fn floor_and_ceil_return_integers() {
        assert!(matches!(
            eval_with_math("math.floor(2.7)").expect("floor"),
            Value::Int(2)
        ));
        assert!(matches!(
            eval_with_math("math.ceil(-2.7)").expect("ceil"),
            Value::Int(-2)
        ));
    }

    #[test]
    fn domain_and_range_errors() {
        let err = eval_with_math("math.sqrt(-1)").expect_err("domain");
        assert_eq!(err.to_string(), "math domain error");
        let err = eval_with_math("math.log(0)").expect_err("log");
        assert_eq!(err.kind(), Some(ErrorKind::ValueError));
        let err = eval_with_math("math.exp(1000)").expect_err("range");
        assert_eq!(err.kind(), Some(ErrorKind::OverflowError));
    }

    #[test]
    fn integer_helpers() {
        assert_eq!(eval_with_math("math.factorial(5)").expect("fact"), Value::Int(120));
        assert_eq!(eval_with_math("math.gcd(12, -18)").expect("gcd"), Value::Int(6));
        assert_eq!(
            eval_with_math("math.isclose(0.1 + 0.2, 0.3)").expect("close"),
            Value::Bool(true)
        );
    }

    #[test]
    fn unknown_member_is_an_attribute_error() {
        let err = eval_with_math("math.nope").expect_err("attr");
        assert_eq!(err.to_string(), "module 'math' has no attribute 'nope'");
    }
}
