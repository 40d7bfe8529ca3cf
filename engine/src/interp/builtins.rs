//! Builtin functions and exception classes visible from every scope.

use std::cmp::Ordering;
use std::fmt;

use crate::interp::ast::BinOp;
use crate::interp::error::{ErrorKind, EvalError, EvalResult};
use crate::interp::eval::{Machine, hashable, iterate};
use crate::interp::ops;
use crate::interp::value::{Dict, Number, RangeValue, Value, repr_str};

pub type BuiltinFn = fn(&mut Machine<'_>, Args) -> EvalResult<Value>;

#[derive(Clone, Copy)]
pub struct Builtin {
    pub name: &'static str,
    pub func: BuiltinFn,
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builtin").field("name", &self.name).finish()
    }
}

/// Evaluated call arguments.
#[derive(Debug, Default)]
pub struct Args {
    pub positional: Vec<Value>,
    pub keywords: Vec<(String, Value)>,
}

impl Args {
    pub fn new(positional: Vec<Value>, keywords: Vec<(String, Value)>) -> Self {
        Self {
            positional,
            keywords,
        }
    }

    pub fn positional(values: Vec<Value>) -> Self {
        Self::new(values, Vec::new())
    }

    /// Remove and return a keyword argument.
    pub fn take_keyword(&mut self, name: &str) -> Option<Value> {
        let position = self.keywords.iter().position(|(key, _)| key == name)?;
        Some(self.keywords.remove(position).1)
    }

    pub fn reject_keywords(&self, func: &str) -> EvalResult<()> {
        match self.keywords.first() {
            None => Ok(()),
            Some((name, _)) => Err(EvalError::type_error(format!(
                "'{name}' is an invalid keyword argument for {func}()"
            ))),
        }
    }

    /// Positional arguments after checking that no keywords remain and the
    /// count lies within `min..=max`.
    pub fn into_positional(self, func: &str, min: usize, max: usize) -> EvalResult<Vec<Value>> {
        self.reject_keywords(func)?;
        let given = self.positional.len();
        if (min..=max).contains(&given) {
            return Ok(self.positional);
        }
        let message = if min == max && max == 0 {
            format!("{func}() takes no arguments ({given} given)")
        } else if min == max && max == 1 {
            format!("{func}() takes exactly one argument ({given} given)")
        } else if given < min {
            format!(
                "{func} expected at least {min} argument{}, got {given}",
                plural(min)
            )
        } else {
            format!(
                "{func} expected at most {max} argument{}, got {given}",
                plural(max)
            )
        };
        Err(EvalError::type_error(message))
    }

    pub fn exactly<const N: usize>(self, func: &str) -> EvalResult<[Value; N]> {
        let values = self.into_positional(func, N, N)?;
        values.try_into().map_err(|values: Vec<Value>| {
            EvalError::type_error(format!(
                "{func}() takes {N} arguments ({} given)",
                values.len()
            ))
        })
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 { "" } else { "s" }
}

static BUILTINS: &[Builtin] = &[
    Builtin { name: "print", func: print },
    Builtin { name: "len", func: len },
    Builtin { name: "max", func: max },
    Builtin { name: "min", func: min },
    Builtin { name: "sum", func: sum },
    Builtin { name: "abs", func: abs },
    Builtin { name: "round", func: round },
    Builtin { name: "sorted", func: sorted },
    Builtin { name: "range", func: range },
    Builtin { name: "list", func: list },
    Builtin { name: "tuple", func: tuple },
    Builtin { name: "dict", func: dict },
    Builtin { name: "str", func: str },
    Builtin { name: "repr", func: repr },
    Builtin { name: "int", func: int },
    Builtin { name: "float", func: float },
    Builtin { name: "bool", func: bool },
    Builtin { name: "globals", func: globals },
    Builtin { name: "exit", func: exit },
    Builtin { name: "quit", func: exit },
];

/// Builtin function or exception class bound to `name`.
pub fn lookup(name: &str) -> Option<Value> {
    if let Some(builtin) = BUILTINS.iter().find(|builtin| builtin.name == name) {
        return Some(Value::Builtin(*builtin));
    }
    ErrorKind::from_builtin_name(name).map(Value::ExceptionType)
}

pub(crate) fn as_integer(value: &Value) -> EvalResult<i64> {
    value.as_int().ok_or_else(|| {
        EvalError::type_error(format!(
            "'{}' object cannot be interpreted as an integer",
            value.type_name()
        ))
    })
}

pub(crate) fn float_to_int(value: f64) -> EvalResult<Value> {
    if value.is_nan() {
        return Err(EvalError::value_error("cannot convert float NaN to integer"));
    }
    if value.is_infinite() {
        return Err(EvalError::new(
            ErrorKind::OverflowError,
            "cannot convert float infinity to integer",
        ));
    }
    if value < i64::MIN as f64 || value >= i64::MAX as f64 {
        return Err(EvalError::overflow());
    }
    Ok(Value::Int(value as i64))
}

fn call_key(machine: &mut Machine<'_>, key: Option<&Value>, item: &Value) -> EvalResult<Value> {
    match key {
        Some(key) => machine.call_value(key, Args::positional(vec![item.clone()])),
        None => Ok(item.clone()),
    }
}

/// Stable sort by optional key; the first comparison failure is returned.
pub(crate) fn sort_values(
    machine: &mut Machine<'_>,
    items: Vec<Value>,
    key: Option<&Value>,
    reverse: bool,
) -> EvalResult<Vec<Value>> {
    let key = key.filter(|key| !matches!(key, Value::None));
    let mut ranked = Vec::with_capacity(items.len());
    for item in items {
        ranked.push((call_key(machine, key, &item)?, item));
    }
    let mut failure = None;
    ranked.sort_by(|(a, _), (b, _)| {
        let ordering = if reverse {
            ops::compare(b, a)
        } else {
            ops::compare(a, b)
        };
        ordering.unwrap_or_else(|err| {
            failure.get_or_insert(err);
            Ordering::Equal
        })
    });
    match failure {
        Some(err) => Err(err),
        None => Ok(ranked.into_iter().map(|(_, item)| item).collect()),
    }
}

/// Merge a mapping or an iterable of pairs into `dict`.
pub(crate) fn update_dict(dict: &mut Dict, source: &Value) -> EvalResult<()> {
    if let Value::Dict(other) = source {
        for (key, value) in other.borrow().iter() {
            dict.insert(key.clone(), value.clone());
        }
        return Ok(());
    }
    for (position, item) in iterate(source)?.into_iter().enumerate() {
        let pair = iterate(&item).map_err(|_| {
            EvalError::type_error(format!(
                "cannot convert dictionary update sequence element #{position} to a sequence"
            ))
        })?;
        let [key, value]: [Value; 2] = pair.try_into().map_err(|pair: Vec<Value>| {
            EvalError::value_error(format!(
                "dictionary update sequence element #{position} has length {}; 2 is required",
                pair.len()
            ))
        })?;
        dict.insert(hashable(key)?, value);
    }
    Ok(())
}

fn text_option(value: Option<Value>, default: &str, name: &str) -> EvalResult<String> {
    match value {
        None | Some(Value::None) => Ok(default.to_string()),
        Some(Value::Str(text)) => Ok(text),
        Some(other) => Err(EvalError::type_error(format!(
            "{name} must be None or a string, not {}",
            other.type_name()
        ))),
    }
}

fn print(machine: &mut Machine<'_>, mut args: Args) -> EvalResult<Value> {
    let sep = text_option(args.take_keyword("sep"), " ", "sep")?;
    let end = text_option(args.take_keyword("end"), "\n", "end")?;
    let line = args
        .into_positional("print", 0, usize::MAX)?
        .iter()
        .map(Value::to_string)
        .collect::<Vec<_>>()
        .join(&sep);
    machine.write_text(&format!("{line}{end}"))?;
    Ok(Value::None)
}

fn len(_: &mut Machine<'_>, args: Args) -> EvalResult<Value> {
    let [value] = args.exactly::<1>("len")?;
    let len = match &value {
        Value::Str(text) => text.chars().count(),
        Value::List(items) => items.borrow().len(),
        Value::Tuple(items) => items.len(),
        Value::Dict(dict) => dict.borrow().len(),
        Value::Range(range) => range.len(),
        other => {
            return Err(EvalError::type_error(format!(
                "object of type '{}' has no len()",
                other.type_name()
            )));
        }
    };
    i64::try_from(len)
        .map(Value::Int)
        .map_err(|_| EvalError::overflow())
}

fn max(machine: &mut Machine<'_>, args: Args) -> EvalResult<Value> {
    extreme(machine, args, "max", Ordering::Greater)
}

fn min(machine: &mut Machine<'_>, args: Args) -> EvalResult<Value> {
    extreme(machine, args, "min", Ordering::Less)
}

fn extreme(
    machine: &mut Machine<'_>,
    mut args: Args,
    func: &str,
    wanted: Ordering,
) -> EvalResult<Value> {
    let key = args
        .take_keyword("key")
        .filter(|key| !matches!(key, Value::None));
    let default = args.take_keyword("default");
    let mut positional = args.into_positional(func, 1, usize::MAX)?;
    let candidates = if positional.len() == 1 {
        iterate(&positional.remove(0))?
    } else if default.is_some() {
        return Err(EvalError::type_error(format!(
            "Cannot specify a default for {func}() with multiple positional arguments"
        )));
    } else {
        positional
    };
    let mut best: Option<(Value, Value)> = None;
    for item in candidates {
        let rank = call_key(machine, key.as_ref(), &item)?;
        let replace = match &best {
            None => true,
            Some((best_rank, _)) => ops::compare(&rank, best_rank)? == wanted,
        };
        if replace {
            best = Some((rank, item));
        }
    }
    match best {
        Some((_, item)) => Ok(item),
        None => default.ok_or_else(|| {
            EvalError::value_error(format!("{func}() iterable argument is empty"))
        }),
    }
}

fn sum(_: &mut Machine<'_>, mut args: Args) -> EvalResult<Value> {
    let start_keyword = args.take_keyword("start");
    let mut values = args.into_positional("sum", 1, 2)?;
    let start = match values.len() {
        2 => values.pop(),
        _ => start_keyword,
    };
    let start = start.unwrap_or(Value::Int(0));
    if matches!(start, Value::Str(_)) {
        return Err(EvalError::type_error(
            "sum() can't sum strings [use ''.join(seq) instead]",
        ));
    }
    let mut total = start;
    for item in iterate(&values[0])? {
        total = ops::binary(BinOp::Add, &total, &item)?;
    }
    Ok(total)
}

fn abs(_: &mut Machine<'_>, args: Args) -> EvalResult<Value> {
    let [value] = args.exactly::<1>("abs")?;
    match value.as_number() {
        Some(Number::Int(value)) => value
            .checked_abs()
            .map(Value::Int)
            .ok_or_else(EvalError::overflow),
        Some(Number::Float(value)) => Ok(Value::Float(value.abs())),
        None => Err(EvalError::type_error(format!(
            "bad operand type for abs(): '{}'",
            value.type_name()
        ))),
    }
}

fn round(_: &mut Machine<'_>, mut args: Args) -> EvalResult<Value> {
    let ndigits_keyword = args.take_keyword("ndigits");
    let mut values = args.into_positional("round", 1, 2)?;
    let ndigits = match values.len() {
        2 => values.pop(),
        _ => ndigits_keyword,
    };
    let ndigits = match ndigits {
        None | Some(Value::None) => None,
        Some(value) => Some(as_integer(&value)?),
    };
    let number = &values[0];
    match (number.as_number(), ndigits) {
        (Some(Number::Int(value)), None) => Ok(Value::Int(value)),
        (Some(Number::Int(value)), Some(digits)) => round_int(value, digits),
        (Some(Number::Float(value)), None) => float_to_int(value.round_ties_even()),
        (Some(Number::Float(value)), Some(digits)) => Ok(Value::Float(round_float(value, digits))),
        (None, _) => Err(EvalError::type_error(format!(
            "type {} doesn't define __round__ method",
            number.type_name()
        ))),
    }
}

fn round_float(value: f64, digits: i64) -> f64 {
    if !value.is_finite() || digits > 22 {
        return value;
    }
    let digits = digits.clamp(-308, 308) as i32;
    let factor = 10f64.powi(digits);
    let rounded = (value * factor).round_ties_even() / factor;
    if rounded.is_finite() { rounded } else { value }
}

fn round_int(value: i64, digits: i64) -> EvalResult<Value> {
    if digits >= 0 {
        return Ok(Value::Int(value));
    }
    let Some(unit) = u32::try_from(-digits)
        .ok()
        .and_then(|exp| 10i64.checked_pow(exp))
    else {
        return Ok(Value::Int(0));
    };
    let quotient = value.div_euclid(unit);
    let remainder = value.rem_euclid(unit);
    let round_up = match (remainder * 2).cmp(&unit) {
        Ordering::Greater => true,
        Ordering::Equal => quotient % 2 != 0,
        Ordering::Less => false,
    };
    let quotient = if round_up { quotient + 1 } else { quotient };
    quotient
        .checked_mul(unit)
        .map(Value::Int)
        .ok_or_else(EvalError::overflow)
}

fn sorted(machine: &mut Machine<'_>, mut args: Args) -> EvalResult<Value> {
    let key = args.take_keyword("key");
    let reverse = args
        .take_keyword("reverse")
        .is_some_and(|reverse| reverse.truthy());
    let [iterable] = args.exactly::<1>("sorted")?;
    let items = sort_values(machine, iterate(&iterable)?, key.as_ref(), reverse)?;
    Ok(Value::list(items))
}

fn range(_: &mut Machine<'_>, args: Args) -> EvalResult<Value> {
    let bounds = args
        .into_positional("range", 1, 3)?
        .iter()
        .map(as_integer)
        .collect::<EvalResult<Vec<_>>>()?;
    let (start, stop, step) = match bounds.as_slice() {
        [stop] => (0, *stop, 1),
        [start, stop] => (*start, *stop, 1),
        [start, stop, step] => (*start, *stop, *step),
        _ => return Err(EvalError::type_error("range expected 1 to 3 arguments")),
    };
    if step == 0 {
        return Err(EvalError::value_error("range() arg 3 must not be zero"));
    }
    Ok(Value::Range(RangeValue { start, stop, step }))
}

fn list(_: &mut Machine<'_>, args: Args) -> EvalResult<Value> {
    let values = args.into_positional("list", 0, 1)?;
    match values.first() {
        Some(source) => Ok(Value::list(iterate(source)?)),
        None => Ok(Value::list(Vec::new())),
    }
}

fn tuple(_: &mut Machine<'_>, args: Args) -> EvalResult<Value> {
    let values = args.into_positional("tuple", 0, 1)?;
    match values.first() {
        Some(source) => Ok(Value::tuple(iterate(source)?)),
        None => Ok(Value::tuple(Vec::new())),
    }
}

fn dict(_: &mut Machine<'_>, args: Args) -> EvalResult<Value> {
    let Args {
        positional,
        keywords,
    } = args;
    if positional.len() > 1 {
        return Err(EvalError::type_error(format!(
            "dict expected at most 1 argument, got {}",
            positional.len()
        )));
    }
    let mut dict = Dict::new();
    if let Some(source) = positional.first() {
        update_dict(&mut dict, source)?;
    }
    for (name, value) in keywords {
        dict.insert(Value::Str(name), value);
    }
    Ok(Value::dict(dict))
}

fn str(_: &mut Machine<'_>, args: Args) -> EvalResult<Value> {
    let values = args.into_positional("str", 0, 1)?;
    Ok(Value::Str(
        values.first().map(Value::to_string).unwrap_or_default(),
    ))
}

fn repr(_: &mut Machine<'_>, args: Args) -> EvalResult<Value> {
    let [value] = args.exactly::<1>("repr")?;
    Ok(Value::Str(value.repr()))
}

fn int(_: &mut Machine<'_>, args: Args) -> EvalResult<Value> {
    let values = args.into_positional("int", 0, 1)?;
    let Some(value) = values.first() else {
        return Ok(Value::Int(0));
    };
    match value {
        Value::Bool(_) | Value::Int(_) => Ok(Value::Int(value.as_int().unwrap_or_default())),
        Value::Float(value) => float_to_int(value.trunc()),
        Value::Str(text) => {
            let cleaned = text.trim();
            cleaned.parse::<i64>().map(Value::Int).map_err(|_| {
                let digits = cleaned.trim_start_matches(['+', '-']);
                if !digits.is_empty() && digits.chars().all(|ch| ch.is_ascii_digit()) {
                    EvalError::overflow()
                } else {
                    EvalError::value_error(format!(
                        "invalid literal for int() with base 10: {}",
                        repr_str(text)
                    ))
                }
            })
        }
        other => Err(EvalError::type_error(format!(
            "int() argument must be a string, a bytes-like object or a real number, not '{}'",
            other.type_name()
        ))),
    }
}

fn float(_: &mut Machine<'_>, args: Args) -> EvalResult<Value> {
    let values = args.into_positional("float", 0, 1)?;
    let Some(value) = values.first() else {
        return Ok(Value::Float(0.0));
    };
    if let Some(number) = value.as_number() {
        return Ok(Value::Float(number.as_f64()));
    }
    match value {
        Value::Str(text) => text.trim().parse::<f64>().map(Value::Float).map_err(|_| {
            EvalError::value_error(format!(
                "could not convert string to float: {}",
                repr_str(text)
            ))
        }),
        other => Err(EvalError::type_error(format!(
            "float() argument must be a string or a real number, not '{}'",
            other.type_name()
        ))),
    }
}

fn bool(_: &mut Machine<'_>, args: Args) -> EvalResult<Value> {
    let values = args.into_positional("bool", 0, 1)?;
    Ok(Value::Bool(values.first().is_some_and(Value::truthy)))
}

fn globals(machine: &mut Machine<'_>, args: Args) -> EvalResult<Value> {
    args.into_positional("globals", 0, 0)?;
    Ok(Value::dict(
        machine
            .workspace()
            .iter()
            .map(|(name, value)| (Value::str(name), value.clone()))
            .collect(),
    ))
}

fn exit(_: &mut Machine<'_>, _: Args) -> EvalResult<Value> {
    Err(EvalError::Exit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::workspace::Workspace;
    use crate::interp;

    fn eval(src: &str) -> EvalResult<Value> {
        interp::eval(src, &mut Workspace::new(), &mut std::io::sink())
    }

    fn shown(src: &str) -> String {
        eval(src).expect("evaluates").repr()
    }

    #[test]
    fn print_honours_sep_and_end() {
        let mut out = Vec::new();
        interp::eval(
            "print(1, 'a', [2], sep='-', end='!')",
            &mut Workspace::new(),
            &mut out,
        )
        .expect("print");
        assert_eq!(String::from_utf8(out).expect("utf8"), "1-a-[2]!");
    }

    #[test]
    fn max_min_with_key_and_default() {
        assert_eq!(shown("max([1, 3, 9])"), "9");
        assert_eq!(shown("max(3, 1, 2)"), "3");
        assert_eq!(shown("min(['bb', 'a', 'ccc'], key=len)"), "'a'");
        assert_eq!(shown("max([], default=0)"), "0");
        let err = eval("max([])").expect_err("empty");
        assert_eq!(err.to_string(), "max() iterable argument is empty");
    }

    #[test]
    fn sorted_is_stable_and_reversible() {
        assert_eq!(shown("sorted([3, 1, 2])"), "[1, 2, 3]");
        assert_eq!(
            shown("sorted(['bb', 'a', 'cc'], key=len, reverse=True)"),
            "['bb', 'cc', 'a']"
        );
        let err = eval("sorted([1, 'a'])").expect_err("mixed");
        assert_eq!(err.kind(), Some(ErrorKind::TypeError));
    }

    #[test]
    fn round_uses_bankers_rounding() {
        assert_eq!(shown("round(2.5)"), "2");
        assert_eq!(shown("round(3.5)"), "4");
        assert_eq!(shown("round(1250, -2)"), "1200");
        assert_eq!(shown("round(0.125, 2)"), "0.12");
    }

    #[test]
    fn conversions() {
        assert_eq!(shown("int(' 42 ')"), "42");
        assert_eq!(shown("int(-2.9)"), "-2");
        assert_eq!(shown("float('1e3')"), "1000.0");
        assert_eq!(shown("str(13.0)"), "'13.0'");
        assert_eq!(shown("repr('x')"), "\"'x'\"");
        assert_eq!(shown("bool([])"), "False");
        assert_eq!(shown("list('ab')"), "['a', 'b']");
        assert_eq!(shown("dict([('k', 'v')], n=1)"), "{'k': 'v', 'n': 1}");
        let err = eval("int('x')").expect_err("literal");
        assert_eq!(err.to_string(), "invalid literal for int() with base 10: 'x'");
    }

    #[test]
    fn range_and_sum() {
        assert_eq!(shown("list(range(1, 10, 4))"), "[1, 5, 9]");
        assert_eq!(shown("sum(range(5))"), "10");
        assert_eq!(shown("sum([[1], [2]], [])"), "[1, 2]");
        let err = eval("range(1, 2, 0)").expect_err("step");
        assert_eq!(err.kind(), Some(ErrorKind::ValueError));
    }

    #[test]
    fn arity_errors() {
        let err = eval("len()").expect_err("arity");
        assert_eq!(err.to_string(), "len() takes exactly one argument (0 given)");
        let err = eval("len([], x=1)").expect_err("keyword");
        assert_eq!(err.to_string(), "'x' is an invalid keyword argument for len()");
    }

    #[test]
    fn globals_snapshots_the_workspace() {
        let mut ws = Workspace::new();
        ws.define("q", Value::Int(123));
        ws.define("__z", Value::str("q"));
        let doubled =
            interp::eval("globals()[__z] * 2", &mut ws, &mut std::io::sink()).expect("eval");
        assert_eq!(doubled, Value::Int(246));
    }

    #[test]
    fn exit_requests_termination() {
        assert!(eval("exit()").expect_err("exit").is_exit());
        assert!(eval("quit(0)").expect_err("quit").is_exit());
    }

    #[test]
    fn exception_classes_are_callable() {
        assert_eq!(shown("ValueError('bad')"), "ValueError('bad')");
        assert_eq!(shown("KeyError"), "<class 'KeyError'>");
    }
}
