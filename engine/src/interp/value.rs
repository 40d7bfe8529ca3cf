//! Runtime values and their Python-compatible rendering and equality.
//!
//! Lists and dicts are shared references: mutating one binding is visible
//! through every other binding of the same object, matching the semantics
//! learners expect from the language being taught.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::interp::ast::Expr;
use crate::interp::builtins::Builtin;
use crate::interp::error::ErrorKind;
use crate::interp::eval::Locals;
use crate::interp::modules::Namespace;

/// Nesting depth past which equality gives up and copies turn shallow.
const MAX_NESTING: usize = 200;

#[derive(Debug, Clone)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Rc<RefCell<Vec<Value>>>),
    Tuple(Rc<Vec<Value>>),
    Dict(Rc<RefCell<Dict>>),
    Range(RangeValue),
    Function(Rc<Lambda>),
    Builtin(Builtin),
    Method(Rc<BoundMethod>),
    Module(&'static Namespace),
    ExceptionType(ErrorKind),
    Exception(Rc<ExceptionValue>),
}

/// Numeric view used for arithmetic and cross-type comparisons.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub fn as_f64(self) -> f64 {
        match self {
            Number::Int(value) => value as f64,
            Number::Float(value) => value,
        }
    }

    fn numeric_eq(self, other: Number) -> bool {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => a == b,
            (a, b) => a.as_f64() == b.as_f64(),
        }
    }
}

/// User-defined `lambda`.
#[derive(Debug)]
pub struct Lambda {
    pub params: Vec<String>,
    pub body: Rc<Expr>,
    /// Locals visible where the lambda was created.
    pub captured: Locals,
}

/// A method looked up on a receiver, e.g. `items.append`.
#[derive(Debug)]
pub struct BoundMethod {
    pub receiver: Value,
    pub name: &'static str,
}

#[derive(Debug)]
pub struct ExceptionValue {
    pub kind: ErrorKind,
    pub message: String,
}

/// Lazy `range(start, stop, step)`; `step` is never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeValue {
    pub start: i64,
    pub stop: i64,
    pub step: i64,
}

impl RangeValue {
    pub fn len(&self) -> usize {
        let (start, stop, step) = (self.start as i128, self.stop as i128, self.step as i128);
        let count = if step > 0 && start < stop {
            (stop - start - 1) / step + 1
        } else if step < 0 && start > stop {
            (start - stop - 1) / (-step) + 1
        } else {
            0
        };
        usize::try_from(count).unwrap_or(usize::MAX)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<i64> {
        if index >= self.len() {
            return None;
        }
        let value = self.start as i128 + self.step as i128 * index as i128;
        i64::try_from(value).ok()
    }

    pub fn contains(&self, value: i64) -> bool {
        let offset = value as i128 - self.start as i128;
        let step = self.step as i128;
        if offset % step != 0 {
            return false;
        }
        let index = offset / step;
        index >= 0 && (index as u128) < self.len() as u128
    }

    fn sequence_eq(&self, other: &RangeValue) -> bool {
        let len = self.len();
        if len != other.len() {
            return false;
        }
        match len {
            0 => true,
            1 => self.start == other.start,
            _ => self.start == other.start && self.step == other.step,
        }
    }
}

/// Insertion-ordered mapping with Python key equality (`1 == 1.0 == True`).
#[derive(Debug, Clone, Default)]
pub struct Dict {
    entries: Vec<(Value, Value)>,
}

impl Dict {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value)
    }

    pub fn contains_key(&self, key: &Value) -> bool {
        self.get(key).is_some()
    }

    /// Insert or replace; an existing key keeps its original spelling.
    pub fn insert(&mut self, key: Value, value: Value) {
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn remove(&mut self, key: &Value) -> Option<Value> {
        let position = self.entries.iter().position(|(existing, _)| existing == key)?;
        Some(self.entries.remove(position).1)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Value, Value)> {
        self.entries.iter()
    }

    pub fn keys(&self) -> Vec<Value> {
        self.entries.iter().map(|(key, _)| key.clone()).collect()
    }

    pub fn values(&self) -> Vec<Value> {
        self.entries.iter().map(|(_, value)| value.clone()).collect()
    }
}

impl FromIterator<(Value, Value)> for Dict {
    fn from_iter<I: IntoIterator<Item = (Value, Value)>>(iter: I) -> Self {
        let mut dict = Dict::new();
        for (key, value) in iter {
            dict.insert(key, value);
        }
        dict
    }
}

impl Value {
    pub fn str(text: impl Into<String>) -> Value {
        Value::Str(text.into())
    }

    pub fn list(items: Vec<Value>) -> Value {
        Value::List(Rc::new(RefCell::new(items)))
    }

    pub fn tuple(items: Vec<Value>) -> Value {
        Value::Tuple(Rc::new(items))
    }

    pub fn dict(dict: Dict) -> Value {
        Value::Dict(Rc::new(RefCell::new(dict)))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "NoneType",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Tuple(_) => "tuple",
            Value::Dict(_) => "dict",
            Value::Range(_) => "range",
            Value::Function(_) => "function",
            Value::Builtin(_) | Value::Method(_) => "builtin_function_or_method",
            Value::Module(_) => "module",
            Value::ExceptionType(_) => "type",
            Value::Exception(exception) => exception.kind.name(),
        }
    }

    pub fn as_number(&self) -> Option<Number> {
        match self {
            Value::Bool(flag) => Some(Number::Int(i64::from(*flag))),
            Value::Int(value) => Some(Number::Int(*value)),
            Value::Float(value) => Some(Number::Float(*value)),
            _ => None,
        }
    }

    /// Integer view for indices and counts (`bool` counts as an integer).
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Bool(flag) => Some(i64::from(*flag)),
            Value::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn truthy(&self) -> bool {
        match self {
            Value::None => false,
            Value::Bool(flag) => *flag,
            Value::Int(value) => *value != 0,
            Value::Float(value) => *value != 0.0,
            Value::Str(text) => !text.is_empty(),
            Value::List(items) => !items.borrow().is_empty(),
            Value::Tuple(items) => !items.is_empty(),
            Value::Dict(dict) => !dict.borrow().is_empty(),
            Value::Range(range) => !range.is_empty(),
            _ => true,
        }
    }

    pub fn is_callable(&self) -> bool {
        matches!(
            self,
            Value::Function(_) | Value::Builtin(_) | Value::Method(_) | Value::ExceptionType(_)
        )
    }

    /// Whether the value may be used as a dict key.
    pub fn is_hashable(&self) -> bool {
        match self {
            Value::List(_) | Value::Dict(_) => false,
            Value::Tuple(items) => items.iter().all(Value::is_hashable),
            _ => true,
        }
    }

    /// Python `repr()`.
    pub fn repr(&self) -> String {
        let mut out = String::new();
        self.write_repr(&mut out, &mut Vec::new());
        out
    }

    /// Copy that shares no mutable containers with `self`.
    pub fn deep_copy(&self) -> Value {
        self.deep_copy_at(0)
    }

    fn deep_copy_at(&self, depth: usize) -> Value {
        if depth > MAX_NESTING {
            return self.clone();
        }
        match self {
            Value::List(items) => Value::list(
                items
                    .borrow()
                    .iter()
                    .map(|item| item.deep_copy_at(depth + 1))
                    .collect(),
            ),
            Value::Tuple(items) => Value::tuple(
                items
                    .iter()
                    .map(|item| item.deep_copy_at(depth + 1))
                    .collect(),
            ),
            Value::Dict(dict) => Value::dict(
                dict.borrow()
                    .iter()
                    .map(|(key, value)| (key.deep_copy_at(depth + 1), value.deep_copy_at(depth + 1)))
                    .collect(),
            ),
            other => other.clone(),
        }
    }

    fn eq_at(&self, other: &Value, depth: usize) -> bool {
        if depth > MAX_NESTING {
            return false;
        }
        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => {
                Rc::ptr_eq(a, b) || sequence_eq(&a.borrow(), &b.borrow(), depth)
            }
            (Value::Tuple(a), Value::Tuple(b)) => sequence_eq(a, b, depth),
            (Value::Dict(a), Value::Dict(b)) => Rc::ptr_eq(a, b) || dict_eq(&a.borrow(), &b.borrow(), depth),
            (Value::Range(a), Value::Range(b)) => a.sequence_eq(b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Builtin(a), Value::Builtin(b)) => a.name == b.name,
            (Value::Method(a), Value::Method(b)) => {
                a.name == b.name && a.receiver.eq_at(&b.receiver, depth + 1)
            }
            (Value::Module(a), Value::Module(b)) => a.name == b.name,
            (Value::ExceptionType(a), Value::ExceptionType(b)) => a == b,
            (Value::Exception(a), Value::Exception(b)) => Rc::ptr_eq(a, b),
            _ => match (self.as_number(), other.as_number()) {
                (Some(a), Some(b)) => a.numeric_eq(b),
                _ => false,
            },
        }
    }

    fn write_repr(&self, out: &mut String, seen: &mut Vec<*const ()>) {
        match self {
            Value::None => out.push_str("None"),
            Value::Bool(true) => out.push_str("True"),
            Value::Bool(false) => out.push_str("False"),
            Value::Int(value) => out.push_str(&value.to_string()),
            Value::Float(value) => out.push_str(&format_float(*value)),
            Value::Str(text) => out.push_str(&repr_str(text)),
            Value::List(items) => {
                let id = Rc::as_ptr(items) as *const ();
                if seen.contains(&id) {
                    out.push_str("[...]");
                    return;
                }
                seen.push(id);
                out.push('[');
                write_items(out, &items.borrow(), seen);
                out.push(']');
                seen.pop();
            }
            Value::Tuple(items) => {
                out.push('(');
                write_items(out, items, seen);
                if items.len() == 1 {
                    out.push(',');
                }
                out.push(')');
            }
            Value::Dict(dict) => {
                let id = Rc::as_ptr(dict) as *const ();
                if seen.contains(&id) {
                    out.push_str("{...}");
                    return;
                }
                seen.push(id);
                out.push('{');
                for (position, (key, value)) in dict.borrow().iter().enumerate() {
                    if position > 0 {
                        out.push_str(", ");
                    }
                    key.write_repr(out, seen);
                    out.push_str(": ");
                    value.write_repr(out, seen);
                }
                out.push('}');
                seen.pop();
            }
            Value::Range(range) => {
                if range.step == 1 {
                    out.push_str(&format!("range({}, {})", range.start, range.stop));
                } else {
                    out.push_str(&format!(
                        "range({}, {}, {})",
                        range.start, range.stop, range.step
                    ));
                }
            }
            Value::Function(_) => out.push_str("<function <lambda>>"),
            Value::Builtin(builtin) => {
                out.push_str(&format!("<built-in function {}>", builtin.name));
            }
            Value::Method(method) => out.push_str(&format!(
                "<built-in method {} of {} object>",
                method.name,
                method.receiver.type_name()
            )),
            Value::Module(namespace) => {
                out.push_str(&format!("<module '{}' (built-in)>", namespace.name));
            }
            Value::ExceptionType(kind) => out.push_str(&format!("<class '{}'>", kind.name())),
            Value::Exception(exception) => {
                out.push_str(exception.kind.name());
                out.push('(');
                if !exception.message.is_empty() {
                    out.push_str(&repr_str(&exception.message));
                }
                out.push(')');
            }
        }
    }
}

/// Python `==`.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.eq_at(other, 0)
    }
}

/// Python `str()`.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(text) => f.write_str(text),
            Value::Exception(exception) => f.write_str(&exception.message),
            other => f.write_str(&other.repr()),
        }
    }
}

fn sequence_eq(left: &[Value], right: &[Value], depth: usize) -> bool {
    left.len() == right.len()
        && left
            .iter()
            .zip(right)
            .all(|(a, b)| a.eq_at(b, depth + 1))
}

fn dict_eq(left: &Dict, right: &Dict, depth: usize) -> bool {
    left.len() == right.len()
        && left.iter().all(|(key, value)| {
            right
                .get(key)
                .is_some_and(|other| value.eq_at(other, depth + 1))
        })
}

fn write_items(out: &mut String, items: &[Value], seen: &mut Vec<*const ()>) {
    for (position, item) in items.iter().enumerate() {
        if position > 0 {
            out.push_str(", ");
        }
        item.write_repr(out, seen);
    }
}

/// Shortest round-trip float rendering with Python's exponent conventions.
pub fn format_float(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    let magnitude = value.abs();
    if magnitude != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        let rendered = format!("{value:e}");
        let (mantissa, exponent) = rendered.split_once('e').unwrap_or((&rendered, "0"));
        let exponent: i32 = exponent.parse().unwrap_or(0);
        let sign = if exponent < 0 { '-' } else { '+' };
        return format!("{mantissa}e{sign}{:02}", exponent.abs());
    }
    let rendered = value.to_string();
    if rendered.contains('.') {
        rendered
    } else {
        format!("{rendered}.0")
    }
}

/// Quote a string the way Python's `repr()` does.
pub fn repr_str(text: &str) -> String {
    let quote = if text.contains('\'') && !text.contains('"') {
        '"'
    } else {
        '\''
    };
    let mut out = String::with_capacity(text.len() + 2);
    out.push(quote);
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if (c as u32) < 0x20 || c as u32 == 0x7f => {
                out.push_str(&format!("\\x{:02x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_compare_across_types() {
        assert_eq!(Value::Int(13), Value::Float(13.0));
        assert_eq!(Value::Bool(false), Value::Int(0));
        assert_ne!(Value::Int(1), Value::str("1"));
    }

    #[test]
    fn list_and_tuple_are_never_equal() {
        let list = Value::list(vec![Value::Int(1)]);
        let tuple = Value::tuple(vec![Value::Int(1)]);
        assert_ne!(list, tuple);
    }

    #[test]
    fn dict_equality_ignores_order() {
        let left = Value::dict(Dict::from_iter([
            (Value::str("a"), Value::Int(1)),
            (Value::str("b"), Value::Int(2)),
        ]));
        let right = Value::dict(Dict::from_iter([
            (Value::str("b"), Value::Int(2)),
            (Value::str("a"), Value::Int(1)),
        ]));
        assert_eq!(left, right);
    }

    #[test]
    fn floats_render_like_python() {
        assert_eq!(format_float(13.0), "13.0");
        assert_eq!(format_float(0.5), "0.5");
        assert_eq!(format_float(1e16), "1e+16");
        assert_eq!(format_float(1.5e-5), "1.5e-05");
        assert_eq!(format_float(-0.0), "-0.0");
        assert_eq!(format_float(f64::INFINITY), "inf");
    }

    #[test]
    fn strings_pick_the_quote_python_picks() {
        assert_eq!(repr_str("abc"), "'abc'");
        assert_eq!(repr_str("\"\""), "'\"\"'");
        assert_eq!(repr_str("it's"), "\"it's\"");
        assert_eq!(repr_str("a\nb"), "'a\\nb'");
    }

    #[test]
    fn containers_render_recursively() {
        let value = Value::list(vec![
            Value::Int(1),
            Value::str("x"),
            Value::tuple(vec![Value::None]),
            Value::dict(Dict::from_iter([(Value::str("k"), Value::str("v"))])),
        ]);
        assert_eq!(value.repr(), "[1, 'x', (None,), {'k': 'v'}]");
        assert_eq!(value.to_string(), value.repr());
        assert_eq!(Value::str("plain").to_string(), "plain");
    }

    #[test]
    fn self_referencing_list_renders_ellipsis() {
        let value = Value::list(Vec::new());
        if let Value::List(items) = &value {
            items.borrow_mut().push(value.clone());
        }
        assert_eq!(value.repr(), "[[...]]");
    }

    #[test]
    fn deep_copy_detaches_containers() {
        let original = Value::list(vec![Value::Int(1)]);
        let copy = original.deep_copy();
        if let Value::List(items) = &copy {
            items.borrow_mut().push(Value::Int(2));
        }
        assert_eq!(original.repr(), "[1]");
        assert_eq!(copy.repr(), "[1, 2]");
    }

    #[test]
    fn range_length_and_membership() {
        let range = RangeValue {
            start: 1,
            stop: 100,
            step: 2,
        };
        assert_eq!(range.len(), 50);
        assert!(range.contains(99));
        assert!(!range.contains(100));
        assert_eq!(range.get(49), Some(99));
        let backwards = RangeValue {
            start: 5,
            stop: 0,
            step: -2,
        };
        assert_eq!(backwards.len(), 3);
    }
}
