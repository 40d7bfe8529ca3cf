//! Methods on lists, dicts and strings.

use std::cell::RefCell;
use std::rc::Rc;

use crate::interp::builtins::{self, Args, as_integer};
use crate::interp::error::{ErrorKind, EvalError, EvalResult};
use crate::interp::eval::{Machine, hashable, iterate, normalize_index};
use crate::interp::value::{Dict, Value, repr_str};

const LIST_METHODS: &[&str] = &[
    "append", "extend", "pop", "insert", "remove", "index", "count", "copy", "clear", "reverse",
    "sort",
];

const DICT_METHODS: &[&str] = &[
    "get", "keys", "values", "items", "update", "pop", "setdefault", "copy", "clear",
];

const STR_METHODS: &[&str] = &[
    "upper", "lower", "strip", "lstrip", "rstrip", "split", "join", "replace", "startswith",
    "endswith", "count", "find", "format",
];

/// Method name on `receiver`'s type, if it exists.
pub fn resolve(receiver: &Value, name: &str) -> Option<&'static str> {
    let table = match receiver {
        Value::List(_) => LIST_METHODS,
        Value::Dict(_) => DICT_METHODS,
        Value::Str(_) => STR_METHODS,
        _ => return None,
    };
    table.iter().copied().find(|method| *method == name)
}

pub fn call(
    machine: &mut Machine<'_>,
    receiver: &Value,
    name: &str,
    args: Args,
) -> EvalResult<Value> {
    match receiver {
        Value::List(items) => list_method(machine, items, name, args),
        Value::Dict(dict) => dict_method(dict, name, args),
        Value::Str(text) => str_method(text, name, args),
        other => Err(no_attribute(other, name)),
    }
}

fn no_attribute(receiver: &Value, name: &str) -> EvalError {
    EvalError::new(
        ErrorKind::AttributeError,
        format!(
            "'{}' object has no attribute '{name}'",
            receiver.type_name()
        ),
    )
}

fn list_method(
    machine: &mut Machine<'_>,
    items: &Rc<RefCell<Vec<Value>>>,
    name: &str,
    mut args: Args,
) -> EvalResult<Value> {
    match name {
        "append" => {
            let [item] = args.exactly::<1>(name)?;
            items.borrow_mut().push(item);
        }
        "extend" => {
            let [source] = args.exactly::<1>(name)?;
            let extra = iterate(&source)?;
            items.borrow_mut().extend(extra);
        }
        "pop" => {
            let position = args.into_positional(name, 0, 1)?;
            let mut items = items.borrow_mut();
            if items.is_empty() {
                return Err(EvalError::new(ErrorKind::IndexError, "pop from empty list"));
            }
            let index = match position.first() {
                None => items.len() - 1,
                Some(position) => normalize_index(as_integer(position)?, items.len())
                    .ok_or_else(|| EvalError::new(ErrorKind::IndexError, "pop index out of range"))?,
            };
            return Ok(items.remove(index));
        }
        "insert" => {
            let [position, item] = args.exactly::<2>(name)?;
            let position = as_integer(&position)?;
            let mut items = items.borrow_mut();
            let len = i64::try_from(items.len()).unwrap_or(i64::MAX);
            let at = if position < 0 {
                (position + len).max(0)
            } else {
                position.min(len)
            };
            items.insert(usize::try_from(at).unwrap_or(0), item);
        }
        "remove" => {
            let [item] = args.exactly::<1>(name)?;
            let found = items.borrow().iter().position(|candidate| *candidate == item);
            match found {
                Some(index) => {
                    items.borrow_mut().remove(index);
                }
                None => return Err(EvalError::value_error("list.remove(x): x not in list")),
            }
        }
        "index" => {
            let [item] = args.exactly::<1>(name)?;
            let found = items.borrow().iter().position(|candidate| *candidate == item);
            return match found {
                Some(index) => Ok(Value::Int(i64::try_from(index).unwrap_or(i64::MAX))),
                None => Err(EvalError::value_error(format!(
                    "{} is not in list",
                    item.repr()
                ))),
            };
        }
        "count" => {
            let [item] = args.exactly::<1>(name)?;
            let count = items
                .borrow()
                .iter()
                .filter(|candidate| **candidate == item)
                .count();
            return Ok(Value::Int(i64::try_from(count).unwrap_or(i64::MAX)));
        }
        "copy" => {
            args.into_positional(name, 0, 0)?;
            return Ok(Value::list(items.borrow().clone()));
        }
        "clear" => {
            args.into_positional(name, 0, 0)?;
            items.borrow_mut().clear();
        }
        "reverse" => {
            args.into_positional(name, 0, 0)?;
            items.borrow_mut().reverse();
        }
        "sort" => {
            let key = args.take_keyword("key");
            let reverse = args
                .take_keyword("reverse")
                .is_some_and(|reverse| reverse.truthy());
            args.into_positional(name, 0, 0)?;
            let snapshot = items.borrow().clone();
            let sorted = builtins::sort_values(machine, snapshot, key.as_ref(), reverse)?;
            *items.borrow_mut() = sorted;
        }
        _ => return Err(no_attribute(&Value::List(Rc::clone(items)), name)),
    }
    Ok(Value::None)
}

fn dict_method(dict: &Rc<RefCell<Dict>>, name: &str, mut args: Args) -> EvalResult<Value> {
    match name {
        "get" => {
            let mut values = args.into_positional(name, 1, 2)?;
            let default = if values.len() == 2 { values.pop() } else { None };
            let key = hashable(values.remove(0))?;
            Ok(dict
                .borrow()
                .get(&key)
                .cloned()
                .or(default)
                .unwrap_or(Value::None))
        }
        "keys" => {
            args.into_positional(name, 0, 0)?;
            Ok(Value::list(dict.borrow().keys()))
        }
        "values" => {
            args.into_positional(name, 0, 0)?;
            Ok(Value::list(dict.borrow().values()))
        }
        "items" => {
            args.into_positional(name, 0, 0)?;
            Ok(Value::list(
                dict.borrow()
                    .iter()
                    .map(|(key, value)| Value::tuple(vec![key.clone(), value.clone()]))
                    .collect(),
            ))
        }
        "update" => {
            let keywords = std::mem::take(&mut args.keywords);
            let sources = args.into_positional(name, 0, 1)?;
            let mut incoming = Dict::new();
            if let Some(source) = sources.first() {
                builtins::update_dict(&mut incoming, source)?;
            }
            for (key, value) in keywords {
                incoming.insert(Value::Str(key), value);
            }
            let mut dict = dict.borrow_mut();
            for (key, value) in incoming.iter() {
                dict.insert(key.clone(), value.clone());
            }
            Ok(Value::None)
        }
        "pop" => {
            let mut values = args.into_positional(name, 1, 2)?;
            let default = if values.len() == 2 { values.pop() } else { None };
            let key = hashable(values.remove(0))?;
            let removed = dict.borrow_mut().remove(&key);
            removed
                .or(default)
                .ok_or_else(|| EvalError::new(ErrorKind::KeyError, key.repr()))
        }
        "setdefault" => {
            let mut values = args.into_positional(name, 1, 2)?;
            let default = if values.len() == 2 {
                values.pop().unwrap_or(Value::None)
            } else {
                Value::None
            };
            let key = hashable(values.remove(0))?;
            let existing = dict.borrow().get(&key).cloned();
            Ok(match existing {
                Some(value) => value,
                None => {
                    dict.borrow_mut().insert(key, default.clone());
                    default
                }
            })
        }
        "copy" => {
            args.into_positional(name, 0, 0)?;
            Ok(Value::dict(dict.borrow().clone()))
        }
        "clear" => {
            args.into_positional(name, 0, 0)?;
            dict.borrow_mut().clear();
            Ok(Value::None)
        }
        _ => Err(no_attribute(&Value::Dict(Rc::clone(dict)), name)),
    }
}

fn text_arg<'v>(value: &'v Value, func: &str) -> EvalResult<&'v str> {
    match value {
        Value::Str(text) => Ok(text),
        other => Err(EvalError::type_error(format!(
            "{func}() argument must be str, not {}",
            other.type_name()
        ))),
    }
}

fn optional_text<'v>(value: Option<&'v Value>, func: &str) -> EvalResult<Option<&'v str>> {
    match value {
        None | Some(Value::None) => Ok(None),
        Some(value) => text_arg(value, func).map(Some),
    }
}

fn char_offset(text: &str, byte_index: usize) -> i64 {
    i64::try_from(text[..byte_index].chars().count()).unwrap_or(i64::MAX)
}

fn str_method(text: &str, name: &str, mut args: Args) -> EvalResult<Value> {
    match name {
        "upper" => {
            args.into_positional(name, 0, 0)?;
            Ok(Value::str(text.to_uppercase()))
        }
        "lower" => {
            args.into_positional(name, 0, 0)?;
            Ok(Value::str(text.to_lowercase()))
        }
        "strip" | "lstrip" | "rstrip" => {
            let values = args.into_positional(name, 0, 1)?;
            let chars: Option<Vec<char>> =
                optional_text(values.first(), name)?.map(|chars| chars.chars().collect());
            let strip = |ch: char| match &chars {
                Some(set) => set.contains(&ch),
                None => ch.is_whitespace(),
            };
            let stripped = match name {
                "lstrip" => text.trim_start_matches(strip),
                "rstrip" => text.trim_end_matches(strip),
                _ => text.trim_matches(strip),
            };
            Ok(Value::str(stripped))
        }
        "split" => {
            let sep_keyword = args.take_keyword("sep");
            let maxsplit_keyword = args.take_keyword("maxsplit");
            let mut values = args.into_positional(name, 0, 2)?;
            let maxsplit = match values.len() {
                2 => values.pop(),
                _ => maxsplit_keyword,
            };
            let maxsplit = maxsplit.as_ref().map(as_integer).transpose()?.unwrap_or(-1);
            let sep = match values.pop() {
                Some(sep) => Some(sep),
                None => sep_keyword,
            };
            let parts = match optional_text(sep.as_ref(), name)? {
                None => split_whitespace(text, maxsplit),
                Some("") => return Err(EvalError::value_error("empty separator")),
                Some(sep) => match usize::try_from(maxsplit) {
                    Ok(limit) => text.splitn(limit.saturating_add(1), sep).map(Value::str).collect(),
                    Err(_) => text.split(sep).map(Value::str).collect(),
                },
            };
            Ok(Value::list(parts))
        }
        "join" => {
            let [iterable] = args.exactly::<1>(name)?;
            let mut pieces = Vec::new();
            for (position, item) in iterate(&iterable)?.iter().enumerate() {
                match item {
                    Value::Str(piece) => pieces.push(piece.clone()),
                    other => {
                        return Err(EvalError::type_error(format!(
                            "sequence item {position}: expected str instance, {} found",
                            other.type_name()
                        )));
                    }
                }
            }
            Ok(Value::str(pieces.join(text)))
        }
        "replace" => {
            let values = args.into_positional(name, 2, 3)?;
            let old = text_arg(&values[0], name)?;
            let new = text_arg(&values[1], name)?;
            let count = values.get(2).map(as_integer).transpose()?.unwrap_or(-1);
            Ok(Value::str(match usize::try_from(count) {
                Ok(count) => text.replacen(old, new, count),
                Err(_) => text.replace(old, new),
            }))
        }
        "startswith" | "endswith" => {
            let [affix] = args.exactly::<1>(name)?;
            let candidates: Vec<Value> = match &affix {
                Value::Str(_) => vec![affix.clone()],
                Value::Tuple(items) => items.as_ref().clone(),
                other => {
                    return Err(EvalError::type_error(format!(
                        "{name} first arg must be str or a tuple of str, not {}",
                        other.type_name()
                    )));
                }
            };
            for candidate in &candidates {
                let candidate = text_arg(candidate, name)?;
                let matched = if name == "startswith" {
                    text.starts_with(candidate)
                } else {
                    text.ends_with(candidate)
                };
                if matched {
                    return Ok(Value::Bool(true));
                }
            }
            Ok(Value::Bool(false))
        }
        "count" => {
            let [needle] = args.exactly::<1>(name)?;
            let needle = text_arg(&needle, name)?;
            let count = if needle.is_empty() {
                text.chars().count() + 1
            } else {
                text.matches(needle).count()
            };
            Ok(Value::Int(i64::try_from(count).unwrap_or(i64::MAX)))
        }
        "find" => {
            let [needle] = args.exactly::<1>(name)?;
            let needle = text_arg(&needle, name)?;
            Ok(Value::Int(
                text.find(needle)
                    .map_or(-1, |index| char_offset(text, index)),
            ))
        }
        "format" => {
            let values = args.into_positional(name, 0, usize::MAX)?;
            format_template(text, &values).map(Value::str)
        }
        _ => Err(no_attribute(&Value::str(text), name)),
    }
}

fn split_whitespace(text: &str, maxsplit: i64) -> Vec<Value> {
    let mut parts = Vec::new();
    let mut rest = text.trim_start();
    while !rest.is_empty() {
        if maxsplit >= 0 && i64::try_from(parts.len()).unwrap_or(i64::MAX) == maxsplit {
            parts.push(Value::str(rest));
            break;
        }
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        parts.push(Value::str(&rest[..end]));
        rest = rest[end..].trim_start();
    }
    parts
}

/// `str.format` with positional `{}` / `{n}` fields.
fn format_template(template: &str, args: &[Value]) -> EvalResult<String> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();
    let mut next_auto = 0;
    while let Some(ch) = chars.next() {
        match ch {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '{' => {
                let mut field = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(ch) => field.push(ch),
                        None => {
                            return Err(EvalError::value_error(
                                "Single '{' encountered in format string",
                            ));
                        }
                    }
                }
                if field.contains([':', '!']) {
                    return Err(EvalError::value_error(
                        "format specifications are not supported",
                    ));
                }
                let index = if field.is_empty() {
                    next_auto += 1;
                    next_auto - 1
                } else {
                    field
                        .parse::<usize>()
                        .map_err(|_| EvalError::new(ErrorKind::KeyError, repr_str(&field)))?
                };
                let value = args.get(index).ok_or_else(|| {
                    EvalError::new(
                        ErrorKind::IndexError,
                        format!("Replacement index {index} out of range for positional args tuple"),
                    )
                })?;
                out.push_str(&value.to_string());
            }
            '}' => {
                return Err(EvalError::value_error(
                    "Single '}' encountered in format string",
                ));
            }
            other => out.push(other),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::workspace::Workspace;
    use crate::interp;

    fn shown(ws: &mut Workspace, src: &str) -> String {
        interp::eval(src, ws, &mut std::io::sink())
            .expect("evaluates")
            .repr()
    }

    fn run(ws: &mut Workspace, src: &str) {
        interp::exec(src, ws, &mut std::io::sink()).expect("executes");
    }

    #[test]
    fn list_methods_mutate_in_place() {
        let mut ws = Workspace::new();
        run(&mut ws, "x = [3, 1]");
        run(&mut ws, "x.append(2)");
        run(&mut ws, "x.insert(0, 9)");
        assert_eq!(shown(&mut ws, "x"), "[9, 3, 1, 2]");
        assert_eq!(shown(&mut ws, "x.pop()"), "2");
        run(&mut ws, "x.sort()");
        assert_eq!(shown(&mut ws, "x"), "[1, 3, 9]");
        assert_eq!(shown(&mut ws, "x.index(9)"), "2");
        run(&mut ws, "x.extend(x)");
        assert_eq!(shown(&mut ws, "x.count(1)"), "2");
    }

    #[test]
    fn list_method_errors() {
        let mut ws = Workspace::new();
        let err = interp::eval("[].pop()", &mut ws, &mut std::io::sink()).expect_err("empty");
        assert_eq!(err.to_string(), "pop from empty list");
        let err = interp::eval("[1].index(2)", &mut ws, &mut std::io::sink()).expect_err("absent");
        assert_eq!(err.to_string(), "2 is not in list");
    }

    #[test]
    fn dict_methods() {
        let mut ws = Workspace::new();
        run(&mut ws, "d = {'a': 1}");
        run(&mut ws, "d.update({'b': 2}, c=3)");
        assert_eq!(shown(&mut ws, "d.keys()"), "['a', 'b', 'c']");
        assert_eq!(shown(&mut ws, "d.get('z', 0)"), "0");
        assert_eq!(shown(&mut ws, "d.pop('a')"), "1");
        assert_eq!(shown(&mut ws, "d.items()"), "[('b', 2), ('c', 3)]");
        run(&mut ws, "d.update(d)");
        assert_eq!(shown(&mut ws, "len(d)"), "2");
    }

    #[test]
    fn string_methods() {
        let mut ws = Workspace::new();
        assert_eq!(shown(&mut ws, "'  hi  '.strip()"), "'hi'");
        assert_eq!(shown(&mut ws, "'a b  c'.split()"), "['a', 'b', 'c']");
        assert_eq!(shown(&mut ws, "'a,b,c'.split(',', 1)"), "['a', 'b,c']");
        assert_eq!(shown(&mut ws, "'-'.join(['x', 'y'])"), "'x-y'");
        assert_eq!(shown(&mut ws, "'aaa'.replace('a', 'b', 2)"), "'bba'");
        assert_eq!(shown(&mut ws, "'hello'.startswith(('x', 'he'))"), "True");
        assert_eq!(shown(&mut ws, "'héllo'.find('l')"), "2");
        assert_eq!(shown(&mut ws, "'{} + {}'.format(1, 2)"), "'1 + 2'");
        assert_eq!(shown(&mut ws, "'{1}{0}'.format('a', 'b')"), "'ba'");
        assert_eq!(shown(&mut ws, "'x'.upper()"), "'X'");
    }

    #[test]
    fn unknown_method_is_an_attribute_error() {
        let mut ws = Workspace::new();
        let err = interp::eval("'x'.nope", &mut ws, &mut std::io::sink()).expect_err("attr");
        assert_eq!(err.kind(), Some(ErrorKind::AttributeError));
        assert_eq!(err.to_string(), "'str' object has no attribute 'nope'");
    }
}
