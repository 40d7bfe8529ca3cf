//! Tree-walking evaluator over a [`Workspace`].

use std::collections::BTreeMap;
use std::io::Write;
use std::rc::Rc;

use crate::core::workspace::Workspace;
use crate::interp::ast::{BinOp, BoolOp, CmpOp, Expr, Index, Stmt, Target};
use crate::interp::builtins::{self, Args};
use crate::interp::error::{ErrorKind, EvalError, EvalResult};
use crate::interp::methods;
use crate::interp::ops::{self, MAX_SEQUENCE_LEN};
use crate::interp::value::{BoundMethod, Dict, ExceptionValue, Lambda, RangeValue, Value};

/// Lambda parameters and comprehension variables in scope.
pub type Locals = Rc<BTreeMap<String, Value>>;

const MAX_DEPTH: usize = 200;

type SliceBounds = (Option<i64>, Option<i64>, Option<i64>);

/// Evaluation state for a single `eval`/`exec`/`call`.
///
/// Globals live in the learner's [`Workspace`]; `print` writes to `out`.
pub struct Machine<'a> {
    globals: &'a mut Workspace,
    out: &'a mut dyn Write,
    depth: usize,
}

impl<'a> Machine<'a> {
    pub fn new(globals: &'a mut Workspace, out: &'a mut dyn Write) -> Self {
        Self {
            globals,
            out,
            depth: 0,
        }
    }

    pub fn workspace(&self) -> &Workspace {
        self.globals
    }

    pub fn write_text(&mut self, text: &str) -> EvalResult<()> {
        self.out.write_all(text.as_bytes()).map_err(|err| {
            EvalError::new(ErrorKind::RuntimeError, format!("output failed: {err}"))
        })
    }

    /// Evaluate a top-level expression with no locals.
    pub fn evaluate(&mut self, expr: &Expr) -> EvalResult<Value> {
        self.eval_expr(expr, &Locals::default())
    }

    pub fn eval_expr(&mut self, expr: &Expr, locals: &Locals) -> EvalResult<Value> {
        if self.depth >= MAX_DEPTH {
            return Err(EvalError::new(
                ErrorKind::RecursionError,
                "maximum recursion depth exceeded",
            ));
        }
        self.depth += 1;
        let result = self.eval_inner(expr, locals);
        self.depth -= 1;
        result
    }

    fn eval_inner(&mut self, expr: &Expr, locals: &Locals) -> EvalResult<Value> {
        match expr {
            Expr::Const(value) => Ok(value.clone()),
            Expr::Name(name) => self.load(name, locals),
            Expr::Tuple(items) => Ok(Value::tuple(self.eval_all(items, locals)?)),
            Expr::List(items) => Ok(Value::list(self.eval_all(items, locals)?)),
            Expr::Dict(pairs) => {
                let mut dict = Dict::new();
                for (key, value) in pairs {
                    let key = hashable(self.eval_expr(key, locals)?)?;
                    let value = self.eval_expr(value, locals)?;
                    dict.insert(key, value);
                }
                Ok(Value::dict(dict))
            }
            Expr::ListComp {
                element,
                target,
                iter,
                conditions,
            } => self.comprehension(element, target, iter, conditions, locals),
            Expr::Unary { op, operand } => {
                let operand = self.eval_expr(operand, locals)?;
                ops::unary(*op, &operand)
            }
            Expr::Binary { op, left, right } => {
                let left = self.eval_expr(left, locals)?;
                let right = self.eval_expr(right, locals)?;
                ops::binary(*op, &left, &right)
            }
            Expr::Bool { op, left, right } => {
                let left = self.eval_expr(left, locals)?;
                let decided = match op {
                    BoolOp::And => !left.truthy(),
                    BoolOp::Or => left.truthy(),
                };
                if decided {
                    Ok(left)
                } else {
                    self.eval_expr(right, locals)
                }
            }
            Expr::Compare { first, rest } => {
                let mut left = self.eval_expr(first, locals)?;
                for (op, expr) in rest {
                    let right = self.eval_expr(expr, locals)?;
                    if !compare_values(*op, &left, &right)? {
                        return Ok(Value::Bool(false));
                    }
                    left = right;
                }
                Ok(Value::Bool(true))
            }
            Expr::IfElse {
                condition,
                then,
                otherwise,
            } => {
                if self.eval_expr(condition, locals)?.truthy() {
                    self.eval_expr(then, locals)
                } else {
                    self.eval_expr(otherwise, locals)
                }
            }
            Expr::Lambda { params, body } => Ok(Value::Function(Rc::new(Lambda {
                params: params.clone(),
                body: Rc::clone(body),
                captured: Rc::clone(locals),
            }))),
            Expr::Call {
                func,
                args,
                keywords,
            } => {
                let func = self.eval_expr(func, locals)?;
                let positional = self.eval_all(args, locals)?;
                let keywords = keywords
                    .iter()
                    .map(|(name, expr)| Ok((name.clone(), self.eval_expr(expr, locals)?)))
                    .collect::<EvalResult<Vec<_>>>()?;
                self.call_value(&func, Args::new(positional, keywords))
            }
            Expr::Attribute { object, name } => {
                let object = self.eval_expr(object, locals)?;
                attribute(object, name)
            }
            Expr::Subscript { object, index } => {
                let object = self.eval_expr(object, locals)?;
                match index.as_ref() {
                    Index::Single(key) => {
                        let key = self.eval_expr(key, locals)?;
                        get_item(&object, &key)
                    }
                    Index::Slice { lower, upper, step } => {
                        let bounds = self.slice_bounds(lower, upper, step, locals)?;
                        get_slice(&object, bounds)
                    }
                }
            }
        }
    }

    fn eval_all(&mut self, exprs: &[Expr], locals: &Locals) -> EvalResult<Vec<Value>> {
        exprs
            .iter()
            .map(|expr| self.eval_expr(expr, locals))
            .collect()
    }

    fn load(&self, name: &str, locals: &Locals) -> EvalResult<Value> {
        locals
            .get(name)
            .or_else(|| self.globals.lookup(name))
            .cloned()
            .or_else(|| builtins::lookup(name))
            .ok_or_else(|| EvalError::name_error(name))
    }

    fn comprehension(
        &mut self,
        element: &Expr,
        target: &str,
        iter: &Expr,
        conditions: &[Expr],
        locals: &Locals,
    ) -> EvalResult<Value> {
        let source = self.eval_expr(iter, locals)?;
        let mut results = Vec::new();
        let mut frame = Rc::clone(locals);
        'items: for item in iterate(&source)? {
            Rc::make_mut(&mut frame).insert(target.to_string(), item);
            for condition in conditions {
                if !self.eval_expr(condition, &frame)?.truthy() {
                    continue 'items;
                }
            }
            results.push(self.eval_expr(element, &frame)?);
        }
        Ok(Value::list(results))
    }

    fn slice_bounds(
        &mut self,
        lower: &Option<Expr>,
        upper: &Option<Expr>,
        step: &Option<Expr>,
        locals: &Locals,
    ) -> EvalResult<SliceBounds> {
        let mut bound = |expr: &Option<Expr>| -> EvalResult<Option<i64>> {
            let Some(expr) = expr else {
                return Ok(None);
            };
            match self.eval_expr(expr, locals)? {
                Value::None => Ok(None),
                value => value.as_int().map(Some).ok_or_else(|| {
                    EvalError::type_error("slice indices must be integers or None")
                }),
            }
        };
        Ok((bound(lower)?, bound(upper)?, bound(step)?))
    }

    pub fn exec_stmt(&mut self, stmt: &Stmt) -> EvalResult<()> {
        let locals = Locals::default();
        match stmt {
            Stmt::Expr(expr) => {
                self.eval_expr(expr, &locals)?;
            }
            Stmt::Assign { targets, value } => {
                let value = self.eval_expr(value, &locals)?;
                for target in targets {
                    self.assign(target, value.clone(), &locals)?;
                }
            }
            Stmt::AugAssign { target, op, value } => {
                self.augmented(target, *op, value, &locals)?;
            }
            Stmt::Delete(targets) => {
                for target in targets {
                    self.delete(target, &locals)?;
                }
            }
            Stmt::Pass => {}
            Stmt::Assert { test, message } => {
                if !self.eval_expr(test, &locals)?.truthy() {
                    let message = match message {
                        Some(message) => self.eval_expr(message, &locals)?.to_string(),
                        None => String::new(),
                    };
                    return Err(EvalError::new(ErrorKind::AssertionError, message));
                }
            }
            Stmt::Raise(expr) => return Err(self.raised(expr.as_ref(), &locals)),
        }
        Ok(())
    }

    fn raised(&mut self, expr: Option<&Expr>, locals: &Locals) -> EvalError {
        let Some(expr) = expr else {
            return EvalError::new(ErrorKind::RuntimeError, "No active exception to reraise");
        };
        match self.eval_expr(expr, locals) {
            Err(err) => err,
            Ok(Value::ExceptionType(kind)) => EvalError::new(kind, ""),
            Ok(Value::Exception(exception)) => {
                EvalError::new(exception.kind, exception.message.clone())
            }
            Ok(_) => EvalError::type_error("exceptions must derive from BaseException"),
        }
    }

    fn assign(&mut self, target: &Target, value: Value, locals: &Locals) -> EvalResult<()> {
        match target {
            Target::Name(name) => {
                self.globals.define(name.clone(), value);
                Ok(())
            }
            Target::Subscript { object, index } => {
                let container = self.eval_expr(object, locals)?;
                match index {
                    Index::Single(key) => {
                        let key = self.eval_expr(key, locals)?;
                        set_item(&container, key, value)
                    }
                    Index::Slice { lower, upper, step } => {
                        let bounds = self.slice_bounds(lower, upper, step, locals)?;
                        set_slice(&container, bounds, iterate(&value)?)
                    }
                }
            }
            Target::Tuple(targets) => {
                let items = match &value {
                    Value::List(_) | Value::Tuple(_) | Value::Str(_) | Value::Dict(_)
                    | Value::Range(_) => iterate(&value)?,
                    other => {
                        return Err(EvalError::type_error(format!(
                            "cannot unpack non-iterable {} object",
                            other.type_name()
                        )));
                    }
                };
                if items.len() < targets.len() {
                    return Err(EvalError::value_error(format!(
                        "not enough values to unpack (expected {}, got {})",
                        targets.len(),
                        items.len()
                    )));
                }
                if items.len() > targets.len() {
                    return Err(EvalError::value_error(format!(
                        "too many values to unpack (expected {})",
                        targets.len()
                    )));
                }
                for (target, item) in targets.iter().zip(items) {
                    self.assign(target, item, locals)?;
                }
                Ok(())
            }
        }
    }

    fn augmented(
        &mut self,
        target: &Target,
        op: BinOp,
        value: &Expr,
        locals: &Locals,
    ) -> EvalResult<()> {
        match target {
            Target::Name(name) => {
                let current = self.load(name, locals)?;
                let operand = self.eval_expr(value, locals)?;
                let updated = in_place(op, current, &operand)?;
                self.globals.define(name.clone(), updated);
                Ok(())
            }
            Target::Subscript { object, index } => {
                let container = self.eval_expr(object, locals)?;
                match index {
                    Index::Single(key) => {
                        let key = self.eval_expr(key, locals)?;
                        let current = get_item(&container, &key)?;
                        let operand = self.eval_expr(value, locals)?;
                        set_item(&container, key, in_place(op, current, &operand)?)
                    }
                    Index::Slice { lower, upper, step } => {
                        let bounds = self.slice_bounds(lower, upper, step, locals)?;
                        let current = get_slice(&container, bounds)?;
                        let operand = self.eval_expr(value, locals)?;
                        let updated = in_place(op, current, &operand)?;
                        set_slice(&container, bounds, iterate(&updated)?)
                    }
                }
            }
            Target::Tuple(_) => Err(EvalError::syntax(
                "'tuple' is an illegal expression for augmented assignment",
            )),
        }
    }

    fn delete(&mut self, target: &Target, locals: &Locals) -> EvalResult<()> {
        match target {
            Target::Name(name) => self
                .globals
                .remove(name)
                .map(|_| ())
                .ok_or_else(|| EvalError::name_error(name)),
            Target::Tuple(targets) => {
                for target in targets {
                    self.delete(target, locals)?;
                }
                Ok(())
            }
            Target::Subscript { object, index } => {
                let container = self.eval_expr(object, locals)?;
                match index {
                    Index::Single(key) => {
                        let key = self.eval_expr(key, locals)?;
                        delete_item(&container, &key)
                    }
                    Index::Slice { lower, upper, step } => {
                        let bounds = self.slice_bounds(lower, upper, step, locals)?;
                        delete_slice(&container, bounds)
                    }
                }
            }
        }
    }

    /// Invoke any callable value.
    pub fn call_value(&mut self, func: &Value, args: Args) -> EvalResult<Value> {
        match func {
            Value::Function(lambda) => self.call_lambda(lambda, args),
            Value::Builtin(builtin) => (builtin.func)(self, args),
            Value::Method(method) => methods::call(self, &method.receiver, method.name, args),
            Value::ExceptionType(kind) => {
                args.reject_keywords(kind.name())?;
                let message = match args.positional.as_slice() {
                    [] => String::new(),
                    [single] => single.to_string(),
                    many => Value::tuple(many.to_vec()).to_string(),
                };
                Ok(Value::Exception(Rc::new(ExceptionValue {
                    kind: *kind,
                    message,
                })))
            }
            other => Err(EvalError::type_error(format!(
                "'{}' object is not callable",
                other.type_name()
            ))),
        }
    }

    fn call_lambda(&mut self, lambda: &Lambda, args: Args) -> EvalResult<Value> {
        let Args {
            positional,
            keywords,
        } = args;
        let expected = lambda.params.len();
        if positional.len() > expected {
            let given = positional.len();
            return Err(EvalError::type_error(format!(
                "<lambda>() takes {expected} positional argument{} but {given} {} given",
                if expected == 1 { "" } else { "s" },
                if given == 1 { "was" } else { "were" },
            )));
        }
        let mut bound: Vec<Option<Value>> = vec![None; expected];
        for (slot, value) in bound.iter_mut().zip(positional) {
            *slot = Some(value);
        }
        for (name, value) in keywords {
            let Some(position) = lambda.params.iter().position(|param| *param == name) else {
                return Err(EvalError::type_error(format!(
                    "<lambda>() got an unexpected keyword argument '{name}'"
                )));
            };
            if bound[position].is_some() {
                return Err(EvalError::type_error(format!(
                    "<lambda>() got multiple values for argument '{name}'"
                )));
            }
            bound[position] = Some(value);
        }
        let missing: Vec<String> = lambda
            .params
            .iter()
            .zip(&bound)
            .filter(|(_, value)| value.is_none())
            .map(|(param, _)| format!("'{param}'"))
            .collect();
        if !missing.is_empty() {
            return Err(EvalError::type_error(format!(
                "<lambda>() missing {} required positional argument{}: {}",
                missing.len(),
                if missing.len() == 1 { "" } else { "s" },
                join_names(&missing)
            )));
        }
        let mut scope = (*lambda.captured).clone();
        for (param, value) in lambda.params.iter().zip(bound) {
            if let Some(value) = value {
                scope.insert(param.clone(), value);
            }
        }
        self.eval_expr(&lambda.body, &Rc::new(scope))
    }
}

fn join_names(names: &[String]) -> String {
    match names {
        [] => String::new(),
        [only] => only.clone(),
        [first, second] => format!("{first} and {second}"),
        [init @ .., last] => format!("{}, and {last}", init.join(", ")),
    }
}

fn compare_values(op: CmpOp, left: &Value, right: &Value) -> EvalResult<bool> {
    Ok(match op {
        CmpOp::Eq => left == right,
        CmpOp::NotEq => left != right,
        CmpOp::Lt | CmpOp::LtE | CmpOp::Gt | CmpOp::GtE => ops::ordering(op, left, right)?,
        CmpOp::In => ops::contains(right, left)?,
        CmpOp::NotIn => !ops::contains(right, left)?,
        CmpOp::Is => ops::identical(left, right),
        CmpOp::IsNot => !ops::identical(left, right),
    })
}

/// `+=` extends a list in place; everything else rebinds.
fn in_place(op: BinOp, current: Value, operand: &Value) -> EvalResult<Value> {
    if let (BinOp::Add, Value::List(items)) = (op, &current) {
        let extra = iterate(operand)?;
        items.borrow_mut().extend(extra);
        return Ok(current);
    }
    ops::binary(op, &current, operand)
}

fn attribute(object: Value, name: &str) -> EvalResult<Value> {
    if let Value::Module(namespace) = &object {
        return namespace.member(name).ok_or_else(|| {
            EvalError::new(
                ErrorKind::AttributeError,
                format!("module '{}' has no attribute '{name}'", namespace.name),
            )
        });
    }
    match methods::resolve(&object, name) {
        Some(method) => Ok(Value::Method(Rc::new(BoundMethod {
            receiver: object,
            name: method,
        }))),
        None => Err(EvalError::new(
            ErrorKind::AttributeError,
            format!("'{}' object has no attribute '{name}'", object.type_name()),
        )),
    }
}

/// Materialise an iterable into its elements.
pub fn iterate(value: &Value) -> EvalResult<Vec<Value>> {
    match value {
        Value::List(items) => Ok(items.borrow().clone()),
        Value::Tuple(items) => Ok(items.as_ref().clone()),
        Value::Str(text) => Ok(text.chars().map(|ch| Value::Str(ch.to_string())).collect()),
        Value::Dict(dict) => Ok(dict.borrow().keys()),
        Value::Range(range) => {
            if range.len() > MAX_SEQUENCE_LEN {
                return Err(EvalError::new(
                    ErrorKind::MemoryError,
                    "range too large to materialise",
                ));
            }
            Ok((0..range.len())
                .filter_map(|index| range.get(index))
                .map(Value::Int)
                .collect())
        }
        other => Err(EvalError::type_error(format!(
            "'{}' object is not iterable",
            other.type_name()
        ))),
    }
}

/// Reject values that cannot be dict keys.
pub fn hashable(key: Value) -> EvalResult<Value> {
    if key.is_hashable() {
        Ok(key)
    } else {
        Err(EvalError::type_error(format!(
            "unhashable type: '{}'",
            key.type_name()
        )))
    }
}

/// Resolve a possibly negative index against `len`.
pub fn normalize_index(index: i64, len: usize) -> Option<usize> {
    let len = i64::try_from(len).ok()?;
    let adjusted = if index < 0 { index + len } else { index };
    if (0..len).contains(&adjusted) {
        usize::try_from(adjusted).ok()
    } else {
        None
    }
}

fn position(key: &Value, len: usize, what: &str) -> EvalResult<Option<usize>> {
    let index = key.as_int().ok_or_else(|| {
        EvalError::type_error(format!(
            "{what} indices must be integers or slices, not {}",
            key.type_name()
        ))
    })?;
    Ok(normalize_index(index, len))
}

fn index_error(message: &str) -> EvalError {
    EvalError::new(ErrorKind::IndexError, message)
}

fn key_error(key: &Value) -> EvalError {
    EvalError::new(ErrorKind::KeyError, key.repr())
}

fn get_item(container: &Value, key: &Value) -> EvalResult<Value> {
    match container {
        Value::List(items) => {
            let items = items.borrow();
            position(key, items.len(), "list")?
                .map(|index| items[index].clone())
                .ok_or_else(|| index_error("list index out of range"))
        }
        Value::Tuple(items) => position(key, items.len(), "tuple")?
            .map(|index| items[index].clone())
            .ok_or_else(|| index_error("tuple index out of range")),
        Value::Str(text) => {
            let chars: Vec<char> = text.chars().collect();
            position(key, chars.len(), "string")?
                .map(|index| Value::Str(chars[index].to_string()))
                .ok_or_else(|| index_error("string index out of range"))
        }
        Value::Range(range) => position(key, range.len(), "range")?
            .and_then(|index| range.get(index))
            .map(Value::Int)
            .ok_or_else(|| index_error("range object index out of range")),
        Value::Dict(dict) => {
            let key = hashable(key.clone())?;
            dict.borrow()
                .get(&key)
                .cloned()
                .ok_or_else(|| key_error(&key))
        }
        other => Err(EvalError::type_error(format!(
            "'{}' object is not subscriptable",
            other.type_name()
        ))),
    }
}

fn set_item(container: &Value, key: Value, value: Value) -> EvalResult<()> {
    match container {
        Value::List(items) => {
            let mut items = items.borrow_mut();
            let index = position(&key, items.len(), "list")?
                .ok_or_else(|| index_error("list assignment index out of range"))?;
            items[index] = value;
            Ok(())
        }
        Value::Dict(dict) => {
            let key = hashable(key)?;
            dict.borrow_mut().insert(key, value);
            Ok(())
        }
        other => Err(EvalError::type_error(format!(
            "'{}' object does not support item assignment",
            other.type_name()
        ))),
    }
}

fn delete_item(container: &Value, key: &Value) -> EvalResult<()> {
    match container {
        Value::List(items) => {
            let mut items = items.borrow_mut();
            let index = position(key, items.len(), "list")?
                .ok_or_else(|| index_error("list assignment index out of range"))?;
            items.remove(index);
            Ok(())
        }
        Value::Dict(dict) => {
            let key = hashable(key.clone())?;
            dict.borrow_mut()
                .remove(&key)
                .map(|_| ())
                .ok_or_else(|| key_error(&key))
        }
        other => Err(EvalError::type_error(format!(
            "'{}' object doesn't support item deletion",
            other.type_name()
        ))),
    }
}

/// Clamp slice bounds the way sequences do, yielding `(start, stop, step)`.
fn adjust_slice(len: usize, (lower, upper, step): SliceBounds) -> EvalResult<(i64, i64, i64)> {
    let step = step.unwrap_or(1);
    if step == 0 {
        return Err(EvalError::value_error("slice step cannot be zero"));
    }
    let len = i64::try_from(len).map_err(|_| EvalError::overflow())?;
    let clamp = |bound: i64| {
        if bound < 0 {
            let shifted = bound + len;
            if shifted < 0 {
                if step < 0 { -1 } else { 0 }
            } else {
                shifted
            }
        } else if bound >= len {
            if step < 0 { len - 1 } else { len }
        } else {
            bound
        }
    };
    let (default_start, default_stop) = if step < 0 { (len - 1, -1) } else { (0, len) };
    let start = lower.map_or(default_start, clamp);
    let stop = upper.map_or(default_stop, clamp);
    Ok((start, stop, step))
}

fn slice_positions(len: usize, bounds: SliceBounds) -> EvalResult<Vec<usize>> {
    let (start, stop, step) = adjust_slice(len, bounds)?;
    let mut positions = Vec::new();
    let mut index = start;
    while (step > 0 && index < stop) || (step < 0 && index > stop) {
        if let Ok(position) = usize::try_from(index) {
            positions.push(position);
        }
        index += step;
    }
    Ok(positions)
}

fn get_slice(container: &Value, bounds: SliceBounds) -> EvalResult<Value> {
    match container {
        Value::List(items) => {
            let items = items.borrow();
            let positions = slice_positions(items.len(), bounds)?;
            Ok(Value::list(
                positions.into_iter().map(|index| items[index].clone()).collect(),
            ))
        }
        Value::Tuple(items) => {
            let positions = slice_positions(items.len(), bounds)?;
            Ok(Value::tuple(
                positions.into_iter().map(|index| items[index].clone()).collect(),
            ))
        }
        Value::Str(text) => {
            let chars: Vec<char> = text.chars().collect();
            let positions = slice_positions(chars.len(), bounds)?;
            Ok(Value::Str(
                positions.into_iter().map(|index| chars[index]).collect(),
            ))
        }
        Value::Range(range) => {
            let (start, stop, step) = adjust_slice(range.len(), bounds)?;
            let rescale = |offset: i64| {
                offset
                    .checked_mul(range.step)
                    .and_then(|scaled| scaled.checked_add(range.start))
            };
            match (rescale(start), rescale(stop), range.step.checked_mul(step)) {
                (Some(start), Some(stop), Some(step)) => {
                    Ok(Value::Range(RangeValue {
                        start,
                        stop,
                        step,
                    }))
                }
                _ => Err(EvalError::overflow()),
            }
        }
        other => Err(EvalError::type_error(format!(
            "'{}' object is not subscriptable",
            other.type_name()
        ))),
    }
}

fn set_slice(container: &Value, bounds: SliceBounds, replacement: Vec<Value>) -> EvalResult<()> {
    let Value::List(items) = container else {
        return Err(EvalError::type_error(format!(
            "'{}' object does not support item assignment",
            container.type_name()
        )));
    };
    let mut items = items.borrow_mut();
    let (start, stop, step) = adjust_slice(items.len(), bounds)?;
    if step == 1 {
        let start = usize::try_from(start).unwrap_or(0);
        let stop = usize::try_from(stop).unwrap_or(0).max(start);
        items.splice(start..stop, replacement);
        return Ok(());
    }
    let positions = slice_positions(items.len(), bounds)?;
    if positions.len() != replacement.len() {
        return Err(EvalError::value_error(format!(
            "attempt to assign sequence of size {} to extended slice of size {}",
            replacement.len(),
            positions.len()
        )));
    }
    for (index, value) in positions.into_iter().zip(replacement) {
        items[index] = value;
    }
    Ok(())
}

fn delete_slice(container: &Value, bounds: SliceBounds) -> EvalResult<()> {
    let Value::List(items) = container else {
        return Err(EvalError::type_error(format!(
            "'{}' object doesn't support item deletion",
            container.type_name()
        )));
    };
    let mut items = items.borrow_mut();
    let mut positions = slice_positions(items.len(), bounds)?;
    positions.sort_unstable();
    for index in positions.into_iter().rev() {
        items.remove(index);
    }
    Ok(())
}
