//! Embedded interpreter for the single-line expression and statement subset
//! learners type at the prompt.
//!
//! Submissions are parsed into [`ast`] nodes and walked by [`eval::Machine`]
//! against a [`Workspace`]. Anything `print` writes goes to the caller's sink,
//! which is how output-capturing checks observe side effects.

pub mod ast;
pub mod builtins;
pub mod error;
pub mod eval;
pub mod lexer;
pub mod methods;
pub mod modules;
pub mod ops;
pub mod parser;
pub mod value;

use std::io::Write;

use crate::core::workspace::Workspace;

pub use error::{ErrorKind, EvalError, EvalResult};
pub use parser::{parse_expression, parse_statement};
pub use value::Value;

use builtins::Args;
use eval::Machine;

/// Evaluate `src` as an expression.
pub fn eval(src: &str, workspace: &mut Workspace, out: &mut dyn Write) -> EvalResult<Value> {
    let expr = parse_expression(src)?;
    Machine::new(workspace, out).evaluate(&expr)
}

/// Execute `src` as a statement; assignments land in `workspace`.
pub fn exec(src: &str, workspace: &mut Workspace, out: &mut dyn Write) -> EvalResult<()> {
    let stmt = parse_statement(src)?;
    Machine::new(workspace, out).exec_stmt(&stmt)
}

pub fn call(
    callable: &Value,
    args: Vec<Value>,
    workspace: &mut Workspace,
    out: &mut dyn Write,
) -> EvalResult<Value> {
    Machine::new(workspace, out).call_value(callable, Args::positional(args))
}
