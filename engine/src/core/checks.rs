//! The six goal verification strategies.
//!
//! Every strategy is total: parse and evaluation failures inside a check are
//! logged at `debug` and reported as [`CheckOutcome::Unsatisfied`], never
//! propagated.

use std::io;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::core::workspace::Workspace;
use crate::interp::{self, EvalError, EvalResult, Value};

/// Operator symbols whose presence [`distinct_operator_tally`] looks for.
pub const TRACKED_OPERATORS: [&str; 7] = ["+", "-", "*", "/", "//", "%", "**"];

static LEADING_NAMESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\p{Alphabetic}+)\.").unwrap());

/// A check setting that is either known up front or computed from the
/// workspace when its goal starts.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolvable {
    Fixed(Value),
    /// Expression evaluated once against the workspace at goal start.
    Deferred(String),
}

impl Resolvable {
    pub fn is_deferred(&self) -> bool {
        matches!(self, Resolvable::Deferred(_))
    }

    pub fn resolve(&self, workspace: &mut Workspace) -> EvalResult<Resolvable> {
        match self {
            Resolvable::Fixed(value) => Ok(Resolvable::Fixed(value.clone())),
            Resolvable::Deferred(text) => {
                interp::eval(text, workspace, &mut io::sink()).map(Resolvable::Fixed)
            }
        }
    }

    fn fixed(&self) -> Option<&Value> {
        match self {
            Resolvable::Fixed(value) => Some(value),
            Resolvable::Deferred(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CheckOutcome {
    /// Carries the marker a goal publishes under its metavar.
    Satisfied(Value),
    Unsatisfied,
}

impl CheckOutcome {
    pub fn is_satisfied(&self) -> bool {
        matches!(self, CheckOutcome::Satisfied(_))
    }

    pub fn into_marker(self) -> Option<Value> {
        match self {
            CheckOutcome::Satisfied(marker) => Some(marker),
            CheckOutcome::Unsatisfied => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Check {
    /// A named variable exists and/or some variable holds a value.
    ExistenceOrValue {
        name: Option<Resolvable>,
        value: Option<Resolvable>,
    },
    /// Evaluating the submission prints exactly `expected` (trimmed).
    CapturedOutput { expected: String },
    /// The submission evaluates to `expected`.
    ValueEquality { expected: Value },
    /// The submission evaluates to a callable mapping `argument` to `result`.
    CallableBehavior { argument: Value, result: Value },
    /// Executing the submission raises.
    ExceptionForcing,
    /// The submission evaluates to `result` using `operators` distinct
    /// operator symbols.
    OperatorCount { operators: usize, result: Value },
}

impl Check {
    pub fn kind(&self) -> &'static str {
        match self {
            Check::ExistenceOrValue { .. } => "existence_or_value",
            Check::CapturedOutput { .. } => "captured_output",
            Check::ValueEquality { .. } => "value_equality",
            Check::CallableBehavior { .. } => "callable_behavior",
            Check::ExceptionForcing => "exception_forcing",
            Check::OperatorCount { .. } => "operator_count",
        }
    }

    pub fn has_deferred(&self) -> bool {
        match self {
            Check::ExistenceOrValue { name, value } => [name, value]
                .into_iter()
                .flatten()
                .any(Resolvable::is_deferred),
            _ => false,
        }
    }

    /// Copy of this check with every deferred setting evaluated.
    pub fn resolved(&self, workspace: &mut Workspace) -> EvalResult<Check> {
        match self {
            Check::ExistenceOrValue { name, value } => {
                let name = name
                    .as_ref()
                    .map(|name| name.resolve(workspace))
                    .transpose()?;
                if let Some(Resolvable::Fixed(resolved)) = &name
                    && !matches!(resolved, Value::Str(_))
                {
                    return Err(EvalError::type_error(format!(
                        "variable name must resolve to a str, not {}",
                        resolved.type_name()
                    )));
                }
                let value = value
                    .as_ref()
                    .map(|value| value.resolve(workspace))
                    .transpose()?;
                Ok(Check::ExistenceOrValue { name, value })
            }
            other => Ok(other.clone()),
        }
    }

    /// Judge `submission` against the workspace.
    ///
    /// `namespaces` is the safelist [`Check::ValueEquality`] may inject.
    pub fn check(
        &self,
        workspace: &mut Workspace,
        submission: &str,
        namespaces: &[String],
    ) -> CheckOutcome {
        let outcome = self.judge(workspace, submission, namespaces);
        debug!(
            check = self.kind(),
            satisfied = outcome.is_satisfied(),
            "check result"
        );
        outcome
    }

    fn judge(
        &self,
        workspace: &mut Workspace,
        submission: &str,
        namespaces: &[String],
    ) -> CheckOutcome {
        match self {
            Check::ExistenceOrValue { name, value } => existence_or_value(workspace, name, value),
            Check::CapturedOutput { expected } => {
                let mut captured = Vec::new();
                if let Err(err) = interp::eval(submission, workspace, &mut captured) {
                    return failed(self, &err);
                }
                let captured = String::from_utf8_lossy(&captured);
                satisfied_if(captured.trim() == expected.as_str())
            }
            Check::ValueEquality { expected } => {
                if let Some(namespace) = leading_namespace(submission)
                    && namespaces.iter().any(|allowed| allowed == namespace)
                {
                    workspace.inject_namespace(namespace);
                }
                match interp::eval(submission, workspace, &mut io::sink()) {
                    Ok(result) => satisfied_if(result == *expected),
                    Err(err) => failed(self, &err),
                }
            }
            Check::CallableBehavior { argument, result } => {
                let callable = match interp::eval(submission, workspace, &mut io::sink()) {
                    Ok(callable) => callable,
                    Err(err) => return failed(self, &err),
                };
                let argument = vec![argument.deep_copy()];
                match interp::call(&callable, argument, workspace, &mut io::sink()) {
                    Ok(returned) => satisfied_if(returned == *result),
                    Err(err) => failed(self, &err),
                }
            }
            Check::ExceptionForcing => {
                let mut scratch = workspace.detached();
                match interp::exec(submission, &mut scratch, &mut io::sink()) {
                    Ok(()) => CheckOutcome::Unsatisfied,
                    Err(err) => {
                        debug!(error = %err, "submission raised as requested");
                        CheckOutcome::Satisfied(Value::Bool(true))
                    }
                }
            }
            Check::OperatorCount { operators, result } => {
                match interp::eval(submission, workspace, &mut io::sink()) {
                    Ok(value) if value == *result => {
                        satisfied_if(distinct_operator_tally(submission) == *operators)
                    }
                    Ok(_) => CheckOutcome::Unsatisfied,
                    Err(err) => failed(self, &err),
                }
            }
        }
    }
}

fn satisfied_if(condition: bool) -> CheckOutcome {
    if condition {
        CheckOutcome::Satisfied(Value::Bool(true))
    } else {
        CheckOutcome::Unsatisfied
    }
}

fn failed(check: &Check, err: &EvalError) -> CheckOutcome {
    debug!(check = check.kind(), error = %err, "submission failed during check");
    CheckOutcome::Unsatisfied
}

fn existence_or_value(
    workspace: &mut Workspace,
    name: &Option<Resolvable>,
    value: &Option<Resolvable>,
) -> CheckOutcome {
    workspace.sanitize();
    let mut marker = Value::Bool(true);
    if let Some(name) = name {
        let present = match name.fixed() {
            Some(Value::Str(name)) => workspace.contains(name),
            _ => {
                debug!("existence check has an unresolved name");
                false
            }
        };
        if !present {
            return CheckOutcome::Unsatisfied;
        }
    }
    if let Some(value) = value {
        let Some(target) = value.fixed() else {
            debug!("value check has an unresolved value");
            return CheckOutcome::Unsatisfied;
        };
        match workspace.find_value(target) {
            Some(matched) => marker = Value::str(matched),
            None => return CheckOutcome::Unsatisfied,
        }
    }
    CheckOutcome::Satisfied(marker)
}

/// Alphabetic name before the first `.` of the submission, if any.
pub fn leading_namespace(submission: &str) -> Option<&str> {
    LEADING_NAMESPACE
        .captures(submission)
        .and_then(|captures| captures.get(1))
        .map(|name| name.as_str())
}

/// Number of distinct tracked operator symbols present in `text`.
///
/// Presence only; `//` and `**` also light up `/` and `*`, so each compound
/// symbol present is subtracted once.
pub fn distinct_operator_tally(text: &str) -> usize {
    let mut present = 0;
    let mut compound = 0;
    for op in TRACKED_OPERATORS {
        if text.contains(op) {
            present += 1;
            if op.len() == 2 {
                compound += 1;
            }
        }
    }
    present - compound
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interp::value::Dict;

    fn math_only() -> Vec<String> {
        vec!["math".to_string()]
    }

    fn run(ws: &mut Workspace, src: &str) {
        interp::exec(src, ws, &mut io::sink()).expect("setup statement");
    }

    fn verdict(check: &Check, ws: &mut Workspace, submission: &str) -> CheckOutcome {
        check.check(ws, submission, &math_only())
    }

    fn fixed(value: Value) -> Option<Resolvable> {
        Some(Resolvable::Fixed(value))
    }

    #[test]
    fn existence_by_name() {
        let check = Check::ExistenceOrValue {
            name: fixed(Value::str("a")),
            value: None,
        };
        let mut ws = Workspace::new();
        run(&mut ws, "b = 2");
        assert_eq!(verdict(&check, &mut ws, "b = 2"), CheckOutcome::Unsatisfied);
        run(&mut ws, "a = 1");
        assert_eq!(
            verdict(&check, &mut ws, "a = 1"),
            CheckOutcome::Satisfied(Value::Bool(true))
        );
    }

    #[test]
    fn value_match_reports_the_variable() {
        let check = Check::ExistenceOrValue {
            name: None,
            value: fixed(Value::Int(123)),
        };
        let mut ws = Workspace::new();
        run(&mut ws, "q = 123");
        assert_eq!(
            verdict(&check, &mut ws, "q = 123").into_marker(),
            Some(Value::str("q"))
        );
    }

    #[test]
    fn name_and_value_must_both_hold() {
        let check = Check::ExistenceOrValue {
            name: fixed(Value::str("d")),
            value: fixed(Value::dict(Dict::from_iter([(
                Value::str("k"),
                Value::str("v"),
            )]))),
        };
        let mut ws = Workspace::new();
        run(&mut ws, "d = {}");
        assert!(!verdict(&check, &mut ws, "d = {}").is_satisfied());
        run(&mut ws, "d['k'] = 'v'");
        assert!(verdict(&check, &mut ws, "d['k'] = 'v'").is_satisfied());
    }

    #[test]
    fn unresolved_settings_never_match() {
        let check = Check::ExistenceOrValue {
            name: Some(Resolvable::Deferred("__z".to_string())),
            value: None,
        };
        let mut ws = Workspace::new();
        ws.define("__z", Value::str("q"));
        assert_eq!(verdict(&check, &mut ws, "q"), CheckOutcome::Unsatisfied);
        assert!(check.has_deferred());
    }

    #[test]
    fn resolution_evaluates_against_the_workspace() {
        let check = Check::ExistenceOrValue {
            name: Some(Resolvable::Deferred("__z".to_string())),
            value: Some(Resolvable::Deferred("globals()[__z] * 2".to_string())),
        };
        let mut ws = Workspace::new();
        run(&mut ws, "q = 123");
        ws.publish("z", Value::str("q"));
        let resolved = check.resolved(&mut ws).expect("resolves");
        assert!(!resolved.has_deferred());
        assert_eq!(
            resolved,
            Check::ExistenceOrValue {
                name: fixed(Value::str("q")),
                value: fixed(Value::Int(246)),
            }
        );
        run(&mut ws, "q = q * 2");
        assert_eq!(
            verdict(&resolved, &mut ws, "q = q * 2"),
            CheckOutcome::Satisfied(Value::str("q"))
        );
    }

    #[test]
    fn resolution_rejects_non_string_names() {
        let check = Check::ExistenceOrValue {
            name: Some(Resolvable::Deferred("1 + 1".to_string())),
            value: None,
        };
        let err = check.resolved(&mut Workspace::new()).expect_err("int name");
        assert_eq!(err.to_string(), "variable name must resolve to a str, not int");
    }

    #[test]
    fn captured_output_is_trimmed_and_exact() {
        let check = Check::CapturedOutput {
            expected: "* * *".to_string(),
        };
        let mut ws = Workspace::new();
        assert!(verdict(&check, &mut ws, "print('* * *')").is_satisfied());
        assert!(verdict(&check, &mut ws, "print('*', '*', '*')").is_satisfied());
        assert!(!verdict(&check, &mut ws, "print('*  *  *')").is_satisfied());
        assert!(!verdict(&check, &mut ws, "print(").is_satisfied());
    }

    #[test]
    fn value_equality_compares_results() {
        let check = Check::ValueEquality {
            expected: Value::Bool(false),
        };
        let mut ws = Workspace::new();
        assert!(verdict(&check, &mut ws, "True and not True").is_satisfied());
        assert!(!verdict(&check, &mut ws, "True").is_satisfied());
        assert!(!verdict(&check, &mut ws, "1/0").is_satisfied());
    }

    #[test]
    fn value_equality_injects_safelisted_namespaces() {
        let check = Check::ValueEquality {
            expected: Value::Float(5f64.cos()),
        };
        let mut ws = Workspace::new();
        assert!(!ws.contains("math"));
        assert!(verdict(&check, &mut ws, "math.cos(5)").is_satisfied());
        assert!(ws.contains("math"));
    }

    #[test]
    fn value_equality_ignores_namespaces_off_the_safelist() {
        let check = Check::ValueEquality {
            expected: Value::Float(5f64.cos()),
        };
        let mut ws = Workspace::new();
        assert!(!check.check(&mut ws, "math.cos(5)", &[]).is_satisfied());
        assert!(!ws.contains("math"));
    }

    #[test]
    fn callable_behavior_calls_with_the_argument() {
        let check = Check::CallableBehavior {
            argument: Value::list(vec![Value::Int(1), Value::Int(3), Value::Int(9)]),
            result: Value::Int(9),
        };
        let mut ws = Workspace::new();
        assert!(verdict(&check, &mut ws, "max").is_satisfied());
        assert!(!verdict(&check, &mut ws, "len").is_satisfied());
        assert!(!verdict(&check, &mut ws, "42").is_satisfied());
        assert!(!verdict(&check, &mut ws, "lambda: 1").is_satisfied());
    }

    #[test]
    fn callable_argument_is_not_mutated_across_attempts() {
        let argument = Value::list(vec![Value::Int(1)]);
        let check = Check::CallableBehavior {
            argument: argument.clone(),
            result: Value::None,
        };
        let mut ws = Workspace::new();
        assert!(verdict(&check, &mut ws, "lambda xs: xs.append(2)").is_satisfied());
        assert_eq!(argument.repr(), "[1]");
    }

    #[test]
    fn exception_forcing_leaves_the_workspace_alone() {
        let check = Check::ExceptionForcing;
        let mut ws = Workspace::new();
        assert!(verdict(&check, &mut ws, "1/0").is_satisfied());
        assert!(!verdict(&check, &mut ws, "1+1").is_satisfied());
        assert!(!verdict(&check, &mut ws, "x = 5").is_satisfied());
        assert!(!ws.contains("x"));
    }

    #[test]
    fn operator_count_requires_value_and_tally() {
        let check = Check::OperatorCount {
            operators: 2,
            result: Value::Int(13),
        };
        let mut ws = Workspace::new();
        assert!(verdict(&check, &mut ws, "2 * 5 + 3").is_satisfied());
        assert!(!verdict(&check, &mut ws, "2 * 5 + 6 / 2").is_satisfied());
        assert!(!verdict(&check, &mut ws, "2 * 5 + 4").is_satisfied());
    }

    #[test]
    fn tally_counts_presence_with_compound_compensation() {
        assert_eq!(distinct_operator_tally("1 + 1 + 1"), 1);
        assert_eq!(distinct_operator_tally("2 ** 3"), 1);
        assert_eq!(distinct_operator_tally("7 // 2 - 1"), 2);
        // `*` is hidden behind `**`, so only `**` and `%` remain.
        assert_eq!(distinct_operator_tally("2 ** 3 * 2 % 5"), 2);
        assert_eq!(distinct_operator_tally("7 // 2 / 1"), 1);
        assert_eq!(distinct_operator_tally("13"), 0);
    }

    #[test]
    fn leading_namespace_requires_an_alphabetic_prefix() {
        assert_eq!(leading_namespace("math.cos(5)"), Some("math"));
        assert_eq!(leading_namespace(" math.cos(5)"), None);
        assert_eq!(leading_namespace("m4th.cos(5)"), None);
        assert_eq!(leading_namespace("1.5"), None);
    }

    #[test]
    fn checks_never_panic_on_garbage() {
        let checks = [
            Check::CapturedOutput {
                expected: String::new(),
            },
            Check::ValueEquality {
                expected: Value::None,
            },
            Check::CallableBehavior {
                argument: Value::None,
                result: Value::None,
            },
            Check::OperatorCount {
                operators: 0,
                result: Value::None,
            },
        ];
        let mut ws = Workspace::new();
        for check in &checks {
            for garbage in ["((((", "'", "lambda", "1 +", "]"] {
                assert!(!verdict(check, &mut ws, garbage).is_satisfied());
            }
        }
    }
}
