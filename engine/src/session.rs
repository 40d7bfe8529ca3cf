//! The goal engine: prompts for each goal in turn and judges submissions until
//! the goal is met or the learner leaves.
//!
//! Per submission the engine moves through
//! `await input -> filter -> execute? -> check -> success | retry | abort`.
//! Only input termination (read failure, interrupt, end of input, or `exit()`
//! from learner code) ends a session early; everything else retries the goal.

use std::io::Write;
use std::thread;
use std::time::Duration;

use anyhow::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, instrument, warn};

use crate::core::checks::{Check, CheckOutcome};
use crate::core::filter::SubmissionFilter;
use crate::core::goal::GoalDescriptor;
use crate::core::hints::HintBudget;
use crate::core::workspace::Workspace;
use crate::interp::{self, EvalError, Value};
use crate::io::config::EngineConfig;
use crate::io::prompt::render_goal_text;
use crate::io::terminal::{Input, LineSource, Terminal};

pub const PROMPT: &str = ":)>>> ";
pub const NEXT_GOAL: &str = "== Next Goal ==";
pub const SUCCESS: &str = "Good!";
pub const FILTERED: &str = "Unbreakable game.";
pub const NEAR_MISS: &str = "Well, not quite.";
pub const NO_HINT: &str = "Not showing anything.";
pub const FAREWELL: &str = "Okthxbye.";
pub const HALFWAY: &str = "Well done - half of goals achieved!";
pub const LAST_GOAL: &str = "Very well done - last goal!";

/// Optional lines shown above a goal; each appears with probability 1/5.
const FLAVOUR: [&str; 2] = ["Having fun?", "Now try your luck:"];
const FLAVOUR_ROLL: usize = 5;

/// Result of judging one submission.
#[derive(Debug)]
enum Attempt {
    Satisfied,
    Retry,
    Abort,
}

/// Drives a learner through a list of goals.
///
/// Owns the session state: the workspace and hint budget persist across every
/// `run` on the same engine, which is how a bonus round keeps the learner's
/// variables.
pub struct GoalEngine<L: LineSource, W: Write> {
    input: L,
    terminal: Terminal<W>,
    workspace: Workspace,
    hints: HintBudget,
    filter: SubmissionFilter,
    config: EngineConfig,
    rng: StdRng,
}

impl<L: LineSource, W: Write> GoalEngine<L, W> {
    pub fn new(input: L, output: W, config: EngineConfig) -> Self {
        Self {
            input,
            terminal: Terminal::new(output),
            workspace: Workspace::new(),
            hints: config.hints(),
            filter: config.filter(),
            config,
            rng: StdRng::from_entropy(),
        }
    }

    /// Make the flavour lines reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn terminal(&mut self) -> &mut Terminal<W> {
        &mut self.terminal
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn hints(&self) -> &HintBudget {
        &self.hints
    }

    /// Read one line outside the goal loop (e.g. "press enter to quit").
    pub fn read_line(&mut self) -> Result<Input> {
        self.input.next_line()
    }

    pub fn into_output(self) -> W {
        self.terminal.into_inner()
    }

    /// Play `goals` front to back. Returns `true` when every goal was met and
    /// `false` when the learner aborted.
    ///
    /// Errors are reserved for broken goal definitions and terminal failures.
    #[instrument(skip_all, fields(goals = goals.len()))]
    pub fn run(&mut self, goals: &[GoalDescriptor]) -> Result<bool> {
        for (idx, goal) in goals.iter().enumerate() {
            if goals.len() > 2 {
                if idx == goals.len() / 2 {
                    self.terminal.line(HALFWAY)?;
                }
                if idx == goals.len() - 1 {
                    self.terminal.line(LAST_GOAL)?;
                }
            }
            info!(goal = idx + 1, check = goal.check.kind(), "goal started");
            if !self.play(goal)? {
                info!(goal = idx + 1, "session aborted");
                return Ok(false);
            }
            info!(goal = idx + 1, "goal achieved");
        }
        Ok(true)
    }

    fn play(&mut self, goal: &GoalDescriptor) -> Result<bool> {
        self.workspace.sanitize();
        self.terminal.blank()?;
        self.terminal.line(NEXT_GOAL)?;
        if let Some(flavour) = FLAVOUR.get(self.rng.gen_range(0..FLAVOUR_ROLL)) {
            self.terminal.line(flavour)?;
        }
        let text = render_goal_text(&goal.text, &self.workspace);
        self.terminal.line(&text)?;
        let check = goal.prepared_check(&mut self.workspace)?;

        loop {
            self.terminal.text(PROMPT)?;
            let submission = match self.input.next_line() {
                Ok(Input::Line(line)) => line,
                Ok(input) => {
                    debug!(?input, "input ended");
                    return self.abort();
                }
                Err(err) => {
                    warn!(error = %err, "reading input failed");
                    return self.abort();
                }
            };
            if submission.is_empty() {
                continue;
            }
            if submission == "?" {
                self.terminal.line(&text)?;
                continue;
            }
            if let Some(token) = self.filter.blocked_token(&submission) {
                debug!(token, "submission filtered");
                self.terminal.line(FILTERED)?;
                continue;
            }
            self.animate()?;
            match self.attempt(goal, &check, &submission)? {
                Attempt::Satisfied => {
                    self.terminal.line(SUCCESS)?;
                    return Ok(true);
                }
                Attempt::Retry => {}
                Attempt::Abort => return self.abort(),
            }
        }
    }

    fn attempt(
        &mut self,
        goal: &GoalDescriptor,
        check: &Check,
        submission: &str,
    ) -> Result<Attempt> {
        if goal.execute
            && let Err(err) = interp::exec(submission, &mut self.workspace, &mut self.terminal)
        {
            if err.is_exit() {
                return Ok(Attempt::Abort);
            }
            debug!(error = %err, "execution failed");
            self.terminal.line(&format!("Error: {err}"))?;
            return Ok(Attempt::Retry);
        }

        let outcome = check.check(
            &mut self.workspace,
            submission,
            &self.config.injectable_namespaces,
        );
        if let CheckOutcome::Satisfied(marker) = outcome {
            if let Some(metavar) = &goal.metavar {
                let name = self.workspace.publish(metavar, marker);
                debug!(metavar = %name, "marker published");
            }
            self.workspace.sanitize();
            return Ok(Attempt::Satisfied);
        }

        match self.diagnose(submission) {
            Err(EvalError::Exit) => Ok(Attempt::Abort),
            Err(err) => {
                debug!(error = %err, "submission does not evaluate");
                self.terminal.line(NEAR_MISS)?;
                Ok(Attempt::Retry)
            }
            Ok(value) => {
                self.hint(&value)?;
                Ok(Attempt::Retry)
            }
        }
    }

    /// What the submission stands for: a workspace variable of that name, or
    /// the value it evaluates to.
    fn diagnose(&mut self, submission: &str) -> Result<Value, EvalError> {
        self.workspace.sanitize();
        if let Some(value) = self.workspace.lookup(submission) {
            return Ok(value.clone());
        }
        interp::eval(submission, &mut self.workspace, &mut self.terminal)
    }

    fn hint(&mut self, value: &Value) -> Result<()> {
        self.terminal.line(&format!(
            "You are not quite concentrating on your job in achieving goals. {} hints left.",
            self.hints.remaining()
        ))?;
        if self.hints.take() {
            debug!(remaining = self.hints.remaining(), "hint revealed");
            self.terminal.line(&value.to_string())
        } else {
            self.terminal.line(NO_HINT)
        }
    }

    fn animate(&mut self) -> Result<()> {
        self.terminal.text("Evaluating")?;
        for _ in 0..self.config.evaluating_ticks {
            if self.config.tick_millis > 0 {
                thread::sleep(Duration::from_millis(self.config.tick_millis));
            }
            self.terminal.text(".")?;
        }
        self.terminal.blank()
    }

    fn abort(&mut self) -> Result<bool> {
        self.terminal.line(FAREWELL)?;
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::checks::Resolvable;
    use crate::test_support::{ScriptedInput, existence_goal, quiet_config};

    fn engine(lines: &[&str]) -> GoalEngine<ScriptedInput, Vec<u8>> {
        GoalEngine::new(ScriptedInput::new(lines), Vec::new(), quiet_config()).with_seed(7)
    }

    fn output(engine: GoalEngine<ScriptedInput, Vec<u8>>) -> String {
        String::from_utf8(engine.into_output()).expect("utf8")
    }

    #[test]
    fn fails_then_succeeds_once() {
        let mut engine = engine(&["b=2", "a=1"]);
        assert!(engine.run(&[existence_goal("a")]).expect("run"));
        let out = output(engine);
        assert_eq!(out.matches(SUCCESS).count(), 1);
        assert!(out.contains("Evaluating...\r\n"));
    }

    #[test]
    fn end_of_input_aborts_with_farewell() {
        let mut engine = engine(&["b=2"]);
        assert!(!engine.run(&[existence_goal("a")]).expect("run"));
        assert!(output(engine).ends_with("Okthxbye.\r\n"));
    }

    #[test]
    fn exit_in_learner_code_aborts() {
        let mut engine = engine(&["exit()", "a=1"]);
        assert!(!engine.run(&[existence_goal("a")]).expect("run"));
        assert!(!output(engine).contains(SUCCESS));
    }

    #[test]
    fn execution_errors_are_reported_and_retried() {
        let mut engine = engine(&["a = 1/0", "a = 1"]);
        assert!(engine.run(&[existence_goal("a")]).expect("run"));
        assert!(output(engine).contains("Error: division by zero\r\n"));
    }

    #[test]
    fn filtered_submissions_never_run() {
        let mut engine = engine(&["a = 'open'", "a = 1"]);
        assert!(engine.run(&[existence_goal("a")]).expect("run"));
        let out = output(engine);
        assert!(out.contains("Unbreakable game.\r\n"));
        assert_eq!(out.matches("Evaluating").count(), 1);
    }

    #[test]
    fn question_mark_repeats_the_goal() {
        let mut engine = engine(&["", "?", "a = 1"]);
        assert!(engine.run(&[existence_goal("a")]).expect("run"));
        let out = output(engine);
        assert_eq!(out.matches("Create a variable 'a' by assignment.").count(), 2);
        assert_eq!(out.matches("Evaluating").count(), 1);
    }

    #[test]
    fn marker_is_published_under_the_metavar() {
        let goal = GoalDescriptor::new(
            "Create a variable with numeric value 123.",
            Check::ExistenceOrValue {
                name: None,
                value: Some(Resolvable::Fixed(Value::Int(123))),
            },
        )
        .executed()
        .publishing("z");
        let mut engine = engine(&["q = 123"]);
        assert!(engine.run(&[goal]).expect("run"));
        assert_eq!(engine.workspace().lookup("__z"), Some(&Value::str("q")));
    }

    #[test]
    fn diagnostics_distinguish_values_from_errors() {
        let goal = GoalDescriptor::new(
            "Calculate False.",
            Check::ValueEquality {
                expected: Value::Bool(false),
            },
        );
        let mut engine = engine(&["1 +", "1 + 1", "False"]);
        assert!(engine.run(&[goal]).expect("run"));
        let out = output(engine);
        assert!(out.contains("Well, not quite.\r\n"));
        assert!(out.contains(
            "You are not quite concentrating on your job in achieving goals. 4 hints left.\r\n2\r\n"
        ));
    }

    #[test]
    fn narration_marks_half_and_last() {
        let goals = vec![existence_goal("a"), existence_goal("a"), existence_goal("a")];
        let mut engine = engine(&["a = 1", "a = 2", "a = 3"]);
        assert!(engine.run(&goals).expect("run"));
        let out = output(engine);
        let half = out.find(HALFWAY).expect("halfway");
        let last = out.find(LAST_GOAL).expect("last");
        assert!(half < last);
    }

    #[test]
    fn prints_from_learner_code_use_crlf() {
        let goal = GoalDescriptor::new("Provoke an exception.", Check::ExceptionForcing);
        let mut engine = engine(&["print('x')", "1/0"]);
        assert!(engine.run(&[goal]).expect("run"));
        assert!(output(engine).contains("x\r\n"));
    }
}
