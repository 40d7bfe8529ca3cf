//! Test-only helpers for driving the goal engine without a terminal.

use std::collections::VecDeque;

use anyhow::Result;

use crate::core::checks::{Check, Resolvable};
use crate::core::goal::GoalDescriptor;
use crate::interp::Value;
use crate::io::config::EngineConfig;
use crate::io::terminal::{Input, LineSource};

/// Line source replaying a fixed script, then reporting end of input.
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    pending: VecDeque<Input>,
}

impl ScriptedInput {
    pub fn new(lines: &[&str]) -> Self {
        Self {
            pending: lines.iter().map(|line| Input::Line(line.to_string())).collect(),
        }
    }

    /// Queue an interrupt after the scripted lines.
    pub fn then_interrupt(mut self) -> Self {
        self.pending.push_back(Input::Interrupt);
        self
    }
}

impl LineSource for ScriptedInput {
    fn next_line(&mut self) -> Result<Input> {
        Ok(self.pending.pop_front().unwrap_or(Input::Eof))
    }
}

/// Default config without the animation delay.
pub fn quiet_config() -> EngineConfig {
    EngineConfig::default().without_delay()
}

/// Goal met once a variable called `name` exists (execute mode).
pub fn existence_goal(name: &str) -> GoalDescriptor {
    GoalDescriptor::new(
        format!("Create a variable '{name}' by assignment."),
        Check::ExistenceOrValue {
            name: Some(Resolvable::Fixed(Value::str(name))),
            value: None,
        },
    )
    .executed()
}

/// Goal met once some variable holds `value` (execute mode).
pub fn value_goal(value: Value) -> GoalDescriptor {
    GoalDescriptor::new(
        format!("Create a variable with value {}.", value.repr()),
        Check::ExistenceOrValue {
            name: None,
            value: Some(Resolvable::Fixed(value)),
        },
    )
    .executed()
}

/// Goal met by an expression evaluating to `expected` (evaluate mode).
pub fn equality_goal(expected: Value) -> GoalDescriptor {
    GoalDescriptor::new(
        format!("Calculate {}.", expected.repr()),
        Check::ValueEquality { expected },
    )
}
