//! Static goal definitions consumed by the goal engine.

use anyhow::{Result, anyhow};

use crate::core::checks::Check;
use crate::core::workspace::Workspace;

/// One tutorial goal. Built once at startup and never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct GoalDescriptor {
    /// Prompt template; may reference published metavars as `{{ __name }}`.
    pub text: String,
    /// Run submissions as statements against the workspace before checking.
    pub execute: bool,
    pub check: Check,
    /// Name the check's marker is published under, without the `__` prefix.
    pub metavar: Option<String>,
    /// Evaluate deferred check settings against the workspace at goal start.
    pub resolve: bool,
}

impl GoalDescriptor {
    pub fn new(text: impl Into<String>, check: Check) -> Self {
        Self {
            text: text.into(),
            execute: false,
            check,
            metavar: None,
            resolve: false,
        }
    }

    pub fn executed(mut self) -> Self {
        self.execute = true;
        self
    }

    pub fn publishing(mut self, metavar: impl Into<String>) -> Self {
        self.metavar = Some(metavar.into());
        self
    }

    pub fn resolving(mut self) -> Self {
        self.resolve = true;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.text.trim().is_empty() {
            return Err(anyhow!("goal text must not be empty"));
        }
        if let Some(metavar) = &self.metavar
            && !is_identifier(metavar)
        {
            return Err(anyhow!("metavar {metavar:?} is not a valid identifier"));
        }
        if self.check.has_deferred() && !self.resolve {
            return Err(anyhow!(
                "{} check has deferred settings but resolve is not set",
                self.check.kind()
            ));
        }
        Ok(())
    }

    /// The check to run for this goal, with deferred settings evaluated
    /// against `workspace` when `resolve` is set.
    pub fn prepared_check(&self, workspace: &mut Workspace) -> Result<Check> {
        if !self.resolve {
            return Ok(self.check.clone());
        }
        self.check.resolved(workspace).map_err(|err| {
            anyhow!(
                "resolve {} check for goal {:?}: {err}",
                self.check.kind(),
                self.text
            )
        })
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|first| first == '_' || first.is_alphabetic())
        && chars.all(|c| c == '_' || c.is_alphanumeric())
}
