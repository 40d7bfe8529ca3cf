//! Campaign file parsing and validation.
//!
//! A campaign is a TOML file listing the main goals and the bonus goals played
//! after them. Check settings are written as expressions in the learner's
//! language:
//!
//! - without `resolve`, they are evaluated once at load time;
//! - with `resolve`, they stay as text and are evaluated against the learner's
//!   workspace when the goal starts.
//!
//! `existence_or_value.name` is a literal variable name unless `resolve` is
//! set, and `captured_output.expected` is always literal text.

use std::fs;
use std::io;
use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;

use engine::core::checks::{Check, Resolvable};
use engine::core::goal::GoalDescriptor;
use engine::core::workspace::Workspace;
use engine::interp::{self, Value};
use engine::io::prompt::validate_template;

/// The campaign shipped with the game.
pub const DEFAULT_CAMPAIGN: &str = include_str!("../campaigns/default.toml");

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct CampaignFile {
    pub goals: Vec<GoalEntry>,
    #[serde(default)]
    pub final_goals: Vec<GoalEntry>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct GoalEntry {
    pub text: String,
    #[serde(default)]
    pub execute: bool,
    pub metavar: Option<String>,
    #[serde(default)]
    pub resolve: bool,
    pub check: CheckEntry,
}

/// Check table as written in the campaign file.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CheckEntry {
    ExistenceOrValue {
        name: Option<String>,
        value: Option<String>,
    },
    CapturedOutput {
        expected: String,
    },
    ValueEquality {
        expected: String,
    },
    CallableBehavior {
        argument: String,
        result: String,
    },
    ExceptionForcing,
    OperatorCount {
        operators: usize,
        result: String,
    },
}

/// Goals ready to hand to the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct Campaign {
    pub goals: Vec<GoalDescriptor>,
    pub final_goals: Vec<GoalDescriptor>,
}

impl Campaign {
    /// Load a campaign file, or the built-in campaign when `path` is `None`.
    ///
    /// `namespaces` are injected while evaluating load-time constants, so
    /// settings like `math.cos(5)` work.
    pub fn load(path: Option<&Path>, namespaces: &[String]) -> Result<Self> {
        match path {
            None => Self::parse_str(DEFAULT_CAMPAIGN, namespaces).context("built-in campaign"),
            Some(path) => {
                let contents = fs::read_to_string(path)
                    .with_context(|| format!("read campaign {}", path.display()))?;
                Self::parse_str(&contents, namespaces)
                    .with_context(|| format!("load campaign {}", path.display()))
            }
        }
    }

    pub fn parse_str(contents: &str, namespaces: &[String]) -> Result<Self> {
        let file: CampaignFile = toml::from_str(contents).context("parse campaign")?;
        file.into_campaign(namespaces)
    }
}

impl CampaignFile {
    fn into_campaign(self, namespaces: &[String]) -> Result<Campaign> {
        if self.goals.is_empty() {
            bail!("goals must be a non-empty array");
        }
        let build = |section: &str, entries: Vec<GoalEntry>| -> Result<Vec<GoalDescriptor>> {
            entries
                .into_iter()
                .enumerate()
                .map(|(index, entry)| {
                    entry
                        .into_descriptor(namespaces)
                        .with_context(|| format!("{section}[{index}] invalid"))
                })
                .collect()
        };
        Ok(Campaign {
            goals: build("goals", self.goals)?,
            final_goals: build("final_goals", self.final_goals)?,
        })
    }
}

impl GoalEntry {
    fn into_descriptor(self, namespaces: &[String]) -> Result<GoalDescriptor> {
        validate_template(&self.text)?;
        let check = self.check.into_check(self.resolve, namespaces)?;
        let goal = GoalDescriptor {
            text: self.text,
            execute: self.execute,
            check,
            metavar: self.metavar,
            resolve: self.resolve,
        };
        goal.validate()?;
        Ok(goal)
    }
}

impl CheckEntry {
    fn into_check(self, resolve: bool, namespaces: &[String]) -> Result<Check> {
        let constant = |field: &str, text: &str| -> Result<Value> {
            let mut scratch = Workspace::new();
            for namespace in namespaces {
                scratch.inject_namespace(namespace);
            }
            interp::eval(text, &mut scratch, &mut io::sink())
                .map_err(|err| anyhow!("{field} = {text:?}: {err}"))
        };
        let setting = |field: &str, text: String| -> Result<Resolvable> {
            if resolve {
                Ok(Resolvable::Deferred(text))
            } else {
                constant(field, &text).map(Resolvable::Fixed)
            }
        };

        let check = match self {
            CheckEntry::ExistenceOrValue { name, value } => {
                if name.is_none() && value.is_none() {
                    bail!("existence_or_value needs a name, a value or both");
                }
                let name = match name {
                    Some(name) if name.trim().is_empty() => {
                        bail!("existence_or_value.name must be non-empty")
                    }
                    Some(name) if resolve => Some(Resolvable::Deferred(name)),
                    Some(name) => Some(Resolvable::Fixed(Value::str(name))),
                    None => None,
                };
                let value = value.map(|value| setting("value", value)).transpose()?;
                Check::ExistenceOrValue { name, value }
            }
            CheckEntry::CapturedOutput { expected } => Check::CapturedOutput { expected },
            CheckEntry::ValueEquality { expected } => Check::ValueEquality {
                expected: constant("expected", &expected)?,
            },
            CheckEntry::CallableBehavior { argument, result } => Check::CallableBehavior {
                argument: constant("argument", &argument)?,
                result: constant("result", &result)?,
            },
            CheckEntry::ExceptionForcing => Check::ExceptionForcing,
            CheckEntry::OperatorCount { operators, result } => Check::OperatorCount {
                operators,
                result: constant("result", &result)?,
            },
        };
        Ok(check)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn math() -> Vec<String> {
        vec!["math".to_string()]
    }

    #[test]
    fn builtin_campaign_loads() {
        let campaign = Campaign::load(None, &math()).expect("built-in");
        assert_eq!(campaign.goals.len(), 14);
        assert_eq!(campaign.final_goals.len(), 1);
        assert_eq!(
            campaign.goals[13].check,
            Check::ValueEquality {
                expected: Value::Float(5f64.cos())
            }
        );
        assert!(campaign.goals[3].check.has_deferred());
    }

    #[test]
    fn constants_are_evaluated_at_load() {
        let input = r#"
[[goals]]
text = "Generate the odd numbers."

[goals.check]
type = "value_equality"
expected = "list(range(1, 10, 2))"
"#;
        let campaign = Campaign::parse_str(input, &[]).expect("parses");
        assert_eq!(
            campaign.goals[0].check,
            Check::ValueEquality {
                expected: Value::list([1, 3, 5, 7, 9].map(Value::Int).to_vec())
            }
        );
        assert!(campaign.final_goals.is_empty());
    }

    #[test]
    fn resolve_keeps_settings_as_text() {
        let input = r#"
[[goals]]
text = "Double '{{ __z }}'."
execute = true
resolve = true

[goals.check]
type = "existence_or_value"
name = "__z"
value = "globals()[__z] * 2"
"#;
        let campaign = Campaign::parse_str(input, &[]).expect("parses");
        assert_eq!(
            campaign.goals[0].check,
            Check::ExistenceOrValue {
                name: Some(Resolvable::Deferred("__z".to_string())),
                value: Some(Resolvable::Deferred("globals()[__z] * 2".to_string())),
            }
        );
    }

    #[test]
    fn bad_constant_names_the_goal() {
        let input = r#"
[[goals]]
text = "Cosine."

[goals.check]
type = "value_equality"
expected = "math.cos(5)"
"#;
        let err = Campaign::parse_str(input, &[]).expect_err("math not injected");
        let message = format!("{err:#}");
        assert!(message.contains("goals[0] invalid"));
        assert!(message.contains("name 'math' is not defined"));
    }

    #[test]
    fn rejects_empty_campaign() {
        let err = Campaign::parse_str("goals = []\n", &[]).expect_err("empty");
        assert!(err.to_string().contains("non-empty"));
    }

    #[test]
    fn rejects_unknown_check_type() {
        let input = r#"
[[goals]]
text = "x"

[goals.check]
type = "telepathy"
"#;
        assert!(Campaign::parse_str(input, &[]).is_err());
    }

    #[test]
    fn rejects_broken_templates() {
        let input = r#"
[[goals]]
text = "Double '{{ __z '."

[goals.check]
type = "exception_forcing"
"#;
        let err = Campaign::parse_str(input, &[]).expect_err("template");
        assert!(format!("{err:#}").contains("invalid goal text template"));
    }
}
