//! Engine configuration loaded from an optional TOML file.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::core::filter::{DEFAULT_BLOCKED_TOKENS, SubmissionFilter};
use crate::core::hints::{DEFAULT_HINTS, HintBudget};
use crate::interp::modules;

/// Engine configuration (TOML).
///
/// Missing fields take the classic game's values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EngineConfig {
    /// Value-revealing hints per session.
    pub hint_budget: u32,

    /// Substrings that get a submission rejected before evaluation.
    pub blocked_tokens: Vec<String>,

    /// Dots printed by the "Evaluating" animation.
    pub evaluating_ticks: u32,

    /// Delay between animation dots in milliseconds. Zero disables sleeping.
    pub tick_millis: u64,

    /// Namespaces value checks may inject when a submission starts with
    /// `name.`.
    pub injectable_namespaces: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            hint_budget: DEFAULT_HINTS,
            blocked_tokens: DEFAULT_BLOCKED_TOKENS.iter().map(ToString::to_string).collect(),
            evaluating_ticks: 3,
            tick_millis: 200,
            injectable_namespaces: vec!["math".to_string()],
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.blocked_tokens.iter().any(|token| token.is_empty()) {
            return Err(anyhow!("blocked_tokens must not contain empty strings"));
        }
        for name in &self.injectable_namespaces {
            if modules::lookup(name).is_none() {
                let known = modules::names().collect::<Vec<_>>().join(", ");
                return Err(anyhow!(
                    "injectable_namespaces: unknown namespace {name:?} (known: {known})"
                ));
            }
        }
        Ok(())
    }

    pub fn filter(&self) -> SubmissionFilter {
        SubmissionFilter::new(self.blocked_tokens.iter().cloned())
    }

    pub fn hints(&self) -> HintBudget {
        HintBudget::new(self.hint_budget)
    }

    /// Same settings with the animation delay removed.
    pub fn without_delay(mut self) -> Self {
        self.tick_millis = 0;
        self
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `EngineConfig::default()`.
pub fn load_config(path: &Path) -> Result<EngineConfig> {
    if !path.exists() {
        let cfg = EngineConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: EngineConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("validate {}", path.display()))?;
    Ok(cfg)
}
