//! Completion score handed to the lecturer.
//!
//! The magic number mixes the day of the month with the elapsed play time so
//! a lecturer can sanity check a learner's report without a server.

use anyhow::{Context, Result, bail};

pub const DEFAULT_PORT: i64 = 8080;
pub const DEFAULT_RING: i64 = 91;

/// Scoring parameters read from `PORT` and `RING`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreConfig {
    pub port: i64,
    pub ring: i64,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            ring: DEFAULT_RING,
        }
    }
}

impl ScoreConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup. Unset and empty variables
    /// take their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let read = |key: &str, default: i64| -> Result<i64> {
            match lookup(key).filter(|raw| !raw.is_empty()) {
                None => Ok(default),
                Some(raw) => raw
                    .trim()
                    .parse()
                    .with_context(|| format!("{key} must be an integer, got {raw:?}")),
            }
        };
        let cfg = Self {
            port: read("PORT", DEFAULT_PORT)?,
            ring: read("RING", DEFAULT_RING)?,
        };
        if cfg.ring <= 0 {
            bail!("RING must be > 0, got {}", cfg.ring);
        }
        Ok(cfg)
    }

    /// `(day * port) % ring + elapsed % ring`.
    pub fn magic_number(&self, day: u32, elapsed_secs: u64) -> i64 {
        let day_part = (i64::from(day).wrapping_mul(self.port)).rem_euclid(self.ring);
        let time_part = (elapsed_secs % self.ring.unsigned_abs()) as i64;
        day_part + time_part
    }
}
