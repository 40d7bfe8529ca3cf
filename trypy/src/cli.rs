//! CLI command implementations.

use std::io::{self, Write};
use std::path::Path;
use std::time::Instant;

use anyhow::Result;
use chrono::{Datelike, Local};
use tracing::{info, warn};

use engine::io::config::{EngineConfig, load_config};
use engine::io::terminal::{LineSource, StdinLines};
use engine::session::GoalEngine;

use crate::campaign::Campaign;
use crate::score::ScoreConfig;

const WELCOME: &str = "Welcome to TryPy! You must achieve all goals with valid Python syntax.";
const BOSS: &str = "You have reached the boss level. Prepare for the final goal!";
const WONDERFUL: &str = "Wonderful - you did the final goal!";
const SCISSORS: &str = "----- 8< -----";
const QUIT_PROMPT: &str = "Inform these two numbers to your lecturer, and then press enter to quit...";

/// Engine config from `path`, or the defaults when no path is given.
pub fn engine_config(path: Option<&Path>, no_delay: bool) -> Result<EngineConfig> {
    let cfg = match path {
        Some(path) => load_config(path)?,
        None => EngineConfig::default(),
    };
    Ok(if no_delay { cfg.without_delay() } else { cfg })
}

/// Play the campaign on stdin/stdout. Returns whether the learner finished.
pub fn play(campaign: &Campaign, config: EngineConfig, score: &ScoreConfig) -> Result<bool> {
    let mut engine = GoalEngine::new(StdinLines::stdin(), io::stdout(), config);
    play_session(&mut engine, campaign, score)
}

/// Banner, main goals, boss level and completion report.
pub fn play_session<L: LineSource, W: Write>(
    engine: &mut GoalEngine<L, W>,
    campaign: &Campaign,
    score: &ScoreConfig,
) -> Result<bool> {
    let started = Instant::now();
    let terminal = engine.terminal();
    terminal.line(WELCOME)?;
    terminal.line(&format!("There are {} goals.", campaign.goals.len()))?;
    if !engine.run(&campaign.goals)? {
        return Ok(false);
    }

    if !campaign.final_goals.is_empty() {
        let terminal = engine.terminal();
        terminal.blank()?;
        terminal.line(&"/ ".repeat(20))?;
        terminal.line(BOSS)?;
        info!(goals = campaign.final_goals.len(), "boss level reached");
        if !engine.run(&campaign.final_goals)? {
            return Ok(false);
        }
    }

    let elapsed = started.elapsed().as_secs();
    let magic = score.magic_number(Local::now().day(), elapsed);
    info!(elapsed, magic, "campaign completed");
    let terminal = engine.terminal();
    terminal.line(WONDERFUL)?;
    terminal.line(SCISSORS)?;
    terminal.line(&format!("You took {elapsed} seconds to play."))?;
    terminal.line(&format!("The magic number is: {magic}"))?;
    terminal.line(SCISSORS)?;
    terminal.blank()?;
    terminal.text(QUIT_PROMPT)?;
    if let Err(err) = engine.read_line() {
        warn!(error = %err, "reading final confirmation failed");
    }
    Ok(true)
}

/// Print one line per goal.
pub fn list_goals(campaign: &Campaign) {
    for (idx, goal) in campaign.goals.iter().enumerate() {
        println!("{:>2}. [{}] {}", idx + 1, goal.check.kind(), goal.text);
    }
    for goal in &campaign.final_goals {
        println!("boss [{}] {}", goal.check.kind(), goal.text);
    }
}
