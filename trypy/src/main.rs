//! TryPy: a Python tutorial game for the terminal.
//!
//! The learner works through a campaign of goals by typing Python at a prompt;
//! the `engine` crate judges each submission. Finishing every goal prints a
//! magic number the learner reports to their lecturer.

mod campaign;
mod cli;
mod exit_codes;
mod score;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing::debug;

use crate::campaign::Campaign;
use crate::score::ScoreConfig;

#[derive(Parser)]
#[command(
    name = "trypy",
    version,
    about = "Python tutorial game with goal verification",
    args_conflicts_with_subcommands = true
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    play: PlayArgs,
}

#[derive(Subcommand)]
enum Command {
    /// Play the campaign on stdin/stdout (the default).
    Play(PlayArgs),
    /// Print the goals of a campaign.
    List {
        /// Campaign TOML file (default: built-in campaign).
        #[arg(long)]
        campaign: Option<PathBuf>,
    },
    /// Load and check a campaign and engine config without playing.
    Validate {
        #[arg(long)]
        campaign: Option<PathBuf>,
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Args, Default)]
struct PlayArgs {
    /// Campaign TOML file (default: built-in campaign).
    #[arg(long)]
    campaign: Option<PathBuf>,
    /// Engine config TOML file (default: built-in settings).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Skip the "Evaluating..." delay.
    #[arg(long)]
    no_delay: bool,
}

fn main() {
    engine::logging::init();
    let code = match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{:#}", err);
            exit_codes::INVALID
        }
    };
    std::process::exit(code);
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command.unwrap_or(Command::Play(cli.play)) {
        Command::Play(args) => cmd_play(args),
        Command::List { campaign } => cmd_list(campaign),
        Command::Validate { campaign, config } => cmd_validate(campaign, config),
    }
}

fn cmd_play(args: PlayArgs) -> Result<i32> {
    let config = cli::engine_config(args.config.as_deref(), args.no_delay)?;
    let campaign = Campaign::load(args.campaign.as_deref(), &config.injectable_namespaces)?;
    let score = ScoreConfig::from_env()?;
    debug!(goals = campaign.goals.len(), ?score, "starting session");
    if cli::play(&campaign, config, &score)? {
        Ok(exit_codes::OK)
    } else {
        Ok(exit_codes::ABORTED)
    }
}

fn cmd_list(campaign: Option<PathBuf>) -> Result<i32> {
    let namespaces = cli::engine_config(None, false)?.injectable_namespaces;
    let campaign = Campaign::load(campaign.as_deref(), &namespaces)?;
    cli::list_goals(&campaign);
    Ok(exit_codes::OK)
}

fn cmd_validate(campaign: Option<PathBuf>, config: Option<PathBuf>) -> Result<i32> {
    let config = cli::engine_config(config.as_deref(), false)?;
    let campaign = Campaign::load(campaign.as_deref(), &config.injectable_namespaces)?;
    ScoreConfig::from_env()?;
    println!(
        "ok: {} goals, {} final goals",
        campaign.goals.len(),
        campaign.final_goals.len()
    );
    Ok(exit_codes::OK)
}
