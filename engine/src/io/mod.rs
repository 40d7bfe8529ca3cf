//! Side-effecting helpers: terminal, configuration files and prompt rendering.

pub mod config;
pub mod prompt;
pub mod terminal;
