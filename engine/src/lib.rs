//! Goal verification engine for a Python tutorial game.
//!
//! A learner works through goals by typing single lines of Python at a prompt.
//! The engine decides, goal by goal, whether a submission satisfies the goal:
//!
//! - **[`interp`]**: A small embedded interpreter for the expression and
//!   statement subset learners type.
//! - **[`core`]**: Pure, deterministic logic (workspace, the six checks, goal
//!   definitions, hint budget, submission filter). No terminal I/O.
//! - **[`io`]**: Side-effecting helpers (CRLF terminal, config files, prompt
//!   templates).
//!
//! [`session::GoalEngine`] ties them together into the submission loop.

pub mod core;
pub mod interp;
pub mod io;
pub mod logging;
pub mod session;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
