//! Stable exit codes for trypy CLI commands.

/// Command succeeded or the learner finished every goal.
pub const OK: i32 = 0;
/// Invalid configuration, campaign or scoring environment.
pub const INVALID: i32 = 1;
/// The learner left before finishing (interrupt, end of input or `exit()`).
pub const ABORTED: i32 = 2;
