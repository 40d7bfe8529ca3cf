//! Deterministic, pure logic behind the goal engine.
//!
//! Core modules never touch the terminal. They operate on the in-memory
//! workspace and return verdicts suitable for tests.

pub mod checks;
pub mod filter;
pub mod goal;
pub mod hints;
pub mod workspace;
