//! Substring blacklist applied before any submission is evaluated.
//!
//! This is a narrow safety net, not a sandbox: it only looks for fixed tokens
//! anywhere in the raw text.

pub const DEFAULT_BLOCKED_TOKENS: [&str; 3] = ["import", "open", ";"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionFilter {
    blocked: Vec<String>,
}

impl SubmissionFilter {
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            blocked: tokens.into_iter().map(Into::into).collect(),
        }
    }

    /// First blocked token occurring in `submission`.
    pub fn blocked_token(&self, submission: &str) -> Option<&str> {
        self.blocked
            .iter()
            .find(|token| submission.contains(token.as_str()))
            .map(String::as_str)
    }
}

impl Default for SubmissionFilter {
    fn default() -> Self {
        Self::new(DEFAULT_BLOCKED_TOKENS)
    }
}
