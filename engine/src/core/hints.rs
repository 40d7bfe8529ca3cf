//! Session-wide allowance of value-revealing hints.

/// Hints a fresh session starts with.
pub const DEFAULT_HINTS: u32 = 4;

/// Depleting hint counter. Never goes below zero and never refills.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HintBudget {
    remaining: u32,
}

impl HintBudget {
    pub fn new(hints: u32) -> Self {
        Self { remaining: hints }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Consume one hint. Returns `false` once the budget is spent.
    pub fn take(&mut self) -> bool {
        match self.remaining.checked_sub(1) {
            Some(left) => {
                self.remaining = left;
                true
            }
            None => false,
        }
    }
}

impl Default for HintBudget {
    fn default() -> Self {
        Self::new(DEFAULT_HINTS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifth_take_is_refused() {
        let mut budget = HintBudget::default();
        for expected in (0..DEFAULT_HINTS).rev() {
            assert!(budget.take());
            assert_eq!(budget.remaining(), expected);
        }
        assert!(!budget.take());
        assert!(!budget.take());
        assert_eq!(budget.remaining(), 0);
    }

    #[test]
    fn empty_budget_never_grants() {
        let mut budget = HintBudget::new(0);
        assert!(!budget.take());
        assert_eq!(budget.remaining(), 0);
    }
}
