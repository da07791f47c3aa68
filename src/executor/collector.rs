use parking_lot::Mutex;

use crate::models::RequestOutcome;

/// Append-only store of every outcome produced during a run.
#[derive(Debug, Default)]
pub struct ResultCollector {
    outcomes: Mutex<Vec<RequestOutcome>>,
}

impl ResultCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, outcome: RequestOutcome) {
        self.outcomes.lock().push(outcome);
    }

    pub fn len(&self) -> usize {
        self.outcomes.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Runs `f` over the full history while holding the lock.
    pub fn with_outcomes<T>(&self, f: impl FnOnce(&[RequestOutcome]) -> T) -> T {
        let outcomes = self.outcomes.lock();
        f(&outcomes)
    }

    /// Runs `f` over the outcomes appended at or after `offset`. The lock is
    /// held only for that slice, so `f` should copy out and return quickly.
    pub fn with_tail<T>(&self, offset: usize, f: impl FnOnce(&[RequestOutcome]) -> T) -> T {
        let outcomes = self.outcomes.lock();
        let start = offset.min(outcomes.len());
        f(&outcomes[start..])
    }

    /// The most recent `cap` outcomes, oldest first.
    pub fn recent(&self, cap: usize) -> Vec<RequestOutcome> {
        let outcomes = self.outcomes.lock();
        let start = outcomes.len().saturating_sub(cap);
        outcomes[start..].to_vec()
    }
}
