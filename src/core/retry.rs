//! Optimistic concurrency retry protocol
//!
//! Every mutating operation runs the same bounded cycle:
//!
//! ```text
//!            ┌──────────────────────────────────────────┐
//!            ▼                                          │
//!     Attempt(n) ── commit ok ──────────► Success       │
//!        │                                              │
//!        ├── precondition failed ───────► (terminal)    │
//!        │                                              │
//!        └── watch conflict ─┬─ n < max ─► ConflictRetry(n)
//!                            └─ n = max ─► Exhausted(n)
//! ```
//!
//! The budget is a plain number on `RetryPolicy` rather than hidden
//! middleware, so tests can drive the machine to exhaustion directly.

/// Default number of attempts per operation
pub const MAX_RETRIES: u32 = 3;

/// Bound on OCC attempts per operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_RETRIES,
        }
    }
}

impl RetryPolicy {
    /// Create a policy allowing `max_attempts` attempts
    ///
    /// A zero budget would never attempt anything, so it falls back to the
    /// default.
    pub fn new(max_attempts: u32) -> Self {
        if max_attempts == 0 {
            tracing::warn!(
                max_attempts,
                default = MAX_RETRIES,
                "Invalid retry budget, using default"
            );
            return Self::default();
        }
        Self { max_attempts }
    }

    /// Initial state of a fresh cycle
    pub fn start<T>(&self) -> OccState<T> {
        OccState::Attempt(1)
    }

    /// State after attempt `attempt` lost to a conflicting write
    pub fn on_conflict<T>(&self, attempt: u32) -> OccState<T> {
        if attempt < self.max_attempts {
            OccState::ConflictRetry(attempt)
        } else {
            OccState::Exhausted(attempt)
        }
    }
}

/// States of one OCC cycle
#[derive(Debug, Clone, PartialEq)]
pub enum OccState<T> {
    /// Run attempt number `n` (1-based): watch, read, decide, commit
    Attempt(u32),
    /// Attempt `n` hit a conflict and another attempt is allowed
    ConflictRetry(u32),
    /// Committed with this result
    Success(T),
    /// Every attempt hit a conflict; carries the number of attempts made
    Exhausted(u32),
}

impl<T> OccState<T> {
    /// Advance out of `ConflictRetry`; other states are returned unchanged
    pub fn retry(self) -> Self {
        match self {
            OccState::ConflictRetry(n) => OccState::Attempt(n + 1),
            other => other,
        }
    }

    /// Whether the cycle has finished
    pub fn is_terminal(&self) -> bool {
        matches!(self, OccState::Success(_) | OccState::Exhausted(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_default_budget() {
        assert_eq!(RetryPolicy::default().max_attempts, 3);
    }

    #[rstest]
    #[case::zero_falls_back(0, MAX_RETRIES)]
    #[case::one(1, 1)]
    #[case::custom(7, 7)]
    fn test_new(#[case] requested: u32, #[case] expected: u32) {
        assert_eq!(RetryPolicy::new(requested).max_attempts, expected);
    }

    #[rstest]
    #[case::first_attempt(1, OccState::ConflictRetry(1))]
    #[case::second_attempt(2, OccState::ConflictRetry(2))]
    #[case::last_attempt(3, OccState::Exhausted(3))]
    fn test_on_conflict(#[case] attempt: u32, #[case] expected: OccState<()>) {
        assert_eq!(RetryPolicy::default().on_conflict::<()>(attempt), expected);
    }

    #[test]
    fn test_conflict_on_every_attempt_exhausts_after_budget() {
        let policy = RetryPolicy::default();
        let mut state: OccState<()> = policy.start();
        let mut attempts = 0;

        while !state.is_terminal() {
            state = match state {
                OccState::Attempt(n) => {
                    attempts += 1;
                    policy.on_conflict(n)
                }
                other => other.retry(),
            };
        }

        assert_eq!(state, OccState::Exhausted(3));
        assert_eq!(attempts, 3);
    }

    #[rstest]
    #[case::attempt(OccState::Attempt(2), OccState::Attempt(2))]
    #[case::conflict(OccState::ConflictRetry(2), OccState::Attempt(3))]
    #[case::success(OccState::Success(5), OccState::Success(5))]
    #[case::exhausted(OccState::Exhausted(3), OccState::Exhausted(3))]
    fn test_retry_transition(#[case] state: OccState<i32>, #[case] expected: OccState<i32>) {
        assert_eq!(state.retry(), expected);
    }
}
