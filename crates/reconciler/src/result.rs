//! Per-step outcome type.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Outcome of one convergence step.
///
/// Exactly one terminal signal applies: a step error (carried separately in
/// the `Result`), `requeue_request`, or `cancel_request`. An all-false value
/// means "continue with the next step". Produced and consumed within a
/// single pass, never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationResult {
    /// Stop the pass and schedule a retry after `requeue_delay`.
    pub requeue_request: bool,
    /// Delay before the retry; zero means "as soon as possible".
    pub requeue_delay: Duration,
    /// Stop the pass without error and without retry.
    pub cancel_request: bool,
}

impl OperationResult {
    /// Proceed to the next step.
    pub fn continue_processing() -> Self {
        Self::default()
    }

    /// Stop and retry as soon as possible.
    pub fn requeue() -> Self {
        Self {
            requeue_request: true,
            ..Self::default()
        }
    }

    /// Stop and retry after the given delay.
    pub fn requeue_after(delay: Duration) -> Self {
        Self {
            requeue_request: true,
            requeue_delay: delay,
            ..Self::default()
        }
    }

    /// Stop without error and without retry.
    pub fn stop_processing() -> Self {
        Self {
            cancel_request: true,
            ..Self::default()
        }
    }

    /// Whether the pipeline should move on to the next step.
    pub fn is_continue(&self) -> bool {
        !self.requeue_request && !self.cancel_request
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn continue_is_the_default() {
        assert!(OperationResult::continue_processing().is_continue());
        assert_eq!(OperationResult::default(), OperationResult::continue_processing());
    }

    #[test]
    fn requeue_carries_delay() {
        let result = OperationResult::requeue_after(Duration::from_secs(5));
        assert!(result.requeue_request);
        assert_eq!(result.requeue_delay, Duration::from_secs(5));
        assert!(!result.is_continue());
    }

    #[test]
    fn zero_delay_requeue_means_asap() {
        let result = OperationResult::requeue();
        assert!(result.requeue_request);
        assert_eq!(result.requeue_delay, Duration::ZERO);
    }

    #[test]
    fn stop_is_not_continue() {
        let result = OperationResult::stop_processing();
        assert!(result.cancel_request);
        assert!(!result.is_continue());
    }
}
