//! Fixed-order step execution and outcome mapping.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::adapter::{ClaimAdapter, OPERATION_ORDER};
use crate::error::Result;

/// Scheduling directive returned to the watch host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileDirective {
    /// Whether the host should invoke reconciliation again.
    pub requeue: bool,
    /// Delay before the next invocation; zero means "as soon as possible".
    pub requeue_after: Duration,
}

impl ReconcileDirective {
    /// The claim is converged for this pass; wait for the next external
    /// change.
    pub fn done() -> Self {
        Self::default()
    }

    /// Retry after the given delay.
    pub fn requeue_after(delay: Duration) -> Self {
        Self {
            requeue: true,
            requeue_after: delay,
        }
    }
}

/// Run the eight convergence operations strictly in order.
///
/// Stops at the first operation that fails, requests a requeue, or cancels;
/// no later operation is invoked. The outcome maps to a directive: an error
/// propagates (the host requeues immediately), a requeue becomes a delayed
/// retry, and a cancel or a fully-continuing pass both mean "done".
pub async fn run_pipeline(adapter: &mut dyn ClaimAdapter) -> Result<ReconcileDirective> {
    for operation in OPERATION_ORDER {
        let result = adapter.execute(operation).await?;
        if result.requeue_request {
            debug!(
                operation = operation.name(),
                delay_ms = result.requeue_delay.as_millis() as u64,
                "operation requested requeue"
            );
            return Ok(ReconcileDirective::requeue_after(result.requeue_delay));
        }
        if result.cancel_request {
            debug!(operation = operation.name(), "operation cancelled the pass");
            return Ok(ReconcileDirective::done());
        }
    }
    Ok(ReconcileDirective::done())
}
