//! The capability contract a reconciliation pass runs against.

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::result::OperationResult;

/// Named convergence operations, in pipeline order.
///
/// The order encodes dependency and priority: deletion intent is checked
/// before anything else, state writes precede the business logic that relies
/// on them, and the terminal state advance runs last. [`OPERATION_ORDER`] is
/// the single source of truth for that order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    DeletionProcessed,
    Initialized,
    RegionSupported,
    StatePending,
    ReferenceExists,
    ReferenceLink,
    Finalizer,
    StatePendingProject,
}

/// The fixed execution order of a reconciliation pass.
pub const OPERATION_ORDER: [Operation; 8] = [
    Operation::DeletionProcessed,
    Operation::Initialized,
    Operation::RegionSupported,
    Operation::StatePending,
    Operation::ReferenceExists,
    Operation::ReferenceLink,
    Operation::Finalizer,
    Operation::StatePendingProject,
];

impl Operation {
    /// Human-readable step name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::DeletionProcessed => "ensure_deletion_processed",
            Self::Initialized => "ensure_initialized",
            Self::RegionSupported => "ensure_region_supported",
            Self::StatePending => "ensure_state_pending",
            Self::ReferenceExists => "ensure_reference_exists",
            Self::ReferenceLink => "ensure_reference_link",
            Self::Finalizer => "ensure_finalizer",
            Self::StatePendingProject => "ensure_state_pending_project",
        }
    }
}

/// One idempotent convergence operation per lifecycle concern.
///
/// Every operation must be safe to call twice with no external state change
/// in between: redelivery is expected, and no in-memory state survives
/// between passes. Operations mutate the adapter's claim copy and persist
/// through the store as a side effect; the returned [`OperationResult`]
/// carries only the control-flow signal.
#[async_trait]
pub trait ClaimAdapter: Send {
    /// Highest priority: intercept deletion intent, finalize external
    /// resources, release the finalizer, and cancel the pass.
    async fn ensure_deletion_processed(&mut self) -> Result<OperationResult>;

    /// Default empty status fields; requeue after a persisted write.
    async fn ensure_initialized(&mut self) -> Result<OperationResult>;

    /// Validate the requested region against the static allow-list.
    async fn ensure_region_supported(&mut self) -> Result<OperationResult>;

    /// Advance a claim that has not moved past `Pending` yet.
    async fn ensure_state_pending(&mut self) -> Result<OperationResult>;

    /// Create or adopt the companion reference; requeue until it is ready.
    async fn ensure_reference_exists(&mut self) -> Result<OperationResult>;

    /// Record the reference link and the resolved project id (write-once).
    async fn ensure_reference_link(&mut self) -> Result<OperationResult>;

    /// Hold the deletion finalizer so `ensure_deletion_processed` can later
    /// intercept removal.
    async fn ensure_finalizer(&mut self) -> Result<OperationResult>;

    /// Terminal state advance of a successful pass.
    async fn ensure_state_pending_project(&mut self) -> Result<OperationResult>;

    /// Record `err` as a status condition under `reason`. A no-op when
    /// `err` is `None`; never replaces the original pipeline error.
    async fn set_claim_condition(&mut self, reason: &str, err: Option<&Error>) -> Result<()>;

    /// Dispatch a named operation. The pipeline drives passes exclusively
    /// through this, so instrumented test adapters observe every call.
    async fn execute(&mut self, operation: Operation) -> Result<OperationResult> {
        match operation {
            Operation::DeletionProcessed => self.ensure_deletion_processed().await,
            Operation::Initialized => self.ensure_initialized().await,
            Operation::RegionSupported => self.ensure_region_supported().await,
            Operation::StatePending => self.ensure_state_pending().await,
            Operation::ReferenceExists => self.ensure_reference_exists().await,
            Operation::ReferenceLink => self.ensure_reference_link().await,
            Operation::Finalizer => self.ensure_finalizer().await,
            Operation::StatePendingProject => self.ensure_state_pending_project().await,
        }
    }
}
