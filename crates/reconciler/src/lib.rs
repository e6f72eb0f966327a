//! Level-triggered reconciliation for project claims.
//!
//! This crate drives a [`claimop_core::ProjectClaim`] toward its provisioned
//! state through a fixed-order pipeline of idempotent convergence steps:
//!
//! 1. Deletion intent (absolute priority)
//! 2. Status initialization
//! 3. Region validation
//! 4. Lifecycle advance past `Pending`
//! 5. Companion reference existence and readiness
//! 6. Reference link and project id recording (write-once)
//! 7. Deletion finalizer
//! 8. Terminal lifecycle advance
//!
//! Every step re-derives its action from the currently persisted state; the
//! same claim may be reconciled arbitrarily many times, including after
//! partial success. The first step that fails, requests a requeue, or
//! cancels stops the pass, and the outcome maps to a scheduling directive
//! for the watch host.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use claimop_core::MemoryStore;
//! use claimop_reconciler::{ClaimReconciler, ReconcilerConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = Arc::new(MemoryStore::new());
//!     let reconciler = ClaimReconciler::new(store, ReconcilerConfig::default());
//!     // invoked by the watch host per claim identity:
//!     // let directive = reconciler.reconcile(&claim_id).await?;
//! }
//! ```

#![forbid(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![forbid(clippy::panic)]

pub mod adapter;
pub mod claim_adapter;
pub mod condition;
pub mod error;
pub mod pipeline;
pub mod reconciler;
pub mod region;
pub mod result;

pub use adapter::{ClaimAdapter, Operation, OPERATION_ORDER};
pub use claim_adapter::ProjectClaimAdapter;
pub use condition::{ConditionManager, RECONCILE_ERROR_REASON};
pub use error::{Error, Result};
pub use pipeline::{run_pipeline, ReconcileDirective};
pub use reconciler::{ClaimReconciler, ReconcilerConfig};
pub use region::SUPPORTED_REGIONS;
pub use result::OperationResult;
