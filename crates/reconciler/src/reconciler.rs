//! Reconciliation entry point.

use std::sync::Arc;
use std::time::Duration;

use claimop_core::{ClaimStore, NamespacedName};
use tracing::{debug, info, warn};

use crate::adapter::ClaimAdapter;
use crate::claim_adapter::ProjectClaimAdapter;
use crate::condition::{ConditionManager, RECONCILE_ERROR_REASON};
use crate::error::Result;
use crate::pipeline::{run_pipeline, ReconcileDirective};

/// Configuration for the claim reconciler.
#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    /// Requeue delay while waiting for the companion reference to become
    /// ready.
    pub reference_wait_delay: Duration,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            reference_wait_delay: Duration::from_secs(5),
        }
    }
}

/// Entry point invoked by the watch host, once per observed claim change.
///
/// Safe to invoke repeatedly; the host serializes passes per claim identity
/// while passes for different claims share only the store client.
pub struct ClaimReconciler {
    store: Arc<dyn ClaimStore>,
    config: ReconcilerConfig,
}

impl ClaimReconciler {
    /// Create a new reconciler around a shared store client.
    pub fn new(store: Arc<dyn ClaimStore>, config: ReconcilerConfig) -> Self {
        Self { store, config }
    }

    /// Get the configuration.
    pub fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    /// Converge the named claim one pass and return the scheduling
    /// directive.
    ///
    /// A vanished claim is success: ownership-based cleanup already applies
    /// and there is nothing left to do. Any pipeline error is recorded as a
    /// status condition under [`RECONCILE_ERROR_REASON`] and still returned,
    /// so the host backs off and retries.
    ///
    /// # Errors
    ///
    /// Returns store errors from the initial fetch (other than not-found)
    /// and the first error any convergence operation surfaces.
    pub async fn reconcile(&self, id: &NamespacedName) -> Result<ReconcileDirective> {
        debug!(claim = %id, "starting reconciliation pass");
        let claim = match self.store.get_claim(id).await {
            Ok(claim) => claim,
            Err(err) if err.is_not_found() => {
                // Deleted after the change that triggered this pass.
                debug!(claim = %id, "claim gone, nothing to reconcile");
                return Ok(ReconcileDirective::done());
            }
            Err(err) => return Err(err.into()),
        };

        let mut adapter = ProjectClaimAdapter::new(
            claim,
            Arc::clone(&self.store),
            ConditionManager::new(),
            self.config.clone(),
        );

        match run_pipeline(&mut adapter).await {
            Ok(directive) => {
                info!(
                    claim = %id,
                    requeue = directive.requeue,
                    "reconciliation pass complete"
                );
                Ok(directive)
            }
            Err(err) => {
                if let Err(record_err) = adapter
                    .set_claim_condition(RECONCILE_ERROR_REASON, Some(&err))
                    .await
                {
                    // The original error still drives scheduling; losing the
                    // condition write only costs diagnostics.
                    warn!(claim = %id, error = %record_err, "failed to record error condition");
                }
                warn!(claim = %id, error = %err, "reconciliation pass failed");
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use claimop_core::{ProjectClaim, ProjectReference, StoreError};

    use super::*;
    use crate::error::Error;

    /// Store double whose fetches always fail transiently.
    struct UnavailableStore;

    #[async_trait]
    impl ClaimStore for UnavailableStore {
        async fn get_claim(
            &self,
            _id: &NamespacedName,
        ) -> claimop_core::Result<ProjectClaim> {
            Err(StoreError::unavailable("connection refused"))
        }
        async fn update_claim(
            &self,
            claim: &ProjectClaim,
        ) -> claimop_core::Result<ProjectClaim> {
            Ok(claim.clone())
        }
        async fn get_reference(
            &self,
            id: &NamespacedName,
        ) -> claimop_core::Result<ProjectReference> {
            Err(StoreError::not_found(id.clone()))
        }
        async fn create_reference(
            &self,
            reference: &ProjectReference,
        ) -> claimop_core::Result<ProjectReference> {
            Ok(reference.clone())
        }
        async fn update_reference(
            &self,
            reference: &ProjectReference,
        ) -> claimop_core::Result<ProjectReference> {
            Ok(reference.clone())
        }
        async fn delete_reference(&self, _id: &NamespacedName) -> claimop_core::Result<()> {
            Ok(())
        }
        async fn find_reference_for_claim(
            &self,
            _claim_id: &NamespacedName,
        ) -> claimop_core::Result<Option<ProjectReference>> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn fetch_failure_propagates_without_running_the_pipeline() {
        let reconciler =
            ClaimReconciler::new(Arc::new(UnavailableStore), ReconcilerConfig::default());
        let id = NamespacedName::new("team-a", "claim-1");
        let outcome = reconciler.reconcile(&id).await;
        assert!(matches!(
            outcome,
            Err(Error::Store(StoreError::Unavailable { .. }))
        ));
    }

    #[tokio::test]
    async fn missing_claim_is_success() {
        let store = Arc::new(claimop_core::MemoryStore::new());
        let reconciler = ClaimReconciler::new(store, ReconcilerConfig::default());
        let id = NamespacedName::new("team-a", "no-such-claim");
        let outcome = reconciler.reconcile(&id).await;
        assert_eq!(outcome.ok(), Some(ReconcileDirective::done()));
    }
}
