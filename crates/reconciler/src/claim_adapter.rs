//! Store-backed adapter implementing the convergence operations.

use std::sync::Arc;

use async_trait::async_trait;
use claimop_core::{
    ClaimState, ClaimStore, ProjectClaim, ProjectReference, StoreError, CLAIM_FINALIZER,
};
use tracing::{debug, info, warn};

use crate::adapter::ClaimAdapter;
use crate::condition::ConditionManager;
use crate::error::{Error, Result};
use crate::reconciler::ReconcilerConfig;
use crate::region;
use crate::result::OperationResult;

/// Per-pass adapter bound to one fetched claim, the shared store client and
/// a condition manager.
///
/// Holds the claim copy the pass operates on. Every persisted write goes
/// through [`Self::persist_claim`], which adopts the store's returned copy
/// (bumped resource version) so later writes in the same pass stay
/// compare-and-swap clean; operations that write still requeue so the next
/// pass re-reads fresh state rather than trusting the in-memory copy.
pub struct ProjectClaimAdapter {
    claim: ProjectClaim,
    store: Arc<dyn ClaimStore>,
    conditions: ConditionManager,
    config: ReconcilerConfig,
}

impl ProjectClaimAdapter {
    /// Bind an adapter to a fetched claim.
    pub fn new(
        claim: ProjectClaim,
        store: Arc<dyn ClaimStore>,
        conditions: ConditionManager,
        config: ReconcilerConfig,
    ) -> Self {
        Self {
            claim,
            store,
            conditions,
            config,
        }
    }

    /// The claim copy this pass operates on.
    pub fn claim(&self) -> &ProjectClaim {
        &self.claim
    }

    /// Write the claim back and adopt the stored copy.
    async fn persist_claim(&mut self) -> Result<()> {
        let updated = self.store.update_claim(&self.claim).await?;
        self.claim = updated;
        Ok(())
    }

    /// Look up the companion reference: through the recorded link if one
    /// exists, otherwise by claim labels.
    async fn lookup_reference(&self) -> Result<Option<ProjectReference>> {
        if let Some(link) = &self.claim.spec.project_reference_link {
            return match self.store.get_reference(link).await {
                Ok(reference) => Ok(Some(reference)),
                Err(err) if err.is_not_found() => Ok(None),
                Err(err) => Err(err.into()),
            };
        }
        Ok(self.store.find_reference_for_claim(&self.claim.id()).await?)
    }

    /// Delete the companion reference if it still exists.
    async fn finalize_external_resources(&self) -> Result<()> {
        let Some(reference) = self.lookup_reference().await? else {
            return Ok(());
        };
        match self.store.delete_reference(&reference.id()).await {
            Ok(()) => {
                info!(claim = %self.claim.id(), reference = %reference.id(), "deleted companion reference");
                Ok(())
            }
            // Already cleaned up, possibly by a redelivered pass.
            Err(err) if err.is_not_found() => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    fn record_link(&mut self, reference: &ProjectReference) -> bool {
        let mut changed = false;
        if self.claim.spec.project_reference_link.is_none() {
            self.claim.spec.project_reference_link = Some(reference.id());
            changed = true;
        }
        let recorded = self.claim.spec.gcp_project_id.clone();
        let resolved = reference.status.gcp_project_id.clone();
        match (recorded, resolved) {
            (None, Some(resolved)) => {
                self.claim.spec.gcp_project_id = Some(resolved);
                changed = true;
            }
            (Some(recorded), Some(resolved)) if recorded != resolved => {
                // Write-once: the recorded id is the source of truth.
                warn!(
                    claim = %self.claim.id(),
                    recorded = %recorded,
                    resolved = %resolved,
                    "reference reports a different project id; keeping the recorded one"
                );
            }
            _ => {}
        }
        changed
    }
}

#[async_trait]
impl ClaimAdapter for ProjectClaimAdapter {
    async fn ensure_deletion_processed(&mut self) -> Result<OperationResult> {
        if !self.claim.meta.is_deletion_requested() {
            return Ok(OperationResult::continue_processing());
        }
        if self.claim.meta.has_finalizer(CLAIM_FINALIZER) {
            self.finalize_external_resources().await?;
            self.claim.meta.remove_finalizer(CLAIM_FINALIZER);
            // Releasing the last finalizer hands the claim to the store's
            // garbage collection.
            self.persist_claim().await?;
            info!(claim = %self.claim.id(), "finalized claim, released finalizer");
        }
        Ok(OperationResult::stop_processing())
    }

    async fn ensure_initialized(&mut self) -> Result<OperationResult> {
        if self.claim.status.state.is_some() {
            return Ok(OperationResult::continue_processing());
        }
        self.claim.status.state = Some(ClaimState::Pending);
        self.persist_claim().await?;
        debug!(claim = %self.claim.id(), "initialized claim status");
        Ok(OperationResult::requeue())
    }

    async fn ensure_region_supported(&mut self) -> Result<OperationResult> {
        if region::is_supported(&self.claim.spec.region) {
            return Ok(OperationResult::continue_processing());
        }
        let requested = self.claim.spec.region.clone();
        self.claim.status.state = Some(ClaimState::Error);
        self.persist_claim().await?;
        warn!(claim = %self.claim.id(), region = %requested, "requested region is not supported");
        Err(Error::region_not_supported(requested))
    }

    async fn ensure_state_pending(&mut self) -> Result<OperationResult> {
        if self
            .claim
            .status
            .state
            .is_some_and(|state| state.is_past_pending())
        {
            return Ok(OperationResult::continue_processing());
        }
        self.claim.status.state = Some(ClaimState::Verification);
        self.persist_claim().await?;
        debug!(claim = %self.claim.id(), "claim advanced to Verification");
        Ok(OperationResult::requeue())
    }

    async fn ensure_reference_exists(&mut self) -> Result<OperationResult> {
        let reference = match self.lookup_reference().await? {
            Some(reference) => reference,
            None => {
                let reference = ProjectReference::for_claim(&self.claim);
                match self.store.create_reference(&reference).await {
                    Ok(created) => {
                        info!(claim = %self.claim.id(), reference = %created.id(), "created companion reference");
                        created
                    }
                    // Lost a create race against a redelivered pass; the
                    // label lookup adopts it next time around.
                    Err(StoreError::AlreadyExists { .. }) => {
                        return Ok(OperationResult::requeue())
                    }
                    Err(err) => return Err(err.into()),
                }
            }
        };
        if !reference.is_ready() {
            debug!(claim = %self.claim.id(), reference = %reference.id(), "waiting for reference to become ready");
            return Ok(OperationResult::requeue_after(
                self.config.reference_wait_delay,
            ));
        }
        Ok(OperationResult::continue_processing())
    }

    async fn ensure_reference_link(&mut self) -> Result<OperationResult> {
        if self.claim.spec.project_reference_link.is_some()
            && self.claim.spec.gcp_project_id.is_some()
        {
            return Ok(OperationResult::continue_processing());
        }
        let Some(reference) = self.lookup_reference().await? else {
            // Vanished between steps; re-run the existence step next pass.
            return Ok(OperationResult::requeue());
        };
        if reference.status.gcp_project_id.is_none() {
            // Ready without a resolved id is a reference-controller gap;
            // poll rather than fail.
            return Ok(OperationResult::requeue_after(
                self.config.reference_wait_delay,
            ));
        }
        if self.record_link(&reference) {
            self.persist_claim().await?;
            info!(
                claim = %self.claim.id(),
                project_id = self.claim.spec.gcp_project_id.as_deref().unwrap_or(""),
                "recorded reference link and project id"
            );
            return Ok(OperationResult::requeue());
        }
        Ok(OperationResult::continue_processing())
    }

    async fn ensure_finalizer(&mut self) -> Result<OperationResult> {
        if self.claim.meta.has_finalizer(CLAIM_FINALIZER) {
            return Ok(OperationResult::continue_processing());
        }
        self.claim.meta.add_finalizer(CLAIM_FINALIZER);
        self.persist_claim().await?;
        debug!(claim = %self.claim.id(), "added deletion finalizer");
        Ok(OperationResult::requeue())
    }

    async fn ensure_state_pending_project(&mut self) -> Result<OperationResult> {
        match self.claim.status.state {
            Some(ClaimState::Ready) => Ok(OperationResult::continue_processing()),
            Some(ClaimState::PendingProject) => {
                // The reference readiness gate already passed this pass.
                self.claim.status.state = Some(ClaimState::Ready);
                self.persist_claim().await?;
                info!(claim = %self.claim.id(), "claim is ready");
                Ok(OperationResult::requeue())
            }
            _ => {
                self.claim.status.state = Some(ClaimState::PendingProject);
                self.persist_claim().await?;
                debug!(claim = %self.claim.id(), "claim advanced to PendingProject");
                Ok(OperationResult::requeue())
            }
        }
    }

    async fn set_claim_condition(&mut self, reason: &str, err: Option<&Error>) -> Result<()> {
        let Some(err) = err else {
            return Ok(());
        };
        self.conditions
            .set_condition(&mut self.claim.status.conditions, reason, err.to_string());
        self.persist_claim().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use claimop_core::{LegalEntity, MemoryStore, ObjectMeta, ReferenceState};

    use super::*;

    fn seed_claim(region: &str) -> ProjectClaim {
        ProjectClaim::new(
            ObjectMeta::new("team-a", "claim-1"),
            LegalEntity::new("Acme", "le-1"),
            region,
        )
    }

    async fn adapter_for(
        store: &Arc<MemoryStore>,
        claim: &ProjectClaim,
    ) -> Option<ProjectClaimAdapter> {
        let stored = store.create_claim(claim).await.ok()?;
        Some(ProjectClaimAdapter::new(
            stored,
            Arc::clone(store) as Arc<dyn ClaimStore>,
            ConditionManager::new(),
            ReconcilerConfig::default(),
        ))
    }

    #[tokio::test]
    async fn initialization_defaults_state_and_requeues() {
        let store = Arc::new(MemoryStore::new());
        let Some(mut adapter) = adapter_for(&store, &seed_claim("us-east1")).await else {
            return assert!(false, "seed failed");
        };
        let result = adapter.ensure_initialized().await;
        assert_eq!(result.ok(), Some(OperationResult::requeue()));
        assert_eq!(adapter.claim().status.state, Some(ClaimState::Pending));

        // Second invocation with no external change: pure continue.
        let result = adapter.ensure_initialized().await;
        assert_eq!(result.ok(), Some(OperationResult::continue_processing()));
    }

    #[tokio::test]
    async fn unsupported_region_sets_error_state_and_fails() {
        let store = Arc::new(MemoryStore::new());
        let Some(mut adapter) = adapter_for(&store, &seed_claim("unsupported-region-1")).await
        else {
            return assert!(false, "seed failed");
        };
        let outcome = adapter.ensure_region_supported().await;
        assert!(matches!(outcome, Err(Error::RegionNotSupported { .. })));
        assert_eq!(adapter.claim().status.state, Some(ClaimState::Error));

        let persisted = store.get_claim(&adapter.claim().id()).await.ok();
        assert_eq!(
            persisted.and_then(|c| c.status.state),
            Some(ClaimState::Error)
        );
    }

    #[tokio::test]
    async fn reference_create_is_idempotent_across_redelivery() {
        let store = Arc::new(MemoryStore::new());
        let Some(mut adapter) = adapter_for(&store, &seed_claim("us-east1")).await else {
            return assert!(false, "seed failed");
        };
        let first = adapter.ensure_reference_exists().await.ok();
        let second = adapter.ensure_reference_exists().await.ok();
        // Both passes requeue while the reference is not ready, and only
        // one reference exists.
        assert!(first.is_some_and(|r| r.requeue_request));
        assert!(second.is_some_and(|r| r.requeue_request));
        assert_eq!(store.reference_count().await, 1);
    }

    #[tokio::test]
    async fn project_id_is_write_once() {
        let store = Arc::new(MemoryStore::new());
        let Some(mut adapter) = adapter_for(&store, &seed_claim("us-east1")).await else {
            return assert!(false, "seed failed");
        };
        let created = adapter.ensure_reference_exists().await;
        assert!(created.is_ok());

        let claim_id = adapter.claim().id();
        let reference = store.find_reference_for_claim(&claim_id).await.ok().flatten();
        let Some(mut reference) = reference else {
            return assert!(false, "reference missing");
        };
        reference.status.state = Some(ReferenceState::Ready);
        reference.status.gcp_project_id = Some("gcp-project-x".to_string());
        assert!(store.update_reference(&reference).await.is_ok());

        let linked = adapter.ensure_reference_link().await.ok();
        assert!(linked.is_some_and(|r| r.requeue_request));
        assert_eq!(
            adapter.claim().spec.gcp_project_id.as_deref(),
            Some("gcp-project-x")
        );

        // The reference now claims a different id; the recorded one stays.
        let refreshed = store.get_reference(&reference.id()).await.ok();
        let Some(mut refreshed) = refreshed else {
            return assert!(false, "reference missing");
        };
        refreshed.status.gcp_project_id = Some("gcp-project-y".to_string());
        assert!(store.update_reference(&refreshed).await.is_ok());

        let relinked = adapter.ensure_reference_link().await.ok();
        assert!(relinked.is_some_and(|r| r.is_continue()));
        assert_eq!(
            adapter.claim().spec.gcp_project_id.as_deref(),
            Some("gcp-project-x")
        );
    }

    #[tokio::test]
    async fn deletion_with_finalizer_cleans_up_and_cancels() {
        let store = Arc::new(MemoryStore::new());
        let mut seed = seed_claim("us-east1");
        seed.meta.add_finalizer(CLAIM_FINALIZER);
        let Some(mut adapter) = adapter_for(&store, &seed).await else {
            return assert!(false, "seed failed");
        };
        let created = adapter.ensure_reference_exists().await;
        assert!(created.is_ok());
        assert_eq!(store.reference_count().await, 1);

        // Mark deletion and hand the adapter the fresh copy, the way a new
        // pass would observe it.
        assert!(store.mark_claim_deleted(&seed.id()).await.is_ok());
        let fresh = store.get_claim(&seed.id()).await.ok();
        let Some(fresh) = fresh else {
            return assert!(false, "claim missing");
        };
        let mut adapter = ProjectClaimAdapter::new(
            fresh,
            Arc::clone(&store) as Arc<dyn ClaimStore>,
            ConditionManager::new(),
            ReconcilerConfig::default(),
        );

        let result = adapter.ensure_deletion_processed().await;
        assert_eq!(result.ok(), Some(OperationResult::stop_processing()));
        assert_eq!(store.reference_count().await, 0);
        assert_eq!(store.claim_count().await, 0);
    }

    #[tokio::test]
    async fn deletion_without_finalizer_cancels_without_touching_the_store() {
        let store = Arc::new(MemoryStore::new());
        let mut marked = seed_claim("us-east1");
        marked.meta.deletion_timestamp = Some(chrono::Utc::now());
        let mut adapter = ProjectClaimAdapter::new(
            marked,
            Arc::clone(&store) as Arc<dyn ClaimStore>,
            ConditionManager::new(),
            ReconcilerConfig::default(),
        );

        // No finalizer held: nothing to clean up, nothing to write.
        let result = adapter.ensure_deletion_processed().await;
        assert_eq!(result.ok(), Some(OperationResult::stop_processing()));
        assert_eq!(store.claim_count().await, 0);
        assert_eq!(store.reference_count().await, 0);

        // The whole pass is that one cancelled step: done, no requeue.
        let directive = crate::pipeline::run_pipeline(&mut adapter).await;
        assert_eq!(
            directive.ok(),
            Some(crate::pipeline::ReconcileDirective::done())
        );
    }

    #[tokio::test]
    async fn deletion_without_intent_continues() {
        let store = Arc::new(MemoryStore::new());
        let Some(mut adapter) = adapter_for(&store, &seed_claim("us-east1")).await else {
            return assert!(false, "seed failed");
        };
        let result = adapter.ensure_deletion_processed().await;
        assert_eq!(result.ok(), Some(OperationResult::continue_processing()));
    }

    #[tokio::test]
    async fn condition_recording_is_a_noop_without_error() {
        let store = Arc::new(MemoryStore::new());
        let Some(mut adapter) = adapter_for(&store, &seed_claim("us-east1")).await else {
            return assert!(false, "seed failed");
        };
        let recorded = adapter.set_claim_condition("ReconcileError", None).await;
        assert!(recorded.is_ok());
        assert!(adapter.claim().status.conditions.is_empty());

        let err = Error::region_not_supported("unsupported-region-1");
        let recorded = adapter
            .set_claim_condition("ReconcileError", Some(&err))
            .await;
        assert!(recorded.is_ok());
        let message = adapter
            .claim()
            .status
            .conditions
            .first()
            .map(|c| c.message.clone());
        assert!(message.is_some_and(|m| m.contains("unsupported-region-1")));
    }
}
