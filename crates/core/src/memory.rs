//! In-memory store, the test and embedding backend.

use std::collections::BTreeMap;

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::claim::ProjectClaim;
use crate::reference::ProjectReference;
use crate::store::{ClaimStore, Result, StoreError};
use crate::types::NamespacedName;

use async_trait::async_trait;

/// In-memory [`ClaimStore`] with the same observable semantics as the real
/// store: UID and version stamping on create, compare-and-swap on update,
/// and garbage collection of deletion-marked objects once their finalizer
/// list empties.
#[derive(Debug, Default)]
pub struct MemoryStore {
    claims: RwLock<BTreeMap<NamespacedName, ProjectClaim>>,
    references: RwLock<BTreeMap<NamespacedName, ProjectReference>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a claim, stamping UID and initial resource version.
    pub async fn create_claim(&self, claim: &ProjectClaim) -> Result<ProjectClaim> {
        let id = claim.id();
        let mut claims = self.claims.write().await;
        if claims.contains_key(&id) {
            return Err(StoreError::already_exists(id));
        }
        let mut stored = claim.clone();
        stored.meta.stamp_uid();
        stored.meta.resource_version = 1;
        claims.insert(id, stored.clone());
        Ok(stored)
    }

    /// Mark a claim for deletion, the way the real store reacts to a delete
    /// request against an object holding finalizers. Removes it outright if
    /// no finalizer is held.
    pub async fn mark_claim_deleted(&self, id: &NamespacedName) -> Result<()> {
        let mut claims = self.claims.write().await;
        let Some(claim) = claims.get_mut(id) else {
            return Err(StoreError::not_found(id.clone()));
        };
        if claim.meta.deletion_timestamp.is_none() {
            claim.meta.deletion_timestamp = Some(Utc::now());
            claim.meta.resource_version += 1;
        }
        if claim.meta.finalizers.is_empty() {
            debug!(claim = %id, "removing claim with no finalizers");
            claims.remove(id);
        }
        Ok(())
    }

    /// Number of stored claims. Test visibility.
    pub async fn claim_count(&self) -> usize {
        self.claims.read().await.len()
    }

    /// Number of stored references. Test visibility.
    pub async fn reference_count(&self) -> usize {
        self.references.read().await.len()
    }
}

#[async_trait]
impl ClaimStore for MemoryStore {
    async fn get_claim(&self, id: &NamespacedName) -> Result<ProjectClaim> {
        self.claims
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::not_found(id.clone()))
    }

    async fn update_claim(&self, claim: &ProjectClaim) -> Result<ProjectClaim> {
        let id = claim.id();
        let mut claims = self.claims.write().await;
        let Some(stored) = claims.get(&id) else {
            return Err(StoreError::not_found(id));
        };
        if stored.meta.resource_version != claim.meta.resource_version {
            return Err(StoreError::conflict(id, claim.meta.resource_version));
        }
        let mut updated = claim.clone();
        updated.meta.resource_version += 1;
        if updated.meta.is_deletion_requested() && updated.meta.finalizers.is_empty() {
            // Last finalizer released: the store garbage-collects the object.
            debug!(claim = %id, "garbage collecting finalized claim");
            claims.remove(&id);
        } else {
            claims.insert(id, updated.clone());
        }
        Ok(updated)
    }

    async fn get_reference(&self, id: &NamespacedName) -> Result<ProjectReference> {
        self.references
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::not_found(id.clone()))
    }

    async fn create_reference(&self, reference: &ProjectReference) -> Result<ProjectReference> {
        let id = reference.id();
        let mut references = self.references.write().await;
        if references.contains_key(&id) {
            return Err(StoreError::already_exists(id));
        }
        let mut stored = reference.clone();
        stored.meta.stamp_uid();
        stored.meta.resource_version = 1;
        references.insert(id, stored.clone());
        Ok(stored)
    }

    async fn update_reference(&self, reference: &ProjectReference) -> Result<ProjectReference> {
        let id = reference.id();
        let mut references = self.references.write().await;
        let Some(stored) = references.get(&id) else {
            return Err(StoreError::not_found(id));
        };
        if stored.meta.resource_version != reference.meta.resource_version {
            return Err(StoreError::conflict(id, reference.meta.resource_version));
        }
        let mut updated = reference.clone();
        updated.meta.resource_version += 1;
        references.insert(id, updated.clone());
        Ok(updated)
    }

    async fn delete_reference(&self, id: &NamespacedName) -> Result<()> {
        let mut references = self.references.write().await;
        if references.remove(id).is_none() {
            return Err(StoreError::not_found(id.clone()));
        }
        Ok(())
    }

    async fn find_reference_for_claim(
        &self,
        claim_id: &NamespacedName,
    ) -> Result<Option<ProjectReference>> {
        let references = self.references.read().await;
        Ok(references
            .values()
            .find(|r| r.is_owned_by(claim_id))
            .cloned())
    }
}
