//! The async port to the durable object store.

use async_trait::async_trait;
use thiserror::Error;

use crate::claim::ProjectClaim;
use crate::reference::ProjectReference;
use crate::types::NamespacedName;

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Store error taxonomy.
///
/// `NotFound` is frequently an expected outcome (deleted between trigger and
/// fetch, delete of an already-cleaned-up reference) and callers special-case
/// it via [`StoreError::is_not_found`]. `Conflict` means a write lost the
/// compare-and-swap race and the caller should requeue and re-read.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("object '{id}' not found")]
    NotFound { id: NamespacedName },

    #[error("object '{id}' already exists")]
    AlreadyExists { id: NamespacedName },

    #[error("conflict writing '{id}': stale resource version {observed}")]
    Conflict { id: NamespacedName, observed: u64 },

    #[error("store unavailable: {reason}")]
    Unavailable { reason: String },
}

impl StoreError {
    /// Create a not-found error.
    pub fn not_found(id: NamespacedName) -> Self {
        Self::NotFound { id }
    }

    /// Create an already-exists error.
    pub fn already_exists(id: NamespacedName) -> Self {
        Self::AlreadyExists { id }
    }

    /// Create a conflict error.
    pub fn conflict(id: NamespacedName, observed: u64) -> Self {
        Self::Conflict { id, observed }
    }

    /// Create an unavailable error.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    /// Whether this error means the object does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Durable store for claims and references.
///
/// Implementations must be safe for concurrent use; they are shared across
/// reconciliation workers. Updates are conditional on the object's
/// `resource_version` and return the stored object with the bumped version,
/// which callers adopt as their new observed copy.
#[async_trait]
pub trait ClaimStore: Send + Sync {
    /// Fetch a claim by identity.
    async fn get_claim(&self, id: &NamespacedName) -> Result<ProjectClaim>;

    /// Write back a claim. Fails with `Conflict` when the stored
    /// `resource_version` no longer matches the caller's copy.
    async fn update_claim(&self, claim: &ProjectClaim) -> Result<ProjectClaim>;

    /// Fetch a reference by identity.
    async fn get_reference(&self, id: &NamespacedName) -> Result<ProjectReference>;

    /// Create a reference. Fails with `AlreadyExists` on redelivered creates.
    async fn create_reference(&self, reference: &ProjectReference) -> Result<ProjectReference>;

    /// Write back a reference, compare-and-swap like `update_claim`.
    async fn update_reference(&self, reference: &ProjectReference) -> Result<ProjectReference>;

    /// Delete a reference. `NotFound` means it was already cleaned up.
    async fn delete_reference(&self, id: &NamespacedName) -> Result<()>;

    /// Look up the reference labelled for the given claim, if any.
    async fn find_reference_for_claim(
        &self,
        claim_id: &NamespacedName,
    ) -> Result<Option<ProjectReference>>;
}
