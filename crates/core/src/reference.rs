//! The companion reference resource.
//!
//! A [`ProjectReference`] is created by the claim reconciler but provisioned
//! by its own controller; the claim only waits on its readiness and copies
//! the resolved project identifier back. It lives in the operator namespace
//! and carries the claim identity in its labels so redelivered passes adopt
//! the existing reference instead of creating duplicates.

use serde::{Deserialize, Serialize};

use crate::claim::ProjectClaim;
use crate::types::{LegalEntity, NamespacedName, ObjectMeta};

/// Label keys linking a reference back to its claim.
pub const LABEL_CLAIM_NAMESPACE: &str = "claimop.io/claim-namespace";
pub const LABEL_CLAIM_NAME: &str = "claimop.io/claim-name";

/// Namespace the operator creates references in.
pub const REFERENCE_NAMESPACE: &str = "claimop-system";

/// Lifecycle state of a reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReferenceState {
    /// Provisioning in progress.
    Creating,
    /// The external project exists and its identifier is resolved.
    Ready,
    /// Provisioning failed.
    Error,
}

/// Desired state of a reference.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceSpec {
    /// The claim this reference provisions for.
    pub claim_link: NamespacedName,
    pub legal_entity: LegalEntity,
    pub region: String,
}

/// Observed state of a reference, written by its own controller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<ReferenceState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gcp_project_id: Option<String>,
}

/// The companion resource tracking the actual provisioning job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectReference {
    pub meta: ObjectMeta,
    pub spec: ReferenceSpec,
    #[serde(default)]
    pub status: ReferenceStatus,
}

impl ProjectReference {
    /// Build the reference a claim expects to own, named
    /// `<claim-namespace>-<claim-name>` in the operator namespace and
    /// labelled with the claim identity.
    pub fn for_claim(claim: &ProjectClaim) -> Self {
        let claim_id = claim.id();
        let mut meta = ObjectMeta::new(
            REFERENCE_NAMESPACE,
            format!("{}-{}", claim_id.namespace, claim_id.name),
        );
        meta.labels
            .insert(LABEL_CLAIM_NAMESPACE.to_string(), claim_id.namespace.clone());
        meta.labels
            .insert(LABEL_CLAIM_NAME.to_string(), claim_id.name.clone());
        Self {
            meta,
            spec: ReferenceSpec {
                claim_link: claim_id,
                legal_entity: claim.spec.legal_entity.clone(),
                region: claim.spec.region.clone(),
            },
            status: ReferenceStatus::default(),
        }
    }

    /// The namespace-qualified identity of this reference.
    pub fn id(&self) -> NamespacedName {
        self.meta.namespaced_name()
    }

    /// Whether this reference belongs to the given claim, judged by labels.
    pub fn is_owned_by(&self, claim_id: &NamespacedName) -> bool {
        self.meta.labels.get(LABEL_CLAIM_NAMESPACE) == Some(&claim_id.namespace)
            && self.meta.labels.get(LABEL_CLAIM_NAME) == Some(&claim_id.name)
    }

    /// Whether provisioning has completed.
    pub fn is_ready(&self) -> bool {
        self.status.state == Some(ReferenceState::Ready)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claim() -> ProjectClaim {
        ProjectClaim::new(
            ObjectMeta::new("team-a", "claim-1"),
            LegalEntity::new("Acme", "le-1"),
            "us-east1",
        )
    }

    #[test]
    fn reference_name_and_labels_derive_from_claim() {
        let reference = ProjectReference::for_claim(&claim());
        assert_eq!(reference.meta.namespace, REFERENCE_NAMESPACE);
        assert_eq!(reference.meta.name, "team-a-claim-1");
        assert!(reference.is_owned_by(&claim().id()));
    }

    #[test]
    fn readiness_tracks_status_state() {
        let mut reference = ProjectReference::for_claim(&claim());
        assert!(!reference.is_ready());
        reference.status.state = Some(ReferenceState::Creating);
        assert!(!reference.is_ready());
        reference.status.state = Some(ReferenceState::Ready);
        assert!(reference.is_ready());
    }
}
