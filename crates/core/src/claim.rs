//! The project claim resource and its lifecycle states.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{LegalEntity, NamespacedName, ObjectMeta};

/// Lifecycle state of a claim.
///
/// States advance monotonically along
/// `Pending -> Verification -> PendingProject -> Ready`. Any step may move a
/// non-terminal claim to `Error`, and a later successful pass may move past
/// it again; the reconciler re-derives the target state from observed state
/// on every pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClaimState {
    /// Accepted, not yet validated.
    Pending,
    /// Validated, waiting on the companion reference.
    Verification,
    /// Reference linked, external project underway.
    PendingProject,
    /// Terminal: the external project is provisioned.
    Ready,
    /// A step recorded a failure that needs operator attention.
    Error,
}

impl ClaimState {
    /// Check if this is the terminal success state.
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }

    /// Check if a claim in this state has already moved past `Pending`.
    pub fn is_past_pending(&self) -> bool {
        matches!(self, Self::Verification | Self::PendingProject | Self::Ready)
    }
}

impl std::fmt::Display for ClaimState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "Pending",
            Self::Verification => "Verification",
            Self::PendingProject => "PendingProject",
            Self::Ready => "Ready",
            Self::Error => "Error",
        };
        write!(f, "{s}")
    }
}

/// Condition types recorded on a claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionType {
    /// The most recent reconciliation failure.
    Error,
}

/// A status condition: the reason and message of the most recent notable
/// outcome, kept for operator diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimCondition {
    pub condition_type: ConditionType,
    /// Whether the condition currently holds.
    pub status: bool,
    pub reason: String,
    pub message: String,
    /// Last time the condition payload changed.
    pub last_transition_time: DateTime<Utc>,
    /// Last time the condition was observed, changed or not.
    pub last_probe_time: DateTime<Utc>,
}

/// Desired state of a claim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimSpec {
    pub legal_entity: LegalEntity,
    pub gcp_credential_secret: NamespacedName,
    pub region: String,
    /// External project identifier. Write-once: set by the reconciler when
    /// the reference resolves it, never overwritten afterwards.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gcp_project_id: Option<String>,
    /// Link to the companion reference resource, once created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_reference_link: Option<NamespacedName>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub availability_zones: Vec<String>,
}

/// Observed state of a claim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClaimStatus {
    #[serde(default)]
    pub conditions: Vec<ClaimCondition>,
    /// `None` until the first reconciliation pass initializes the claim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<ClaimState>,
}

impl ClaimStatus {
    /// Get the condition of the given type, if recorded.
    pub fn condition(&self, condition_type: ConditionType) -> Option<&ClaimCondition> {
        self.conditions
            .iter()
            .find(|c| c.condition_type == condition_type)
    }
}

/// A declarative request for an externally provisioned project.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectClaim {
    pub meta: ObjectMeta,
    pub spec: ClaimSpec,
    #[serde(default)]
    pub status: ClaimStatus,
}

impl ProjectClaim {
    /// Create a claim with the minimal spec fields.
    pub fn new(meta: ObjectMeta, legal_entity: LegalEntity, region: impl Into<String>) -> Self {
        Self {
            meta,
            spec: ClaimSpec {
                legal_entity,
                region: region.into(),
                ..ClaimSpec::default()
            },
            status: ClaimStatus::default(),
        }
    }

    /// The namespace-qualified identity of this claim.
    pub fn id(&self) -> NamespacedName {
        self.meta.namespaced_name()
    }
}
