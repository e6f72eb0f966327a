//! Data model and store port for project claim provisioning.
//!
//! This crate holds the persisted shapes the reconciler converges on:
//!
//! - [`ProjectClaim`] - the declarative request for an external project
//! - [`ProjectReference`] - the companion resource that tracks the actual
//!   provisioning job, independently lifecycled
//! - [`ClaimStore`] - the async port to the durable object store, with
//!   compare-and-swap update semantics
//! - [`MemoryStore`] - an in-memory store used by tests and embedding hosts
//!
//! Nothing in here talks to the external provisioning system; claims and
//! references are plain serde-serializable records plus the invariants the
//! reconciler relies on (write-once project id, finalizer-gated deletion).

#![forbid(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![forbid(clippy::panic)]

pub mod claim;
pub mod memory;
pub mod reference;
pub mod store;
pub mod types;

pub use claim::{ClaimCondition, ClaimSpec, ClaimState, ClaimStatus, ConditionType, ProjectClaim};
pub use memory::MemoryStore;
pub use reference::{ProjectReference, ReferenceSpec, ReferenceState, ReferenceStatus};
pub use store::{ClaimStore, Result, StoreError};
pub use types::{LegalEntity, NamespacedName, ObjectMeta, CLAIM_FINALIZER};
