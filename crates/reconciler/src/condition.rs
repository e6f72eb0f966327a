//! Status condition bookkeeping.

use chrono::Utc;
use claimop_core::{ClaimCondition, ConditionType};

/// Fixed reason the entry point records pipeline failures under.
pub const RECONCILE_ERROR_REASON: &str = "ReconcileError";

/// Records and merges status conditions on a claim.
///
/// Conditions are upserted keyed by type. A re-observation of the same
/// reason and message only refreshes the probe time; a changed payload also
/// bumps the transition time, so `last_transition_time` answers "since when
/// has it been failing like this".
#[derive(Debug, Clone, Copy, Default)]
pub struct ConditionManager;

impl ConditionManager {
    /// Create a new condition manager.
    pub fn new() -> Self {
        Self
    }

    /// Upsert the error condition with the given reason and message.
    pub fn set_condition(
        &self,
        conditions: &mut Vec<ClaimCondition>,
        reason: impl Into<String>,
        message: impl Into<String>,
    ) {
        let reason = reason.into();
        let message = message.into();
        let now = Utc::now();

        if let Some(existing) = conditions
            .iter_mut()
            .find(|c| c.condition_type == ConditionType::Error)
        {
            if existing.reason != reason || existing.message != message || !existing.status {
                existing.last_transition_time = now;
            }
            existing.status = true;
            existing.reason = reason;
            existing.message = message;
            existing.last_probe_time = now;
            return;
        }

        conditions.push(ClaimCondition {
            condition_type: ConditionType::Error,
            status: true,
            reason,
            message,
            last_transition_time: now,
            last_probe_time: now,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_set_appends_one_condition() {
        let manager = ConditionManager::new();
        let mut conditions = Vec::new();
        manager.set_condition(&mut conditions, "ReconcileError", "boom");
        assert_eq!(conditions.len(), 1);
        assert_eq!(conditions.first().map(|c| c.reason.as_str()), Some("ReconcileError"));
        assert_eq!(conditions.first().map(|c| c.status), Some(true));
    }

    #[test]
    fn repeated_set_updates_in_place() {
        let manager = ConditionManager::new();
        let mut conditions = Vec::new();
        manager.set_condition(&mut conditions, "ReconcileError", "boom");
        manager.set_condition(&mut conditions, "ReconcileError", "boom");
        manager.set_condition(&mut conditions, "ReconcileError", "different boom");
        assert_eq!(conditions.len(), 1);
        assert_eq!(
            conditions.first().map(|c| c.message.as_str()),
            Some("different boom")
        );
    }

    #[test]
    fn same_payload_keeps_transition_time() {
        let manager = ConditionManager::new();
        let mut conditions = Vec::new();
        manager.set_condition(&mut conditions, "ReconcileError", "boom");
        let first_transition = conditions.first().map(|c| c.last_transition_time);
        manager.set_condition(&mut conditions, "ReconcileError", "boom");
        assert_eq!(
            conditions.first().map(|c| c.last_transition_time),
            first_transition
        );
    }
}
