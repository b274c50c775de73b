//! User overrides and their lifecycle
//!
//! An override starts `Pending`, is accepted by the user, and is finally
//! synced once the surrounding application has reconciled it. Reconciliation
//! that cannot succeed moves it to `Invalid`. Illegal transitions fail with
//! [`Error::InvalidTransition`] instead of being skipped.
//!
//! ## Example
//!
//! ```rust
//! use fieldrules_core::{Override, OverrideState};
//!
//! let mut ov = Override::new("o1", "p1", "total", 1600, 1500);
//! ov.accept().unwrap();
//! ov.mark_synced().unwrap();
//! assert_eq!(ov.state, OverrideState::Synced);
//!
//! // Already synced: accepting again is an error
//! assert!(ov.accept().is_err());
//! ```

use crate::conflict::{ConflictInfo, ConflictType};
use crate::error::{Error, Result};
use crate::value::Value;
use chrono::{DateTime, Utc};
use std::fmt;

/// Lifecycle state of an override
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "SCREAMING_SNAKE_CASE")
)]
pub enum OverrideState {
    Pending,
    Accepted,
    Synced,
    /// Synced because the field's formula now agrees with the override
    SyncedFormula,
    Invalid,
}

impl OverrideState {
    /// Get the canonical name
    pub fn as_str(&self) -> &'static str {
        match self {
            OverrideState::Pending => "PENDING",
            OverrideState::Accepted => "ACCEPTED",
            OverrideState::Synced => "SYNCED",
            OverrideState::SyncedFormula => "SYNCED_FORMULA",
            OverrideState::Invalid => "INVALID",
        }
    }

    /// Check if no further transitions are possible
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OverrideState::Synced | OverrideState::SyncedFormula | OverrideState::Invalid
        )
    }
}

impl fmt::Display for OverrideState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user-supplied value that takes precedence over a field's computed or
/// rule-set value
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Override {
    pub id: String,
    pub project_id: String,
    pub field_id: String,
    pub override_value: Value,
    /// Value the field held before the override
    pub original_value: Value,
    pub state: OverrideState,
    pub reason: Option<String>,
    pub conflict_type: Option<ConflictType>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Override {
    /// Create a pending override
    pub fn new(
        id: impl Into<String>,
        project_id: impl Into<String>,
        field_id: impl Into<String>,
        override_value: impl Into<Value>,
        original_value: impl Into<Value>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            project_id: project_id.into(),
            field_id: field_id.into(),
            override_value: override_value.into(),
            original_value: original_value.into(),
            state: OverrideState::Pending,
            reason: None,
            conflict_type: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Attach a reason
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// PENDING → ACCEPTED
    pub fn accept(&mut self) -> Result<()> {
        self.transition("accept", &[OverrideState::Pending], OverrideState::Accepted)
    }

    /// ACCEPTED → SYNCED
    pub fn mark_synced(&mut self) -> Result<()> {
        self.transition("sync", &[OverrideState::Accepted], OverrideState::Synced)
    }

    /// ACCEPTED → SYNCED_FORMULA
    pub fn mark_synced_formula(&mut self) -> Result<()> {
        self.transition(
            "sync",
            &[OverrideState::Accepted],
            OverrideState::SyncedFormula,
        )
    }

    /// PENDING or ACCEPTED → INVALID
    pub fn mark_invalid(&mut self, reason: impl Into<String>) -> Result<()> {
        self.transition(
            "invalidate",
            &[OverrideState::Pending, OverrideState::Accepted],
            OverrideState::Invalid,
        )?;
        self.reason = Some(reason.into());
        Ok(())
    }

    /// Record a conflict classification (does not change the state)
    pub fn mark_conflict(&mut self, conflict_type: ConflictType) {
        self.conflict_type = Some(conflict_type);
        self.touch();
    }

    /// Clear the conflict classification (does not change the state)
    pub fn clear_conflict(&mut self) {
        self.conflict_type = None;
        self.touch();
    }

    /// Record or clear a detector result in one call
    pub fn apply_conflict(&mut self, conflict: Option<&ConflictInfo>) {
        match conflict {
            Some(info) => self.mark_conflict(info.conflict_type),
            None => self.clear_conflict(),
        }
    }

    /// Check if a conflict is currently recorded
    pub fn has_conflict(&self) -> bool {
        self.conflict_type.is_some()
    }

    fn transition(
        &mut self,
        action: &'static str,
        allowed: &[OverrideState],
        to: OverrideState,
    ) -> Result<()> {
        if !allowed.contains(&self.state) {
            return Err(Error::InvalidTransition {
                action,
                from: self.state,
            });
        }
        self.state = to;
        self.touch();
        Ok(())
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending() -> Override {
        Override::new("o1", "p1", "total", 1600, 1500)
    }

    #[test]
    fn test_happy_path() {
        let mut ov = pending();
        assert_eq!(ov.state, OverrideState::Pending);

        ov.accept().unwrap();
        assert_eq!(ov.state, OverrideState::Accepted);

        ov.mark_synced().unwrap();
        assert_eq!(ov.state, OverrideState::Synced);
        assert!(ov.state.is_terminal());
    }

    #[test]
    fn test_synced_formula_variant() {
        let mut ov = pending();
        ov.accept().unwrap();
        ov.mark_synced_formula().unwrap();
        assert_eq!(ov.state, OverrideState::SyncedFormula);
    }

    #[test]
    fn test_sync_requires_accept() {
        let mut ov = pending();
        let err = ov.mark_synced().unwrap_err();
        assert_eq!(
            err,
            Error::InvalidTransition {
                action: "sync",
                from: OverrideState::Pending
            }
        );
        assert_eq!(err.to_string(), "Cannot sync override in state PENDING");
        assert_eq!(ov.state, OverrideState::Pending);
    }

    #[test]
    fn test_accept_twice_fails() {
        let mut ov = pending();
        ov.accept().unwrap();
        assert!(ov.accept().is_err());
        assert_eq!(ov.state, OverrideState::Accepted);
    }

    #[test]
    fn test_invalid_from_pending_and_accepted() {
        let mut ov = pending();
        ov.mark_invalid("field was deleted").unwrap();
        assert_eq!(ov.state, OverrideState::Invalid);
        assert_eq!(ov.reason.as_deref(), Some("field was deleted"));
        assert!(ov.accept().is_err());

        let mut ov = pending();
        ov.accept().unwrap();
        ov.mark_invalid("type changed").unwrap();
        assert_eq!(ov.state, OverrideState::Invalid);

        let mut ov = pending();
        ov.accept().unwrap();
        ov.mark_synced().unwrap();
        assert!(ov.mark_invalid("too late").is_err());
    }

    #[test]
    fn test_transitions_update_timestamp() {
        let mut ov = pending();
        let before = ov.updated_at;
        ov.accept().unwrap();
        assert!(ov.updated_at >= before);
        assert_eq!(ov.created_at, before);
    }

    #[test]
    fn test_conflict_metadata_is_independent_of_state() {
        let mut ov = pending();
        ov.mark_conflict(ConflictType::Formula);
        assert_eq!(ov.state, OverrideState::Pending);
        assert_eq!(ov.conflict_type, Some(ConflictType::Formula));

        ov.accept().unwrap();
        assert!(ov.has_conflict());

        ov.clear_conflict();
        assert_eq!(ov.conflict_type, None);
        assert_eq!(ov.state, OverrideState::Accepted);
    }

    #[test]
    fn test_apply_conflict() {
        let mut ov = pending();
        let info = ConflictInfo {
            field_id: "total".into(),
            conflict_type: ConflictType::Control,
            override_value: Value::Integer(1600),
            computed_value: None,
            control_value: Some(Value::Integer(1500)),
            description: String::new(),
        };
        ov.apply_conflict(Some(&info));
        assert_eq!(ov.conflict_type, Some(ConflictType::Control));
        ov.apply_conflict(None);
        assert!(!ov.has_conflict());
    }
}
