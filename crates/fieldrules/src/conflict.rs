//! Conflict detection between overrides and authoritative values
//!
//! An override conflicts with an authority (the field's formula, a control
//! rule, or both) when its value differs from what that authority produces.
//! Values compare with [`Value`]'s equality: integers and floats compare
//! numerically, booleans never equal numbers and text never equals numbers.

use crate::{ConflictInfo, ConflictType, Value};
use thiserror::Error;

/// Errors from the conflict detector
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConflictError {
    /// Field id that is empty or blank
    #[error("Invalid field id: {0:?}")]
    InvalidFieldId(String),
}

/// Result type alias using [`ConflictError`]
pub type ConflictResult<T> = std::result::Result<T, ConflictError>;

fn check_field_id(field_id: &str) -> ConflictResult<()> {
    if field_id.trim().is_empty() {
        return Err(ConflictError::InvalidFieldId(field_id.to_string()));
    }
    Ok(())
}

/// Compare an override against the value computed by the field's formula
pub fn detect_formula_conflict(
    field_id: &str,
    override_value: &Value,
    computed_value: &Value,
) -> ConflictResult<Option<ConflictInfo>> {
    check_field_id(field_id)?;
    if override_value == computed_value {
        return Ok(None);
    }

    Ok(Some(ConflictInfo {
        field_id: field_id.to_string(),
        conflict_type: ConflictType::Formula,
        override_value: override_value.clone(),
        computed_value: Some(computed_value.clone()),
        control_value: None,
        description: format!(
            "Override {} differs from formula result {} for field '{}'",
            override_value.repr(),
            computed_value.repr(),
            field_id
        ),
    }))
}

/// Compare an override against the value set by a control rule
pub fn detect_control_conflict(
    field_id: &str,
    override_value: &Value,
    control_value: &Value,
) -> ConflictResult<Option<ConflictInfo>> {
    check_field_id(field_id)?;
    if override_value == control_value {
        return Ok(None);
    }

    Ok(Some(ConflictInfo {
        field_id: field_id.to_string(),
        conflict_type: ConflictType::Control,
        override_value: override_value.clone(),
        computed_value: None,
        control_value: Some(control_value.clone()),
        description: format!(
            "Override {} differs from control rule value {} for field '{}'",
            override_value.repr(),
            control_value.repr(),
            field_id
        ),
    }))
}

/// Compare an override against both authorities
///
/// Matching either one reconciles the override.
pub fn detect_dual_conflict(
    field_id: &str,
    override_value: &Value,
    computed_value: &Value,
    control_value: &Value,
) -> ConflictResult<Option<ConflictInfo>> {
    check_field_id(field_id)?;
    if override_value == computed_value || override_value == control_value {
        return Ok(None);
    }

    Ok(Some(ConflictInfo {
        field_id: field_id.to_string(),
        conflict_type: ConflictType::FormulaControl,
        override_value: override_value.clone(),
        computed_value: Some(computed_value.clone()),
        control_value: Some(control_value.clone()),
        description: format!(
            "Override {} matches neither formula result {} nor control rule value {} for field '{}'",
            override_value.repr(),
            computed_value.repr(),
            control_value.repr(),
            field_id
        ),
    }))
}

/// Pick the detector matching the authorities that apply to the field
///
/// With neither a computed nor a control value there is nothing to conflict with.
pub fn detect_conflict(
    field_id: &str,
    override_value: &Value,
    computed_value: Option<&Value>,
    control_value: Option<&Value>,
) -> ConflictResult<Option<ConflictInfo>> {
    match (computed_value, control_value) {
        (Some(computed), Some(control)) => {
            detect_dual_conflict(field_id, override_value, computed, control)
        }
        (Some(computed), None) => detect_formula_conflict(field_id, override_value, computed),
        (None, Some(control)) => detect_control_conflict(field_id, override_value, control),
        (None, None) => {
            check_field_id(field_id)?;
            Ok(None)
        }
    }
}
