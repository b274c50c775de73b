//! Conflict classification shared by the detector and the override record

use crate::value::Value;
use std::fmt;

/// Which authority an override disagrees with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum ConflictType {
    /// The field's formula computes a different value
    Formula,
    /// A control rule sets a different value
    Control,
    /// Both a formula and a control rule apply and the override matches neither
    FormulaControl,
}

impl ConflictType {
    /// Get the stable name (`formula`, `control`, `formula_control`)
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictType::Formula => "formula",
            ConflictType::Control => "control",
            ConflictType::FormulaControl => "formula_control",
        }
    }

    /// Parse a stable name
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "formula" => Some(ConflictType::Formula),
            "control" => Some(ConflictType::Control),
            "formula_control" => Some(ConflictType::FormulaControl),
            _ => None,
        }
    }
}

impl fmt::Display for ConflictType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A detected mismatch between an override and the value that would
/// otherwise be computed or rule-set for a field
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConflictInfo {
    pub field_id: String,
    pub conflict_type: ConflictType,
    pub override_value: Value,
    pub computed_value: Option<Value>,
    pub control_value: Option<Value>,
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_type_names() {
        for ty in [
            ConflictType::Formula,
            ConflictType::Control,
            ConflictType::FormulaControl,
        ] {
            assert_eq!(ConflictType::parse(ty.as_str()), Some(ty));
        }
        assert_eq!(ConflictType::FormulaControl.to_string(), "formula_control");
        assert_eq!(ConflictType::parse("Formula"), None);
    }
}
