//! Control rules
//!
//! A control rule pairs a boolean condition formula with an effect on a
//! target field. When the condition holds, the effect alters the target's
//! visibility, enabled state, required-ness or value.
//!
//! ## Example
//!
//! ```rust
//! use fieldrules_core::{ControlRule, RuleEffect};
//!
//! let rule = ControlRule::new(
//!     "r1",
//!     "Compute total",
//!     "qty > 0",
//!     RuleEffect::value_formula("total", "qty * unit_price"),
//! )
//! .with_priority(10);
//!
//! assert!(rule.enabled);
//! ```

use crate::error::{Error, Result};
use crate::value::Value;
use std::fmt;

/// What aspect of the target field an effect controls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "SCREAMING_SNAKE_CASE")
)]
pub enum ControlType {
    /// Show or hide the field
    Visibility,
    /// Enable or disable editing
    Enable,
    /// Make the field mandatory or optional
    Required,
    /// Set the field's value
    ValueSet,
}

impl ControlType {
    /// Get the canonical name
    pub fn as_str(&self) -> &'static str {
        match self {
            ControlType::Visibility => "VISIBILITY",
            ControlType::Enable => "ENABLE",
            ControlType::Required => "REQUIRED",
            ControlType::ValueSet => "VALUE_SET",
        }
    }

    /// Check if effects of this type carry a boolean flag
    pub fn is_flag(&self) -> bool {
        !matches!(self, ControlType::ValueSet)
    }
}

impl fmt::Display for ControlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a rule's effect value is obtained
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum EffectValue {
    /// A fixed value
    Literal(Value),
    /// A formula evaluated against the same field values as the condition
    Formula(String),
}

impl Default for EffectValue {
    fn default() -> Self {
        EffectValue::Literal(Value::Boolean(true))
    }
}

/// Effect declared on a rule
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RuleEffect {
    pub control_type: ControlType,
    pub target_field_id: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub value: EffectValue,
}

impl RuleEffect {
    /// Create an effect with a literal value
    pub fn new(
        control_type: ControlType,
        target_field_id: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        Self {
            control_type,
            target_field_id: target_field_id.into(),
            value: EffectValue::Literal(value.into()),
        }
    }

    /// Show (`true`) or hide (`false`) the target
    pub fn visibility(target_field_id: impl Into<String>, visible: bool) -> Self {
        Self::new(ControlType::Visibility, target_field_id, visible)
    }

    /// Enable (`true`) or disable (`false`) the target
    pub fn enable(target_field_id: impl Into<String>, enabled: bool) -> Self {
        Self::new(ControlType::Enable, target_field_id, enabled)
    }

    /// Make the target required (`true`) or optional (`false`)
    pub fn required(target_field_id: impl Into<String>, required: bool) -> Self {
        Self::new(ControlType::Required, target_field_id, required)
    }

    /// Set the target to a fixed value
    pub fn value_set(target_field_id: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(ControlType::ValueSet, target_field_id, value)
    }

    /// Set the target to the result of a formula
    pub fn value_formula(target_field_id: impl Into<String>, formula: impl Into<String>) -> Self {
        Self {
            control_type: ControlType::ValueSet,
            target_field_id: target_field_id.into(),
            value: EffectValue::Formula(formula.into()),
        }
    }
}

/// A conditional rule attached to a field
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ControlRule {
    pub id: String,
    pub name: String,
    /// Formula text expected to evaluate to a boolean
    pub condition: String,
    pub effect: RuleEffect,
    /// Disabled rules are never evaluated
    #[cfg_attr(feature = "serde", serde(default = "default_enabled"))]
    pub enabled: bool,
    /// Lower priorities are applied first; later effects win
    #[cfg_attr(feature = "serde", serde(default))]
    pub priority: i32,
}

#[cfg(feature = "serde")]
fn default_enabled() -> bool {
    true
}

impl ControlRule {
    /// Create an enabled rule with priority 0
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        condition: impl Into<String>,
        effect: RuleEffect,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            condition: condition.into(),
            effect,
            enabled: true,
            priority: 0,
        }
    }

    /// Set the priority
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Enable or disable the rule
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// An effect produced by a rule whose condition held
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ControlEffect {
    pub control_type: ControlType,
    pub target_field_id: String,
    pub value: Value,
    /// Id of the rule that fired
    pub rule_id: String,
}

impl ControlEffect {
    /// Get the effect's flag for visibility/enable/required effects
    pub fn flag(&self) -> Result<bool> {
        self.value.as_bool().ok_or(Error::InvalidValueType {
            expected: "boolean",
            actual: self.value.type_name(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_builder() {
        let rule = ControlRule::new(
            "r1",
            "Require reason",
            "status == \"rejected\"",
            RuleEffect::required("reason", true),
        )
        .with_priority(5)
        .with_enabled(false);

        assert_eq!(rule.priority, 5);
        assert!(!rule.enabled);
        assert_eq!(rule.effect.control_type, ControlType::Required);
        assert_eq!(rule.effect.value, EffectValue::Literal(Value::Boolean(true)));
    }

    #[test]
    fn test_value_formula_effect() {
        let effect = RuleEffect::value_formula("total", "qty * unit_price");
        assert_eq!(effect.control_type, ControlType::ValueSet);
        assert_eq!(
            effect.value,
            EffectValue::Formula("qty * unit_price".to_string())
        );
    }

    #[test]
    fn test_effect_flag() {
        let effect = ControlEffect {
            control_type: ControlType::Visibility,
            target_field_id: "notes".into(),
            value: Value::Boolean(false),
            rule_id: "r1".into(),
        };
        assert_eq!(effect.flag(), Ok(false));

        let effect = ControlEffect {
            value: Value::Integer(1),
            ..effect
        };
        assert_eq!(
            effect.flag(),
            Err(Error::InvalidValueType {
                expected: "boolean",
                actual: "integer"
            })
        );
    }

    #[test]
    fn test_control_type_names() {
        assert_eq!(ControlType::ValueSet.to_string(), "VALUE_SET");
        assert!(ControlType::Visibility.is_flag());
        assert!(!ControlType::ValueSet.is_flag());
    }
}
