//! Entity definitions and projects

use crate::control::ControlRule;
use crate::field::{FieldType, SchemaField};
use crate::value::{FieldValues, Value};

/// A field of an entity definition
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldDefinition {
    pub id: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub label: String,
    pub field_type: FieldType,
    /// Formula computing this field's value (calculated fields)
    #[cfg_attr(feature = "serde", serde(default))]
    pub formula: Option<String>,
    /// Rules attached to this field, in declaration order
    #[cfg_attr(feature = "serde", serde(default))]
    pub control_rules: Vec<ControlRule>,
}

impl FieldDefinition {
    /// Create a field with no formula and no rules
    pub fn new(id: impl Into<String>, field_type: FieldType) -> Self {
        let id = id.into();
        Self {
            label: id.clone(),
            id,
            field_type,
            formula: None,
            control_rules: Vec::new(),
        }
    }

    /// Set the display label
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Set the formula
    pub fn with_formula(mut self, formula: impl Into<String>) -> Self {
        self.formula = Some(formula.into());
        self
    }

    /// Attach a control rule
    pub fn with_rule(mut self, rule: ControlRule) -> Self {
        self.control_rules.push(rule);
        self
    }
}

/// The definition of an entity: its ordered fields and their rules
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntityDefinition {
    pub id: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub fields: Vec<FieldDefinition>,
}

impl EntityDefinition {
    /// Create an empty entity definition
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Add a field
    pub fn with_field(mut self, field: FieldDefinition) -> Self {
        self.fields.push(field);
        self
    }

    /// Look up a field by id
    pub fn field(&self, id: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.id == id)
    }

    /// Check if the entity has a field with the given id
    pub fn has_field(&self, id: &str) -> bool {
        self.field(id).is_some()
    }

    /// Iterate over all rules in declaration order (field order, then rule order)
    pub fn rules(&self) -> impl Iterator<Item = (&FieldDefinition, &ControlRule)> + '_ {
        self.fields
            .iter()
            .flat_map(|field| field.control_rules.iter().map(move |rule| (field, rule)))
    }

    /// Build the read-only schema snapshot used for type inference
    pub fn schema(&self) -> Vec<SchemaField> {
        self.fields
            .iter()
            .map(|f| SchemaField::new(f.id.clone(), f.field_type.as_str()))
            .collect()
    }
}

/// A project: one instance of an entity with its current field values
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Project {
    pub id: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub name: String,
    /// Id of the entity definition this project instantiates
    pub entity_definition_id: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub field_values: FieldValues,
}

impl Project {
    /// Create a project with no field values
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        entity_definition_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            entity_definition_id: entity_definition_id.into(),
            field_values: FieldValues::new(),
        }
    }

    /// Set a field value
    pub fn with_value(mut self, field_id: impl Into<String>, value: impl Into<Value>) -> Self {
        self.field_values.insert(field_id.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::RuleEffect;

    fn invoice() -> EntityDefinition {
        EntityDefinition::new("invoice", "Invoice")
            .with_field(FieldDefinition::new("qty", FieldType::Number))
            .with_field(
                FieldDefinition::new("total", FieldType::Currency)
                    .with_formula("qty * 10")
                    .with_rule(ControlRule::new(
                        "r1",
                        "Show total",
                        "qty > 0",
                        RuleEffect::visibility("total", true),
                    ))
                    .with_rule(ControlRule::new(
                        "r2",
                        "Lock total",
                        "true",
                        RuleEffect::enable("total", false),
                    )),
            )
    }

    #[test]
    fn test_field_lookup() {
        let entity = invoice();
        assert!(entity.has_field("qty"));
        assert!(!entity.has_field("tax"));
        assert_eq!(entity.field("total").unwrap().formula.as_deref(), Some("qty * 10"));
    }

    #[test]
    fn test_rules_in_declaration_order() {
        let entity = invoice();
        let ids: Vec<&str> = entity.rules().map(|(_, r)| r.id.as_str()).collect();
        assert_eq!(ids, vec!["r1", "r2"]);
    }

    #[test]
    fn test_schema_snapshot() {
        let schema = invoice().schema();
        assert_eq!(
            schema,
            vec![
                SchemaField::new("qty", "number"),
                SchemaField::new("total", "currency")
            ]
        );
    }

    #[test]
    fn test_project_values() {
        let project = Project::new("p1", "Order 1", "invoice").with_value("qty", 3);
        assert_eq!(project.field_values.get("qty"), Some(&Value::Integer(3)));
    }
}
