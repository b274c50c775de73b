//! Calculated field engine
//!
//! Evaluates every field formula of an entity in dependency order, so a
//! formula sees the freshly computed values of the fields it reads.
//!
//! # Example
//!
//! ```rust
//! use fieldrules::prelude::*;
//! use fieldrules::calculate_fields;
//!
//! let entity = EntityDefinition::new("invoice", "Invoice")
//!     .with_field(FieldDefinition::new("qty", FieldType::Number))
//!     .with_field(FieldDefinition::new("unit_price", FieldType::Currency))
//!     .with_field(FieldDefinition::new("total", FieldType::Calculated).with_formula("qty * unit_price"));
//!
//! let mut values = FieldValues::new();
//! values.insert("qty".into(), Value::Integer(3));
//! values.insert("unit_price".into(), Value::Integer(10));
//!
//! let result = calculate_fields(&entity, &values);
//! assert_eq!(result.values.get("total"), Some(&Value::Integer(30)));
//! ```

use crate::dependencies::build_graph;
use crate::{
    evaluate, parse_formula, standard_registry, EntityDefinition, EvaluationContext, FieldValues,
    FunctionRegistry,
};
use std::collections::BTreeMap;

/// Error recorded for every field on a dependency cycle
pub const CIRCULAR_REFERENCE: &str = "Circular reference";

/// Outcome of a calculation run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CalculationResult {
    /// Computed values of calculated fields only
    pub values: FieldValues,
    /// Field id → why the field could not be computed
    pub errors: BTreeMap<String, String>,
    /// Calculated fields in the order they were evaluated
    pub order: Vec<String>,
}

impl CalculationResult {
    /// Check if every formula was computed
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Input values overlaid with the computed ones
    pub fn merged(&self, inputs: &FieldValues) -> FieldValues {
        let mut merged = inputs.clone();
        merged.extend(self.values.iter().map(|(k, v)| (k.clone(), v.clone())));
        merged
    }
}

/// Calculate every calculated field with the standard functions
pub fn calculate_fields(entity: &EntityDefinition, field_values: &FieldValues) -> CalculationResult {
    calculate_fields_with(entity, field_values, standard_registry())
}

/// Calculate every calculated field with a custom function registry
pub fn calculate_fields_with(
    entity: &EntityDefinition,
    field_values: &FieldValues,
    functions: &FunctionRegistry,
) -> CalculationResult {
    let mut result = CalculationResult::default();

    // Phase 1: dependency graph over formulas only
    let (graph, _) = build_graph(entity, false);

    // Phase 2: cycles never evaluate, and dependents must not read their inputs
    let mut working = field_values.clone();
    let circular = graph.circular_fields();
    for field_id in &circular {
        if entity.field(field_id).map_or(false, |f| f.formula.is_some()) {
            tracing::warn!(entity = %entity.id, field = %field_id, "circular reference in formula");
            working.remove(field_id);
            result
                .errors
                .insert(field_id.clone(), CIRCULAR_REFERENCE.to_string());
        }
    }

    // Phase 3: evaluate in topological order against the working snapshot
    for field_id in graph.calculation_order() {
        let Some(formula) = entity.field(&field_id).and_then(|f| f.formula.as_deref()) else {
            continue;
        };
        result.order.push(field_id.clone());

        let outcome = parse_formula(formula).and_then(|ast| {
            let ctx = EvaluationContext::new(&working, functions);
            evaluate(&ast, &ctx)
        });

        match outcome {
            Ok(value) => {
                tracing::debug!(field = %field_id, value = %value.repr(), "calculated field");
                working.insert(field_id.clone(), value.clone());
                result.values.insert(field_id, value);
            }
            Err(e) => {
                tracing::warn!(field = %field_id, error = %e, "failed to calculate field");
                // Dependents must not see a stale input value
                working.remove(&field_id);
                result.errors.insert(field_id, e.to_string());
            }
        }
    }

    result
}
