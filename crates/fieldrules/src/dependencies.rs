//! Field dependency analysis for an entity definition
//!
//! A field depends on every field read by its own formula, and on every
//! field read by a `VALUE_SET` rule that writes it (both the rule's
//! condition and its value formula). Visibility, enable and required rules
//! never change a value, so they add no edges.

use crate::{parse_formula, DependencyGraph, EffectValue, EntityDefinition};
use fieldrules_core::ControlType;
use std::collections::BTreeSet;

/// Outcome of [`analyze_dependencies`]
#[derive(Debug, Clone, PartialEq)]
pub struct DependencyReport {
    pub graph: DependencyGraph,
    /// Fields lying on a dependency cycle
    pub circular_fields: BTreeSet<String>,
    /// Acyclic fields, precedents first
    pub calculation_order: Vec<String>,
    /// Formulas that could not be parsed (their edges are missing)
    pub errors: Vec<String>,
}

impl DependencyReport {
    /// Check if any cycle was found
    pub fn has_cycles(&self) -> bool {
        !self.circular_fields.is_empty()
    }
}

/// Build the dependency graph of an entity and look for cycles
pub fn analyze_dependencies(entity: &EntityDefinition) -> DependencyReport {
    let (graph, errors) = build_graph(entity, true);
    let circular_fields = graph.circular_fields();
    let calculation_order = graph.calculation_order();

    for field in &circular_fields {
        tracing::warn!(entity = %entity.id, field = %field, "field is part of a dependency cycle");
    }

    DependencyReport {
        graph,
        circular_fields,
        calculation_order,
        errors,
    }
}

/// Build the graph; `include_rules` adds the edges contributed by `VALUE_SET` rules
pub(crate) fn build_graph(
    entity: &EntityDefinition,
    include_rules: bool,
) -> (DependencyGraph, Vec<String>) {
    let mut graph = DependencyGraph::new();
    let mut errors = Vec::new();

    for field in &entity.fields {
        graph.add_field(field.id.as_str());

        if let Some(formula) = &field.formula {
            let context = format!("Formula of field '{}'", field.id);
            add_formula_edges(entity, &mut graph, &mut errors, &context, formula, &field.id);
        }
    }

    if include_rules {
        for (_, rule) in entity.rules() {
            if !rule.enabled || rule.effect.control_type != ControlType::ValueSet {
                continue;
            }
            let target = &rule.effect.target_field_id;
            if !entity.has_field(target) {
                continue;
            }

            let context = format!("Rule '{}' ({}) condition", rule.name, rule.id);
            add_formula_edges(entity, &mut graph, &mut errors, &context, &rule.condition, target);

            if let EffectValue::Formula(formula) = &rule.effect.value {
                let context = format!("Rule '{}' ({}) value", rule.name, rule.id);
                add_formula_edges(entity, &mut graph, &mut errors, &context, formula, target);
            }
        }
    }

    (graph, errors)
}

fn add_formula_edges(
    entity: &EntityDefinition,
    graph: &mut DependencyGraph,
    errors: &mut Vec<String>,
    context: &str,
    formula: &str,
    dependent: &str,
) {
    match parse_formula(formula) {
        Ok(ast) => {
            for reference in ast.field_references() {
                // Unknown names cannot take part in a cycle
                if entity.has_field(&reference) {
                    graph.add_dependency(&reference, dependent);
                }
            }
        }
        Err(e) => errors.push(format!("{}: {}", context, e)),
    }
}
