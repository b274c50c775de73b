//! Control-rule engine
//!
//! Evaluates the control rules of an entity against a snapshot of field
//! values. A rule that cannot be evaluated never fires; it is reported in
//! [`EvaluationResult::errors`] and the remaining rules still run.
//!
//! # Example
//!
//! ```rust
//! use fieldrules::prelude::*;
//!
//! let entity = EntityDefinition::new("invoice", "Invoice")
//!     .with_field(FieldDefinition::new("qty", FieldType::Number))
//!     .with_field(FieldDefinition::new("unit_price", FieldType::Currency))
//!     .with_field(FieldDefinition::new("total", FieldType::Currency).with_rule(
//!         ControlRule::new("r1", "Compute total", "qty > 0", RuleEffect::value_formula("total", "qty * unit_price")),
//!     ));
//!
//! let mut values = FieldValues::new();
//! values.insert("qty".into(), Value::Integer(3));
//! values.insert("unit_price".into(), Value::Integer(10));
//!
//! let result = evaluate_controls(&entity, &values);
//! assert_eq!(result.effects.len(), 1);
//! assert_eq!(result.effects[0].value, Value::Integer(30));
//! ```

use crate::dependencies::build_graph;
use crate::{
    evaluate, parse_formula, standard_registry, ControlEffect, ControlRule, ControlType,
    EffectValue, EntityDefinition, EvaluationContext, FieldValues, FormulaError, FunctionCatalog,
    FunctionRegistry, ResultType, SchemaField, TypeInferencer, Value,
};
use thiserror::Error;

/// Options for control-rule evaluation
#[derive(Debug, Clone)]
pub struct ControlOptions {
    /// Skip rules whose condition statically infers to a non-boolean type
    pub infer_condition_types: bool,
    /// Log a warning for every field on a dependency cycle before evaluating
    pub warn_on_cycles: bool,
}

impl Default for ControlOptions {
    fn default() -> Self {
        Self {
            infer_condition_types: true,
            warn_on_cycles: true,
        }
    }
}

/// Outcome of evaluating an entity's rules
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvaluationResult {
    /// Effects of the rules that fired, in evaluation order
    pub effects: Vec<ControlEffect>,
    /// One entry per skipped rule: `Rule '<name>' (<id>): <reason>`
    pub errors: Vec<String>,
}

impl EvaluationResult {
    /// Check if every rule evaluated cleanly
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Collapse effects on the same (field, control type) pair; the last one wins
    ///
    /// The result keeps the position of each pair's first effect.
    pub fn resolved(&self) -> Vec<ControlEffect> {
        let mut resolved: Vec<ControlEffect> = Vec::new();
        for effect in &self.effects {
            match resolved.iter_mut().find(|e| {
                e.target_field_id == effect.target_field_id && e.control_type == effect.control_type
            }) {
                Some(slot) => *slot = effect.clone(),
                None => resolved.push(effect.clone()),
            }
        }
        resolved
    }

    /// Materialize the controlled state of one field
    pub fn field_state(&self, field_id: &str) -> FieldState {
        let mut state = FieldState::default();
        for effect in self
            .resolved()
            .into_iter()
            .filter(|e| e.target_field_id == field_id)
        {
            match effect.control_type {
                ControlType::Visibility => state.visible = effect.flag().unwrap_or(state.visible),
                ControlType::Enable => state.enabled = effect.flag().unwrap_or(state.enabled),
                ControlType::Required => state.required = effect.flag().unwrap_or(state.required),
                ControlType::ValueSet => state.value = Some(effect.value),
            }
        }
        state
    }
}

/// Controlled state of a single field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldState {
    pub visible: bool,
    pub enabled: bool,
    pub required: bool,
    /// Value forced by a `VALUE_SET` rule, if any fired
    pub value: Option<Value>,
}

impl Default for FieldState {
    fn default() -> Self {
        Self {
            visible: true,
            enabled: true,
            required: false,
            value: None,
        }
    }
}

/// Why a rule was skipped
#[derive(Debug, Error)]
enum RuleError {
    #[error("condition must be BOOLEAN, inferred {0}")]
    ConditionType(ResultType),

    #[error("condition evaluated to {0}, expected boolean")]
    NotBoolean(&'static str),

    #[error("{0}")]
    Condition(FormulaError),

    #[error("effect target '{0}' is not a field of this entity")]
    UnknownTarget(String),

    #[error("effect value: {0}")]
    EffectValue(FormulaError),

    #[error("{control_type} effect requires a boolean value, got {actual}")]
    FlagValue {
        control_type: ControlType,
        actual: &'static str,
    },
}

/// The control-rule engine
#[derive(Debug, Clone)]
pub struct ControlEngine<'f> {
    options: ControlOptions,
    functions: &'f FunctionRegistry,
}

impl Default for ControlEngine<'static> {
    fn default() -> Self {
        Self::new(ControlOptions::default())
    }
}

impl ControlEngine<'static> {
    /// Create an engine backed by the standard functions
    pub fn new(options: ControlOptions) -> Self {
        Self {
            options,
            functions: standard_registry(),
        }
    }
}

impl<'f> ControlEngine<'f> {
    /// Create an engine backed by a custom function registry
    pub fn with_functions(options: ControlOptions, functions: &'f FunctionRegistry) -> Self {
        Self { options, functions }
    }

    /// Get the engine options
    pub fn options(&self) -> &ControlOptions {
        &self.options
    }

    /// Evaluate every enabled rule of the entity
    ///
    /// Rules run ordered by priority (ascending), then by declaration order
    /// across the entity's fields, so later effects override earlier ones.
    pub fn evaluate(&self, entity: &EntityDefinition, field_values: &FieldValues) -> EvaluationResult {
        let mut result = EvaluationResult::default();

        if self.options.warn_on_cycles {
            let (graph, _) = build_graph(entity, true);
            for field in graph.circular_fields() {
                tracing::warn!(entity = %entity.id, field = %field, "field is part of a dependency cycle");
            }
        }

        let schema = entity.schema();

        // sort_by_key is stable: equal priorities keep declaration order
        let mut rules: Vec<&ControlRule> = entity
            .rules()
            .map(|(_, rule)| rule)
            .filter(|rule| rule.enabled)
            .collect();
        rules.sort_by_key(|rule| rule.priority);

        for rule in rules {
            match self.evaluate_rule(entity, &schema, rule, field_values) {
                Ok(Some(effect)) => {
                    tracing::debug!(
                        rule = %rule.id,
                        target = %effect.target_field_id,
                        control = %effect.control_type,
                        value = %effect.value.repr(),
                        "rule fired"
                    );
                    result.effects.push(effect);
                }
                Ok(None) => {
                    tracing::debug!(rule = %rule.id, "rule condition is false");
                }
                Err(e) => {
                    tracing::warn!(rule = %rule.id, reason = %e, "skipping rule");
                    result
                        .errors
                        .push(format!("Rule '{}' ({}): {}", rule.name, rule.id, e));
                }
            }
        }

        result
    }

    fn evaluate_rule(
        &self,
        entity: &EntityDefinition,
        schema: &[SchemaField],
        rule: &ControlRule,
        field_values: &FieldValues,
    ) -> Result<Option<ControlEffect>, RuleError> {
        let ast = parse_formula(&rule.condition).map_err(RuleError::Condition)?;

        if self.options.infer_condition_types {
            let catalog = FunctionCatalog::STANDARD;
            let inferred = TypeInferencer::new(schema, &catalog).infer_type(&ast);
            if !matches!(inferred, ResultType::Boolean | ResultType::Unknown) {
                return Err(RuleError::ConditionType(inferred));
            }
        }

        let ctx = EvaluationContext::new(field_values, self.functions);
        let fired = match evaluate(&ast, &ctx).map_err(RuleError::Condition)? {
            Value::Boolean(b) => b,
            other => return Err(RuleError::NotBoolean(other.type_name())),
        };
        if !fired {
            return Ok(None);
        }

        let effect = &rule.effect;
        if !entity.has_field(&effect.target_field_id) {
            return Err(RuleError::UnknownTarget(effect.target_field_id.clone()));
        }

        let value = match &effect.value {
            EffectValue::Literal(value) => value.clone(),
            EffectValue::Formula(formula) => parse_formula(formula)
                .and_then(|ast| evaluate(&ast, &ctx))
                .map_err(RuleError::EffectValue)?,
        };

        if effect.control_type.is_flag() && value.as_bool().is_none() {
            return Err(RuleError::FlagValue {
                control_type: effect.control_type,
                actual: value.type_name(),
            });
        }

        Ok(Some(ControlEffect {
            control_type: effect.control_type,
            target_field_id: effect.target_field_id.clone(),
            value,
            rule_id: rule.id.clone(),
        }))
    }
}

/// Evaluate an entity's rules with the default options and standard functions
pub fn evaluate_controls(entity: &EntityDefinition, field_values: &FieldValues) -> EvaluationResult {
    ControlEngine::default().evaluate(entity, field_values)
}
