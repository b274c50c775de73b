//! # fieldrules
//!
//! Formula-driven field behavior for form-like entities.
//!
//! Fieldrules lets an entity definition attach formulas and control rules to
//! its fields, and evaluates them against concrete field values.
//!
//! ## Features
//!
//! - Formula language with static type inference and reference validation
//! - Control rules: visibility, enable, required and value-set effects
//! - Calculated fields evaluated in dependency order, with cycle detection
//! - Override conflict detection against formula and rule-set values
//! - Repository-backed orchestration service
//!
//! ## Example
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
//! // Design time: check a formula against the entity's schema
//! let check = validate_formula("qty * unit_price", &entity.schema());
//! assert!(check.is_valid);
//! assert_eq!(check.inferred_type, ResultType::Number);
//!
//! // Run time: evaluate the rules
//! let mut values = FieldValues::new();
//! values.insert("qty".into(), Value::Integer(3));
//! values.insert("unit_price".into(), Value::Integer(10));
//!
//! let result = evaluate_controls(&entity, &values);
//! assert_eq!(result.field_state("total").value, Some(Value::Integer(30)));
//! ```

pub mod calculation;
pub mod conflict;
pub mod control;
pub mod dependencies;
pub mod prelude;
pub mod repository;
pub mod service;

pub use calculation::{calculate_fields, calculate_fields_with, CalculationResult, CIRCULAR_REFERENCE};
pub use conflict::{
    detect_conflict, detect_control_conflict, detect_dual_conflict, detect_formula_conflict,
    ConflictError, ConflictResult,
};
pub use control::{evaluate_controls, ControlEngine, ControlOptions, EvaluationResult, FieldState};
pub use dependencies::{analyze_dependencies, DependencyReport};
pub use repository::{
    InMemoryProjectRepository, InMemorySchemaRepository, ProjectRepository, RepositoryError,
    RepositoryResult, SchemaRepository,
};
pub use service::{ControlService, ServiceError, ServiceResult};

// Re-export core types
pub use fieldrules_core::{
    ConflictInfo, ConflictType, ControlEffect, ControlRule, ControlType, EffectValue,
    EntityDefinition, Error, FieldDefinition, FieldType, FieldValues, Override, OverrideState,
    Project, Result, RuleEffect, SchemaField, Value,
};

// Re-export formula types
pub use fieldrules_formula::{
    evaluate, infer_type, parse_formula, standard_registry, validate_formula, BinaryOperator,
    DependencyGraph, EvaluationContext, FormulaError, FormulaExpr, FormulaResult, FunctionCatalog,
    FunctionImpl, FunctionRegistry, FunctionSignature, Literal, ResultType, TypeInferencer,
    UnaryOperator, ValidationResult,
};
