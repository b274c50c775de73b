//! Prelude module - common imports for fieldrules users
//!
//! ```rust
//! use fieldrules::prelude::*;
//! ```

pub use crate::{
    // Entity model
    ControlRule,
    ControlType,
    EffectValue,
    EntityDefinition,
    FieldDefinition,
    FieldType,
    Project,
    RuleEffect,
    SchemaField,
    // Values
    FieldValues,
    Value,
    // Formula language
    evaluate,
    parse_formula,
    validate_formula,
    EvaluationContext,
    FormulaError,
    FunctionRegistry,
    ResultType,
    ValidationResult,
    // Engines
    analyze_dependencies,
    calculate_fields,
    evaluate_controls,
    CalculationResult,
    ControlEffect,
    ControlEngine,
    ControlOptions,
    EvaluationResult,
    FieldState,
    // Conflicts and overrides
    detect_conflict,
    detect_control_conflict,
    detect_dual_conflict,
    detect_formula_conflict,
    ConflictInfo,
    ConflictType,
    Override,
    OverrideState,
    // Errors
    Error,
    Result,
};
