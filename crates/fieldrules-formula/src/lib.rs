//! # fieldrules-formula
//!
//! Formula language for fieldrules.
//!
//! This crate provides:
//! - Formula parsing (text → AST)
//! - Static type inference and reference validation against a schema
//! - Formula evaluation (AST → value)
//! - The thirteen standard functions and a registry for host functions
//! - Dependency tracking between fields
//!
//! ## Example
//!
//! ```rust
//! use fieldrules_core::{FieldValues, SchemaField, Value};
//! use fieldrules_formula::{evaluate, parse_formula, validate_formula, EvaluationContext, ResultType};
//!
//! let schema = vec![SchemaField::new("qty", "number"), SchemaField::new("unit_price", "currency")];
//! let check = validate_formula("qty * unit_price", &schema);
//! assert!(check.is_valid);
//! assert_eq!(check.inferred_type, ResultType::Number);
//!
//! let mut fields = FieldValues::new();
//! fields.insert("qty".into(), Value::Integer(3));
//! fields.insert("unit_price".into(), Value::Integer(10));
//!
//! let ast = parse_formula("qty * unit_price").unwrap();
//! let ctx = EvaluationContext::with_standard_functions(&fields);
//! assert_eq!(evaluate(&ast, &ctx).unwrap(), Value::Integer(30));
//! ```

pub mod ast;
pub mod dependency;
pub mod error;
pub mod evaluator;
pub mod functions;
pub mod inference;
pub mod parser;
pub mod types;

pub use ast::{BinaryOperator, FormulaExpr, Literal, UnaryOperator};
pub use dependency::DependencyGraph;
pub use error::{FormulaError, FormulaResult};
pub use evaluator::{evaluate, EvaluationContext};
pub use functions::{standard_registry, FunctionImpl, FunctionRegistry};
pub use inference::{infer_type, validate_formula, TypeInferencer, ValidationResult};
pub use parser::parse_formula;
pub use types::{FunctionCatalog, FunctionSignature, ResultType};
