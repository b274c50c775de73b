//! Static type inference and reference validation
//!
//! The inferencer walks an AST against a schema snapshot and a function
//! catalog. It never stops at the first problem: every unknown field and
//! function is reported, and arithmetic on text only produces warnings.

use crate::ast::{BinaryOperator, FormulaExpr, Literal, UnaryOperator};
use crate::parser::parse_formula;
use crate::types::{FunctionCatalog, ResultType};
use fieldrules_core::SchemaField;
use std::collections::BTreeSet;

/// Outcome of validating a formula
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    /// `true` when no errors were found
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub inferred_type: ResultType,
    /// Every referenced field id, sorted and de-duplicated
    pub field_references: BTreeSet<String>,
}

impl ValidationResult {
    fn syntax_failure(message: String) -> Self {
        Self {
            is_valid: false,
            errors: vec![message],
            warnings: Vec::new(),
            inferred_type: ResultType::Unknown,
            field_references: BTreeSet::new(),
        }
    }
}

/// Type inferencer over a schema snapshot
#[derive(Debug, Clone, Copy)]
pub struct TypeInferencer<'a> {
    schema: &'a [SchemaField],
    catalog: &'a FunctionCatalog,
}

/// Diagnostics collected during one walk
#[derive(Default)]
struct Diagnostics {
    errors: Vec<String>,
    warnings: Vec<String>,
}

impl Diagnostics {
    fn error(&mut self, msg: String) {
        if !self.errors.contains(&msg) {
            self.errors.push(msg);
        }
    }

    fn warning(&mut self, msg: String) {
        if !self.warnings.contains(&msg) {
            self.warnings.push(msg);
        }
    }
}

impl<'a> TypeInferencer<'a> {
    /// Create an inferencer over a schema and catalog
    pub fn new(schema: &'a [SchemaField], catalog: &'a FunctionCatalog) -> Self {
        Self { schema, catalog }
    }

    /// Parse and validate formula text
    pub fn validate(&self, formula: &str) -> ValidationResult {
        match parse_formula(formula) {
            Ok(ast) => self.check(&ast),
            Err(e) => ValidationResult::syntax_failure(e.to_string()),
        }
    }

    /// Validate an already parsed AST
    pub fn check(&self, ast: &FormulaExpr) -> ValidationResult {
        let mut diag = Diagnostics::default();
        let inferred_type = self.infer(ast, &mut diag);

        ValidationResult {
            is_valid: diag.errors.is_empty(),
            errors: diag.errors,
            warnings: diag.warnings,
            inferred_type,
            field_references: ast.field_references(),
        }
    }

    /// Infer just the result type of an AST, discarding diagnostics
    pub fn infer_type(&self, ast: &FormulaExpr) -> ResultType {
        self.infer(ast, &mut Diagnostics::default())
    }

    fn field_type(&self, name: &str) -> Option<ResultType> {
        self.schema
            .iter()
            .find(|f| f.field_id == name)
            .map(|f| ResultType::of_field_type_name(&f.field_type))
    }

    fn infer(&self, expr: &FormulaExpr, diag: &mut Diagnostics) -> ResultType {
        match expr {
            FormulaExpr::Literal(lit) => match lit {
                Literal::Integer(_) | Literal::Float(_) => ResultType::Number,
                Literal::Text(_) => ResultType::Text,
                Literal::Boolean(_) => ResultType::Boolean,
                Literal::None => ResultType::Unknown,
            },

            FormulaExpr::FieldRef(name) => match self.field_type(name) {
                Some(ty) => ty,
                None => {
                    diag.error(format!("Unknown field: '{}'", name));
                    ResultType::Unknown
                }
            },

            FormulaExpr::UnaryOp { op, operand } => {
                let operand_type = self.infer(operand, diag);
                match op {
                    UnaryOperator::Not => ResultType::Boolean,
                    UnaryOperator::Negate | UnaryOperator::Plus => {
                        if operand_type == ResultType::Text {
                            diag.warning(format!("Unary '{}' applied to a TEXT operand", op));
                        }
                        ResultType::Number
                    }
                }
            }

            FormulaExpr::BinaryOp { op, left, right } => {
                let left_type = self.infer(left, diag);
                let right_type = self.infer(right, diag);
                self.infer_binary(*op, left_type, right_type, diag)
            }

            FormulaExpr::Function { name, args } => {
                // Arguments are checked even when the function itself is unknown
                for arg in args {
                    self.infer(arg, diag);
                }

                match self.catalog.get(name) {
                    Some(sig) => {
                        if !sig.accepts(args.len()) {
                            diag.error(format!(
                                "Function '{}' expects {}, got {}",
                                name,
                                sig.arity_description(),
                                args.len()
                            ));
                        }
                        sig.return_type
                    }
                    None => {
                        diag.error(format!(
                            "Unknown function: '{}'. Allowed functions: {}",
                            name,
                            self.catalog.names().join(", ")
                        ));
                        ResultType::Unknown
                    }
                }
            }
        }
    }

    fn infer_binary(
        &self,
        op: BinaryOperator,
        left: ResultType,
        right: ResultType,
        diag: &mut Diagnostics,
    ) -> ResultType {
        if op.is_comparison() || op.is_logical() {
            return ResultType::Boolean;
        }

        let has_text = left == ResultType::Text || right == ResultType::Text;
        if op == BinaryOperator::Add {
            return if has_text {
                ResultType::Text
            } else {
                ResultType::Number
            };
        }

        if has_text {
            diag.warning(format!(
                "Arithmetic operator '{}' applied to a TEXT operand",
                op
            ));
        }
        ResultType::Number
    }
}

/// Validate formula text against a schema using the standard catalog
pub fn validate_formula(formula: &str, schema: &[SchemaField]) -> ValidationResult {
    TypeInferencer::new(schema, &FunctionCatalog::STANDARD).validate(formula)
}

/// Infer the result type of an AST using the standard catalog
pub fn infer_type(ast: &FormulaExpr, schema: &[SchemaField]) -> ResultType {
    TypeInferencer::new(schema, &FunctionCatalog::STANDARD).infer_type(ast)
}
