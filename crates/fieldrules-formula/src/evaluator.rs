//! Formula evaluator
//!
//! Evaluates formula ASTs against a field snapshot and a function registry.

use crate::ast::{BinaryOperator, FormulaExpr, UnaryOperator};
use crate::error::{FormulaError, FormulaResult};
use crate::functions::{standard_registry, FunctionImpl, FunctionRegistry};
use fieldrules_core::{FieldValues, Value};
use std::cmp::Ordering;
use std::panic::{self, AssertUnwindSafe};

/// Context for formula evaluation
///
/// Both mappings are borrowed for the duration of a single call; the
/// evaluator keeps no state between calls.
#[derive(Debug, Clone, Copy)]
pub struct EvaluationContext<'a> {
    /// Field id → current value
    pub fields: &'a FieldValues,
    /// Callable functions
    pub functions: &'a FunctionRegistry,
}

impl<'a> EvaluationContext<'a> {
    /// Create a new evaluation context
    pub fn new(fields: &'a FieldValues, functions: &'a FunctionRegistry) -> Self {
        Self { fields, functions }
    }

    /// Create a context backed by the standard function registry
    pub fn with_standard_functions(fields: &'a FieldValues) -> Self {
        Self::new(fields, standard_registry())
    }

    /// Get a field's value
    pub fn get_field_value(&self, name: &str) -> FormulaResult<&'a Value> {
        self.fields
            .get(name)
            .ok_or_else(|| FormulaError::FieldNotFound(name.to_string()))
    }

    /// Get a function by name
    pub fn get_function(&self, name: &str) -> FormulaResult<&'a FunctionImpl> {
        self.functions
            .get(name)
            .ok_or_else(|| FormulaError::FunctionNotFound(name.to_string()))
    }
}

/// Evaluate a formula expression
pub fn evaluate(expr: &FormulaExpr, ctx: &EvaluationContext) -> FormulaResult<Value> {
    match expr {
        // === Literals ===
        FormulaExpr::Literal(lit) => Ok(lit.to_value()),

        // === References ===
        FormulaExpr::FieldRef(name) => ctx.get_field_value(name).cloned(),

        // === Operators ===
        FormulaExpr::BinaryOp { op, left, right } => evaluate_binary_op(*op, left, right, ctx),

        FormulaExpr::UnaryOp { op, operand } => evaluate_unary_op(*op, operand, ctx),

        // === Functions ===
        FormulaExpr::Function { name, args } => evaluate_function(name, args, ctx),
    }
}

/// Evaluate a binary operation
fn evaluate_binary_op(
    op: BinaryOperator,
    left: &FormulaExpr,
    right: &FormulaExpr,
    ctx: &EvaluationContext,
) -> FormulaResult<Value> {
    // Logical operators short-circuit
    match op {
        BinaryOperator::And => {
            if !evaluate(left, ctx)?.is_truthy() {
                return Ok(Value::Boolean(false));
            }
            return Ok(Value::Boolean(evaluate(right, ctx)?.is_truthy()));
        }
        BinaryOperator::Or => {
            if evaluate(left, ctx)?.is_truthy() {
                return Ok(Value::Boolean(true));
            }
            return Ok(Value::Boolean(evaluate(right, ctx)?.is_truthy()));
        }
        _ => {}
    }

    let left_val = evaluate(left, ctx)?;
    let right_val = evaluate(right, ctx)?;
    apply_binary_op(op, &left_val, &right_val)
}

/// Apply a binary operator to already evaluated operands
fn apply_binary_op(op: BinaryOperator, left: &Value, right: &Value) -> FormulaResult<Value> {
    match op {
        // Arithmetic operators
        BinaryOperator::Add => add(left, right),
        BinaryOperator::Subtract => {
            arithmetic(op, left, right, i64::checked_sub, |l, r| l - r)
        }
        BinaryOperator::Multiply => {
            arithmetic(op, left, right, i64::checked_mul, |l, r| l * r)
        }
        BinaryOperator::Divide => divide(left, right),
        BinaryOperator::Modulo => modulo(left, right),
        BinaryOperator::Power => power(left, right),

        // Comparison operators
        BinaryOperator::Equal => Ok(Value::Boolean(left == right)),
        BinaryOperator::NotEqual => Ok(Value::Boolean(left != right)),
        BinaryOperator::LessThan
        | BinaryOperator::LessEqual
        | BinaryOperator::GreaterThan
        | BinaryOperator::GreaterEqual => compare(op, left, right).map(Value::Boolean),

        // Logical operators (non-short-circuit form)
        BinaryOperator::And => Ok(Value::Boolean(left.is_truthy() && right.is_truthy())),
        BinaryOperator::Or => Ok(Value::Boolean(left.is_truthy() || right.is_truthy())),
    }
}

/// Evaluate a unary operation
fn evaluate_unary_op(
    op: UnaryOperator,
    operand: &FormulaExpr,
    ctx: &EvaluationContext,
) -> FormulaResult<Value> {
    let value = evaluate(operand, ctx)?;

    match op {
        UnaryOperator::Not => Ok(Value::Boolean(!value.is_truthy())),
        UnaryOperator::Negate => match value {
            Value::Integer(n) => n
                .checked_neg()
                .map(Value::Integer)
                .ok_or(FormulaError::Overflow("-")),
            Value::Float(n) => Ok(Value::Float(-n)),
            other => Err(bad_unary_operand(op, &other)),
        },
        UnaryOperator::Plus => match value {
            Value::Integer(_) | Value::Float(_) => Ok(value),
            other => Err(bad_unary_operand(op, &other)),
        },
    }
}

/// Evaluate a function call
fn evaluate_function(
    name: &str,
    args: &[FormulaExpr],
    ctx: &EvaluationContext,
) -> FormulaResult<Value> {
    let func = ctx.get_function(name)?;

    // Evaluate arguments left to right
    let values = args
        .iter()
        .map(|arg| evaluate(arg, ctx))
        .collect::<FormulaResult<Vec<_>>>()?;

    // Host functions are foreign code: errors and panics stop here
    match panic::catch_unwind(AssertUnwindSafe(|| (**func)(&values))) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(FormulaError::FunctionFailed {
            name: name.to_string(),
            message: e.to_string(),
        }),
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "function panicked".to_string());
            tracing::warn!(function = name, %message, "formula function panicked");
            Err(FormulaError::FunctionFailed {
                name: name.to_string(),
                message,
            })
        }
    }
}

// === Operator semantics ===

fn bad_operands(op: BinaryOperator, left: &Value, right: &Value) -> FormulaError {
    FormulaError::Type(format!(
        "unsupported operand types for '{}': {} and {}",
        op,
        left.type_name(),
        right.type_name()
    ))
}

fn bad_unary_operand(op: UnaryOperator, value: &Value) -> FormulaError {
    FormulaError::Type(format!(
        "bad operand type for unary '{}': {}",
        op,
        value.type_name()
    ))
}

/// Numeric operands of a binary operator, after promotion
enum Numbers {
    Integers(i64, i64),
    Floats(f64, f64),
}

fn numbers(op: BinaryOperator, left: &Value, right: &Value) -> FormulaResult<Numbers> {
    match (left, right) {
        (Value::Integer(l), Value::Integer(r)) => Ok(Numbers::Integers(*l, *r)),
        (l, r) => match (l.as_f64(), r.as_f64()) {
            (Some(l), Some(r)) => Ok(Numbers::Floats(l, r)),
            _ => Err(bad_operands(op, left, right)),
        },
    }
}

fn arithmetic(
    op: BinaryOperator,
    left: &Value,
    right: &Value,
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> FormulaResult<Value> {
    match numbers(op, left, right)? {
        Numbers::Integers(l, r) => int_op(l, r)
            .map(Value::Integer)
            .ok_or(FormulaError::Overflow(op.symbol())),
        Numbers::Floats(l, r) => Ok(Value::Float(float_op(l, r))),
    }
}

fn add(left: &Value, right: &Value) -> FormulaResult<Value> {
    match (left, right) {
        (Value::Text(l), Value::Text(r)) => Ok(Value::Text(format!("{}{}", l, r))),
        (Value::List(l), Value::List(r)) => Ok(Value::List(l.iter().chain(r).cloned().collect())),
        _ => arithmetic(BinaryOperator::Add, left, right, i64::checked_add, |l, r| l + r),
    }
}

fn divide(left: &Value, right: &Value) -> FormulaResult<Value> {
    let (l, r) = match numbers(BinaryOperator::Divide, left, right)? {
        Numbers::Integers(l, r) => (l as f64, r as f64),
        Numbers::Floats(l, r) => (l, r),
    };
    if r == 0.0 {
        return Err(FormulaError::DivisionByZero);
    }
    Ok(Value::Float(l / r))
}

/// Floored modulo: the result takes the sign of the divisor
fn modulo(left: &Value, right: &Value) -> FormulaResult<Value> {
    match numbers(BinaryOperator::Modulo, left, right)? {
        Numbers::Integers(_, 0) => Err(FormulaError::DivisionByZero),
        Numbers::Integers(l, r) => {
            let m = l.checked_rem(r).ok_or(FormulaError::Overflow("%"))?;
            if m != 0 && (m < 0) != (r < 0) {
                Ok(Value::Integer(m + r))
            } else {
                Ok(Value::Integer(m))
            }
        }
        Numbers::Floats(_, r) if r == 0.0 => Err(FormulaError::DivisionByZero),
        Numbers::Floats(l, r) => {
            let m = l % r;
            if m != 0.0 && (m < 0.0) != (r < 0.0) {
                Ok(Value::Float(m + r))
            } else {
                Ok(Value::Float(m))
            }
        }
    }
}

/// Exponentiation shared by `**` and `pow()`
pub(crate) fn power(left: &Value, right: &Value) -> FormulaResult<Value> {
    let (base, exp) = match numbers(BinaryOperator::Power, left, right)? {
        Numbers::Integers(base, exp) if exp >= 0 => {
            return u32::try_from(exp)
                .ok()
                .and_then(|exp| base.checked_pow(exp))
                .map(Value::Integer)
                .ok_or(FormulaError::Overflow("**"));
        }
        Numbers::Integers(base, exp) => (base as f64, exp as f64),
        Numbers::Floats(base, exp) => (base, exp),
    };

    if base == 0.0 && exp < 0.0 {
        return Err(FormulaError::DivisionByZero);
    }
    let result = base.powf(exp);
    if result.is_nan() && !base.is_nan() && !exp.is_nan() {
        return Err(FormulaError::argument(format!(
            "{:?} ** {:?} has no real result",
            base, exp
        )));
    }
    if result.is_infinite() && base.is_finite() && exp.is_finite() {
        return Err(FormulaError::Overflow("**"));
    }
    Ok(Value::Float(result))
}

/// Ordering comparison: numbers with numbers, text with text, booleans with booleans
fn compare(op: BinaryOperator, left: &Value, right: &Value) -> FormulaResult<bool> {
    let ordering = match (left, right) {
        (Value::Integer(l), Value::Integer(r)) => Some(l.cmp(r)),
        (Value::Text(l), Value::Text(r)) => Some(l.cmp(r)),
        (Value::Boolean(l), Value::Boolean(r)) => Some(l.cmp(r)),
        (l, r) => match (l.as_f64(), r.as_f64()) {
            (Some(l), Some(r)) => l.partial_cmp(&r),
            _ => {
                return Err(FormulaError::Type(format!(
                    "'{}' not supported between {} and {}",
                    op,
                    left.type_name(),
                    right.type_name()
                )))
            }
        },
    };

    // NaN compares false with everything
    let Some(ordering) = ordering else {
        return Ok(false);
    };

    Ok(match op {
        BinaryOperator::LessThan => ordering == Ordering::Less,
        BinaryOperator::LessEqual => ordering != Ordering::Greater,
        BinaryOperator::GreaterThan => ordering == Ordering::Greater,
        BinaryOperator::GreaterEqual => ordering != Ordering::Less,
        _ => ordering == Ordering::Equal,
    })
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::parser::parse_formula;
    use proptest::prelude::*;

    proptest! {
        /// Same AST and same context always produce the same outcome
        #[test]
        fn evaluation_is_deterministic(
            a in -1000i64..1000,
            b in -1000i64..1000,
            op in prop::sample::select(vec!["+", "-", "*", "/", "%", "**", "<", "==", "and", "or"]),
        ) {
            let mut fields = FieldValues::new();
            fields.insert("a".into(), Value::Integer(a));
            fields.insert("b".into(), Value::Integer(b));
            let ctx = EvaluationContext::with_standard_functions(&fields);
            let ast = parse_formula(&format!("a {} b", op)).unwrap();
            prop_assert_eq!(evaluate(&ast, &ctx), evaluate(&ast, &ctx));
        }

        /// Floored modulo always carries the divisor's sign
        #[test]
        fn modulo_sign_follows_divisor(a in -10_000i64..10_000, b in prop::num::i64::ANY.prop_filter("non-zero", |b| *b != 0)) {
            let mut fields = FieldValues::new();
            fields.insert("a".into(), Value::Integer(a));
            fields.insert("b".into(), Value::Integer(b));
            let ctx = EvaluationContext::with_standard_functions(&fields);
            let ast = parse_formula("a % b").unwrap();
            let m = evaluate(&ast, &ctx).unwrap().as_i64().unwrap();
            prop_assert!(m == 0 || (m < 0) == (b < 0));
            prop_assert!(m.unsigned_abs() < b.unsigned_abs());
        }
    }
}
