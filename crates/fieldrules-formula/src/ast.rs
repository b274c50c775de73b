//! Formula Abstract Syntax Tree types

use fieldrules_core::Value;
use std::collections::BTreeSet;
use std::fmt;

/// Formula expression AST
///
/// The node set is closed: the type inferencer, the evaluator and the
/// reference walkers all match on it exhaustively.
#[derive(Debug, Clone, PartialEq)]
pub enum FormulaExpr {
    /// Literal constant
    Literal(Literal),

    /// Bare identifier naming a field
    FieldRef(String),

    /// Unary operation
    UnaryOp {
        op: UnaryOperator,
        operand: Box<FormulaExpr>,
    },

    /// Binary operation
    BinaryOp {
        op: BinaryOperator,
        left: Box<FormulaExpr>,
        right: Box<FormulaExpr>,
    },

    /// Function call
    Function { name: String, args: Vec<FormulaExpr> },
}

/// Literal constants
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Integer(i64),
    Float(f64),
    Text(String),
    Boolean(bool),
    None,
}

impl Literal {
    /// Convert to a runtime value
    pub fn to_value(&self) -> Value {
        match self {
            Literal::Integer(n) => Value::Integer(*n),
            Literal::Float(n) => Value::Float(*n),
            Literal::Text(s) => Value::Text(s.clone()),
            Literal::Boolean(b) => Value::Boolean(*b),
            Literal::None => Value::Null,
        }
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    // Arithmetic
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Power,

    // Comparison
    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,

    // Logical
    And,
    Or,
}

impl BinaryOperator {
    /// Source symbol of the operator
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Modulo => "%",
            BinaryOperator::Power => "**",
            BinaryOperator::Equal => "==",
            BinaryOperator::NotEqual => "!=",
            BinaryOperator::LessThan => "<",
            BinaryOperator::LessEqual => "<=",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::GreaterEqual => ">=",
            BinaryOperator::And => "and",
            BinaryOperator::Or => "or",
        }
    }

    /// Check if this is a comparison operator
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOperator::Equal
                | BinaryOperator::NotEqual
                | BinaryOperator::LessThan
                | BinaryOperator::LessEqual
                | BinaryOperator::GreaterThan
                | BinaryOperator::GreaterEqual
        )
    }

    /// Check if this is `and` / `or`
    pub fn is_logical(&self) -> bool {
        matches!(self, BinaryOperator::And | BinaryOperator::Or)
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    Not,
    Negate,
    Plus,
}

impl UnaryOperator {
    /// Source symbol of the operator
    pub fn symbol(&self) -> &'static str {
        match self {
            UnaryOperator::Not => "not",
            UnaryOperator::Negate => "-",
            UnaryOperator::Plus => "+",
        }
    }
}

impl fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FormulaExpr {
    /// Collect the ids of every field referenced by this expression
    pub fn field_references(&self) -> BTreeSet<String> {
        let mut refs = BTreeSet::new();
        self.collect_field_references(&mut refs);
        refs
    }

    fn collect_field_references(&self, refs: &mut BTreeSet<String>) {
        match self {
            FormulaExpr::Literal(_) => {}
            FormulaExpr::FieldRef(name) => {
                refs.insert(name.clone());
            }
            FormulaExpr::UnaryOp { operand, .. } => operand.collect_field_references(refs),
            FormulaExpr::BinaryOp { left, right, .. } => {
                left.collect_field_references(refs);
                right.collect_field_references(refs);
            }
            FormulaExpr::Function { args, .. } => {
                for arg in args {
                    arg.collect_field_references(refs);
                }
            }
        }
    }

    /// Collect the names of every function called by this expression
    pub fn function_names(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        self.collect_function_names(&mut names);
        names
    }

    fn collect_function_names(&self, names: &mut BTreeSet<String>) {
        match self {
            FormulaExpr::Literal(_) | FormulaExpr::FieldRef(_) => {}
            FormulaExpr::UnaryOp { operand, .. } => operand.collect_function_names(names),
            FormulaExpr::BinaryOp { left, right, .. } => {
                left.collect_function_names(names);
                right.collect_function_names(names);
            }
            FormulaExpr::Function { name, args } => {
                names.insert(name.clone());
                for arg in args {
                    arg.collect_function_names(names);
                }
            }
        }
    }
}
