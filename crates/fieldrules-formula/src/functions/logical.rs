//! Logical functions

use super::nth;
use crate::error::FormulaResult;
use fieldrules_core::Value;

/// IF_ELSE(condition, then, otherwise)
///
/// Arguments are evaluated before the call, so both branches must evaluate
/// cleanly; the condition is tested by truthiness.
pub fn fn_if_else(args: &[Value]) -> FormulaResult<Value> {
    let condition = nth("if_else", args, 0)?;
    let chosen = if condition.is_truthy() { 1 } else { 2 };
    nth("if_else", args, chosen).cloned()
}

/// IS_EMPTY(value)
///
/// Null, blank text and empty collections are empty; numbers and booleans
/// never are.
pub fn fn_is_empty(args: &[Value]) -> FormulaResult<Value> {
    let empty = match nth("is_empty", args, 0)? {
        Value::Null => true,
        Value::Text(s) => s.trim().is_empty(),
        Value::List(items) => items.is_empty(),
        Value::Map(entries) => entries.is_empty(),
        Value::Boolean(_) | Value::Integer(_) | Value::Float(_) => false,
    };
    Ok(Value::Boolean(empty))
}

/// COALESCE(value, ...) - first non-null argument, or null
pub fn fn_coalesce(args: &[Value]) -> FormulaResult<Value> {
    Ok(args
        .iter()
        .find(|value| !value.is_null())
        .cloned()
        .unwrap_or(Value::Null))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_if_else() {
        let pick = |cond: Value| {
            fn_if_else(&[cond, Value::text("yes"), Value::text("no")]).unwrap()
        };
        assert_eq!(pick(Value::Boolean(true)), Value::text("yes"));
        assert_eq!(pick(Value::Boolean(false)), Value::text("no"));
        assert_eq!(pick(Value::Integer(0)), Value::text("no"));
        assert_eq!(pick(Value::text("x")), Value::text("yes"));
        assert_eq!(pick(Value::Null), Value::text("no"));
    }

    #[test]
    fn test_is_empty() {
        let check = |value: Value| fn_is_empty(&[value]).unwrap();
        assert_eq!(check(Value::Null), Value::Boolean(true));
        assert_eq!(check(Value::text("")), Value::Boolean(true));
        assert_eq!(check(Value::text("   ")), Value::Boolean(true));
        assert_eq!(check(Value::List(vec![])), Value::Boolean(true));
        assert_eq!(check(Value::text("a")), Value::Boolean(false));
        assert_eq!(check(Value::Integer(0)), Value::Boolean(false));
        assert_eq!(check(Value::Boolean(false)), Value::Boolean(false));
    }

    #[test]
    fn test_coalesce() {
        assert_eq!(
            fn_coalesce(&[Value::Null, Value::Integer(0), Value::Integer(5)]).unwrap(),
            Value::Integer(0)
        );
        assert_eq!(
            fn_coalesce(&[Value::Null, Value::Null]).unwrap(),
            Value::Null
        );
    }
}
