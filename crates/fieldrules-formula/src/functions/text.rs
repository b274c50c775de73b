//! Text functions

use super::{expect_text, nth};
use crate::error::FormulaResult;
use fieldrules_core::Value;

/// UPPER(text)
pub fn fn_upper(args: &[Value]) -> FormulaResult<Value> {
    let text = expect_text("upper", nth("upper", args, 0)?)?;
    Ok(Value::Text(text.to_uppercase()))
}

/// LOWER(text)
pub fn fn_lower(args: &[Value]) -> FormulaResult<Value> {
    let text = expect_text("lower", nth("lower", args, 0)?)?;
    Ok(Value::Text(text.to_lowercase()))
}

/// STRIP(text) - removes leading and trailing whitespace
pub fn fn_strip(args: &[Value]) -> FormulaResult<Value> {
    let text = expect_text("strip", nth("strip", args, 0)?)?;
    Ok(Value::Text(text.trim().to_string()))
}

/// CONCAT(value, ...) - joins the text rendering of every argument
///
/// Null renders as the empty string.
pub fn fn_concat(args: &[Value]) -> FormulaResult<Value> {
    let mut result = String::new();
    for value in args {
        match value {
            Value::Null => {}
            Value::Text(s) => result.push_str(s),
            other => result.push_str(&other.to_string()),
        }
    }
    Ok(Value::Text(result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FormulaError;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_case_conversion() {
        assert_eq!(
            fn_upper(&[Value::text("Hello")]).unwrap(),
            Value::text("HELLO")
        );
        assert_eq!(
            fn_lower(&[Value::text("HeLLo")]).unwrap(),
            Value::text("hello")
        );
        assert_eq!(
            fn_upper(&[Value::text("straße")]).unwrap(),
            Value::text("STRASSE")
        );
    }

    #[test]
    fn test_text_required() {
        assert_eq!(
            fn_upper(&[Value::Integer(1)]).unwrap_err(),
            FormulaError::Argument("upper() requires text, got integer".into())
        );
        assert!(fn_strip(&[Value::Null]).is_err());
        assert!(fn_lower(&[]).is_err());
    }

    #[test]
    fn test_strip() {
        assert_eq!(
            fn_strip(&[Value::text("  padded \t\n")]).unwrap(),
            Value::text("padded")
        );
    }

    #[test]
    fn test_concat() {
        assert_eq!(fn_concat(&[]).unwrap(), Value::text(""));
        assert_eq!(
            fn_concat(&[
                Value::text("Qty: "),
                Value::Integer(3),
                Value::Null,
                Value::text(" @ "),
                Value::Float(2.5),
                Value::text(" "),
                Value::Boolean(true),
            ])
            .unwrap(),
            Value::text("Qty: 3 @ 2.5 true")
        );
    }
}
