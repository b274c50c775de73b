//! Math functions

use super::{expect_number, nth, number_required, spread};
use crate::error::{FormulaError, FormulaResult};
use crate::evaluator::power;
use fieldrules_core::Value;
use std::cmp::Ordering;

/// ABS(x)
pub fn fn_abs(args: &[Value]) -> FormulaResult<Value> {
    match nth("abs", args, 0)? {
        Value::Integer(n) => n
            .checked_abs()
            .map(Value::Integer)
            .ok_or(FormulaError::Overflow("abs")),
        Value::Float(n) => Ok(Value::Float(n.abs())),
        other => Err(number_required("abs", other)),
    }
}

/// MIN(x, ...) or MIN(list)
pub fn fn_min(args: &[Value]) -> FormulaResult<Value> {
    extreme("min", args, Ordering::Less)
}

/// MAX(x, ...) or MAX(list)
pub fn fn_max(args: &[Value]) -> FormulaResult<Value> {
    extreme("max", args, Ordering::Greater)
}

/// Pick the first value that compares `wanted` against every other one.
/// The winning value keeps its original kind (integers stay integers).
fn extreme(func: &str, args: &[Value], wanted: Ordering) -> FormulaResult<Value> {
    let mut best: Option<(&Value, f64)> = None;

    for value in spread(args) {
        expect_number(func, value)?;
        let n = value.as_f64().unwrap_or(f64::NAN);
        match best {
            Some((_, current)) if n.partial_cmp(&current) != Some(wanted) => {}
            _ => best = Some((value, n)),
        }
    }

    best.map(|(value, _)| value.clone())
        .ok_or_else(|| FormulaError::argument(format!("{}() arg is an empty sequence", func)))
}

/// ROUND(x, [ndigits])
///
/// Rounds half to even. Without `ndigits` the result is an integer.
pub fn fn_round(args: &[Value]) -> FormulaResult<Value> {
    let number = nth("round", args, 0)?;

    let digits = match args.get(1) {
        None | Some(Value::Null) => None,
        Some(Value::Integer(d)) => Some(*d),
        Some(other) => {
            return Err(FormulaError::argument(format!(
                "round() ndigits must be an integer, got {}",
                other.type_name()
            )))
        }
    };

    match (number, digits) {
        (Value::Integer(n), None) => Ok(Value::Integer(*n)),
        (Value::Integer(n), Some(d)) if d >= 0 => Ok(Value::Integer(*n)),
        (Value::Integer(n), Some(d)) => {
            // Negative digits round to tens, hundreds, ...
            let factor = u32::try_from(-d)
                .ok()
                .and_then(|exp| 10i64.checked_pow(exp));
            match factor {
                Some(factor) => round_int_half_even(*n, factor),
                None => Ok(Value::Integer(0)),
            }
        }
        (Value::Float(f), None) => float_to_int(f.round_ties_even()),
        (Value::Float(f), Some(d)) => {
            let d = d.clamp(-308, 308) as i32;
            let scale = 10f64.powi(d);
            let rounded = (f * scale).round_ties_even() / scale;
            Ok(Value::Float(if rounded.is_finite() { rounded } else { *f }))
        }
        (other, _) => Err(number_required("round", other)),
    }
}

fn round_int_half_even(n: i64, factor: i64) -> FormulaResult<Value> {
    let quotient = n.div_euclid(factor);
    let remainder = n.rem_euclid(factor);
    let doubled = i128::from(remainder) * 2;
    let factor_wide = i128::from(factor);

    let rounded_up = match doubled.cmp(&factor_wide) {
        Ordering::Greater => true,
        Ordering::Less => false,
        Ordering::Equal => quotient % 2 != 0,
    };
    let quotient = if rounded_up { quotient + 1 } else { quotient };

    quotient
        .checked_mul(factor)
        .map(Value::Integer)
        .ok_or(FormulaError::Overflow("round"))
}

fn float_to_int(f: f64) -> FormulaResult<Value> {
    if !f.is_finite() {
        return Err(FormulaError::argument(format!(
            "cannot convert {:?} to an integer",
            f
        )));
    }
    if f < i64::MIN as f64 || f >= i64::MAX as f64 {
        return Err(FormulaError::Overflow("round"));
    }
    Ok(Value::Integer(f as i64))
}

/// SUM(x, ...) or SUM(list)
///
/// Integers stay integral until a float joins the total.
pub fn fn_sum(args: &[Value]) -> FormulaResult<Value> {
    let mut total = Value::Integer(0);

    for value in spread(args) {
        expect_number("sum", value)?;
        total = match (&total, value) {
            (Value::Integer(a), Value::Integer(b)) => a
                .checked_add(*b)
                .map(Value::Integer)
                .ok_or(FormulaError::Overflow("sum"))?,
            (a, b) => Value::Float(a.as_f64().unwrap_or(0.0) + b.as_f64().unwrap_or(0.0)),
        };
    }

    Ok(total)
}

/// POW(base, exp)
pub fn fn_pow(args: &[Value]) -> FormulaResult<Value> {
    let base = nth("pow", args, 0)?;
    let exp = nth("pow", args, 1)?;
    expect_number("pow", base)?;
    expect_number("pow", exp)?;
    power(base, exp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ints(values: &[i64]) -> Vec<Value> {
        values.iter().copied().map(Value::Integer).collect()
    }

    #[test]
    fn test_abs() {
        assert_eq!(fn_abs(&[Value::Integer(-5)]).unwrap(), Value::Integer(5));
        assert_eq!(fn_abs(&[Value::Float(-2.5)]).unwrap(), Value::Float(2.5));
        assert!(fn_abs(&[Value::text("x")]).is_err());
        assert_eq!(
            fn_abs(&[Value::Integer(i64::MIN)]).unwrap_err(),
            FormulaError::Overflow("abs")
        );
    }

    #[test]
    fn test_min_max() {
        assert_eq!(fn_min(&ints(&[3, 1, 2])).unwrap(), Value::Integer(1));
        assert_eq!(fn_max(&ints(&[3, 1, 2])).unwrap(), Value::Integer(3));
        assert_eq!(
            fn_max(&[Value::Integer(1), Value::Float(2.5)]).unwrap(),
            Value::Float(2.5)
        );
        // A single list argument is spread
        assert_eq!(
            fn_max(&[Value::List(ints(&[4, 9, 2]))]).unwrap(),
            Value::Integer(9)
        );
        // Ties keep the first value
        assert!(matches!(
            fn_min(&[Value::Integer(1), Value::Float(1.0)]).unwrap(),
            Value::Integer(1)
        ));
    }

    #[test]
    fn test_min_max_errors() {
        assert_eq!(
            fn_min(&[Value::List(vec![])]).unwrap_err(),
            FormulaError::Argument("min() arg is an empty sequence".into())
        );
        assert_eq!(
            fn_max(&[Value::Integer(1), Value::Null]).unwrap_err(),
            FormulaError::Argument("max() requires a number, got null".into())
        );
    }

    #[test]
    fn test_round_half_to_even() {
        assert_eq!(fn_round(&[Value::Float(2.5)]).unwrap(), Value::Integer(2));
        assert_eq!(fn_round(&[Value::Float(3.5)]).unwrap(), Value::Integer(4));
        assert_eq!(fn_round(&[Value::Float(-2.5)]).unwrap(), Value::Integer(-2));
        assert_eq!(fn_round(&[Value::Integer(7)]).unwrap(), Value::Integer(7));
    }

    #[test]
    fn test_round_with_digits() {
        assert_eq!(
            fn_round(&[Value::Float(3.14159), Value::Integer(2)]).unwrap(),
            Value::Float(3.14)
        );
        assert_eq!(
            fn_round(&[Value::Float(2.5), Value::Null]).unwrap(),
            Value::Integer(2)
        );
        assert_eq!(
            fn_round(&[Value::Integer(1250), Value::Integer(-2)]).unwrap(),
            Value::Integer(1200)
        );
        assert_eq!(
            fn_round(&[Value::Integer(1350), Value::Integer(-2)]).unwrap(),
            Value::Integer(1400)
        );
        assert_eq!(
            fn_round(&[Value::Integer(-1251), Value::Integer(-2)]).unwrap(),
            Value::Integer(-1300)
        );
        assert!(fn_round(&[Value::Float(1.0), Value::Float(1.0)]).is_err());
    }

    #[test]
    fn test_round_non_finite() {
        assert!(fn_round(&[Value::Float(f64::INFINITY)]).is_err());
    }

    #[test]
    fn test_sum() {
        assert_eq!(fn_sum(&[]).unwrap(), Value::Integer(0));
        assert_eq!(fn_sum(&ints(&[1, 2, 3])).unwrap(), Value::Integer(6));
        assert_eq!(
            fn_sum(&[Value::Integer(1), Value::Float(0.5)]).unwrap(),
            Value::Float(1.5)
        );
        assert_eq!(
            fn_sum(&[Value::List(ints(&[10, 20]))]).unwrap(),
            Value::Integer(30)
        );
        assert!(fn_sum(&[Value::text("1")]).is_err());
        assert_eq!(
            fn_sum(&ints(&[i64::MAX, 1])).unwrap_err(),
            FormulaError::Overflow("sum")
        );
    }

    #[test]
    fn test_pow() {
        assert_eq!(
            fn_pow(&ints(&[2, 10])).unwrap(),
            Value::Integer(1024)
        );
        assert_eq!(
            fn_pow(&[Value::Integer(2), Value::Integer(-2)]).unwrap(),
            Value::Float(0.25)
        );
        assert!(fn_pow(&[Value::text("2"), Value::Integer(2)]).is_err());
    }
}
