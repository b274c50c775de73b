//! Field value types

use std::collections::BTreeMap;
use std::fmt;

/// Field id → value mapping for a single entity instance
pub type FieldValues = BTreeMap<String, Value>;

/// A value held by a field or produced by a formula
///
/// Equality is strict about kinds: a boolean never equals a number and a
/// number never equals its text rendering. Integers and floats compare
/// numerically, and lists/maps compare structurally.
#[derive(Debug, Clone, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(untagged)
)]
pub enum Value {
    /// Absent value
    #[default]
    Null,
    /// Boolean value
    Boolean(bool),
    /// Integral number
    Integer(i64),
    /// Floating point number
    Float(f64),
    /// Text value
    Text(String),
    /// Ordered collection
    List(Vec<Value>),
    /// String-keyed mapping
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Create a text value
    pub fn text<S: Into<String>>(s: S) -> Self {
        Value::Text(s.into())
    }

    /// Check if this is the null value
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Check if this is an integer or a float
    pub fn is_number(&self) -> bool {
        matches!(self, Value::Integer(_) | Value::Float(_))
    }

    /// Get the value as a boolean (booleans only, no coercion)
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Get the value as a float (integers are widened)
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(n) => Some(*n as f64),
            Value::Float(n) => Some(*n),
            _ => None,
        }
    }

    /// Get the value as an integer (integers only)
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Get the value as a string slice
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Truthiness used by `and`, `or` and `not`
    ///
    /// Null, `false`, zero, empty text and empty collections are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Boolean(b) => *b,
            Value::Integer(n) => *n != 0,
            Value::Float(n) => *n != 0.0,
            Value::Text(s) => !s.is_empty(),
            Value::List(items) => !items.is_empty(),
            Value::Map(entries) => !entries.is_empty(),
        }
    }

    /// Get the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }

    /// Render the value for diagnostics, quoting text
    pub fn repr(&self) -> String {
        match self {
            Value::Text(s) => format!("{:?}", s),
            other => other.to_string(),
        }
    }
}

/// Exact comparison; widening the integer would lose precision above 2^53
fn int_equals_float(i: i64, f: f64) -> bool {
    // i64::MAX as f64 rounds up to 2^63, which is itself out of range
    f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 && f as i64 == i
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Integer(i), Value::Float(f)) | (Value::Float(f), Value::Integer(i)) => {
                int_equals_float(*i, *f)
            }
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Integer(n) => write!(f, "{}", n),
            // Debug keeps the trailing ".0" so 5.0 does not read as an integer
            Value::Float(n) => write!(f, "{:?}", n),
            Value::Text(s) => write!(f, "{}", s),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item.repr())?;
                }
                write!(f, "]")
            }
            Value::Map(entries) => {
                write!(f, "{{")?;
                for (i, (key, item)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{:?}: {}", key, item.repr())?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Integer(i64::from(n))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_conversions() {
        assert_eq!(Value::from(42), Value::Integer(42));
        assert_eq!(Value::from(3.5), Value::Float(3.5));
        assert_eq!(Value::from(true), Value::Boolean(true));
        assert_eq!(Value::from("hello").as_str(), Some("hello"));
        assert_eq!(Value::from(None::<i64>), Value::Null);
    }

    #[test]
    fn test_strict_equality() {
        // Booleans are not numbers
        assert_ne!(Value::Boolean(true), Value::Integer(1));
        assert_ne!(Value::Boolean(false), Value::Integer(0));

        // Numbers are not their text rendering
        assert_ne!(Value::Integer(1500), Value::text("1500"));

        // Integers and floats compare numerically
        assert_eq!(Value::Integer(5), Value::Float(5.0));
        assert_ne!(Value::Integer(5), Value::Float(5.5));

        assert_ne!(Value::Null, Value::Integer(0));
    }

    #[test]
    fn test_large_integer_float_equality() {
        // 2^53 + 1 has no exact f64; it must not equal its rounded neighbour
        assert_ne!(Value::Integer(9_007_199_254_740_993), Value::Float(9_007_199_254_740_992.0));
        assert_ne!(Value::Float(9_007_199_254_740_992.0), Value::Integer(9_007_199_254_740_993));
        assert_eq!(Value::Integer(9_007_199_254_740_992), Value::Float(9_007_199_254_740_992.0));

        // 2^63 is past i64::MAX, so the saturating cast must not match
        assert_ne!(Value::Integer(i64::MAX), Value::Float(9_223_372_036_854_775_808.0));
        assert_eq!(Value::Integer(i64::MIN), Value::Float(i64::MIN as f64));

        assert_ne!(Value::Integer(0), Value::Float(f64::NAN));
        assert_eq!(Value::Integer(-3), Value::Float(-3.0));
    }

    #[test]
    fn test_structural_equality() {
        let a = Value::List(vec![Value::Integer(1), Value::text("x")]);
        let b = Value::List(vec![Value::Integer(1), Value::text("x")]);
        let c = Value::List(vec![Value::Integer(1), Value::text("y")]);
        assert_eq!(a, b);
        assert_ne!(a, c);

        let mut m1 = BTreeMap::new();
        m1.insert("k".to_string(), a.clone());
        let mut m2 = BTreeMap::new();
        m2.insert("k".to_string(), c);
        assert_ne!(Value::Map(m1.clone()), Value::Map(m2));
        assert_eq!(Value::Map(m1.clone()), Value::Map(m1));
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Integer(0).is_truthy());
        assert!(!Value::text("").is_truthy());
        assert!(!Value::List(vec![]).is_truthy());
        assert!(Value::Float(0.1).is_truthy());
        assert!(Value::text("no").is_truthy());
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Float(5.0).to_string(), "5.0");
        assert_eq!(Value::Integer(5).to_string(), "5");
        assert_eq!(Value::text("abc").to_string(), "abc");
        assert_eq!(Value::text("abc").repr(), "\"abc\"");
        assert_eq!(
            Value::List(vec![Value::Integer(1), Value::text("a")]).to_string(),
            "[1, \"a\"]"
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_deserialize_untagged() {
        let value: Value = serde_json::from_str(r#"{"qty": 3, "price": 2.5, "tags": ["a"], "x": null}"#)
            .unwrap();
        let Value::Map(entries) = value else {
            panic!("Expected map");
        };
        assert_eq!(entries["qty"], Value::Integer(3));
        assert_eq!(entries["price"], Value::Float(2.5));
        assert_eq!(entries["tags"], Value::List(vec![Value::text("a")]));
        assert_eq!(entries["x"], Value::Null);
    }
}
