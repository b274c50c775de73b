//! Static result types and the function catalog
//!
//! Both tables are constants: the inferencer receives them by reference
//! instead of consulting hidden global state.

use fieldrules_core::FieldType;
use std::fmt;

/// Static type a formula is known to produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultType {
    Boolean,
    Number,
    Text,
    /// Not statically known
    Unknown,
}

impl ResultType {
    /// Get the canonical name
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultType::Boolean => "BOOLEAN",
            ResultType::Number => "NUMBER",
            ResultType::Text => "TEXT",
            ResultType::Unknown => "UNKNOWN",
        }
    }

    /// Result type of a schema field kind
    pub fn of_field(kind: FieldType) -> Self {
        match kind {
            FieldType::Text
            | FieldType::TextArea
            | FieldType::Email
            | FieldType::Url
            | FieldType::Dropdown
            | FieldType::Radio
            | FieldType::Date
            | FieldType::DateTime => ResultType::Text,
            FieldType::Number | FieldType::Currency => ResultType::Number,
            FieldType::Boolean => ResultType::Boolean,
            FieldType::Calculated
            | FieldType::Lookup
            | FieldType::Table
            | FieldType::MultiSelect
            | FieldType::File => ResultType::Unknown,
        }
    }

    /// Result type of a host type name; unrecognised names are `Unknown`
    pub fn of_field_type_name(name: &str) -> Self {
        FieldType::parse(name).map_or(ResultType::Unknown, Self::of_field)
    }
}

impl fmt::Display for ResultType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Name, arity and return type of a callable formula function
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionSignature {
    pub name: &'static str,
    pub min_args: usize,
    /// `None` for variadic functions
    pub max_args: Option<usize>,
    pub return_type: ResultType,
}

impl FunctionSignature {
    const fn new(
        name: &'static str,
        min_args: usize,
        max_args: Option<usize>,
        return_type: ResultType,
    ) -> Self {
        Self {
            name,
            min_args,
            max_args,
            return_type,
        }
    }

    /// Check if a call with `count` arguments is within the arity range
    pub fn accepts(&self, count: usize) -> bool {
        count >= self.min_args && self.max_args.map_or(true, |max| count <= max)
    }

    /// Describe the accepted argument count for messages
    pub fn arity_description(&self) -> String {
        let plural = |n: usize| if n == 1 { "argument" } else { "arguments" };
        match self.max_args {
            Some(max) if max == self.min_args => format!("{} {}", max, plural(max)),
            Some(max) => format!("{} to {} arguments", self.min_args, max),
            None => format!("at least {} {}", self.min_args, plural(self.min_args)),
        }
    }
}

/// Set of functions a formula may call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionCatalog {
    entries: &'static [FunctionSignature],
}

const STANDARD_FUNCTIONS: &[FunctionSignature] = &[
    FunctionSignature::new("abs", 1, Some(1), ResultType::Number),
    FunctionSignature::new("coalesce", 1, None, ResultType::Unknown),
    FunctionSignature::new("concat", 0, None, ResultType::Text),
    FunctionSignature::new("if_else", 3, Some(3), ResultType::Unknown),
    FunctionSignature::new("is_empty", 1, Some(1), ResultType::Boolean),
    FunctionSignature::new("lower", 1, Some(1), ResultType::Text),
    FunctionSignature::new("max", 1, None, ResultType::Number),
    FunctionSignature::new("min", 1, None, ResultType::Number),
    FunctionSignature::new("pow", 2, Some(2), ResultType::Number),
    FunctionSignature::new("round", 1, Some(2), ResultType::Number),
    FunctionSignature::new("strip", 1, Some(1), ResultType::Text),
    FunctionSignature::new("sum", 0, None, ResultType::Number),
    FunctionSignature::new("upper", 1, Some(1), ResultType::Text),
];

impl FunctionCatalog {
    /// The thirteen functions every formula may call
    pub const STANDARD: FunctionCatalog = FunctionCatalog {
        entries: STANDARD_FUNCTIONS,
    };

    /// Build a catalog from a static table (entries should be sorted by name)
    pub const fn new(entries: &'static [FunctionSignature]) -> Self {
        Self { entries }
    }

    /// Look up a function by its exact (case-sensitive) name
    pub fn get(&self, name: &str) -> Option<&FunctionSignature> {
        self.entries.iter().find(|sig| sig.name == name)
    }

    /// Check if a function is allowed
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Allowed names in sorted order
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.entries.iter().map(|sig| sig.name).collect();
        names.sort_unstable();
        names
    }

    /// Iterate over the catalog entries
    pub fn iter(&self) -> impl Iterator<Item = &FunctionSignature> {
        self.entries.iter()
    }
}

impl Default for FunctionCatalog {
    fn default() -> Self {
        FunctionCatalog::STANDARD
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_field_type_table() {
        assert_eq!(ResultType::of_field(FieldType::Email), ResultType::Text);
        assert_eq!(ResultType::of_field(FieldType::Currency), ResultType::Number);
        assert_eq!(ResultType::of_field(FieldType::Boolean), ResultType::Boolean);
        assert_eq!(ResultType::of_field(FieldType::Lookup), ResultType::Unknown);

        assert_eq!(ResultType::of_field_type_name("checkbox"), ResultType::Boolean);
        assert_eq!(ResultType::of_field_type_name("DateTime"), ResultType::Text);
        assert_eq!(ResultType::of_field_type_name("geo_point"), ResultType::Unknown);
    }

    #[test]
    fn test_standard_catalog() {
        let catalog = FunctionCatalog::STANDARD;
        assert_eq!(
            catalog.names(),
            vec![
                "abs", "coalesce", "concat", "if_else", "is_empty", "lower", "max", "min", "pow",
                "round", "strip", "sum", "upper"
            ]
        );
        assert!(catalog.contains("upper"));
        assert!(!catalog.contains("UPPER"));
        assert_eq!(
            catalog.get("is_empty").map(|sig| sig.return_type),
            Some(ResultType::Boolean)
        );
    }

    #[test]
    fn test_arity() {
        let catalog = FunctionCatalog::STANDARD;
        let round = catalog.get("round").unwrap();
        assert!(round.accepts(1));
        assert!(round.accepts(2));
        assert!(!round.accepts(3));
        assert_eq!(round.arity_description(), "1 to 2 arguments");

        let abs = catalog.get("abs").unwrap();
        assert_eq!(abs.arity_description(), "1 argument");

        let sum = catalog.get("sum").unwrap();
        assert!(sum.accepts(0));
        assert!(sum.accepts(40));
        assert_eq!(sum.arity_description(), "at least 0 arguments");
    }
}
