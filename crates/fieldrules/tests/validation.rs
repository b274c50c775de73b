//! Design-time formula validation against an entity schema

use fieldrules::prelude::*;
use fieldrules::FunctionCatalog;
use pretty_assertions::assert_eq;
use std::collections::BTreeSet;

fn contact_schema() -> Vec<SchemaField> {
    EntityDefinition::new("contact", "Contact")
        .with_field(FieldDefinition::new("name", FieldType::Text))
        .with_field(FieldDefinition::new("age", FieldType::Number))
        .with_field(FieldDefinition::new("active", FieldType::Boolean))
        .schema()
}

#[test]
fn test_text_function_on_text_field() {
    let result = validate_formula("upper(name)", &contact_schema());
    assert!(result.is_valid, "{:?}", result.errors);
    assert_eq!(result.inferred_type, ResultType::Text);
    assert_eq!(
        result.field_references,
        BTreeSet::from(["name".to_string()])
    );
}

#[test]
fn test_unknown_field_is_named() {
    let result = validate_formula("upper(nam)", &contact_schema());
    assert!(!result.is_valid);
    assert!(result.errors.contains(&"Unknown field: 'nam'".to_string()));
}

#[test]
fn test_unknown_function_lists_allowed_names() {
    let result = validate_formula("shout(name)", &contact_schema());
    assert!(!result.is_valid);
    assert_eq!(result.errors.len(), 1);
    let error = &result.errors[0];
    assert!(error.starts_with("Unknown function: 'shout'"));
    for name in FunctionCatalog::STANDARD.names() {
        assert!(error.contains(name), "{} missing from {}", name, error);
    }
}

#[test]
fn test_syntax_error() {
    let result = validate_formula("age +", &contact_schema());
    assert!(!result.is_valid);
    assert_eq!(result.inferred_type, ResultType::Unknown);
    assert!(result.errors[0].starts_with("Syntax error: "));
}

#[test]
fn test_operator_typing() {
    let schema = contact_schema();

    let plus = validate_formula("name + age", &schema);
    assert!(plus.is_valid);
    assert_eq!(plus.inferred_type, ResultType::Text);
    assert!(plus.warnings.is_empty());

    let times = validate_formula("name * 2", &schema);
    assert!(times.is_valid);
    assert_eq!(times.inferred_type, ResultType::Number);
    assert_eq!(times.warnings.len(), 1);

    let cond = validate_formula("active and age >= 18", &schema);
    assert_eq!(cond.inferred_type, ResultType::Boolean);
    assert_eq!(cond.field_references.len(), 2);
}

#[test]
fn test_validation_is_idempotent() {
    let schema = contact_schema();
    let first = validate_formula("if_else(active, upper(name), \"-\")", &schema);
    let second = validate_formula("if_else(active, upper(name), \"-\")", &schema);
    assert_eq!(first, second);
}
