//! Schema field kinds and the read-only schema snapshot

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Kind of a schema field, as named by the host application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum FieldType {
    Text,
    TextArea,
    Email,
    Url,
    Dropdown,
    Radio,
    Date,
    DateTime,
    Number,
    Currency,
    #[cfg_attr(feature = "serde", serde(alias = "checkbox"))]
    Boolean,
    Calculated,
    Lookup,
    Table,
    MultiSelect,
    File,
}

impl FieldType {
    /// All known field kinds
    pub const ALL: [FieldType; 16] = [
        FieldType::Text,
        FieldType::TextArea,
        FieldType::Email,
        FieldType::Url,
        FieldType::Dropdown,
        FieldType::Radio,
        FieldType::Date,
        FieldType::DateTime,
        FieldType::Number,
        FieldType::Currency,
        FieldType::Boolean,
        FieldType::Calculated,
        FieldType::Lookup,
        FieldType::Table,
        FieldType::MultiSelect,
        FieldType::File,
    ];

    /// Get the canonical type name
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::TextArea => "textarea",
            FieldType::Email => "email",
            FieldType::Url => "url",
            FieldType::Dropdown => "dropdown",
            FieldType::Radio => "radio",
            FieldType::Date => "date",
            FieldType::DateTime => "datetime",
            FieldType::Number => "number",
            FieldType::Currency => "currency",
            FieldType::Boolean => "boolean",
            FieldType::Calculated => "calculated",
            FieldType::Lookup => "lookup",
            FieldType::Table => "table",
            FieldType::MultiSelect => "multiselect",
            FieldType::File => "file",
        }
    }

    /// Parse a host type name (case-insensitive)
    pub fn parse(name: &str) -> Option<Self> {
        let lower = name.trim().to_ascii_lowercase();
        match lower.as_str() {
            "checkbox" | "bool" => Some(FieldType::Boolean),
            "text_area" => Some(FieldType::TextArea),
            "date_time" => Some(FieldType::DateTime),
            "multi_select" => Some(FieldType::MultiSelect),
            other => FieldType::ALL.into_iter().find(|t| t.as_str() == other),
        }
    }
}

impl FromStr for FieldType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        FieldType::parse(s).ok_or_else(|| Error::InvalidFieldType(s.to_string()))
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a schema snapshot: a field id and the host's type name
///
/// The type name is kept as the host supplied it; unrecognised names are
/// tolerated and simply carry no type information.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SchemaField {
    pub field_id: String,
    pub field_type: String,
}

impl SchemaField {
    /// Create a snapshot entry
    pub fn new(field_id: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self {
            field_id: field_id.into(),
            field_type: field_type.into(),
        }
    }

    /// Get the parsed field kind, if the type name is recognised
    pub fn kind(&self) -> Option<FieldType> {
        FieldType::parse(&self.field_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_field_type() {
        assert_eq!(FieldType::parse("TEXT"), Some(FieldType::Text));
        assert_eq!(FieldType::parse("checkbox"), Some(FieldType::Boolean));
        assert_eq!(FieldType::parse(" Currency "), Some(FieldType::Currency));
        assert_eq!(FieldType::parse("multi_select"), Some(FieldType::MultiSelect));
        assert_eq!(FieldType::parse("hologram"), None);
    }

    #[test]
    fn test_round_trip_names() {
        for kind in FieldType::ALL {
            assert_eq!(FieldType::parse(kind.as_str()), Some(kind));
        }
    }

    #[test]
    fn test_from_str_error() {
        let err = "hologram".parse::<FieldType>().unwrap_err();
        assert_eq!(err.to_string(), "Invalid field type: hologram");
    }

    #[test]
    fn test_schema_field_kind() {
        assert_eq!(SchemaField::new("qty", "number").kind(), Some(FieldType::Number));
        assert_eq!(SchemaField::new("x", "???").kind(), None);
    }
}
