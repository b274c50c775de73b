//! # fieldrules-core
//!
//! Core data model for the fieldrules engine.
//!
//! This crate provides the types shared by the formula, control-rule and
//! conflict layers:
//! - [`Value`] and [`FieldValues`] - Runtime field values
//! - [`FieldType`] and [`SchemaField`] - Schema field kinds and snapshots
//! - [`EntityDefinition`], [`FieldDefinition`], [`Project`] - Entities and their instances
//! - [`ControlRule`], [`RuleEffect`], [`ControlEffect`] - Conditional field behavior
//! - [`Override`] and [`ConflictInfo`] - User overrides and detected conflicts
//!
//! ## Example
//!
//! ```rust
//! use fieldrules_core::{ControlRule, EntityDefinition, FieldDefinition, FieldType, RuleEffect};
//!
//! let entity = EntityDefinition::new("project", "Project")
//!     .with_field(FieldDefinition::new("qty", FieldType::Number))
//!     .with_field(FieldDefinition::new("unit_price", FieldType::Currency))
//!     .with_field(FieldDefinition::new("total", FieldType::Currency).with_rule(
//!         ControlRule::new(
//!             "r1",
//!             "Compute total",
//!             "qty > 0",
//!             RuleEffect::value_formula("total", "qty * unit_price"),
//!         ),
//!     ));
//!
//! assert_eq!(entity.rules().count(), 1);
//! ```

pub mod conflict;
pub mod control;
pub mod entity;
pub mod error;
pub mod field;
pub mod overrides;
pub mod value;

// Re-exports for convenience
pub use conflict::{ConflictInfo, ConflictType};
pub use control::{ControlEffect, ControlRule, ControlType, EffectValue, RuleEffect};
pub use entity::{EntityDefinition, FieldDefinition, Project};
pub use error::{Error, Result};
pub use field::{FieldType, SchemaField};
pub use overrides::{Override, OverrideState};
pub use value::{FieldValues, Value};
