//! Orchestration service
//!
//! Loads projects and entity definitions from repositories and runs the
//! control-rule engine, the calculated-field engine and the conflict
//! detector against them.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use fieldrules::prelude::*;
//! use fieldrules::{ControlService, InMemoryProjectRepository, InMemorySchemaRepository};
//!
//! let entity = EntityDefinition::new("invoice", "Invoice")
//!     .with_field(FieldDefinition::new("qty", FieldType::Number))
//!     .with_field(FieldDefinition::new("notes", FieldType::TextArea).with_rule(
//!         ControlRule::new("r1", "Require notes", "qty > 100", RuleEffect::required("notes", true)),
//!     ));
//! let project = Project::new("p1", "Big order", "invoice").with_value("qty", 500);
//!
//! let service = ControlService::new()
//!     .with_project_repository(Arc::new(InMemoryProjectRepository::new().with_project(project)))
//!     .with_schema_repository(Arc::new(InMemorySchemaRepository::new().with_entity(entity)));
//!
//! let result = service.evaluate_project_controls("p1").unwrap();
//! assert!(result.field_state("notes").required);
//! ```

use crate::calculation::{calculate_fields_with, CalculationResult};
use crate::conflict::{detect_conflict, ConflictError};
use crate::control::{ControlEngine, ControlOptions, EvaluationResult};
use crate::repository::{ProjectRepository, RepositoryError, SchemaRepository};
use crate::{ConflictInfo, EntityDefinition, FieldValues, Override, Project};
use std::sync::Arc;
use thiserror::Error;

/// Errors raised at the service boundary
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("No project repository configured")]
    NoProjectRepository,

    #[error("No schema repository configured")]
    NoSchemaRepository,

    /// Id that is empty or contains characters outside `[A-Za-z0-9_-]`
    #[error("Invalid {kind} id: {id:?}")]
    InvalidId { kind: &'static str, id: String },

    #[error("Failed to load project '{id}'")]
    ProjectLoad {
        id: String,
        #[source]
        source: RepositoryError,
    },

    #[error("Project not found: '{0}'")]
    ProjectNotFound(String),

    #[error("Failed to load entity definition '{id}'")]
    EntityLoad {
        id: String,
        #[source]
        source: RepositoryError,
    },

    #[error("Entity definition not found: '{0}'")]
    EntityNotFound(String),

    #[error(transparent)]
    Conflict(#[from] ConflictError),
}

/// Result type alias using [`ServiceError`]
pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

fn check_id(kind: &'static str, id: &str) -> ServiceResult<()> {
    let well_formed = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if !well_formed {
        return Err(ServiceError::InvalidId {
            kind,
            id: id.to_string(),
        });
    }
    Ok(())
}

/// Runs rule evaluation for stored projects
#[derive(Clone, Default)]
pub struct ControlService {
    projects: Option<Arc<dyn ProjectRepository>>,
    schemas: Option<Arc<dyn SchemaRepository>>,
    options: ControlOptions,
}

impl std::fmt::Debug for ControlService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControlService")
            .field("projects", &self.projects.is_some())
            .field("schemas", &self.schemas.is_some())
            .field("options", &self.options)
            .finish()
    }
}

impl ControlService {
    /// Create a service with no repositories
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the project repository
    pub fn with_project_repository(mut self, repository: Arc<dyn ProjectRepository>) -> Self {
        self.projects = Some(repository);
        self
    }

    /// Set the schema repository
    pub fn with_schema_repository(mut self, repository: Arc<dyn SchemaRepository>) -> Self {
        self.schemas = Some(repository);
        self
    }

    /// Set the engine options
    pub fn with_options(mut self, options: ControlOptions) -> Self {
        self.options = options;
        self
    }

    /// Load a project by id
    pub fn load_project(&self, project_id: &str) -> ServiceResult<Project> {
        let repository = self
            .projects
            .as_ref()
            .ok_or(ServiceError::NoProjectRepository)?;
        check_id("project", project_id)?;

        repository
            .get_project(project_id)
            .map_err(|source| ServiceError::ProjectLoad {
                id: project_id.to_string(),
                source,
            })?
            .ok_or_else(|| ServiceError::ProjectNotFound(project_id.to_string()))
    }

    /// Load an entity definition by id
    pub fn load_entity(&self, entity_id: &str) -> ServiceResult<EntityDefinition> {
        let repository = self
            .schemas
            .as_ref()
            .ok_or(ServiceError::NoSchemaRepository)?;
        check_id("entity", entity_id)?;

        repository
            .get_entity_definition(entity_id)
            .map_err(|source| ServiceError::EntityLoad {
                id: entity_id.to_string(),
                source,
            })?
            .ok_or_else(|| ServiceError::EntityNotFound(entity_id.to_string()))
    }

    fn load_project_and_entity(
        &self,
        project_id: &str,
    ) -> ServiceResult<(Project, EntityDefinition)> {
        let project = self.load_project(project_id)?;
        let entity = self.load_entity(&project.entity_definition_id)?;
        Ok((project, entity))
    }

    /// Evaluate the rules of a stored project against its current values
    pub fn evaluate_project_controls(&self, project_id: &str) -> ServiceResult<EvaluationResult> {
        let (project, entity) = self.load_project_and_entity(project_id)?;
        tracing::info!(project = %project.id, entity = %entity.id, "evaluating project controls");
        Ok(self.engine().evaluate(&entity, &project.field_values))
    }

    /// Evaluate the rules of a stored entity against caller-supplied values
    pub fn evaluate_entity_controls(
        &self,
        entity_id: &str,
        field_values: &FieldValues,
    ) -> ServiceResult<EvaluationResult> {
        let entity = self.load_entity(entity_id)?;
        tracing::info!(entity = %entity.id, "evaluating entity controls");
        Ok(self.engine().evaluate(&entity, field_values))
    }

    /// Compute the calculated fields of a stored project
    pub fn calculate_project_fields(&self, project_id: &str) -> ServiceResult<CalculationResult> {
        let (project, entity) = self.load_project_and_entity(project_id)?;
        tracing::info!(project = %project.id, entity = %entity.id, "calculating project fields");
        Ok(calculate_fields_with(
            &entity,
            &project.field_values,
            crate::standard_registry(),
        ))
    }

    /// Re-run conflict detection for an override and record the outcome on it
    ///
    /// The computed value comes from the field's formula and the control value
    /// from the last `VALUE_SET` effect on the field. Fields whose value could
    /// not be computed only take part through the control value.
    pub fn refresh_override_conflict(
        &self,
        ov: &mut Override,
    ) -> ServiceResult<Option<ConflictInfo>> {
        let (project, entity) = self.load_project_and_entity(&ov.project_id)?;

        let calculated = calculate_fields_with(
            &entity,
            &project.field_values,
            crate::standard_registry(),
        );
        let computed = calculated.values.get(&ov.field_id);

        // Rules see the freshly calculated values
        let values = calculated.merged(&project.field_values);
        let controls = self.engine().evaluate(&entity, &values);
        let control = controls.field_state(&ov.field_id).value;

        let conflict = detect_conflict(&ov.field_id, &ov.override_value, computed, control.as_ref())?;
        ov.apply_conflict(conflict.as_ref());

        tracing::info!(
            override_id = %ov.id,
            field = %ov.field_id,
            conflict = ?conflict.as_ref().map(|c| c.conflict_type),
            "refreshed override conflict"
        );
        Ok(conflict)
    }

    fn engine(&self) -> ControlEngine<'static> {
        ControlEngine::new(self.options.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{InMemoryProjectRepository, InMemorySchemaRepository, RepositoryResult};
    use crate::{ConflictType, ControlRule, FieldDefinition, FieldType, RuleEffect, Value};
    use pretty_assertions::assert_eq;

    struct BrokenProjects;

    impl ProjectRepository for BrokenProjects {
        fn get_project(&self, _project_id: &str) -> RepositoryResult<Option<Project>> {
            Err(RepositoryError::new("connection refused"))
        }
    }

    struct BrokenSchemas;

    impl SchemaRepository for BrokenSchemas {
        fn get_entity_definition(
            &self,
            _entity_id: &str,
        ) -> RepositoryResult<Option<EntityDefinition>> {
            Err(RepositoryError::with_source(
                "schema backend unavailable",
                std::io::Error::new(std::io::ErrorKind::TimedOut, "read timed out"),
            ))
        }
    }

    fn invoice() -> EntityDefinition {
        EntityDefinition::new("invoice", "Invoice")
            .with_field(FieldDefinition::new("qty", FieldType::Number))
            .with_field(FieldDefinition::new("unit_price", FieldType::Currency))
            .with_field(
                FieldDefinition::new("subtotal", FieldType::Calculated)
                    .with_formula("qty * unit_price"),
            )
            .with_field(FieldDefinition::new("total", FieldType::Currency).with_rule(
                ControlRule::new(
                    "r1",
                    "Copy subtotal",
                    "qty > 0",
                    RuleEffect::value_formula("total", "subtotal"),
                ),
            ))
    }

    fn service() -> ControlService {
        let project = Project::new("p1", "Order", "invoice")
            .with_value("qty", 3)
            .with_value("unit_price", 500);
        let orphan = Project::new("p2", "Orphan", "gone");
        ControlService::new()
            .with_project_repository(Arc::new(
                InMemoryProjectRepository::new()
                    .with_project(project)
                    .with_project(orphan),
            ))
            .with_schema_repository(Arc::new(InMemorySchemaRepository::new().with_entity(invoice())))
    }

    #[test]
    fn test_missing_repositories() {
        let err = ControlService::new().evaluate_project_controls("p1").unwrap_err();
        assert!(matches!(err, ServiceError::NoProjectRepository));

        let err = ControlService::new()
            .evaluate_entity_controls("invoice", &FieldValues::new())
            .unwrap_err();
        assert!(matches!(err, ServiceError::NoSchemaRepository));
    }

    #[test]
    fn test_malformed_ids() {
        for id in ["", " ", "p 1", "p1;drop", "é"] {
            let err = service().evaluate_project_controls(id).unwrap_err();
            assert!(
                matches!(err, ServiceError::InvalidId { kind: "project", .. }),
                "{:?} gave {:?}",
                id,
                err
            );
        }
    }

    #[test]
    fn test_not_found() {
        let err = service().evaluate_project_controls("nope").unwrap_err();
        assert_eq!(err.to_string(), "Project not found: 'nope'");

        let err = service().evaluate_project_controls("p2").unwrap_err();
        assert_eq!(err.to_string(), "Entity definition not found: 'gone'");
    }

    #[test]
    fn test_load_failure_keeps_source() {
        use std::error::Error as _;

        let err = ControlService::new()
            .with_project_repository(Arc::new(BrokenProjects))
            .load_project("p1")
            .unwrap_err();
        assert_eq!(err.to_string(), "Failed to load project 'p1'");
        assert_eq!(
            err.source().map(|e| e.to_string()),
            Some("connection refused".to_string())
        );
    }

    #[test]
    fn test_entity_load_failure_keeps_source() {
        use std::error::Error as _;

        let projects = InMemoryProjectRepository::new()
            .with_project(Project::new("p1", "Order", "invoice"));
        let service = ControlService::new()
            .with_project_repository(Arc::new(projects))
            .with_schema_repository(Arc::new(BrokenSchemas));

        let err = service.evaluate_project_controls("p1").unwrap_err();
        assert!(matches!(err, ServiceError::EntityLoad { ref id, .. } if id == "invoice"));
        assert_eq!(err.to_string(), "Failed to load entity definition 'invoice'");

        let source = err.source().expect("repository error is kept");
        assert_eq!(source.to_string(), "schema backend unavailable");
        assert_eq!(
            source.source().map(|e| e.to_string()),
            Some("read timed out".to_string())
        );
    }

    #[test]
    fn test_project_controls_use_stored_values() {
        // subtotal is not stored, so the copy rule cannot resolve its value
        let result = service().evaluate_project_controls("p1").unwrap();
        assert!(result.effects.is_empty());
        assert_eq!(
            result.errors,
            vec!["Rule 'Copy subtotal' (r1): effect value: Field 'subtotal' not found".to_string()]
        );
    }

    #[test]
    fn test_entity_controls() {
        let mut values = FieldValues::new();
        values.insert("qty".into(), Value::Integer(2));
        values.insert("subtotal".into(), Value::Integer(40));

        let result = service().evaluate_entity_controls("invoice", &values).unwrap();
        assert_eq!(result.field_state("total").value, Some(Value::Integer(40)));
    }

    #[test]
    fn test_calculate_project_fields() {
        let result = service().calculate_project_fields("p1").unwrap();
        assert_eq!(result.values.get("subtotal"), Some(&Value::Integer(1500)));
    }

    #[test]
    fn test_refresh_override_conflict() {
        let service = service();

        // subtotal: formula gives 1500
        let mut ov = Override::new("o1", "p1", "subtotal", 1600, 1500);
        let conflict = service.refresh_override_conflict(&mut ov).unwrap();
        assert_eq!(
            conflict.map(|c| c.conflict_type),
            Some(ConflictType::Formula)
        );
        assert_eq!(ov.conflict_type, Some(ConflictType::Formula));

        // total: the rule copies the calculated subtotal
        let mut ov = Override::new("o2", "p1", "total", 1500, 0);
        ov.mark_conflict(ConflictType::Control);
        assert_eq!(service.refresh_override_conflict(&mut ov).unwrap(), None);
        assert_eq!(ov.conflict_type, None);

        let mut ov = Override::new("o3", "p1", "total", 1, 0);
        let conflict = service.refresh_override_conflict(&mut ov).unwrap().unwrap();
        assert_eq!(conflict.conflict_type, ConflictType::Control);
        assert_eq!(conflict.control_value, Some(Value::Integer(1500)));
    }
}
