//! Repository interfaces for projects and entity definitions
//!
//! The orchestration service loads its inputs through these traits, so the
//! host application can back them with any storage. Loads are synchronous
//! and blocking; retries and timeouts are the implementor's concern.

use crate::{EntityDefinition, Project};
use std::collections::HashMap;
use std::sync::RwLock;
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A storage backend failure
#[derive(Debug, Error)]
#[error("{message}")]
pub struct RepositoryError {
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl RepositoryError {
    /// Create an error with a message only
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Create an error wrapping an underlying cause
    pub fn with_source(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Get the message
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Result type alias using [`RepositoryError`]
pub type RepositoryResult<T> = std::result::Result<T, RepositoryError>;

/// Loads projects by id
pub trait ProjectRepository: Send + Sync {
    /// Load a project; `Ok(None)` when no project has this id
    fn get_project(&self, project_id: &str) -> RepositoryResult<Option<Project>>;
}

/// Loads entity definitions by id
pub trait SchemaRepository: Send + Sync {
    /// Load an entity definition; `Ok(None)` when no entity has this id
    fn get_entity_definition(&self, entity_id: &str) -> RepositoryResult<Option<EntityDefinition>>;
}

/// In-memory [`ProjectRepository`]
#[derive(Debug, Default)]
pub struct InMemoryProjectRepository {
    projects: RwLock<HashMap<String, Project>>,
}

impl InMemoryProjectRepository {
    /// Create an empty repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a project (builder style)
    pub fn with_project(self, project: Project) -> Self {
        self.insert(project);
        self
    }

    /// Insert or replace a project
    pub fn insert(&self, project: Project) {
        match self.projects.write() {
            Ok(mut projects) => {
                projects.insert(project.id.clone(), project);
            }
            Err(poisoned) => {
                poisoned.into_inner().insert(project.id.clone(), project);
            }
        }
    }
}

impl ProjectRepository for InMemoryProjectRepository {
    fn get_project(&self, project_id: &str) -> RepositoryResult<Option<Project>> {
        let projects = self
            .projects
            .read()
            .map_err(|_| RepositoryError::new("project store lock poisoned"))?;
        Ok(projects.get(project_id).cloned())
    }
}

/// In-memory [`SchemaRepository`]
#[derive(Debug, Default)]
pub struct InMemorySchemaRepository {
    entities: RwLock<HashMap<String, EntityDefinition>>,
}

impl InMemorySchemaRepository {
    /// Create an empty repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entity definition (builder style)
    pub fn with_entity(self, entity: EntityDefinition) -> Self {
        self.insert(entity);
        self
    }

    /// Insert or replace an entity definition
    pub fn insert(&self, entity: EntityDefinition) {
        match self.entities.write() {
            Ok(mut entities) => {
                entities.insert(entity.id.clone(), entity);
            }
            Err(poisoned) => {
                poisoned.into_inner().insert(entity.id.clone(), entity);
            }
        }
    }
}

impl SchemaRepository for InMemorySchemaRepository {
    fn get_entity_definition(&self, entity_id: &str) -> RepositoryResult<Option<EntityDefinition>> {
        let entities = self
            .entities
            .read()
            .map_err(|_| RepositoryError::new("schema store lock poisoned"))?;
        Ok(entities.get(entity_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_in_memory_projects() {
        let repo = InMemoryProjectRepository::new().with_project(Project::new("p1", "One", "e1"));
        assert_eq!(repo.get_project("p1").unwrap().map(|p| p.name), Some("One".to_string()));
        assert!(repo.get_project("p2").unwrap().is_none());

        repo.insert(Project::new("p1", "Renamed", "e1"));
        assert_eq!(
            repo.get_project("p1").unwrap().map(|p| p.name),
            Some("Renamed".to_string())
        );
    }

    #[test]
    fn test_in_memory_entities() {
        let repo = InMemorySchemaRepository::new().with_entity(EntityDefinition::new("e1", "E"));
        assert!(repo.get_entity_definition("e1").unwrap().is_some());
        assert!(repo.get_entity_definition("e2").unwrap().is_none());
    }

    #[test]
    fn test_error_source_chain() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
        let err = RepositoryError::with_source("load failed", io);
        assert_eq!(err.to_string(), "load failed");
        assert_eq!(err.source().map(|e| e.to_string()), Some("disk on fire".to_string()));
        assert!(RepositoryError::new("x").source().is_none());
    }
}
