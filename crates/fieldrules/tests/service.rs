//! Repository-backed orchestration

use fieldrules::prelude::*;
use fieldrules::{
    ControlService, InMemoryProjectRepository, InMemorySchemaRepository, ServiceError,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn service() -> ControlService {
    let entity = EntityDefinition::new("ticket", "Ticket")
        .with_field(FieldDefinition::new("status", FieldType::Dropdown))
        .with_field(FieldDefinition::new("resolution", FieldType::TextArea).with_rule(
            ControlRule::new(
                "r_resolution",
                "Resolution required when closed",
                "status == \"closed\"",
                RuleEffect::required("resolution", true),
            ),
        ));

    let projects = InMemoryProjectRepository::new()
        .with_project(Project::new("t-1", "Open ticket", "ticket").with_value("status", "open"))
        .with_project(Project::new("t-2", "Closed ticket", "ticket").with_value("status", "closed"));

    ControlService::new()
        .with_project_repository(Arc::new(projects))
        .with_schema_repository(Arc::new(InMemorySchemaRepository::new().with_entity(entity)))
}

#[test]
fn test_evaluate_stored_projects() {
    let service = service();

    let open = service.evaluate_project_controls("t-1").unwrap();
    assert!(!open.field_state("resolution").required);

    let closed = service.evaluate_project_controls("t-2").unwrap();
    assert!(closed.field_state("resolution").required);
}

#[test]
fn test_service_errors_are_distinct() {
    let err = ControlService::new().evaluate_project_controls("t-1").unwrap_err();
    assert!(matches!(err, ServiceError::NoProjectRepository));

    let err = service().evaluate_project_controls("t 1").unwrap_err();
    assert_eq!(err.to_string(), "Invalid project id: \"t 1\"");

    let err = service().evaluate_project_controls("t-3").unwrap_err();
    assert!(matches!(err, ServiceError::ProjectNotFound(ref id) if id == "t-3"));

    let err = service()
        .evaluate_entity_controls("nothing", &FieldValues::new())
        .unwrap_err();
    assert!(matches!(err, ServiceError::EntityNotFound(_)));
}

#[test]
fn test_service_is_shareable_across_threads() {
    let service = Arc::new(service());
    let handles: Vec<_> = ["t-1", "t-2"]
        .into_iter()
        .map(|id| {
            let service = Arc::clone(&service);
            std::thread::spawn(move || service.evaluate_project_controls(id).map(|r| r.effects.len()))
        })
        .collect();

    let counts: Vec<usize> = handles
        .into_iter()
        .map(|h| h.join().unwrap().unwrap())
        .collect();
    assert_eq!(counts, vec![0, 1]);
}
