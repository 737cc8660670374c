//! Messages crossing the engine boundary.
//!
//! [`ProjectionEvent`]s flow in from the backend; [`BackendRequest`]s flow
//! out and are answered asynchronously by the host, whose answers come
//! back as further events.

use serde::{Deserialize, Serialize};

use courier_shared::{ActivityDescriptor, DescriptorId, Entity, EntityId};

use crate::sweep::SweepId;

/// An entity paired with its latest activity, as returned by backend queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityEntry {
    pub entity: Entity,
    #[serde(default)]
    pub activity: Option<ActivityDescriptor>,
}

impl EntityEntry {
    pub fn new(entity: Entity, activity: Option<ActivityDescriptor>) -> Self {
        Self { entity, activity }
    }
}

/// Inbound backend events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProjectionEvent {
    /// Answer to a "get all" query.
    BulkLoaded { entries: Vec<EntityEntry> },
    EntityCreated {
        entity: Entity,
        #[serde(default)]
        activity: Option<ActivityDescriptor>,
    },
    EntityUpdated {
        entity: Entity,
        #[serde(default)]
        activity: Option<ActivityDescriptor>,
    },
    EntityDeleted { entity_id: EntityId },
    /// Activity records removed in bulk; affected entities must be resolved.
    DescriptorsDeleted { descriptor_ids: Vec<DescriptorId> },
    /// The active workspace changed; everything known is invalid.
    WorkspaceReset,
    /// Answer to [`BackendRequest::SearchByName`].
    NameSearchResults {
        query: String,
        entries: Vec<EntityEntry>,
    },
    /// Answer to [`BackendRequest::SearchByContent`].
    ContentSearchResults {
        query: String,
        entries: Vec<EntityEntry>,
    },
}

/// Outbound asynchronous requests to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "request", rename_all = "snake_case")]
pub enum BackendRequest {
    LoadAll,
    /// Re-derive the latest activity of an entity after its last one was deleted.
    LastDescriptor { entity_id: EntityId },
    SearchByName { query: String },
    SearchByContent { query: String },
    Delete { entity_id: EntityId },
}

/// Result of applying one event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyOutcome {
    /// The views changed and listeners were notified.
    pub changed: bool,
    /// Delete sweeps completed by this event.
    pub sweeps_completed: Vec<SweepId>,
}

impl ApplyOutcome {
    pub fn unchanged() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_shared::EntityKind;

    #[test]
    fn test_event_tagging() {
        let json = serde_json::to_string(&ProjectionEvent::WorkspaceReset).unwrap();
        assert_eq!(json, r#"{"event":"workspace_reset"}"#);
    }

    #[test]
    fn test_created_without_activity_parses() {
        let id = EntityId::new();
        let json = format!(
            r#"{{"event":"entity_created","entity":{{"id":"{id}","kind":"contact","display_name":"Ann"}}}}"#
        );
        let event: ProjectionEvent = serde_json::from_str(&json).unwrap();
        match event {
            ProjectionEvent::EntityCreated { entity, activity } => {
                assert_eq!(entity.id, id);
                assert_eq!(entity.kind, EntityKind::Contact);
                assert!(activity.is_none());
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_request_tagging() {
        let id = EntityId::new();
        let json = serde_json::to_string(&BackendRequest::Delete { entity_id: id }).unwrap();
        assert_eq!(json, format!(r#"{{"request":"delete","entity_id":"{id}"}}"#));
    }
}
