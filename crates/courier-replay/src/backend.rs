//! In-memory stand-in for the backend services.
//!
//! Mirrors the entities and activity history seen in the event log and
//! answers the projection's [`BackendRequest`]s from that state.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use courier_projection::{BackendRequest, EntityEntry, ProjectionEvent};
use courier_shared::{ActivityDescriptor, DescriptorId, Entity, EntityId, EntityKind};

#[derive(Debug, Clone)]
struct Record {
    entity: Entity,
    history: Vec<ActivityDescriptor>,
}

impl Record {
    fn new(entity: Entity) -> Self {
        Self {
            entity,
            history: Vec::new(),
        }
    }

    fn record(&mut self, activity: Option<&ActivityDescriptor>) {
        if let Some(activity) = activity {
            if !self.history.iter().any(|a| a.id == activity.id) {
                self.history.push(activity.clone());
            }
        }
    }

    fn latest(&self) -> Option<ActivityDescriptor> {
        self.history.iter().max_by_key(|a| a.created_at).cloned()
    }

    fn entry(&self) -> EntityEntry {
        EntityEntry::new(self.entity.clone(), self.latest())
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    records: HashMap<EntityId, Record>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Track an event the backend published.
    pub fn observe(&mut self, event: &ProjectionEvent) {
        match event {
            ProjectionEvent::BulkLoaded { entries } => {
                self.records.clear();
                for entry in entries {
                    self.upsert(&entry.entity, entry.activity.as_ref());
                }
            }
            ProjectionEvent::EntityCreated { entity, activity }
            | ProjectionEvent::EntityUpdated { entity, activity } => {
                self.upsert(entity, activity.as_ref());
            }
            ProjectionEvent::EntityDeleted { entity_id } => {
                self.records.remove(entity_id);
            }
            ProjectionEvent::DescriptorsDeleted { descriptor_ids } => {
                self.forget_descriptors(descriptor_ids);
            }
            ProjectionEvent::WorkspaceReset => self.records.clear(),
            ProjectionEvent::NameSearchResults { .. }
            | ProjectionEvent::ContentSearchResults { .. } => {}
        }
    }

    fn upsert(&mut self, entity: &Entity, activity: Option<&ActivityDescriptor>) {
        let record = self
            .records
            .entry(entity.id)
            .or_insert_with(|| Record::new(entity.clone()));
        record.entity = entity.clone();
        record.record(activity);
    }

    /// Drop deleted activity. Call and notification records with no
    /// activity left are gone too.
    fn forget_descriptors(&mut self, descriptor_ids: &[DescriptorId]) {
        let deleted: HashSet<&DescriptorId> = descriptor_ids.iter().collect();
        self.records.retain(|_, record| {
            let before = record.history.len();
            record.history.retain(|a| !deleted.contains(&a.id));
            let emptied = before > 0 && record.history.is_empty();
            !(emptied && matches!(record.entity.kind, EntityKind::Call | EntityKind::Notification))
        });
    }

    /// Answer a request, or `None` if there is nothing to report.
    pub fn answer(&mut self, request: &BackendRequest) -> Option<ProjectionEvent> {
        debug!(?request, "Answering backend request");
        match request {
            BackendRequest::LoadAll => {
                let mut entries: Vec<EntityEntry> = self.records.values().map(Record::entry).collect();
                entries.sort_by_key(|e| e.entity.id);
                Some(ProjectionEvent::BulkLoaded { entries })
            }
            BackendRequest::LastDescriptor { entity_id } => {
                self.records.get(entity_id).map(|record| ProjectionEvent::EntityUpdated {
                    entity: record.entity.clone(),
                    activity: record.latest(),
                })
            }
            BackendRequest::SearchByName { query } => {
                let needle = query.to_lowercase();
                let mut entries: Vec<EntityEntry> = self
                    .records
                    .values()
                    .filter(|r| {
                        matches!(
                            r.entity.kind,
                            EntityKind::Contact | EntityKind::Group | EntityKind::CallReceiver
                        )
                    })
                    .filter(|r| r.entity.display_name.to_lowercase().contains(&needle))
                    .map(Record::entry)
                    .collect();
                entries.sort_by_key(|e| e.entity.display_name.to_lowercase());
                Some(ProjectionEvent::NameSearchResults {
                    query: query.clone(),
                    entries,
                })
            }
            BackendRequest::SearchByContent { query } => {
                let needle = query.to_lowercase();
                let mut entries: Vec<EntityEntry> = self
                    .records
                    .values()
                    .map(Record::entry)
                    .filter(|e| {
                        e.activity
                            .as_ref()
                            .and_then(|a| a.payload.as_ref())
                            .is_some_and(|p| p.to_lowercase().contains(&needle))
                    })
                    .collect();
                entries.sort_by_key(|e| {
                    std::cmp::Reverse(e.activity.as_ref().map(|a| a.timestamp_millis()))
                });
                Some(ProjectionEvent::ContentSearchResults {
                    query: query.clone(),
                    entries,
                })
            }
            BackendRequest::Delete { entity_id } => self
                .records
                .remove(entity_id)
                .map(|_| ProjectionEvent::EntityDeleted {
                    entity_id: *entity_id,
                }),
        }
    }
}
