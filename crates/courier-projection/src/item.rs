use serde::{Deserialize, Serialize};

use courier_shared::{ActivityDescriptor, Entity, EntityId, EntityKind};

/// Per-entity projection record used for ordering, grouping and display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiItem {
    pub entity_id: EntityId,
    pub kind: EntityKind,
    /// Peer the item is about; equals `entity_id` for conversations.
    pub subject_id: EntityId,
    pub display_name: String,
    pub secondary_score: f64,
    pub avatar: Option<String>,
    pub last_activity: Option<ActivityDescriptor>,
}

impl UiItem {
    pub fn from_entity(entity: Entity, activity: Option<ActivityDescriptor>) -> Self {
        let subject_id = entity.subject();
        Self {
            entity_id: entity.id,
            kind: entity.kind,
            subject_id,
            display_name: entity.display_name,
            secondary_score: entity.secondary_score,
            avatar: entity.avatar,
            last_activity: activity,
        }
    }

    /// Ordering timestamp in millis. Items with no activity sort as `0`.
    pub fn activity_timestamp(&self) -> i64 {
        self.last_activity
            .as_ref()
            .map(ActivityDescriptor::timestamp_millis)
            .unwrap_or(0)
    }

    /// Case-insensitive substring match on the display name.
    pub fn name_matches(&self, query: &str) -> bool {
        self.display_name
            .to_lowercase()
            .contains(&query.to_lowercase())
    }
}
