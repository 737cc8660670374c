//! Pure mapping from a grouped row to the data a list cell displays.

use chrono::{DateTime, Utc};
use serde::Serialize;

use courier_shared::{EntityId, EntityKind, NotificationType};

use crate::grouping::GroupedItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Icon {
    Contact,
    Group,
    CallReceiver,
    IncomingCall,
    OutgoingCall,
    MissedCall,
    Notification(NotificationType),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Presentation {
    pub entity_id: EntityId,
    pub title: String,
    pub subtitle: Option<String>,
    pub icon: Icon,
    pub is_video: bool,
    /// Number of collapsed rows; 1 for a plain row.
    pub count: usize,
    pub timestamp: Option<DateTime<Utc>>,
    /// Missed call, or a notification not yet acknowledged.
    pub highlighted: bool,
    pub avatar: Option<String>,
}

pub fn present(group: &GroupedItem) -> Presentation {
    let item = &group.representative;
    let activity = item.last_activity.as_ref();

    let icon = match item.kind {
        EntityKind::Contact => Icon::Contact,
        EntityKind::Group => Icon::Group,
        EntityKind::CallReceiver => Icon::CallReceiver,
        EntityKind::Call => match activity {
            Some(a) if a.is_missed() => Icon::MissedCall,
            Some(a) if a.is_incoming => Icon::IncomingCall,
            _ => Icon::OutgoingCall,
        },
        EntityKind::Notification => activity
            .and_then(|a| a.notification_type())
            .map(Icon::Notification)
            .unwrap_or(Icon::Contact),
    };

    let highlighted = match item.kind {
        EntityKind::Call => activity.is_some_and(|a| a.is_missed()),
        EntityKind::Notification => group
            .constituents
            .iter()
            .any(|c| c.last_activity.as_ref().is_some_and(|a| !a.is_acknowledged)),
        _ => false,
    };

    Presentation {
        entity_id: item.entity_id,
        title: item.display_name.clone(),
        subtitle: activity.and_then(|a| a.payload.clone()),
        icon,
        is_video: activity.is_some_and(|a| a.is_video),
        count: group.count,
        timestamp: activity.map(|a| a.created_at),
        highlighted,
        avatar: item.avatar.clone(),
    }
}
