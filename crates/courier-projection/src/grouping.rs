//! Collapse adjacent items that describe the same logical event.
//!
//! Grouping is a read-time transform over an ordered snapshot. A single
//! forward scan merges consecutive items that share a [`GroupKey`]; items
//! without a key are always emitted on their own.

use serde::{Deserialize, Serialize};

use courier_shared::{ActivityKind, EntityId, NotificationType};

use crate::item::UiItem;

/// Equivalence relation applied by a screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupingRule {
    /// One row per conversation.
    Conversations,
    /// Consecutive calls with the same peer, media and missed state.
    Calls,
    /// Consecutive notifications of the same type about the same subject.
    Notifications,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GroupKey {
    Call {
        subject: EntityId,
        is_video: bool,
        is_missed: bool,
    },
    Notification {
        subject: EntityId,
        member: Option<EntityId>,
        kind: NotificationType,
    },
}

impl GroupingRule {
    /// Grouping key of `item`, or `None` if it must stay a singleton.
    pub fn key(self, item: &UiItem) -> Option<GroupKey> {
        let activity = item.last_activity.as_ref()?;
        match self {
            Self::Conversations => None,
            Self::Calls => match activity.kind {
                ActivityKind::Call => Some(GroupKey::Call {
                    subject: item.subject_id,
                    is_video: activity.is_video,
                    is_missed: activity.is_missed(),
                }),
                _ => None,
            },
            Self::Notifications => {
                let kind = activity.notification_type()?;
                kind.is_groupable().then_some(GroupKey::Notification {
                    subject: item.subject_id,
                    member: activity.group_member_id,
                    kind,
                })
            }
        }
    }
}

/// A run of one or more equivalent items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupedItem {
    /// Most recent member of the run.
    pub representative: UiItem,
    /// Every member of the run, most recent first.
    pub constituents: Vec<UiItem>,
    pub count: usize,
}

impl GroupedItem {
    fn singleton(item: UiItem) -> Self {
        Self {
            representative: item.clone(),
            constituents: vec![item],
            count: 1,
        }
    }

    fn push(&mut self, item: UiItem) {
        self.constituents.push(item);
        self.count = self.constituents.len();
    }

}

/// Collapse consecutive runs of `items` under `rule`.
pub fn group(items: &[UiItem], rule: GroupingRule) -> Vec<GroupedItem> {
    let mut groups: Vec<GroupedItem> = Vec::with_capacity(items.len());
    let mut current_key: Option<GroupKey> = None;

    for item in items {
        let key = rule.key(item);
        match (&key, groups.last_mut()) {
            (Some(k), Some(last)) if current_key.as_ref() == Some(k) => last.push(item.clone()),
            _ => groups.push(GroupedItem::singleton(item.clone())),
        }
        current_key = key;
    }

    groups
}

/// Expand groups back into the raw ordered items.
pub fn flatten(groups: &[GroupedItem]) -> Vec<UiItem> {
    groups
        .iter()
        .flat_map(|g| g.constituents.iter().cloned())
        .collect()
}
