//! Backend-owned records observed by the projection engine.
//!
//! The engine never mutates these; it only reads identity, display name
//! and the activity fields that drive ordering and grouping.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{DescriptorId, EntityId};

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// What an entity is on the screen that lists it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// Direct conversation with a contact.
    Contact,
    /// Group conversation.
    Group,
    /// Conversation opened through a call receiver link.
    CallReceiver,
    /// A single call record (Calls screen).
    Call,
    /// A single notification (Notifications screen).
    Notification,
}

/// A contact, group, call or notification as published by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
    pub display_name: String,
    /// The peer this entity is about (a call's contact, a notification's
    /// subject). `None` means the entity is its own subject.
    #[serde(default)]
    pub subject_id: Option<EntityId>,
    /// Backend-supplied usage score, used to rank never-contacted entities.
    #[serde(default)]
    pub secondary_score: f64,
    /// Display-only avatar reference.
    #[serde(default)]
    pub avatar: Option<String>,
}

impl Entity {
    pub fn new(id: EntityId, kind: EntityKind, display_name: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            display_name: display_name.into(),
            subject_id: None,
            secondary_score: 0.0,
            avatar: None,
        }
    }

    pub fn with_subject(mut self, subject_id: EntityId) -> Self {
        self.subject_id = Some(subject_id);
        self
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.secondary_score = score;
        self
    }

    pub fn with_avatar(mut self, avatar: impl Into<String>) -> Self {
        self.avatar = Some(avatar.into());
        self
    }

    /// The subject used for grouping: the explicit subject or the entity itself.
    pub fn subject(&self) -> EntityId {
        self.subject_id.unwrap_or(self.id)
    }
}

// ---------------------------------------------------------------------------
// Activity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    NewContact,
    UpdatedContact,
    UpdatedAvatarContact,
    DeletedContact,
    MissedAudioCall,
    MissedVideoCall,
    ResetConversation,
    NewTextMessage,
    NewImageMessage,
    NewAudioMessage,
    NewVideoMessage,
    NewFileMessage,
    NewGeolocation,
    NewGroupInvitation,
    NewGroupJoined,
    DeletedGroup,
    NewContactInvitation,
    UpdatedAnnotation,
}

impl NotificationType {
    /// Invitations and group membership changes always stay on their own row.
    pub fn is_groupable(self) -> bool {
        !matches!(
            self,
            Self::NewGroupInvitation
                | Self::NewContactInvitation
                | Self::NewGroupJoined
                | Self::DeletedGroup
        )
    }
}

/// Logical type tag of an activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Message,
    Call,
    Invitation,
    Reset,
    Notification(NotificationType),
}

/// The most recent event known for an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityDescriptor {
    pub id: DescriptorId,
    pub created_at: DateTime<Utc>,
    pub kind: ActivityKind,
    /// Group member who produced the activity, for group subjects.
    #[serde(default)]
    pub group_member_id: Option<EntityId>,
    #[serde(default)]
    pub is_incoming: bool,
    #[serde(default)]
    pub is_video: bool,
    #[serde(default)]
    pub is_accepted: bool,
    #[serde(default)]
    pub is_acknowledged: bool,
    /// Opaque display payload (message preview, call duration, ...).
    #[serde(default)]
    pub payload: Option<String>,
}

impl ActivityDescriptor {
    pub fn new(kind: ActivityKind, created_at: DateTime<Utc>) -> Self {
        Self {
            id: DescriptorId::new(),
            created_at,
            kind,
            group_member_id: None,
            is_incoming: false,
            is_video: false,
            is_accepted: false,
            is_acknowledged: false,
            payload: None,
        }
    }

    /// Build a descriptor from a Unix timestamp in milliseconds.
    pub fn at_millis(kind: ActivityKind, millis: i64) -> Self {
        let created_at = DateTime::<Utc>::from_timestamp_millis(millis).unwrap_or_default();
        Self::new(kind, created_at)
    }

    pub fn incoming(mut self) -> Self {
        self.is_incoming = true;
        self
    }

    pub fn video(mut self) -> Self {
        self.is_video = true;
        self
    }

    pub fn accepted(mut self) -> Self {
        self.is_accepted = true;
        self
    }

    pub fn acknowledged(mut self) -> Self {
        self.is_acknowledged = true;
        self
    }

    pub fn from_member(mut self, member: EntityId) -> Self {
        self.group_member_id = Some(member);
        self
    }

    pub fn with_payload(mut self, payload: impl Into<String>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    /// Ordering timestamp (Unix epoch millis).
    pub fn timestamp_millis(&self) -> i64 {
        self.created_at.timestamp_millis()
    }

    /// An incoming call that was never picked up.
    pub fn is_missed(&self) -> bool {
        self.is_incoming && !self.is_accepted
    }

    pub fn notification_type(&self) -> Option<NotificationType> {
        match self.kind {
            ActivityKind::Notification(t) => Some(t),
            _ => None,
        }
    }
}
