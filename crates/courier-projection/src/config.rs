use std::str::FromStr;

use serde::{Deserialize, Serialize};

use courier_shared::constants::MIN_RESULTS_VISIBLE;
use courier_shared::SharedError;

use crate::grouping::GroupingRule;

/// The list screen a reducer instance serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Screen {
    Conversations,
    Calls,
    Notifications,
}

impl Screen {
    pub fn grouping_rule(self) -> GroupingRule {
        match self {
            Self::Conversations => GroupingRule::Conversations,
            Self::Calls => GroupingRule::Calls,
            Self::Notifications => GroupingRule::Notifications,
        }
    }

    /// Whether each item *is* one activity record, so deleting the record
    /// deletes the item. Conversation rows outlive their last message.
    pub fn is_descriptor_backed(self) -> bool {
        matches!(self, Self::Calls | Self::Notifications)
    }
}

impl FromStr for Screen {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "conversations" => Ok(Self::Conversations),
            "calls" => Ok(Self::Calls),
            "notifications" => Ok(Self::Notifications),
            other => Err(SharedError::UnknownScreen(other.to_string())),
        }
    }
}

impl std::fmt::Display for Screen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Conversations => "conversations",
            Self::Calls => "calls",
            Self::Notifications => "notifications",
        };
        f.write_str(name)
    }
}

/// Per-screen engine settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectionConfig {
    pub screen: Screen,
    /// Matches shown per search section before "show all".
    pub min_results_visible: usize,
}

impl ProjectionConfig {
    pub fn for_screen(screen: Screen) -> Self {
        Self {
            screen,
            ..Self::default()
        }
    }
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            screen: Screen::Conversations,
            min_results_visible: MIN_RESULTS_VISIBLE,
        }
    }
}
