//! Per-viewer per-topic tracking/read state.

use serde::{Deserialize, Serialize};

/// How closely a user follows a topic.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    Muted,
    Regular,
    Tracking,
    Watching,
}

impl NotificationLevel {
    pub fn as_i64(&self) -> i64 {
        match self {
            NotificationLevel::Muted => 0,
            NotificationLevel::Regular => 1,
            NotificationLevel::Tracking => 2,
            NotificationLevel::Watching => 3,
        }
    }

    pub fn from_i64(value: i64) -> Option<Self> {
        match value {
            0 => Some(NotificationLevel::Muted),
            1 => Some(NotificationLevel::Regular),
            2 => Some(NotificationLevel::Tracking),
            3 => Some(NotificationLevel::Watching),
            _ => None,
        }
    }
}

/// A persisted topic-user row.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicUser {
    pub topic_id: String,
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_read_post_number: Option<i64>,
    pub notification_level: NotificationLevel,
    pub posted: bool,
}

/// The slice of tracking state attached to each topic view-model for
/// serialization.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicUserView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_read_post_number: Option<i64>,
    pub notification_level: NotificationLevel,
    pub posted: bool,
}

impl TopicUserView {
    pub fn from_topic_user(tu: &TopicUser) -> Self {
        Self {
            last_read_post_number: tu.last_read_post_number,
            notification_level: tu.notification_level,
            posted: tu.posted,
        }
    }
}

/// Request body for updating the viewer's tracking state on a topic.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTrackingRequest {
    #[serde(default)]
    pub notification_level: Option<NotificationLevel>,
    #[serde(default)]
    pub last_read_post_number: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_level_round_trip() {
        for level in [
            NotificationLevel::Muted,
            NotificationLevel::Regular,
            NotificationLevel::Tracking,
            NotificationLevel::Watching,
        ] {
            assert_eq!(NotificationLevel::from_i64(level.as_i64()), Some(level));
        }
        assert_eq!(NotificationLevel::from_i64(9), None);
    }
}
