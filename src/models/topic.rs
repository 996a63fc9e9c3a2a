//! Topic row and view-model.

use serde::{Deserialize, Serialize};

use super::TopicUserView;

/// A persisted topic row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    pub id: String,
    pub title: String,
    pub slug: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    pub created_at: String,
    pub bumped_at: String,
    pub posts_count: i64,
    pub visible: bool,
}

/// Request body for creating a new topic.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTopicRequest {
    pub title: String,
    #[serde(default)]
    pub category_id: Option<String>,
}

/// Request-scoped topic view-model. The category reference is assigned during
/// assembly and the viewer's tracking state is attached afterwards; neither is
/// persisted on the topic row.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicView {
    pub id: String,
    pub title: String,
    pub slug: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    pub created_at: String,
    pub bumped_at: String,
    pub posts_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_data: Option<TopicUserView>,
}

impl TopicView {
    pub fn from_topic(topic: &Topic) -> Self {
        Self {
            id: topic.id.clone(),
            title: topic.title.clone(),
            slug: topic.slug.clone(),
            category_id: topic.category_id.clone(),
            created_at: topic.created_at.clone(),
            bumped_at: topic.bumped_at.clone(),
            posts_count: topic.posts_count,
            user_data: None,
        }
    }
}
