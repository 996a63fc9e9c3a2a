//! Topic API endpoints.

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};

use super::{success, ApiResult};
use crate::errors::AppError;
use crate::guardian;
use crate::models::{CreateTopicRequest, Topic, TopicUser, UpdateTrackingRequest};
use crate::AppState;

/// POST /api/topics - Create a new topic, optionally in a category.
pub async fn create_topic(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CreateTopicRequest>,
) -> ApiResult<Topic> {
    let guardian = guardian::resolve(&state.repo, &headers).await?;
    if guardian.current_user().is_none() {
        return Err(AppError::Unauthorized(
            "Authentication required to create topics".to_string(),
        ));
    }

    if request.title.trim().is_empty() {
        return Err(AppError::Validation("Title is required".to_string()));
    }

    let topic = state.repo.create_topic(&request).await?;
    success(topic)
}

/// PUT /api/topics/:id/tracking - Update the viewer's tracking state for a topic.
pub async fn update_tracking(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(topic_id): Path<String>,
    Json(request): Json<UpdateTrackingRequest>,
) -> ApiResult<TopicUser> {
    let guardian = guardian::resolve(&state.repo, &headers).await?;
    let Some(user) = guardian.current_user() else {
        return Err(AppError::Unauthorized(
            "Authentication required to track topics".to_string(),
        ));
    };

    let topic_user = state
        .repo
        .set_topic_user(&user.id, &topic_id, &request)
        .await?;
    success(topic_user)
}
