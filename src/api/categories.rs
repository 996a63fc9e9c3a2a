//! Category API endpoints.

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};

use super::{success, ApiResult};
use crate::category_list::CategoryList;
use crate::errors::AppError;
use crate::guardian;
use crate::models::{Category, CreateCategoryRequest, FeatureTopicRequest, NEW_TOPIC_DRAFT_KEY};
use crate::AppState;

/// GET /api/categories - Assemble the category list for the current viewer.
pub async fn get_category_list(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<CategoryList> {
    let guardian = guardian::resolve(&state.repo, &headers).await?;

    let mut list = CategoryList::build(&state.repo, &guardian, &state.config.site).await?;

    // Draft metadata for the composer shell; not computed by the assembly.
    if let Some(user) = guardian.current_user() {
        if let Some(draft) = state.repo.find_draft(&user.id, NEW_TOPIC_DRAFT_KEY).await? {
            list.draft_key = draft.draft_key;
            list.draft_sequence = Some(draft.sequence);
            list.draft = Some(draft.data);
        }
    }

    success(list)
}

/// POST /api/categories - Create a new category (staff only).
pub async fn create_category(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CreateCategoryRequest>,
) -> ApiResult<Category> {
    let guardian = guardian::resolve(&state.repo, &headers).await?;
    if !guardian.can_create_category() {
        return Err(AppError::Forbidden(
            "Only staff may create categories".to_string(),
        ));
    }

    if request.name.trim().is_empty() {
        return Err(AppError::Validation("Name is required".to_string()));
    }

    let category = state.repo.create_category(&request).await?;
    success(category)
}

/// POST /api/categories/:id/featured - Feature a topic in a category (staff only).
pub async fn feature_topic(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(category_id): Path<String>,
    Json(request): Json<FeatureTopicRequest>,
) -> ApiResult<()> {
    let guardian = guardian::resolve(&state.repo, &headers).await?;
    if !guardian.is_staff() {
        return Err(AppError::Forbidden(
            "Only staff may feature topics".to_string(),
        ));
    }

    state
        .repo
        .feature_topic(&category_id, &request.topic_id, request.rank)
        .await?;
    success(())
}
