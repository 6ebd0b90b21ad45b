use axum::{
    Extension, Json,
    extract::{Path, State},
};
use std::sync::Arc;

use super::{ApiError, ApiJson, ApiResponse, AppState};
use crate::api::validation::validate_id;
use crate::models::User;
use crate::services::{ProfileDraft, UserError};

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::NotFound => Self::NotFound(err.to_string()),
            UserError::UsernameTaken => Self::Conflict(err.to_string()),
            UserError::Forbidden => Self::Forbidden(err.to_string()),
            UserError::Validation(msg) => Self::validation(msg),
            UserError::Internal(msg) => Self::internal(msg),
        }
    }
}

/// # Endpoint
/// `GET /api/users/{id}`
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<User>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    let id = validate_id("user", id)?;
    let user = state.user_service().get_profile(viewer.id, id).await?;
    Ok(Json(ApiResponse::success(user)))
}

/// # Endpoint
/// `PUT /api/users/{id}`
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<User>,
    Path(id): Path<i32>,
    ApiJson(draft): ApiJson<ProfileDraft>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    let id = validate_id("user", id)?;
    let user = state
        .user_service()
        .update_profile(viewer.id, id, draft)
        .await?;
    Ok(Json(ApiResponse::success(user)))
}
