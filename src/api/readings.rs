use axum::{Extension, Json, extract::State};
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, ApiJson, ApiResponse, AppState, MessageResponse};
use crate::api::validation::validate_id;
use crate::models::{ReadingEntry, User};
use crate::services::ReadingError;

impl From<ReadingError> for ApiError {
    fn from(err: ReadingError) -> Self {
        match err {
            ReadingError::TomeNotFound => Self::NotFound(err.to_string()),
            ReadingError::InvalidRating => Self::validation(err.to_string()),
            ReadingError::Internal(msg) => Self::internal(msg),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadStateRequest {
    pub tome_id: Option<i32>,
    #[serde(default)]
    pub is_read: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingRequest {
    pub tome_id: Option<i32>,
    #[serde(default)]
    pub rating: Option<i32>,
}

fn required_tome_id(tome_id: Option<i32>) -> Result<i32, ApiError> {
    let id = tome_id.ok_or_else(|| ApiError::validation("tomeId is required"))?;
    validate_id("tome", id)
}

/// # Endpoint
/// `GET /api/readings`
pub async fn list_readings(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
) -> Result<Json<ApiResponse<Vec<ReadingEntry>>>, ApiError> {
    let entries = state.reading_service().list(user.id).await?;
    Ok(Json(ApiResponse::success(entries)))
}

/// Marks a volume read (creates the reading) or unread (deletes it).
///
/// # Endpoint
/// `POST /api/readings`
pub async fn set_read_state(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    ApiJson(payload): ApiJson<ReadStateRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let tome_id = required_tome_id(payload.tome_id)?;

    state
        .reading_service()
        .set_read(user.id, tome_id, payload.is_read)
        .await?;

    let message = if payload.is_read {
        "Tome marked as read"
    } else {
        "Tome marked as unread"
    };
    Ok(Json(ApiResponse::success(MessageResponse::new(message))))
}

/// Rates a volume; `null` or `0` clears the rating.
///
/// # Endpoint
/// `PUT /api/readings`
pub async fn set_rating(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    ApiJson(payload): ApiJson<RatingRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let tome_id = required_tome_id(payload.tome_id)?;

    state
        .reading_service()
        .rate(user.id, tome_id, payload.rating)
        .await?;

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Rating updated",
    ))))
}
