use axum::{
    Json,
    extract::{FromRequest, Request, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_sessions::Session;

use super::{ApiError, AppState, ClientKey};
use crate::api::auth::session_user;
use crate::services::UploadError;
use crate::services::upload::UploadRequest;

impl From<UploadError> for ApiError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::RateLimited => Self::RateLimited(err.to_string()),
            UploadError::Unauthenticated | UploadError::Forbidden => {
                Self::unauthorized(err.to_string())
            }
            UploadError::MissingFields
            | UploadError::UnknownCategory(_)
            | UploadError::InvalidEncoding
            | UploadError::TooLarge { .. }
            | UploadError::InvalidSignature
            | UploadError::InvalidImage => Self::validation(err.to_string()),
            UploadError::Internal(msg) => Self::internal(msg),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadBody {
    pub file: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Sent by the tome screen; the stored file is not tied to it.
    pub manga_id: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    pub url: String,
    pub file_name: String,
}

/// Stores a base64 image for a cover, a volume or a user logo.
///
/// The client is throttled before the session or the body is read, so
/// anonymous floods and malformed bodies are answered with 429 as well.
///
/// # Endpoint
/// `POST /api/admin/upload`
pub async fn upload_image(
    State(state): State<Arc<AppState>>,
    ClientKey(client): ClientKey,
    session: Session,
    request: Request,
) -> Result<Json<UploadResponse>, ApiError> {
    state.upload_service().admit(&client).await?;

    let caller = session_user(&state, &session).await?;
    if caller.is_none() {
        return Err(UploadError::Unauthenticated.into());
    }

    let body = match Json::<UploadBody>::from_request(request, &state).await {
        Ok(Json(body)) => body,
        // Past the route's body limit the payload cannot fit `max_bytes`.
        Err(e) if e.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            let max_bytes = state.config().read().await.uploads.max_bytes;
            return Err(UploadError::TooLarge {
                max_mib: max_bytes / (1024 * 1024),
            }
            .into());
        }
        Err(e) => return Err(ApiError::validation(e.body_text())),
    };

    if let Some(manga_id) = &body.manga_id {
        tracing::debug!(%manga_id, "Upload for manga");
    }

    let stored = state
        .upload_service()
        .upload(UploadRequest {
            file: body.file.as_deref().unwrap_or_default(),
            category: body.kind.as_deref().unwrap_or_default(),
            caller: caller.as_ref(),
        })
        .await?;

    Ok(Json(UploadResponse {
        success: true,
        url: stored.url,
        file_name: stored.file_name,
    }))
}
