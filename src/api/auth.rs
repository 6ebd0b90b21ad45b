use axum::{
    Extension, Json,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use tower_sessions::Session;

use super::{ApiError, ApiJson, ApiResponse, AppState, ClientKey, MessageResponse};
use crate::models::User;
use crate::services::AuthError;

/// Session key holding the serialized [`User`].
pub const SESSION_USER_KEY: &str = "user";

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => Self::unauthorized(err.to_string()),
            AuthError::UserNotFound => Self::unauthorized("Not authenticated"),
            AuthError::UsernameTaken => Self::Conflict(err.to_string()),
            AuthError::RateLimited => Self::RateLimited(err.to_string()),
            AuthError::Validation(msg) => Self::validation(msg),
            AuthError::Internal(msg) => Self::internal(msg),
        }
    }
}

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

// ============================================================================
// Middleware
// ============================================================================

/// Reloads the session user on every request so deleted or demoted accounts
/// lose access immediately. The fresh [`User`] is added to the request
/// extensions for handlers.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = session_user(&state, &session)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    tracing::Span::current().record("user_id", user.id);
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

/// Runs after [`auth_middleware`]; admin routes answer 401 to everyone else.
pub async fn require_admin(
    Extension(user): Extension<User>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !user.isadmin {
        return Err(ApiError::unauthorized("Admin access required"));
    }

    Ok(next.run(request).await)
}

/// The authenticated user behind the session, if any.
pub async fn session_user(state: &AppState, session: &Session) -> Result<Option<User>, ApiError> {
    let stored = session
        .get::<User>(SESSION_USER_KEY)
        .await
        .map_err(|e| ApiError::internal(format!("Session error: {e}")))?;

    let Some(stored) = stored else {
        return Ok(None);
    };

    match state.auth_service().current_user(stored.id).await {
        Ok(user) => {
            if user != stored {
                session
                    .insert(SESSION_USER_KEY, &user)
                    .await
                    .map_err(|e| ApiError::internal(format!("Session error: {e}")))?;
            }
            Ok(Some(user))
        }
        Err(AuthError::UserNotFound) => {
            let _ = session.flush().await;
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    session: Session,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    if payload.username.is_empty() {
        return Err(ApiError::validation("Username is required"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    let user = state
        .auth_service()
        .login(&payload.username, &payload.password)
        .await?;

    session
        .cycle_id()
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))?;
    session
        .insert(SESSION_USER_KEY, &user)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))?;

    tracing::info!(user_id = user.id, "User logged in");

    Ok(Json(ApiResponse::success(user)))
}

/// POST /auth/logout
pub async fn logout(session: Session) -> Json<ApiResponse<MessageResponse>> {
    let _ = session.flush().await;
    Json(ApiResponse::success(MessageResponse::new("Logged out")))
}

/// GET /auth/me
pub async fn get_current_user(Extension(user): Extension<User>) -> Json<ApiResponse<User>> {
    Json(ApiResponse::success(user))
}

/// POST /auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    ClientKey(client): ClientKey,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .auth_service()
        .register(&payload.username, &payload.password, &client)
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(user))))
}
