//! Catalog and account administration. Every route here sits behind
//! `require_admin`.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, ApiJson, ApiResponse, AppState, MessageResponse};
use crate::api::validation::{DEFAULT_PAGE_LIMIT, validate_id, validate_limit, validate_page};
use crate::models::{Manga, Tome, User};
use crate::services::{CatalogError, MangaDraft, TomeDraft, TomePage, UserDraft};

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::MangaNotFound | CatalogError::TomeNotFound => {
                Self::NotFound(err.to_string())
            }
            CatalogError::DuplicateTitle => Self::Conflict(err.to_string()),
            CatalogError::DuplicateNumero(_) => Self::validation(err.to_string()),
            CatalogError::Validation(msg) => Self::validation(msg),
            CatalogError::Internal(msg) => Self::internal(msg),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

const fn default_page() -> u64 {
    1
}

const fn default_limit() -> u64 {
    DEFAULT_PAGE_LIMIT
}

// ============================================================================
// Mangas
// ============================================================================

/// # Endpoint
/// `GET /api/admin/mangas`
pub async fn list_mangas(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<Manga>>>, ApiError> {
    let mangas = state.catalog_service().list_mangas().await?;
    Ok(Json(ApiResponse::success(mangas)))
}

/// # Endpoint
/// `POST /api/admin/mangas`
pub async fn create_manga(
    State(state): State<Arc<AppState>>,
    ApiJson(draft): ApiJson<MangaDraft>,
) -> Result<impl IntoResponse, ApiError> {
    let manga = state.catalog_service().create_manga(draft).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(manga))))
}

/// # Endpoint
/// `PUT /api/admin/mangas/{id}`
pub async fn update_manga(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    ApiJson(draft): ApiJson<MangaDraft>,
) -> Result<Json<ApiResponse<Manga>>, ApiError> {
    let id = validate_id("manga", id)?;
    let manga = state.catalog_service().update_manga(id, draft).await?;
    Ok(Json(ApiResponse::success(manga)))
}

/// # Endpoint
/// `DELETE /api/admin/mangas/{id}`
pub async fn delete_manga(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let id = validate_id("manga", id)?;
    state.catalog_service().delete_manga(id).await?;
    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Manga deleted",
    ))))
}

// ============================================================================
// Tomes
// ============================================================================

/// # Endpoint
/// `GET /api/admin/tomes?page=1&limit=20`
pub async fn list_tomes(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PageQuery>,
) -> Result<Json<TomePage>, ApiError> {
    let page = validate_page(query.page)?;
    let limit = validate_limit(query.limit)?;

    let result = state.catalog_service().list_tomes(page, limit).await?;
    Ok(Json(result))
}

/// # Endpoint
/// `POST /api/admin/tomes`
pub async fn create_tome(
    State(state): State<Arc<AppState>>,
    ApiJson(draft): ApiJson<TomeDraft>,
) -> Result<impl IntoResponse, ApiError> {
    let tome = state.catalog_service().create_tome(draft).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(tome))))
}

/// # Endpoint
/// `PUT /api/admin/tomes/{id}`
pub async fn update_tome(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    ApiJson(draft): ApiJson<TomeDraft>,
) -> Result<Json<ApiResponse<Tome>>, ApiError> {
    let id = validate_id("tome", id)?;
    let tome = state.catalog_service().update_tome(id, draft).await?;
    Ok(Json(ApiResponse::success(tome)))
}

/// # Endpoint
/// `DELETE /api/admin/tomes/{id}`
pub async fn delete_tome(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let id = validate_id("tome", id)?;
    state.catalog_service().delete_tome(id).await?;
    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Tome deleted",
    ))))
}

// ============================================================================
// Users
// ============================================================================

/// # Endpoint
/// `GET /api/admin/users`
pub async fn list_users(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<User>>>, ApiError> {
    let users = state.user_service().list().await?;
    Ok(Json(ApiResponse::success(users)))
}

/// # Endpoint
/// `POST /api/admin/users`
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    ApiJson(draft): ApiJson<UserDraft>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.user_service().create(draft).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(user))))
}

/// # Endpoint
/// `PUT /api/admin/users/{id}`
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    ApiJson(draft): ApiJson<UserDraft>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    let id = validate_id("user", id)?;
    let user = state.user_service().update(id, draft).await?;
    Ok(Json(ApiResponse::success(user)))
}

/// # Endpoint
/// `DELETE /api/admin/users/{id}`
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let id = validate_id("user", id)?;
    state.user_service().delete(id).await?;
    Ok(Json(ApiResponse::success(MessageResponse::new(
        "User deleted",
    ))))
}
