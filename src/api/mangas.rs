use axum::{
    Extension, Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState};
use crate::api::validation::parse_choice;
use crate::models::User;
use crate::services::collection::{
    CollectionFilter, CollectionStats, MangaView, Suggestion, collection_stats, suggest_random,
};

#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    pub search: Option<String>,
    pub status: Option<String>,
    pub read: Option<String>,
    pub rating: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
}

impl DashboardQuery {
    fn into_filter(self) -> Result<CollectionFilter, ApiError> {
        Ok(CollectionFilter {
            status: parse_choice("status", self.status.as_deref())?,
            read: parse_choice("read status", self.read.as_deref())?,
            rating: parse_choice("rating filter", self.rating.as_deref())?,
            sort: parse_choice("sort key", self.sort.as_deref())?.unwrap_or_default(),
            order: parse_choice("sort order", self.order.as_deref())?.unwrap_or_default(),
            search: self.search.filter(|s| !s.trim().is_empty()),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct DashboardDto {
    pub mangas: Vec<MangaView>,
    pub stats: CollectionStats,
    pub total: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RandomPickDto {
    pub fully_read: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manga: Option<MangaView>,
}

/// Catalog annotated with the viewer's read state and ratings.
///
/// # Endpoint
/// `GET /api/mangas`
pub async fn list_mangas(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
) -> Result<Json<ApiResponse<Vec<MangaView>>>, ApiError> {
    let views = state.reading_service().collection(user.id).await?;
    Ok(Json(ApiResponse::success(views)))
}

/// # Endpoint
/// `GET /api/mangas/dashboard?search&status&read&rating&sort&order`
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<ApiResponse<DashboardDto>>, ApiError> {
    let filter = query.into_filter()?;
    let views = state.reading_service().collection(user.id).await?;

    let stats = collection_stats(&views);
    let mangas = filter.apply(&views);

    Ok(Json(ApiResponse::success(DashboardDto {
        mangas,
        stats,
        total: views.len(),
    })))
}

/// # Endpoint
/// `GET /api/mangas/random`
pub async fn random_manga(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
) -> Result<Json<ApiResponse<RandomPickDto>>, ApiError> {
    let views = state.reading_service().collection(user.id).await?;

    let dto = match suggest_random(&views, &mut rand::rng()) {
        Suggestion::Pick(view) => RandomPickDto {
            fully_read: false,
            manga: Some(view.clone()),
        },
        Suggestion::FullyRead => RandomPickDto {
            fully_read: true,
            manga: None,
        },
    };

    Ok(Json(ApiResponse::success(dto)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::collection::{ReadStatus, RatingFilter, SortKey, SortOrder};

    #[test]
    fn test_dashboard_query_defaults() {
        let filter = DashboardQuery::default().into_filter().unwrap();
        assert_eq!(filter, CollectionFilter::default());
    }

    #[test]
    fn test_dashboard_query_parses_choices() {
        let query = DashboardQuery {
            search: Some("  ".to_string()),
            status: Some("all".to_string()),
            read: Some("partial".to_string()),
            rating: Some("high".to_string()),
            sort: Some("tomesCount".to_string()),
            order: Some("desc".to_string()),
        };
        let filter = query.into_filter().unwrap();

        assert_eq!(filter.search, None);
        assert_eq!(filter.status, None);
        assert_eq!(filter.read, Some(ReadStatus::Partial));
        assert_eq!(filter.rating, Some(RatingFilter::High));
        assert_eq!(filter.sort, SortKey::TomeCount);
        assert_eq!(filter.order, SortOrder::Desc);
    }

    #[test]
    fn test_dashboard_query_rejects_unknown_sort() {
        let query = DashboardQuery {
            sort: Some("popularity".to_string()),
            ..DashboardQuery::default()
        };
        assert!(query.into_filter().is_err());
    }
}
