//! Domain service for the manga catalog: series and their volumes.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Manga, Price, Tome, TomeWithManga};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Manga not found")]
    MangaNotFound,

    #[error("Tome not found")]
    TomeNotFound,

    #[error("A manga with this title already exists")]
    DuplicateTitle,

    #[error("Tome {0} already exists for this manga")]
    DuplicateNumero(i32),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for CatalogError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(format!("{err:#}"))
    }
}

/// Unvalidated manga fields as sent by the admin screens.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MangaDraft {
    #[serde(default)]
    pub title: String,
    pub author: Option<String>,
    pub genre: Option<String>,
    pub status: Option<String>,
    pub description: Option<String>,
    pub cover_image: Option<String>,
}

/// Unvalidated volume fields as sent by the admin screens.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TomeDraft {
    pub manga_id: Option<i32>,
    pub numero: Option<i32>,
    pub prix: Option<Price>,
    pub editeur: Option<String>,
    pub cover_image: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TomePage {
    pub data: Vec<TomeWithManga>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
}

#[async_trait::async_trait]
pub trait CatalogService: Send + Sync {
    /// Every series with its volumes, by title.
    async fn list_mangas(&self) -> Result<Vec<Manga>, CatalogError>;

    /// # Errors
    ///
    /// Returns [`CatalogError::DuplicateTitle`] when the title is in use.
    async fn create_manga(&self, draft: MangaDraft) -> Result<Manga, CatalogError>;

    /// Replaces the series' fields. A missing cover keeps the current one.
    async fn update_manga(&self, id: i32, draft: MangaDraft) -> Result<Manga, CatalogError>;

    /// Deletes the series, its volumes and their readings.
    async fn delete_manga(&self, id: i32) -> Result<(), CatalogError>;

    async fn list_tomes(&self, page: u64, limit: u64) -> Result<TomePage, CatalogError>;

    /// # Errors
    ///
    /// Returns [`CatalogError::MangaNotFound`] when the series does not exist
    /// and [`CatalogError::DuplicateNumero`] when the number is in use.
    async fn create_tome(&self, draft: TomeDraft) -> Result<Tome, CatalogError>;

    async fn update_tome(&self, id: i32, draft: TomeDraft) -> Result<Tome, CatalogError>;

    async fn delete_tome(&self, id: i32) -> Result<(), CatalogError>;
}
