//! `SeaORM` implementation of the `CatalogService` trait.

use async_trait::async_trait;
use tracing::info;

use crate::db::Store;
use crate::models::catalog::STATUS_INCOMPLETE;
use crate::models::{Manga, MangaInput, Tome, TomeInput};
use crate::services::catalog_service::{
    CatalogError, CatalogService, MangaDraft, TomeDraft, TomePage,
};
use crate::services::input::trim_to_option;

pub struct SeaOrmCatalogService {
    store: Store,
}

impl SeaOrmCatalogService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    fn manga_input(
        draft: MangaDraft,
        current_cover: Option<String>,
    ) -> Result<MangaInput, CatalogError> {
        let title = draft.title.trim();
        if title.is_empty() {
            return Err(CatalogError::Validation("Title is required".to_string()));
        }

        Ok(MangaInput {
            title: title.to_string(),
            author: trim_to_option(draft.author.as_deref()),
            genre: trim_to_option(draft.genre.as_deref()),
            status: trim_to_option(draft.status.as_deref())
                .unwrap_or_else(|| STATUS_INCOMPLETE.to_string()),
            description: trim_to_option(draft.description.as_deref()),
            cover_image: trim_to_option(draft.cover_image.as_deref()).or(current_cover),
        })
    }

    fn tome_input(draft: &TomeDraft) -> Result<TomeInput, CatalogError> {
        let (Some(numero), Some(prix), Some(editeur)) = (
            draft.numero,
            draft.prix,
            trim_to_option(draft.editeur.as_deref()),
        ) else {
            return Err(CatalogError::Validation(
                "Numero, prix and editeur are required".to_string(),
            ));
        };

        if numero <= 0 {
            return Err(CatalogError::Validation(
                "Numero must be a positive integer".to_string(),
            ));
        }

        Ok(TomeInput {
            numero,
            prix,
            editeur,
            cover_image: trim_to_option(draft.cover_image.as_deref()),
        })
    }
}

#[async_trait]
impl CatalogService for SeaOrmCatalogService {
    async fn list_mangas(&self) -> Result<Vec<Manga>, CatalogError> {
        Ok(self.store.list_mangas().await?)
    }

    async fn create_manga(&self, draft: MangaDraft) -> Result<Manga, CatalogError> {
        let input = Self::manga_input(draft, None)?;

        if self.store.manga_title_taken(&input.title, None).await? {
            return Err(CatalogError::DuplicateTitle);
        }

        Ok(self.store.add_manga(input).await?)
    }

    async fn update_manga(&self, id: i32, draft: MangaDraft) -> Result<Manga, CatalogError> {
        let existing = self
            .store
            .get_manga(id)
            .await?
            .ok_or(CatalogError::MangaNotFound)?;

        let input = Self::manga_input(draft, existing.cover_image)?;

        if self.store.manga_title_taken(&input.title, Some(id)).await? {
            return Err(CatalogError::DuplicateTitle);
        }

        self.store
            .update_manga(id, input)
            .await?
            .ok_or(CatalogError::MangaNotFound)
    }

    async fn delete_manga(&self, id: i32) -> Result<(), CatalogError> {
        if self.store.remove_manga(id).await? {
            Ok(())
        } else {
            Err(CatalogError::MangaNotFound)
        }
    }

    async fn list_tomes(&self, page: u64, limit: u64) -> Result<TomePage, CatalogError> {
        let (data, total) = self.store.list_tomes_paged(page, limit).await?;
        Ok(TomePage {
            data,
            total,
            page,
            limit,
        })
    }

    async fn create_tome(&self, draft: TomeDraft) -> Result<Tome, CatalogError> {
        let manga_id = draft
            .manga_id
            .ok_or_else(|| CatalogError::Validation("mangaId is required".to_string()))?;
        let input = Self::tome_input(&draft)?;

        if !self.store.manga_exists(manga_id).await? {
            return Err(CatalogError::MangaNotFound);
        }

        if self
            .store
            .tome_numero_taken(manga_id, input.numero, None)
            .await?
        {
            return Err(CatalogError::DuplicateNumero(input.numero));
        }

        Ok(self.store.add_tome(manga_id, input).await?)
    }

    async fn update_tome(&self, id: i32, draft: TomeDraft) -> Result<Tome, CatalogError> {
        let existing = self
            .store
            .get_tome(id)
            .await?
            .ok_or(CatalogError::TomeNotFound)?;

        let mut input = Self::tome_input(&draft)?;
        if input.cover_image.is_none() {
            input.cover_image = existing.cover_image;
        }

        if self
            .store
            .tome_numero_taken(existing.manga_id, input.numero, Some(id))
            .await?
        {
            return Err(CatalogError::DuplicateNumero(input.numero));
        }

        self.store
            .update_tome(id, input)
            .await?
            .ok_or(CatalogError::TomeNotFound)
    }

    async fn delete_tome(&self, id: i32) -> Result<(), CatalogError> {
        if self.store.remove_tome(id).await? {
            info!("Deleted tome {}", id);
            Ok(())
        } else {
            Err(CatalogError::TomeNotFound)
        }
    }
}
