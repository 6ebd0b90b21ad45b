//! `SeaORM` implementation of the `ReadingService` trait.

use async_trait::async_trait;
use tracing::debug;

use crate::db::Store;
use crate::models::ReadingEntry;
use crate::services::collection::{MangaView, build_views};
use crate::services::reading_service::{ReadingError, ReadingService, normalize_rating};

pub struct SeaOrmReadingService {
    store: Store,
}

impl SeaOrmReadingService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    async fn ensure_tome(&self, tome_id: i32) -> Result<(), ReadingError> {
        if self.store.get_tome(tome_id).await?.is_none() {
            return Err(ReadingError::TomeNotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl ReadingService for SeaOrmReadingService {
    async fn set_read(
        &self,
        user_id: i32,
        tome_id: i32,
        is_read: bool,
    ) -> Result<(), ReadingError> {
        self.ensure_tome(tome_id).await?;

        if is_read {
            self.store.mark_read(user_id, tome_id).await?;
        } else {
            self.store.unmark_read(user_id, tome_id).await?;
        }

        debug!(user_id, tome_id, is_read, "Updated read state");
        Ok(())
    }

    async fn rate(
        &self,
        user_id: i32,
        tome_id: i32,
        rating: Option<i32>,
    ) -> Result<(), ReadingError> {
        let rating = normalize_rating(rating)?;
        self.ensure_tome(tome_id).await?;

        self.store.set_rating(user_id, tome_id, rating).await?;

        debug!(user_id, tome_id, ?rating, "Updated rating");
        Ok(())
    }

    async fn list(&self, user_id: i32) -> Result<Vec<ReadingEntry>, ReadingError> {
        Ok(self.store.reading_entries_for_user(user_id).await?)
    }

    async fn collection(&self, user_id: i32) -> Result<Vec<MangaView>, ReadingError> {
        let mangas = self.store.list_mangas().await?;
        let own = self.store.readings_for_user(user_id).await?;
        let all = self.store.all_ratings().await?;

        Ok(build_views(mangas, &own, &all))
    }
}
