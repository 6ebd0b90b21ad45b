use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use std::collections::HashMap;
use tracing::info;

use crate::entities::{mangas, prelude::*, readings, tomes};
use crate::models::{Manga, MangaInput, Tome};

use super::tome::map_tome;

pub struct MangaRepository {
    conn: DatabaseConnection,
}

impl MangaRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    fn map_manga(model: mangas::Model, tomes: Vec<Tome>) -> Manga {
        Manga {
            id: model.id,
            title: model.title,
            author: model.author,
            genre: model.genre,
            status: model.status,
            description: model.description,
            cover_image: model.cover_image,
            tomes,
        }
    }

    /// The whole catalog: series by title, volumes by number.
    pub async fn list_with_tomes(&self) -> Result<Vec<Manga>> {
        let manga_rows = Mangas::find()
            .order_by_asc(mangas::Column::Title)
            .all(&self.conn)
            .await
            .context("Failed to list mangas")?;

        let tome_rows = Tomes::find()
            .order_by_asc(tomes::Column::MangaId)
            .order_by_asc(tomes::Column::Numero)
            .all(&self.conn)
            .await
            .context("Failed to list tomes")?;

        let mut by_manga: HashMap<i32, Vec<Tome>> = HashMap::new();
        for row in tome_rows {
            by_manga.entry(row.manga_id).or_default().push(map_tome(row));
        }

        Ok(manga_rows
            .into_iter()
            .map(|m| {
                let tomes = by_manga.remove(&m.id).unwrap_or_default();
                Self::map_manga(m, tomes)
            })
            .collect())
    }

    pub async fn get(&self, id: i32) -> Result<Option<Manga>> {
        let Some(model) = Mangas::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query manga")?
        else {
            return Ok(None);
        };

        let tome_rows = Tomes::find()
            .filter(tomes::Column::MangaId.eq(id))
            .order_by_asc(tomes::Column::Numero)
            .all(&self.conn)
            .await
            .context("Failed to query tomes of manga")?;

        Ok(Some(Self::map_manga(
            model,
            tome_rows.into_iter().map(map_tome).collect(),
        )))
    }

    pub async fn exists(&self, id: i32) -> Result<bool> {
        let found = Mangas::find_by_id(id)
            .select_only()
            .column(mangas::Column::Id)
            .into_tuple::<i32>()
            .one(&self.conn)
            .await
            .context("Failed to check manga existence")?;

        Ok(found.is_some())
    }

    /// Whether `title` is used by a manga other than `excluding`.
    pub async fn title_taken(&self, title: &str, excluding: Option<i32>) -> Result<bool> {
        let mut query = Mangas::find().filter(mangas::Column::Title.eq(title));
        if let Some(id) = excluding {
            query = query.filter(mangas::Column::Id.ne(id));
        }

        let existing = query
            .one(&self.conn)
            .await
            .context("Failed to check title uniqueness")?;

        Ok(existing.is_some())
    }

    pub async fn create(&self, input: MangaInput) -> Result<Manga> {
        let now = chrono::Utc::now().to_rfc3339();
        let active = mangas::ActiveModel {
            title: Set(input.title),
            author: Set(input.author),
            genre: Set(input.genre),
            status: Set(input.status),
            description: Set(input.description),
            cover_image: Set(input.cover_image),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to insert manga")?;

        info!("Created manga: {}", model.title);
        Ok(Self::map_manga(model, Vec::new()))
    }

    pub async fn update(&self, id: i32, input: MangaInput) -> Result<Option<Manga>> {
        let Some(existing) = Mangas::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query manga for update")?
        else {
            return Ok(None);
        };

        let mut active: mangas::ActiveModel = existing.into();
        active.title = Set(input.title);
        active.author = Set(input.author);
        active.genre = Set(input.genre);
        active.status = Set(input.status);
        active.description = Set(input.description);
        active.cover_image = Set(input.cover_image);
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active
            .update(&self.conn)
            .await
            .context("Failed to update manga")?;

        self.get(id).await
    }

    /// Removes the series, its volumes and every reading of those volumes.
    pub async fn delete(&self, id: i32) -> Result<bool> {
        let txn = self.conn.begin().await?;

        let tome_ids: Vec<i32> = Tomes::find()
            .select_only()
            .column(tomes::Column::Id)
            .filter(tomes::Column::MangaId.eq(id))
            .into_tuple()
            .all(&txn)
            .await?;

        if !tome_ids.is_empty() {
            Readings::delete_many()
                .filter(readings::Column::TomeId.is_in(tome_ids))
                .exec(&txn)
                .await?;
        }

        Tomes::delete_many()
            .filter(tomes::Column::MangaId.eq(id))
            .exec(&txn)
            .await?;

        let result = Mangas::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;

        if result.rows_affected > 0 {
            info!("Deleted manga {}", id);
        }
        Ok(result.rows_affected > 0)
    }
}
