use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::info;

use crate::entities::{mangas, prelude::*, readings, tomes};
use crate::models::{Price, Tome, TomeInput, TomeWithManga};

pub(super) fn map_tome(model: tomes::Model) -> Tome {
    Tome {
        id: model.id,
        manga_id: model.manga_id,
        numero: model.numero,
        prix: Price::from_cents(model.price_cents).unwrap_or(Price::ZERO),
        editeur: model.editeur,
        cover_image: model.cover_image,
    }
}

pub struct TomeRepository {
    conn: DatabaseConnection,
}

impl TomeRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get(&self, id: i32) -> Result<Option<Tome>> {
        let tome = Tomes::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query tome")?;

        Ok(tome.map(map_tome))
    }

    /// Whether `numero` is already used in `manga_id` by a volume other than `excluding`.
    pub async fn numero_taken(
        &self,
        manga_id: i32,
        numero: i32,
        excluding: Option<i32>,
    ) -> Result<bool> {
        let mut query = Tomes::find()
            .filter(tomes::Column::MangaId.eq(manga_id))
            .filter(tomes::Column::Numero.eq(numero));
        if let Some(id) = excluding {
            query = query.filter(tomes::Column::Id.ne(id));
        }

        let existing = query
            .one(&self.conn)
            .await
            .context("Failed to check volume number uniqueness")?;

        Ok(existing.is_some())
    }

    /// One page of volumes, ordered by series title then volume number.
    pub async fn list_paged(&self, page: u64, limit: u64) -> Result<(Vec<TomeWithManga>, u64)> {
        let total = Tomes::find()
            .count(&self.conn)
            .await
            .context("Failed to count tomes")?;

        let rows = Tomes::find()
            .find_also_related(Mangas)
            .order_by_asc(mangas::Column::Title)
            .order_by_asc(tomes::Column::Numero)
            .offset(page.saturating_sub(1) * limit)
            .limit(limit)
            .all(&self.conn)
            .await
            .context("Failed to list tomes")?;

        let data = rows
            .into_iter()
            .map(|(tome, manga)| TomeWithManga {
                tome: map_tome(tome),
                manga_title: manga.map(|m| m.title).unwrap_or_default(),
            })
            .collect();

        Ok((data, total))
    }

    pub async fn create(&self, manga_id: i32, input: TomeInput) -> Result<Tome> {
        let active = tomes::ActiveModel {
            manga_id: Set(manga_id),
            numero: Set(input.numero),
            price_cents: Set(input.prix.cents()),
            editeur: Set(input.editeur),
            cover_image: Set(input.cover_image),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to insert tome")?;

        info!("Created tome {} for manga {}", model.numero, manga_id);
        Ok(map_tome(model))
    }

    /// Replaces the volume's fields; it stays attached to its series.
    pub async fn update(&self, id: i32, input: TomeInput) -> Result<Option<Tome>> {
        let Some(existing) = Tomes::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query tome for update")?
        else {
            return Ok(None);
        };

        let mut active: tomes::ActiveModel = existing.into();
        active.numero = Set(input.numero);
        active.price_cents = Set(input.prix.cents());
        active.editeur = Set(input.editeur);
        active.cover_image = Set(input.cover_image);

        let model = active
            .update(&self.conn)
            .await
            .context("Failed to update tome")?;

        Ok(Some(map_tome(model)))
    }

    /// Removes the volume along with every reading of it.
    pub async fn delete(&self, id: i32) -> Result<bool> {
        let txn = self.conn.begin().await?;

        Readings::delete_many()
            .filter(readings::Column::TomeId.eq(id))
            .exec(&txn)
            .await?;

        let result = Tomes::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;

        Ok(result.rows_affected > 0)
    }
}
