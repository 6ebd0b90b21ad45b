use anyhow::{Context, Result};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    sea_query::OnConflict,
};

use crate::entities::{mangas, prelude::*, readings, tomes};
use crate::models::{Reading, ReadingEntry};

use super::tome::map_tome;

impl From<readings::Model> for Reading {
    fn from(model: readings::Model) -> Self {
        Self {
            user_id: model.user_id,
            tome_id: model.tome_id,
            rating: model.rating,
        }
    }
}

pub struct ReadingRepository {
    conn: DatabaseConnection,
}

impl ReadingRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Records the volume as read. Existing readings keep their rating.
    pub async fn mark_read(&self, user_id: i32, tome_id: i32) -> Result<()> {
        let active = readings::ActiveModel {
            user_id: Set(user_id),
            tome_id: Set(tome_id),
            rating: Set(None),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
        };

        Readings::insert(active)
            .on_conflict(
                OnConflict::columns([readings::Column::UserId, readings::Column::TomeId])
                    .do_nothing()
                    .to_owned(),
            )
            .do_nothing()
            .exec(&self.conn)
            .await
            .context("Failed to mark tome as read")?;

        Ok(())
    }

    /// Forgets the reading, and with it any rating.
    pub async fn unmark(&self, user_id: i32, tome_id: i32) -> Result<()> {
        Readings::delete_many()
            .filter(readings::Column::UserId.eq(user_id))
            .filter(readings::Column::TomeId.eq(tome_id))
            .exec(&self.conn)
            .await
            .context("Failed to unmark tome")?;

        Ok(())
    }

    /// Upserts the reading with the given rating; rating a volume marks it read.
    pub async fn set_rating(&self, user_id: i32, tome_id: i32, rating: Option<i32>) -> Result<()> {
        let active = readings::ActiveModel {
            user_id: Set(user_id),
            tome_id: Set(tome_id),
            rating: Set(rating),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
        };

        Readings::insert(active)
            .on_conflict(
                OnConflict::columns([readings::Column::UserId, readings::Column::TomeId])
                    .update_column(readings::Column::Rating)
                    .to_owned(),
            )
            .exec(&self.conn)
            .await
            .context("Failed to save rating")?;

        Ok(())
    }

    pub async fn for_user(&self, user_id: i32) -> Result<Vec<Reading>> {
        let rows = Readings::find()
            .filter(readings::Column::UserId.eq(user_id))
            .all(&self.conn)
            .await
            .context("Failed to list readings of user")?;

        Ok(rows.into_iter().map(Reading::from).collect())
    }

    /// Every rated reading across all users.
    pub async fn all_rated(&self) -> Result<Vec<Reading>> {
        let rows = Readings::find()
            .filter(readings::Column::Rating.is_not_null())
            .all(&self.conn)
            .await
            .context("Failed to list ratings")?;

        Ok(rows.into_iter().map(Reading::from).collect())
    }

    /// The viewer's readings joined with their volume and series title.
    pub async fn for_user_detailed(&self, user_id: i32) -> Result<Vec<ReadingEntry>> {
        let readings = Readings::find()
            .filter(readings::Column::UserId.eq(user_id))
            .find_also_related(Tomes)
            .order_by_asc(readings::Column::TomeId)
            .all(&self.conn)
            .await
            .context("Failed to list readings with tomes")?;

        let manga_ids: Vec<i32> = readings
            .iter()
            .filter_map(|(_, tome)| tome.as_ref().map(|t| t.manga_id))
            .collect();

        let titles: std::collections::HashMap<i32, String> = if manga_ids.is_empty() {
            std::collections::HashMap::new()
        } else {
            Mangas::find()
                .filter(mangas::Column::Id.is_in(manga_ids))
                .all(&self.conn)
                .await
                .context("Failed to load manga titles")?
                .into_iter()
                .map(|m| (m.id, m.title))
                .collect()
        };

        Ok(readings
            .into_iter()
            .filter_map(|(reading, tome): (readings::Model, Option<tomes::Model>)| {
                let tome = tome?;
                let manga_title = titles.get(&tome.manga_id).cloned().unwrap_or_default();
                Some(ReadingEntry {
                    tome_id: reading.tome_id,
                    rating: reading.rating,
                    tome: map_tome(tome),
                    manga_title,
                })
            })
            .collect())
    }
}
