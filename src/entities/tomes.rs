use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "tomes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub manga_id: i32,
    /// Volume number, unique within a manga (see `idx_tomes_manga_numero`)
    pub numero: i32,
    /// Price in cents
    pub price_cents: i64,
    pub editeur: String,
    pub cover_image: Option<String>,
    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::mangas::Entity",
        from = "Column::MangaId",
        to = "super::mangas::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Mangas,
    #[sea_orm(has_many = "super::readings::Entity")]
    Readings,
}

impl Related<super::mangas::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Mangas.def()
    }
}

impl Related<super::readings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Readings.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
