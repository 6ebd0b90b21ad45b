use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "mangas")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub title: String,
    pub author: Option<String>,
    pub genre: Option<String>,
    pub status: String,
    pub description: Option<String>,
    pub cover_image: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::tomes::Entity")]
    Tomes,
}

impl Related<super::tomes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tomes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
