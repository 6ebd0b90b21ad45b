use sea_orm::entity::prelude::*;

/// A reading row means the user has read the volume; `rating` is optional.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "readings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: i32,
    #[sea_orm(primary_key, auto_increment = false)]
    pub tome_id: i32,
    pub rating: Option<i32>,
    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Users,
    #[sea_orm(
        belongs_to = "super::tomes::Entity",
        from = "Column::TomeId",
        to = "super::tomes::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Tomes,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::tomes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tomes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
