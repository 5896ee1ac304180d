//! Author entity for database

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "authors")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::author_book::Entity")]
    AuthorBooks,
}

impl Related<super::author_book::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AuthorBooks.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
