//! Create author_books association table

use sea_orm_migration::prelude::*;

use super::m20240101_000001_create_authors::Authors;
use super::m20240101_000002_create_books::Books;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AuthorBooks::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(AuthorBooks::AuthorId).integer().not_null())
                    .col(ColumnDef::new(AuthorBooks::BookId).integer().not_null())
                    .col(
                        ColumnDef::new(AuthorBooks::Position)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .primary_key(
                        Index::create()
                            .col(AuthorBooks::AuthorId)
                            .col(AuthorBooks::BookId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_author_books_author")
                            .from(AuthorBooks::Table, AuthorBooks::AuthorId)
                            .to(Authors::Table, Authors::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_author_books_book")
                            .from(AuthorBooks::Table, AuthorBooks::BookId)
                            .to(Books::Table, Books::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_author_books_book")
                    .table(AuthorBooks::Table)
                    .col(AuthorBooks::BookId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AuthorBooks::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum AuthorBooks {
    Table,
    AuthorId,
    BookId,
    Position,
}
