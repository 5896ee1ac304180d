//! SeaORM implementation of AuthorRepository and ResultCounter

use async_trait::async_trait;
use sea_orm::sea_query::LikeExpr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Select, Set,
};
use tracing::info;

use crate::domain::{
    Author, AuthorDraft, AuthorFilter, AuthorRepository, AuthorWithBooks, BookSummary,
    DomainError, DomainResult, ResultCounter,
};
use crate::infrastructure::database::entities::{author, author_book, book};

// ── Conversion helpers ──────────────────────────────────────────

fn entity_to_domain(model: author::Model) -> Author {
    Author {
        id: model.id,
        name: model.name,
    }
}

const LIKE_ESCAPE: char = '\\';

/// `%` and `_` in a search fragment match themselves.
fn escape_like(fragment: &str) -> String {
    let mut escaped = String::with_capacity(fragment.len());
    for c in fragment.chars() {
        if matches!(c, '%' | '_' | LIKE_ESCAPE) {
            escaped.push(LIKE_ESCAPE);
        }
        escaped.push(c);
    }
    escaped
}

/// Single place the filter predicate is built, shared by count and window.
fn filtered(filter: &AuthorFilter) -> Select<author::Entity> {
    let mut query = author::Entity::find();
    if let Some(fragment) = filter.name_contains.as_deref() {
        let pattern = format!("%{}%", escape_like(fragment));
        query = query.filter(
            author::Column::Name.like(LikeExpr::new(pattern).escape(LIKE_ESCAPE)),
        );
    }
    query
}

// ── SeaOrmAuthorRepository ──────────────────────────────────────

pub struct SeaOrmAuthorRepository {
    db: DatabaseConnection,
}

impl SeaOrmAuthorRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ResultCounter for SeaOrmAuthorRepository {
    async fn count_matching(&self, filter: &AuthorFilter) -> DomainResult<u64> {
        Ok(filtered(filter).count(&self.db).await?)
    }
}

#[async_trait]
impl AuthorRepository for SeaOrmAuthorRepository {
    async fn find_window(
        &self,
        filter: &AuthorFilter,
        offset: u64,
        limit: u64,
    ) -> DomainResult<Vec<Author>> {
        let models = filtered(filter)
            .order_by_asc(author::Column::Name)
            .order_by_asc(author::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(entity_to_domain).collect())
    }

    async fn find_with_books(&self, id: i32) -> DomainResult<Option<AuthorWithBooks>> {
        let Some(model) = author::Entity::find_by_id(id).one(&self.db).await? else {
            return Ok(None);
        };

        let links = author_book::Entity::find()
            .filter(author_book::Column::AuthorId.eq(id))
            .order_by_asc(author_book::Column::Position)
            .order_by_asc(author_book::Column::BookId)
            .find_also_related(book::Entity)
            .all(&self.db)
            .await?;

        let books = links
            .into_iter()
            .filter_map(|(_, book)| book)
            .map(|b| BookSummary {
                id: b.id,
                title: b.title,
            })
            .collect();

        Ok(Some(AuthorWithBooks {
            author: entity_to_domain(model),
            books,
        }))
    }

    async fn exists(&self, id: i32) -> DomainResult<bool> {
        let count = author::Entity::find()
            .filter(author::Column::Id.eq(id))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }

    async fn name_taken(&self, name: &str, except_id: Option<i32>) -> DomainResult<bool> {
        let mut query = author::Entity::find().filter(author::Column::Name.eq(name));
        if let Some(id) = except_id {
            query = query.filter(author::Column::Id.ne(id));
        }
        Ok(query.count(&self.db).await? > 0)
    }

    async fn insert(&self, draft: AuthorDraft) -> DomainResult<Author> {
        let model = author::ActiveModel {
            name: Set(draft.name),
            ..Default::default()
        };
        let result = model.insert(&self.db).await.map_err(|e| {
            if e.to_string().contains("UNIQUE") {
                DomainError::Validation("An author with that name already exists".to_string())
            } else {
                e.into()
            }
        })?;
        info!("Author saved: {} ({})", result.name, result.id);
        Ok(entity_to_domain(result))
    }

    async fn update(&self, id: i32, draft: AuthorDraft) -> DomainResult<Author> {
        let Some(existing) = author::Entity::find_by_id(id).one(&self.db).await? else {
            return Err(DomainError::not_found("Author", "id", id));
        };

        let mut active: author::ActiveModel = existing.into();
        active.name = Set(draft.name);
        let result = active.update(&self.db).await?;
        info!("Author updated: {} ({})", result.name, result.id);
        Ok(entity_to_domain(result))
    }

    async fn delete(&self, id: i32) -> DomainResult<()> {
        author_book::Entity::delete_many()
            .filter(author_book::Column::AuthorId.eq(id))
            .exec(&self.db)
            .await?;

        let result = author::Entity::delete_by_id(id).exec(&self.db).await?;
        if result.rows_affected == 0 {
            return Err(DomainError::not_found("Author", "id", id));
        }
        info!("Author deleted: {}", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::database::test_support::memory_db;

    async fn seed_book(db: &DatabaseConnection, title: &str) -> book::Model {
        book::ActiveModel {
            title: Set(title.to_string()),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap()
    }

    async fn link(db: &DatabaseConnection, author_id: i32, book_id: i32, position: i32) {
        author_book::ActiveModel {
            author_id: Set(author_id),
            book_id: Set(book_id),
            position: Set(position),
        }
        .insert(db)
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn count_and_window_share_the_filter() {
        let db = memory_db().await;
        let repo = SeaOrmAuthorRepository::new(db);
        for name in ["Borges", "Cortazar", "Bioy Casares", "Ocampo"] {
            repo.insert(AuthorDraft::new(name)).await.unwrap();
        }

        let filter = AuthorFilter::name_contains("o");
        let total = repo.count_matching(&filter).await.unwrap();
        let window = repo.find_window(&filter, 0, 50).await.unwrap();
        assert_eq!(total, window.len() as u64);

        let all = repo.count_matching(&AuthorFilter::all()).await.unwrap();
        assert_eq!(all, 4);
    }

    #[test]
    fn like_metacharacters_are_escaped() {
        assert_eq!(escape_like("Borges"), "Borges");
        assert_eq!(escape_like("100%_\\"), "100\\%\\_\\\\");
    }

    #[tokio::test]
    async fn wildcards_in_a_fragment_match_literally() {
        let db = memory_db().await;
        let repo = SeaOrmAuthorRepository::new(db);
        for name in ["Borges", "Cortazar", "Arlt"] {
            repo.insert(AuthorDraft::new(name)).await.unwrap();
        }

        for fragment in ["%", "_", "\\"] {
            let filter = AuthorFilter::name_contains(fragment);
            assert_eq!(repo.count_matching(&filter).await.unwrap(), 0, "{fragment}");
            assert!(repo.find_window(&filter, 0, 50).await.unwrap().is_empty());
        }

        repo.insert(AuthorDraft::new("Grupo_100%")).await.unwrap();
        for fragment in ["_", "%", "o_1", "0%"] {
            let filter = AuthorFilter::name_contains(fragment);
            assert_eq!(repo.count_matching(&filter).await.unwrap(), 1, "{fragment}");
            let names: Vec<String> = repo
                .find_window(&filter, 0, 50)
                .await
                .unwrap()
                .into_iter()
                .map(|a| a.name)
                .collect();
            assert_eq!(names, vec!["Grupo_100%"]);
        }
    }

    #[tokio::test]
    async fn window_is_ordered_by_name() {
        let db = memory_db().await;
        let repo = SeaOrmAuthorRepository::new(db);
        for name in ["Cortazar", "Arlt", "Borges"] {
            repo.insert(AuthorDraft::new(name)).await.unwrap();
        }

        let names: Vec<String> = repo
            .find_window(&AuthorFilter::all(), 1, 2)
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.name)
            .collect();
        assert_eq!(names, vec!["Borges", "Cortazar"]);
    }

    #[tokio::test]
    async fn books_come_back_in_position_order() {
        let db = memory_db().await;
        let repo = SeaOrmAuthorRepository::new(db.clone());
        let author = repo.insert(AuthorDraft::new("Borges")).await.unwrap();
        let aleph = seed_book(&db, "El Aleph").await;
        let ficciones = seed_book(&db, "Ficciones").await;
        link(&db, author.id, aleph.id, 2).await;
        link(&db, author.id, ficciones.id, 1).await;

        let found = repo.find_with_books(author.id).await.unwrap().unwrap();
        let titles: Vec<&str> = found.books.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, vec!["Ficciones", "El Aleph"]);
        assert!(repo.find_with_books(author.id + 100).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn name_taken_can_ignore_the_row_being_updated() {
        let db = memory_db().await;
        let repo = SeaOrmAuthorRepository::new(db);
        let author = repo.insert(AuthorDraft::new("Borges")).await.unwrap();

        assert!(repo.name_taken("Borges", None).await.unwrap());
        assert!(!repo.name_taken("Borges", Some(author.id)).await.unwrap());
        assert!(!repo.name_taken("Arlt", None).await.unwrap());
    }

    #[tokio::test]
    async fn delete_unknown_id_is_not_found() {
        let db = memory_db().await;
        let repo = SeaOrmAuthorRepository::new(db);
        let err = repo.delete(99).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    #[tokio::test]
    async fn delete_removes_associations() {
        let db = memory_db().await;
        let repo = SeaOrmAuthorRepository::new(db.clone());
        let author = repo.insert(AuthorDraft::new("Borges")).await.unwrap();
        let aleph = seed_book(&db, "El Aleph").await;
        link(&db, author.id, aleph.id, 1).await;

        repo.delete(author.id).await.unwrap();
        assert!(!repo.exists(author.id).await.unwrap());
        let remaining = author_book::Entity::find().count(&db).await.unwrap();
        assert_eq!(remaining, 0);
    }
}
