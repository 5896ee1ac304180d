//! Author repository interfaces

use async_trait::async_trait;

use super::model::{Author, AuthorDraft, AuthorFilter, AuthorWithBooks};
use crate::domain::DomainResult;

/// Counts the rows a filter matches, ignoring any pagination.
#[async_trait]
pub trait ResultCounter: Send + Sync {
    async fn count_matching(&self, filter: &AuthorFilter) -> DomainResult<u64>;
}

#[async_trait]
pub trait AuthorRepository: ResultCounter {
    /// Rows matching `filter`, ordered by name then id, sliced to the window.
    async fn find_window(
        &self,
        filter: &AuthorFilter,
        offset: u64,
        limit: u64,
    ) -> DomainResult<Vec<Author>>;
    async fn find_with_books(&self, id: i32) -> DomainResult<Option<AuthorWithBooks>>;
    async fn exists(&self, id: i32) -> DomainResult<bool>;
    /// Exact name match, optionally ignoring one id (the row being updated).
    async fn name_taken(&self, name: &str, except_id: Option<i32>) -> DomainResult<bool>;
    async fn insert(&self, draft: AuthorDraft) -> DomainResult<Author>;
    async fn update(&self, id: i32, draft: AuthorDraft) -> DomainResult<Author>;
    async fn delete(&self, id: i32) -> DomainResult<()>;
}
