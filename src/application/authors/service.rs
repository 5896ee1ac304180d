//! Author use cases: listing with pagination, fetch, create, update, delete

use std::sync::Arc;

use tracing::debug;

use crate::domain::{
    Author, AuthorDraft, AuthorFilter, AuthorRepository, AuthorWithBooks, DomainError,
    DomainResult, PageRequest, PageResult, PaginationPolicy,
};

/// Longest accepted author name, in characters
pub const MAX_NAME_LEN: u64 = 120;

pub struct AuthorService {
    repo: Arc<dyn AuthorRepository>,
    pagination: PaginationPolicy,
}

impl AuthorService {
    pub fn new(repo: Arc<dyn AuthorRepository>, pagination: PaginationPolicy) -> Self {
        Self { repo, pagination }
    }

    pub fn pagination(&self) -> &PaginationPolicy {
        &self.pagination
    }

    /// Counts first, then fetches the window with the same filter.
    ///
    /// The two queries are not transactionally linked: a concurrent write
    /// between them can make `total_count` disagree with the window contents.
    pub async fn list(
        &self,
        filter: &AuthorFilter,
        request: &PageRequest,
    ) -> DomainResult<PageResult<Author>> {
        let total = self.repo.count_matching(filter).await?;
        let window = self.pagination.compute_window(request, total);
        debug!(
            page = window.page,
            offset = window.offset,
            limit = window.limit,
            total,
            "Listing authors"
        );

        if window.is_empty() {
            return Ok(PageResult::empty(total));
        }

        let items = self
            .repo
            .find_window(filter, window.offset, window.limit)
            .await?;
        Ok(PageResult::new(items, total))
    }

    pub async fn search_by_name(
        &self,
        fragment: &str,
        request: &PageRequest,
    ) -> DomainResult<PageResult<Author>> {
        self.list(&AuthorFilter::name_contains(fragment), request)
            .await
    }

    pub async fn get(&self, id: i32) -> DomainResult<AuthorWithBooks> {
        self.repo
            .find_with_books(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Author", "id", id))
    }

    pub async fn create(&self, draft: AuthorDraft) -> DomainResult<Author> {
        validate_name(&draft.name)?;
        if self.repo.name_taken(&draft.name, None).await? {
            return Err(duplicate_name(&draft.name));
        }
        self.repo.insert(draft).await
    }

    pub async fn update(&self, id: i32, draft: AuthorDraft) -> DomainResult<Author> {
        if !self.repo.exists(id).await? {
            return Err(DomainError::not_found("Author", "id", id));
        }
        validate_name(&draft.name)?;
        if self.repo.name_taken(&draft.name, Some(id)).await? {
            return Err(duplicate_name(&draft.name));
        }
        self.repo.update(id, draft).await
    }

    pub async fn delete(&self, id: i32) -> DomainResult<()> {
        if !self.repo.exists(id).await? {
            return Err(DomainError::not_found("Author", "id", id));
        }
        self.repo.delete(id).await
    }
}

fn validate_name(name: &str) -> DomainResult<()> {
    if name.is_empty() {
        return Err(DomainError::Validation(
            "Author name cannot be empty".to_string(),
        ));
    }
    if name.chars().count() as u64 > MAX_NAME_LEN {
        return Err(DomainError::Validation(format!(
            "Author name cannot exceed {} characters",
            MAX_NAME_LEN
        )));
    }
    Ok(())
}

fn duplicate_name(name: &str) -> DomainError {
    DomainError::Validation(format!("An author named '{}' already exists", name))
}
