//! Domain layer: resource models, repository interfaces and pagination rules

pub mod author;
pub mod error;
pub mod pagination;

pub use author::{
    Author, AuthorDraft, AuthorFilter, AuthorRepository, AuthorWithBooks, BookSummary,
    ResultCounter,
};
pub use error::{DomainError, DomainResult};
pub use pagination::{PageRequest, PageResult, PageWindow, PaginationPolicy};
