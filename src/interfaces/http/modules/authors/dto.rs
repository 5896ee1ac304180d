//! Author DTOs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::application::MAX_NAME_LEN;
use crate::domain::{Author, AuthorDraft, AuthorWithBooks, BookSummary};
use crate::interfaces::http::hateoas::{LinkDescriptor, Linkable};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthorDto {
    pub id: i32,
    pub name: String,
    pub links: Vec<LinkDescriptor>,
}

impl From<Author> for AuthorDto {
    fn from(a: Author) -> Self {
        Self {
            id: a.id,
            name: a.name,
            links: Vec::new(),
        }
    }
}

impl Linkable for AuthorDto {
    fn route_params(&self) -> Vec<(&'static str, String)> {
        vec![("id", self.id.to_string())]
    }

    fn links_mut(&mut self) -> &mut Vec<LinkDescriptor> {
        &mut self.links
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BookDto {
    pub id: i32,
    pub title: String,
}

impl From<BookSummary> for BookDto {
    fn from(b: BookSummary) -> Self {
        Self {
            id: b.id,
            title: b.title,
        }
    }
}

/// Single author fetch, books ordered by their position
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthorWithBooksDto {
    pub id: i32,
    pub name: String,
    pub books: Vec<BookDto>,
    pub links: Vec<LinkDescriptor>,
}

impl From<AuthorWithBooks> for AuthorWithBooksDto {
    fn from(a: AuthorWithBooks) -> Self {
        Self {
            id: a.author.id,
            name: a.author.name,
            books: a.books.into_iter().map(BookDto::from).collect(),
            links: Vec::new(),
        }
    }
}

impl Linkable for AuthorWithBooksDto {
    fn route_params(&self) -> Vec<(&'static str, String)> {
        vec![("id", self.id.to_string())]
    }

    fn links_mut(&mut self) -> &mut Vec<LinkDescriptor> {
        &mut self.links
    }
}

/// Body for both create and full replace
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AuthorRequest {
    #[validate(length(min = 1, max = MAX_NAME_LEN))]
    pub name: String,
}

impl AuthorRequest {
    pub fn into_draft(self) -> AuthorDraft {
        AuthorDraft::new(self.name)
    }
}
