//! Author domain model

/// Author as stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub id: i32,
    pub name: String,
}

/// Book reference nested under an author
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookSummary {
    pub id: i32,
    pub title: String,
}

/// Author with its book associations, ordered by association position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorWithBooks {
    pub author: Author,
    pub books: Vec<BookSummary>,
}

/// Data required to create or replace an author
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorDraft {
    pub name: String,
}

impl AuthorDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into().trim().to_string(),
        }
    }
}

/// Filter applied identically to the count and to the window fetch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorFilter {
    pub name_contains: Option<String>,
}

impl AuthorFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn name_contains(fragment: impl Into<String>) -> Self {
        Self {
            name_contains: Some(fragment.into()),
        }
    }
}
