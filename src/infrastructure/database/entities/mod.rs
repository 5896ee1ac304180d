//! Database entities module

pub mod author;
pub mod author_book;
pub mod book;

pub use author::Entity as Author;
pub use author_book::Entity as AuthorBook;
pub use book::Entity as Book;
