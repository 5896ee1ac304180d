pub mod model;
pub mod repository;

pub use model::{Author, AuthorDraft, AuthorFilter, AuthorWithBooks, BookSummary};
pub use repository::{AuthorRepository, ResultCounter};
