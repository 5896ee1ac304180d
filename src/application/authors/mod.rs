pub mod service;

pub use service::{AuthorService, MAX_NAME_LEN};
