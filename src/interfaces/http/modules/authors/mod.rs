//! Authors module: versioned, paginated author collection with hypermedia links

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
