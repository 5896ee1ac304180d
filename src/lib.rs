//! # authors-api
//!
//! REST service exposing an `authors` collection behind a header version
//! gate, with paginated listings (total count in a response header) and
//! hypermedia links filtered by the caller's authorization policies.
//!
//! ## Architecture
//!
//! - **domain**: resource models, repository traits, pagination arithmetic
//! - **application**: author use cases and policy based authorization
//! - **infrastructure**: SeaORM persistence, migrations, JWT
//! - **interfaces**: Axum HTTP layer (version gate, links, handlers, router)
//! - **server**: runtime wiring and graceful shutdown

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod server;
pub mod support;

pub use config::{default_config_path, AppConfig};

pub use infrastructure::{init_database, DatabaseConfig, SeaOrmAuthorRepository};

pub use interfaces::http::create_api_router;
