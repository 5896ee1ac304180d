//! HTTP REST API interfaces
//!
//! - `versioning`: header version gate applied to every resource route
//! - `pagination`: query parameters and the total count header
//! - `hateoas`: policy gated hypermedia links
//! - `middleware`: bearer token resolution and policy guards
//! - `modules`: handlers per resource
//! - `router`: API router with Swagger documentation

pub mod common;
pub mod error;
pub mod hateoas;
pub mod middleware;
pub mod modules;
pub mod pagination;
pub mod router;
pub mod versioning;

pub use error::{ApiError, ErrorResponse};
pub use hateoas::{author_link_table, HypermediaLinkInjector};
pub use router::{create_api_router, ApiContext, ApiDoc};
pub use versioning::VersionGate;
