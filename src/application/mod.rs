//! Application layer: use cases and authorization policies

pub mod authorization;
pub mod authors;

pub use authorization::{
    AuthenticatedUser, AuthorizationContext, AuthorizationError, AuthorizationService,
    PolicyAuthorizer, IS_ADMIN,
};
pub use authors::{AuthorService, MAX_NAME_LEN};
