//! Authentication and policy middleware for Axum

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{header, request::Parts, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::errors::ErrorKind;

use super::error::ApiError;
use crate::application::{AuthenticatedUser, AuthorizationContext, AuthorizationService};
use crate::infrastructure::crypto::{verify_token, JwtConfig, TokenClaims};

/// Authentication state containing JWT config
#[derive(Clone)]
pub struct AuthState {
    pub jwt_config: JwtConfig,
}

fn extract_token(auth_header: &str) -> Option<&str> {
    auth_header.strip_prefix("Bearer ")
}

fn user_from_claims(claims: TokenClaims) -> AuthenticatedUser {
    AuthenticatedUser {
        user_id: claims.sub,
        username: claims.username,
        role: claims.role,
    }
}

fn resolve_context(
    auth_header: Option<&header::HeaderValue>,
    jwt_config: &JwtConfig,
) -> Result<AuthorizationContext, ApiError> {
    let Some(auth_header) = auth_header else {
        return Ok(AuthorizationContext::anonymous());
    };

    let token = auth_header
        .to_str()
        .ok()
        .and_then(extract_token)
        .ok_or_else(|| ApiError::Unauthorized("Invalid authentication token".to_string()))?;

    match verify_token(token, jwt_config) {
        Ok(claims) if claims.is_expired() => {
            Err(ApiError::Unauthorized("Token has expired".to_string()))
        }
        Ok(claims) => Ok(AuthorizationContext::authenticated(user_from_claims(
            claims,
        ))),
        Err(e) if matches!(e.kind(), ErrorKind::ExpiredSignature) => {
            Err(ApiError::Unauthorized("Token has expired".to_string()))
        }
        Err(_) => Err(ApiError::Unauthorized(
            "Invalid authentication token".to_string(),
        )),
    }
}

/// Resolves the caller's [`AuthorizationContext`] once per request.
///
/// No `Authorization` header means anonymous; a header that does not verify
/// is rejected with 401.
pub async fn authorization_context_middleware(
    State(auth_state): State<AuthState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let context = match resolve_context(
        request.headers().get(header::AUTHORIZATION),
        &auth_state.jwt_config,
    ) {
        Ok(context) => context,
        Err(e) => return e.into_response(),
    };

    request.extensions_mut().insert(context);
    next.run(request).await
}

impl<S> FromRequestParts<S> for AuthorizationContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<AuthorizationContext>()
            .cloned()
            .unwrap_or_default())
    }
}

/// Anonymous callers get 401, authenticated callers without the policy 403.
pub async fn require_policy(
    authorizer: &dyn AuthorizationService,
    context: &AuthorizationContext,
    policy: &str,
) -> Result<(), ApiError> {
    if !context.is_authenticated() {
        return Err(ApiError::Unauthorized(
            "Missing authentication token".to_string(),
        ));
    }

    if authorizer.authorize(context, policy).await? {
        Ok(())
    } else {
        Err(ApiError::Forbidden(policy.to_string()))
    }
}

/// State for [`require_policy_middleware`]
#[derive(Clone)]
pub struct PolicyGuard {
    pub authorizer: Arc<dyn AuthorizationService>,
    pub policy: &'static str,
}

/// Route-level guard; must run inside [`authorization_context_middleware`].
pub async fn require_policy_middleware(
    State(guard): State<PolicyGuard>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let context = request
        .extensions()
        .get::<AuthorizationContext>()
        .cloned()
        .unwrap_or_default();

    match require_policy(guard.authorizer.as_ref(), &context, guard.policy).await {
        Ok(()) => next.run(request).await,
        Err(e) => e.into_response(),
    }
}
