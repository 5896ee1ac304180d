//! Caller authorization context and policy evaluation
//!
//! A policy is a named capability (`is-admin`, ...) mapped to the roles that
//! hold it. Handlers and the link injector only ever ask "does this caller
//! satisfy policy X", never "what role is this caller".

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;

/// Policy required for every write action and for name search.
pub const IS_ADMIN: &str = "is-admin";

/// Identity resolved from a bearer token
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub username: String,
    pub role: String,
}

/// Per-request capability context. Anonymous when no token was presented.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AuthorizationContext {
    caller: Option<AuthenticatedUser>,
}

impl AuthorizationContext {
    pub fn anonymous() -> Self {
        Self { caller: None }
    }

    pub fn authenticated(user: AuthenticatedUser) -> Self {
        Self { caller: Some(user) }
    }

    pub fn caller(&self) -> Option<&AuthenticatedUser> {
        self.caller.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.caller.is_some()
    }

    pub fn role(&self) -> Option<&str> {
        self.caller.as_ref().map(|c| c.role.as_str())
    }
}

#[derive(Debug, Error)]
pub enum AuthorizationError {
    #[error("unknown authorization policy '{0}'")]
    UnknownPolicy(String),

    #[error("policy evaluation failed: {0}")]
    Evaluation(String),
}

#[async_trait]
pub trait AuthorizationService: Send + Sync {
    async fn authorize(
        &self,
        context: &AuthorizationContext,
        policy: &str,
    ) -> Result<bool, AuthorizationError>;
}

/// Role table backed authorizer: `policy -> roles allowed`.
#[derive(Debug, Clone)]
pub struct PolicyAuthorizer {
    policies: HashMap<String, Vec<String>>,
}

impl PolicyAuthorizer {
    pub fn new(policies: HashMap<String, Vec<String>>) -> Self {
        Self { policies }
    }
}

impl Default for PolicyAuthorizer {
    fn default() -> Self {
        Self::new(default_policies())
    }
}

pub fn default_policies() -> HashMap<String, Vec<String>> {
    HashMap::from([(IS_ADMIN.to_string(), vec!["admin".to_string()])])
}

#[async_trait]
impl AuthorizationService for PolicyAuthorizer {
    async fn authorize(
        &self,
        context: &AuthorizationContext,
        policy: &str,
    ) -> Result<bool, AuthorizationError> {
        let roles = self
            .policies
            .get(policy)
            .ok_or_else(|| AuthorizationError::UnknownPolicy(policy.to_string()))?;

        Ok(context
            .role()
            .is_some_and(|role| roles.iter().any(|allowed| allowed == role)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: &str) -> AuthorizationContext {
        AuthorizationContext::authenticated(AuthenticatedUser {
            user_id: "u-1".into(),
            username: "someone".into(),
            role: role.into(),
        })
    }

    #[tokio::test]
    async fn admin_satisfies_is_admin() {
        let authorizer = PolicyAuthorizer::default();
        assert!(authorizer.authorize(&user("admin"), IS_ADMIN).await.unwrap());
    }

    #[tokio::test]
    async fn other_roles_and_anonymous_are_denied() {
        let authorizer = PolicyAuthorizer::default();
        assert!(!authorizer.authorize(&user("reader"), IS_ADMIN).await.unwrap());
        assert!(!authorizer
            .authorize(&AuthorizationContext::anonymous(), IS_ADMIN)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn unknown_policy_is_an_error() {
        let authorizer = PolicyAuthorizer::default();
        let err = authorizer
            .authorize(&user("admin"), "can-publish")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthorizationError::UnknownPolicy(p) if p == "can-publish"));
    }

    #[tokio::test]
    async fn policies_come_from_the_table() {
        let authorizer = PolicyAuthorizer::new(HashMap::from([(
            IS_ADMIN.to_string(),
            vec!["admin".to_string(), "editor".to_string()],
        )]));
        assert!(authorizer.authorize(&user("editor"), IS_ADMIN).await.unwrap());
    }

    #[test]
    fn context_exposes_the_caller() {
        let ctx = AuthorizationContext::authenticated(AuthenticatedUser {
            user_id: "u-9".into(),
            username: "ana".into(),
            role: "admin".into(),
        });
        assert_eq!(ctx.role(), Some("admin"));
        assert_eq!(ctx.caller().map(|c| c.username.as_str()), Some("ana"));
        assert!(ctx.is_authenticated());
        assert!(!AuthorizationContext::anonymous().is_authenticated());
    }
}
