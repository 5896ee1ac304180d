//! Hypermedia links for resource representations
//!
//! Links come from a declarative table. Each entry names the scope it applies
//! to, the relation, the HTTP method, a route template and optionally the
//! policy the caller must satisfy. Links whose policy is denied are left out
//! entirely.

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::{FromRef, FromRequestParts};
use axum::http::{request::Parts, HeaderMap, HeaderName, Method};
use serde::{Deserialize, Serialize};
use tracing::warn;
use utoipa::ToSchema;

use crate::application::{AuthorizationContext, AuthorizationService, IS_ADMIN};

/// A single hypermedia control
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LinkDescriptor {
    pub href: String,
    pub rel: String,
    pub method: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkScope {
    Item,
    Collection,
}

#[derive(Debug, Clone)]
pub struct LinkTemplate {
    pub scope: LinkScope,
    pub rel: &'static str,
    pub method: Method,
    /// Path with `{name}` placeholders
    pub route: &'static str,
    pub policy: Option<&'static str>,
}

impl LinkTemplate {
    /// Placeholders without a matching parameter are left as is.
    pub fn render(&self, params: &[(&'static str, String)]) -> LinkDescriptor {
        let href = params.iter().fold(self.route.to_string(), |href, (key, value)| {
            href.replace(&format!("{{{}}}", key), value)
        });

        LinkDescriptor {
            href,
            rel: self.rel.to_string(),
            method: self.method.to_string(),
        }
    }
}

/// Links offered on author representations
pub fn author_link_table() -> Vec<LinkTemplate> {
    vec![
        LinkTemplate {
            scope: LinkScope::Item,
            rel: "self",
            method: Method::GET,
            route: "/api/authors/{id}",
            policy: None,
        },
        LinkTemplate {
            scope: LinkScope::Item,
            rel: "update",
            method: Method::PUT,
            route: "/api/authors/{id}",
            policy: Some(IS_ADMIN),
        },
        LinkTemplate {
            scope: LinkScope::Item,
            rel: "delete",
            method: Method::DELETE,
            route: "/api/authors/{id}",
            policy: Some(IS_ADMIN),
        },
        LinkTemplate {
            scope: LinkScope::Collection,
            rel: "self",
            method: Method::GET,
            route: "/api/authors",
            policy: None,
        },
        LinkTemplate {
            scope: LinkScope::Collection,
            rel: "create",
            method: Method::POST,
            route: "/api/authors",
            policy: Some(IS_ADMIN),
        },
    ]
}

/// A representation that can carry links.
///
/// Implementors expose only their link list; business fields are never
/// touched by the injector.
pub trait Linkable {
    /// Values substituted into item route templates
    fn route_params(&self) -> Vec<(&'static str, String)>;

    fn links_mut(&mut self) -> &mut Vec<LinkDescriptor>;
}

/// Collection envelope: items plus collection level links. Counts travel in
/// a response header, never here.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ResourceCollection<T> {
    pub values: Vec<T>,
    pub links: Vec<LinkDescriptor>,
}

/// Policy outcomes for one annotation pass
#[derive(Debug, Default)]
struct PolicyDecisions {
    allowed: HashMap<&'static str, bool>,
}

impl PolicyDecisions {
    fn permits(&self, template: &LinkTemplate) -> bool {
        match template.policy {
            None => true,
            Some(policy) => self.allowed.get(policy).copied().unwrap_or(false),
        }
    }
}

#[derive(Clone)]
pub struct HypermediaLinkInjector {
    table: Arc<[LinkTemplate]>,
    authorizer: Arc<dyn AuthorizationService>,
    opt_in_header: Option<HeaderName>,
}

impl HypermediaLinkInjector {
    pub fn new(table: Vec<LinkTemplate>, authorizer: Arc<dyn AuthorizationService>) -> Self {
        Self {
            table: table.into(),
            authorizer,
            opt_in_header: None,
        }
    }

    /// Only inject links when the request carries `header: Y`.
    pub fn with_opt_in_header(mut self, header: HeaderName) -> Self {
        self.opt_in_header = Some(header);
        self
    }

    pub fn wants_links(&self, headers: &HeaderMap) -> bool {
        match &self.opt_in_header {
            None => true,
            Some(header) => headers
                .get(header)
                .and_then(|v| v.to_str().ok())
                .is_some_and(|v| v.trim().eq_ignore_ascii_case("y")),
        }
    }

    /// Evaluates every distinct policy in scope exactly once.
    ///
    /// An authorizer failure counts as a denial and is logged.
    async fn decide(
        &self,
        context: &AuthorizationContext,
        scopes: &[LinkScope],
    ) -> PolicyDecisions {
        let mut decisions = PolicyDecisions::default();

        for template in self.table.iter().filter(|t| scopes.contains(&t.scope)) {
            let Some(policy) = template.policy else {
                continue;
            };
            if decisions.allowed.contains_key(policy) {
                continue;
            }

            let allowed = match self.authorizer.authorize(context, policy).await {
                Ok(allowed) => allowed,
                Err(e) => {
                    warn!(policy, error = %e, "Authorization check failed, omitting links");
                    false
                }
            };
            decisions.allowed.insert(policy, allowed);
        }

        decisions
    }

    fn apply<T: Linkable>(&self, item: &mut T, decisions: &PolicyDecisions) {
        let params = item.route_params();
        let links: Vec<LinkDescriptor> = self
            .table
            .iter()
            .filter(|t| t.scope == LinkScope::Item && decisions.permits(t))
            .map(|t| t.render(&params))
            .collect();
        item.links_mut().extend(links);
    }

    pub async fn annotate<T: Linkable>(&self, mut item: T, context: &AuthorizationContext) -> T {
        let decisions = self.decide(context, &[LinkScope::Item]).await;
        self.apply(&mut item, &decisions);
        item
    }

    /// Item links on every element plus collection links on the envelope,
    /// all from a single set of policy decisions.
    pub async fn annotate_collection<T: Linkable>(
        &self,
        mut items: Vec<T>,
        context: &AuthorizationContext,
        params: &[(&'static str, String)],
    ) -> ResourceCollection<T> {
        let decisions = self
            .decide(context, &[LinkScope::Item, LinkScope::Collection])
            .await;

        for item in items.iter_mut() {
            self.apply(item, &decisions);
        }

        let links = self
            .table
            .iter()
            .filter(|t| t.scope == LinkScope::Collection && decisions.permits(t))
            .map(|t| t.render(params))
            .collect();

        ResourceCollection {
            values: items,
            links,
        }
    }
}

/// Per-request handle on the injector, with the caller's context and the
/// opt-in decision already resolved.
pub struct Hypermedia {
    injector: HypermediaLinkInjector,
    context: AuthorizationContext,
    enabled: bool,
}

impl Hypermedia {
    pub fn context(&self) -> &AuthorizationContext {
        &self.context
    }

    pub async fn item<T: Linkable>(&self, item: T) -> T {
        if !self.enabled {
            return item;
        }
        self.injector.annotate(item, &self.context).await
    }

    pub async fn collection<T: Linkable>(
        &self,
        items: Vec<T>,
        params: &[(&'static str, String)],
    ) -> ResourceCollection<T> {
        if !self.enabled {
            return ResourceCollection {
                values: items,
                links: Vec::new(),
            };
        }
        self.injector
            .annotate_collection(items, &self.context, params)
            .await
    }
}

impl<S> FromRequestParts<S> for Hypermedia
where
    HypermediaLinkInjector: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let injector = HypermediaLinkInjector::from_ref(state);
        let enabled = injector.wants_links(&parts.headers);
        let context = parts
            .extensions
            .get::<AuthorizationContext>()
            .cloned()
            .unwrap_or_default();

        Ok(Self {
            injector,
            context,
            enabled,
        })
    }
}
