//! API Router with Swagger UI

use std::sync::Arc;
use std::time::Instant;

use axum::{
    http::{header, HeaderName},
    middleware,
    routing::{get, post, put},
    Router,
};
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use super::error::ErrorResponse;
use super::hateoas::{HypermediaLinkInjector, LinkDescriptor};
use super::middleware::{
    authorization_context_middleware, require_policy_middleware, AuthState, PolicyGuard,
};
use super::modules::authors::{self, AuthorDto, AuthorRequest, AuthorWithBooksDto, AuthorsState, BookDto};
use super::modules::health::{self, ComponentHealth, HealthResponse, HealthState};
use super::modules::request_id::{request_id_middleware, REQUEST_ID_HEADER};
use super::versioning::{versioned, VersionGate};
use crate::application::{AuthorService, AuthorizationService, IS_ADMIN};
use crate::infrastructure::crypto::JwtConfig;

/// Security scheme modifier for OpenAPI
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("JWT Bearer token"))
                        .build(),
                ),
            );
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        authors::list_authors,
        authors::get_author,
        authors::create_author,
        authors::update_author,
        authors::delete_author,
    ),
    components(
        schemas(
            ErrorResponse,
            LinkDescriptor,
            AuthorDto,
            AuthorWithBooksDto,
            BookDto,
            AuthorRequest,
            HealthResponse,
            ComponentHealth,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Server health check endpoints"),
        (name = "Authors", description = "Versioned author collection with pagination and hypermedia links"),
    ),
    info(
        title = "Authors API",
        version = "1.0.0",
        description = "Header-versioned REST API for authors and their books",
        license(name = "MIT")
    )
)]
pub struct ApiDoc;

/// Everything the router needs, built once at startup
#[derive(Clone)]
pub struct ApiContext {
    pub db: DatabaseConnection,
    pub service: Arc<AuthorService>,
    pub authorizer: Arc<dyn AuthorizationService>,
    pub injector: HypermediaLinkInjector,
    pub gate: VersionGate,
    pub total_count_header: HeaderName,
    pub jwt_config: JwtConfig,
    pub started_at: Arc<Instant>,
}

/// Create the API router with all routes
pub fn create_api_router(context: ApiContext) -> Router {
    let auth_state = AuthState {
        jwt_config: context.jwt_config.clone(),
    };
    let admin_guard = PolicyGuard {
        authorizer: context.authorizer.clone(),
        policy: IS_ADMIN,
    };
    let authors_state = AuthorsState {
        service: context.service.clone(),
        authorizer: context.authorizer.clone(),
        injector: context.injector.clone(),
        total_count_header: context.total_count_header.clone(),
    };

    // Name search on GET /{id} is gated inside the handler
    let public_routes = Router::new()
        .route("/api/authors", get(authors::list_authors))
        .route("/api/authors/{id}", get(authors::get_author));

    let admin_routes = Router::new()
        .route("/api/authors", post(authors::create_author))
        .route(
            "/api/authors/{id}",
            put(authors::update_author).delete(authors::delete_author),
        )
        .route_layer(middleware::from_fn_with_state(
            admin_guard,
            require_policy_middleware,
        ));

    let author_routes = public_routes
        .merge(admin_routes)
        .layer(middleware::from_fn_with_state(
            auth_state,
            authorization_context_middleware,
        ))
        .with_state(authors_state);

    // Version gate wraps everything else, so a bad version never reaches auth
    let author_routes = versioned(author_routes, context.gate.clone());

    let health_routes = Router::new()
        .route("/health", get(health::health_check))
        .with_state(HealthState {
            db: context.db.clone(),
            started_at: context.started_at.clone(),
        });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([
            context.total_count_header.clone(),
            header::LOCATION,
            HeaderName::from_static(REQUEST_ID_HEADER),
        ]);

    let swagger_routes = SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi());

    Router::new()
        .merge(swagger_routes)
        .merge(health_routes)
        .merge(author_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(request_id_middleware))
}
