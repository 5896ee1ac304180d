//! Author resource handlers

use std::sync::Arc;

use axum::{
    extract::{FromRef, Path, State},
    http::{header, HeaderName, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tracing::debug;

use super::dto::{AuthorDto, AuthorRequest, AuthorWithBooksDto};
use crate::application::{AuthorService, AuthorizationService, IS_ADMIN};
use crate::domain::AuthorFilter;
use crate::interfaces::http::common::ValidatedJson;
use crate::interfaces::http::error::{ApiError, ErrorResponse};
use crate::interfaces::http::hateoas::{Hypermedia, HypermediaLinkInjector, ResourceCollection};
use crate::interfaces::http::middleware::require_policy;
use crate::interfaces::http::pagination::{PaginationQuery, TotalCount};

/// Author handler state
#[derive(Clone)]
pub struct AuthorsState {
    pub service: Arc<AuthorService>,
    pub authorizer: Arc<dyn AuthorizationService>,
    pub injector: HypermediaLinkInjector,
    pub total_count_header: HeaderName,
}

impl FromRef<AuthorsState> for HypermediaLinkInjector {
    fn from_ref(state: &AuthorsState) -> Self {
        state.injector.clone()
    }
}

/// Write routes take a numeric id only.
fn parse_id(raw: &str) -> Result<i32, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::BadRequest(format!("'{}' is not a valid author id", raw)))
}

#[utoipa::path(
    get,
    path = "/api/authors",
    operation_id = "get-authors",
    tag = "Authors",
    params(
        PaginationQuery,
        ("x-version" = String, Header, description = "Required API version")
    ),
    responses(
        (status = 200, description = "One page of authors", body = ResourceCollection<AuthorDto>,
            headers(("x-total-count" = u64, description = "Matching authors, ignoring pagination"))),
        (status = 400, description = "Version header rejected", body = ErrorResponse)
    )
)]
pub async fn list_authors(
    State(state): State<AuthorsState>,
    query: PaginationQuery,
    hypermedia: Hypermedia,
) -> Result<(TotalCount, Json<ResourceCollection<AuthorDto>>), ApiError> {
    let page = state
        .service
        .list(&AuthorFilter::all(), &query.to_page_request())
        .await?;

    let total = TotalCount::new(state.total_count_header.clone(), page.total_count);
    let items = page.map(AuthorDto::from).items;
    let collection = hypermedia.collection(items, &[]).await;

    Ok((total, Json(collection)))
}

/// `{id}` is an author id when it parses as an integer, a name fragment
/// otherwise.
#[utoipa::path(
    get,
    path = "/api/authors/{id}",
    operation_id = "get-author",
    tag = "Authors",
    security((), ("bearer_auth" = [])),
    params(
        ("id" = String, Path, description = "Author id, or a name fragment to search for (requires is-admin)"),
        PaginationQuery,
        ("x-version" = String, Header, description = "Required API version")
    ),
    responses(
        (status = 200, description = "Author with books, or a page of matching authors",
            body = AuthorWithBooksDto),
        (status = 401, description = "Name search without a token", body = ErrorResponse),
        (status = 403, description = "Name search without is-admin", body = ErrorResponse),
        (status = 404, description = "Unknown author id", body = ErrorResponse)
    )
)]
pub async fn get_author(
    State(state): State<AuthorsState>,
    Path(key): Path<String>,
    query: PaginationQuery,
    hypermedia: Hypermedia,
) -> Result<Response, ApiError> {
    if let Ok(id) = key.parse::<i32>() {
        let author = state.service.get(id).await?;
        let dto = hypermedia.item(AuthorWithBooksDto::from(author)).await;
        return Ok(Json(dto).into_response());
    }

    require_policy(state.authorizer.as_ref(), hypermedia.context(), IS_ADMIN).await?;
    debug!(fragment = %key, "Searching authors by name");

    let page = state
        .service
        .search_by_name(&key, &query.to_page_request())
        .await?;

    let total = TotalCount::new(state.total_count_header.clone(), page.total_count);
    let items = page.map(AuthorDto::from).items;
    let collection = hypermedia.collection(items, &[]).await;

    Ok((total, Json(collection)).into_response())
}

#[utoipa::path(
    post,
    path = "/api/authors",
    operation_id = "create-author",
    tag = "Authors",
    security(("bearer_auth" = [])),
    params(("x-version" = String, Header, description = "Required API version")),
    request_body = AuthorRequest,
    responses(
        (status = 201, description = "Created", body = AuthorDto,
            headers(("location" = String, description = "URI of the new author"))),
        (status = 400, description = "Invalid or duplicate name", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Caller lacks is-admin", body = ErrorResponse),
        (status = 422, description = "Body failed validation", body = ErrorResponse)
    )
)]
pub async fn create_author(
    State(state): State<AuthorsState>,
    hypermedia: Hypermedia,
    ValidatedJson(request): ValidatedJson<AuthorRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let author = state.service.create(request.into_draft()).await?;
    let location = format!("/api/authors/{}", author.id);
    let dto = hypermedia.item(AuthorDto::from(author)).await;

    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(dto)))
}

#[utoipa::path(
    put,
    path = "/api/authors/{id}",
    operation_id = "update-author",
    tag = "Authors",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Author id"),
        ("x-version" = String, Header, description = "Required API version")
    ),
    request_body = AuthorRequest,
    responses(
        (status = 204, description = "Updated"),
        (status = 400, description = "Invalid id, invalid or duplicate name", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Caller lacks is-admin", body = ErrorResponse),
        (status = 404, description = "Unknown author id", body = ErrorResponse)
    )
)]
pub async fn update_author(
    State(state): State<AuthorsState>,
    Path(id): Path<String>,
    ValidatedJson(request): ValidatedJson<AuthorRequest>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    state.service.update(id, request.into_draft()).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/api/authors/{id}",
    operation_id = "delete-author",
    tag = "Authors",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Author id"),
        ("x-version" = String, Header, description = "Required API version")
    ),
    responses(
        (status = 200, description = "Deleted"),
        (status = 400, description = "Invalid id", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Caller lacks is-admin", body = ErrorResponse),
        (status = 404, description = "Unknown author id", body = ErrorResponse)
    )
)]
pub async fn delete_author(
    State(state): State<AuthorsState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.service.delete(parse_id(&id)?).await?;
    Ok(StatusCode::OK)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_ids_must_be_numeric() {
        assert_eq!(parse_id("42").unwrap(), 42);
        let err = parse_id("Borges").unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}
