//! Pagination inputs and the total-count response header

use std::fmt;
use std::num::IntErrorKind;

use axum::extract::{FromRequestParts, Query};
use axum::http::request::Parts;
use axum::http::{HeaderName, HeaderValue};
use axum::response::{IntoResponseParts, ResponseParts};
use serde::de::{self, Deserializer, Visitor};
use serde::Deserialize;
use utoipa::IntoParams;

use super::error::ApiError;
use crate::domain::PageRequest;

/// Header carrying the number of matching rows, ignoring pagination
pub const DEFAULT_TOTAL_COUNT_HEADER: &str = "x-total-count";

/// `?page=&pageSize=` query parameters
///
/// Both are optional. Out of range values are clamped, never rejected;
/// integers too large for `i64` saturate. A value that is not an integer at
/// all is a 400 with the usual error body.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaginationQuery {
    /// 1-based page number; values below 1 are treated as 1
    #[serde(default, deserialize_with = "saturating_int")]
    pub page: Option<i64>,
    /// Items per page; clamped to the configured maximum
    #[serde(rename = "pageSize", default, deserialize_with = "saturating_int")]
    pub page_size: Option<i64>,
}

impl<S> FromRequestParts<S> for PaginationQuery
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(query) = Query::<Self>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
        Ok(query)
    }
}

fn saturating_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(SaturatingIntVisitor)
}

struct SaturatingIntVisitor;

impl<'de> Visitor<'de> for SaturatingIntVisitor {
    type Value = Option<i64>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an integer")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(Some(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(Some(i64::try_from(v).unwrap_or(i64::MAX)))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        match v.trim().parse::<i64>() {
            Ok(n) => Ok(Some(n)),
            Err(e) => match e.kind() {
                IntErrorKind::Empty => Ok(None),
                IntErrorKind::PosOverflow => Ok(Some(i64::MAX)),
                IntErrorKind::NegOverflow => Ok(Some(i64::MIN)),
                _ => Err(E::invalid_value(de::Unexpected::Str(v), &self)),
            },
        }
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_any(self)
    }
}

impl PaginationQuery {
    pub fn to_page_request(&self) -> PageRequest {
        PageRequest {
            page_number: self.page.unwrap_or(1),
            page_size: self.page_size,
        }
    }
}

/// Response part that writes the total count header.
///
/// Uses `insert`, so the header appears exactly once even if another part
/// tried to set it.
#[derive(Debug, Clone)]
pub struct TotalCount {
    header: HeaderName,
    total: u64,
}

impl TotalCount {
    pub fn new(header: HeaderName, total: u64) -> Self {
        Self { header, total }
    }
}

impl IntoResponseParts for TotalCount {
    type Error = std::convert::Infallible;

    fn into_response_parts(self, mut res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        res.headers_mut()
            .insert(self.header, HeaderValue::from(self.total));
        Ok(res)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    #[test]
    fn missing_params_mean_first_page_default_size() {
        let request = PaginationQuery::default().to_page_request();
        assert_eq!(request, PageRequest::default());
    }

    #[test]
    fn params_pass_through_untouched() {
        let query = PaginationQuery {
            page: Some(-3),
            page_size: Some(999),
        };
        assert_eq!(query.to_page_request(), PageRequest::new(-3, 999));
    }

    #[test]
    fn query_uses_camel_case_page_size() {
        let query: PaginationQuery = serde_json::from_str(r#"{"page":2,"pageSize":5}"#).unwrap();
        assert_eq!(query.page, Some(2));
        assert_eq!(query.page_size, Some(5));
    }

    fn from_query_string(query: &str) -> Result<PaginationQuery, ApiError> {
        let uri: axum::http::Uri = format!("/api/authors?{query}").parse().unwrap();
        Query::<PaginationQuery>::try_from_uri(&uri)
            .map(|Query(q)| q)
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
    }

    #[test]
    fn oversized_integers_saturate() {
        let query = from_query_string("page=99999999999999999999&pageSize=99999999999999999999")
            .unwrap();
        assert_eq!(query.page, Some(i64::MAX));
        assert_eq!(query.page_size, Some(i64::MAX));

        let query = from_query_string("page=-99999999999999999999").unwrap();
        assert_eq!(query.page, Some(i64::MIN));
        assert_eq!(query.page_size, None);
    }

    #[test]
    fn empty_values_count_as_absent() {
        let query = from_query_string("page=&pageSize=").unwrap();
        assert_eq!(query.to_page_request(), PageRequest::default());
    }

    #[test]
    fn non_numeric_values_are_rejected() {
        let err = from_query_string("page=abc").unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
        assert!(from_query_string("pageSize=1.5").is_err());
    }

    #[test]
    fn total_count_header_is_written_once() {
        let header = HeaderName::from_static(DEFAULT_TOTAL_COUNT_HEADER);
        let response = (
            TotalCount::new(header.clone(), 1),
            TotalCount::new(header.clone(), 25),
            "body",
        )
            .into_response();

        let values: Vec<_> = response.headers().get_all(&header).iter().collect();
        assert_eq!(values, vec![&HeaderValue::from_static("25")]);
    }
}
