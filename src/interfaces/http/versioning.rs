//! Header-based API version gate
//!
//! Every versioned route declares the version it serves. A request is only
//! dispatched when its version header carries exactly that value; otherwise
//! it is rejected before any handler code runs.
//!
//! ```rust,ignore
//! let gate = VersionGate::new("x-version", "1")?;
//! let routes = versioned(Router::new().route("/authors", get(list)), gate);
//! ```

use std::fmt;

use axum::{
    body::Body,
    extract::State,
    http::{header::InvalidHeaderName, HeaderMap, HeaderName, Request},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    Router,
};
use tracing::debug;

use super::error::ApiError;

/// Header used when none is configured
pub const DEFAULT_VERSION_HEADER: &str = "x-version";

/// Why a request was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionRejection {
    MissingHeader,
    MalformedHeader,
    VersionMismatch,
}

impl VersionRejection {
    /// Machine readable code sent back to the client
    pub fn reason(&self) -> &'static str {
        match self {
            Self::MissingHeader => "missing-header",
            Self::MalformedHeader => "malformed-header",
            Self::VersionMismatch => "version-mismatch",
        }
    }
}

impl fmt::Display for VersionRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.reason())
    }
}

/// A version string is one or more dot separated runs of ASCII digits.
pub fn is_well_formed(version: &str) -> bool {
    !version.is_empty()
        && version
            .split('.')
            .all(|part| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()))
}

#[derive(Debug, Clone)]
pub struct VersionGate {
    header: HeaderName,
    required: String,
}

impl VersionGate {
    pub fn new(header: &str, required: impl Into<String>) -> Result<Self, InvalidHeaderName> {
        Ok(Self {
            header: HeaderName::try_from(header.to_ascii_lowercase())?,
            required: required.into(),
        })
    }

    pub fn header(&self) -> &HeaderName {
        &self.header
    }

    pub fn required(&self) -> &str {
        &self.required
    }

    /// Exact string comparison against the required version.
    pub fn evaluate(&self, declared: Option<&str>) -> Result<(), VersionRejection> {
        let declared = declared.ok_or(VersionRejection::MissingHeader)?.trim();
        if !is_well_formed(declared) {
            return Err(VersionRejection::MalformedHeader);
        }
        if declared != self.required {
            return Err(VersionRejection::VersionMismatch);
        }
        Ok(())
    }

    /// A repeated header or one that is not visible ASCII counts as malformed.
    pub fn evaluate_headers(&self, headers: &HeaderMap) -> Result<(), VersionRejection> {
        let mut values = headers.get_all(&self.header).iter();
        let Some(first) = values.next() else {
            return self.evaluate(None);
        };
        if values.next().is_some() {
            return Err(VersionRejection::MalformedHeader);
        }
        let declared = first
            .to_str()
            .map_err(|_| VersionRejection::MalformedHeader)?;
        self.evaluate(Some(declared))
    }
}

/// Middleware rejecting requests whose version header does not match the gate.
pub async fn version_gate_middleware(
    State(gate): State<VersionGate>,
    request: Request<Body>,
    next: Next,
) -> Response {
    match gate.evaluate_headers(request.headers()) {
        Ok(()) => next.run(request).await,
        Err(rejection) => {
            debug!(
                header = %gate.header,
                required = %gate.required,
                %rejection,
                "Rejected request before dispatch"
            );
            ApiError::VersionRejected(rejection).into_response()
        }
    }
}

/// Puts every route of `router` behind `gate`.
pub fn versioned<S>(router: Router<S>, gate: VersionGate) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(middleware::from_fn_with_state(gate, version_gate_middleware))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, StatusCode};
    use axum::routing::get;
    use tower::ServiceExt;

    fn gate() -> VersionGate {
        VersionGate::new(DEFAULT_VERSION_HEADER, "1").unwrap()
    }

    #[test]
    fn absent_header_is_missing() {
        assert_eq!(gate().evaluate(None), Err(VersionRejection::MissingHeader));
    }

    #[test]
    fn other_version_is_a_mismatch() {
        assert_eq!(
            gate().evaluate(Some("2")),
            Err(VersionRejection::VersionMismatch)
        );
        assert_eq!(
            gate().evaluate(Some("1.0")),
            Err(VersionRejection::VersionMismatch)
        );
    }

    #[test]
    fn exact_match_is_accepted() {
        assert_eq!(gate().evaluate(Some("1")), Ok(()));
        assert_eq!(gate().evaluate(Some(" 1 ")), Ok(()));
    }

    #[test]
    fn garbage_is_malformed_not_mismatched() {
        for value in ["", "v1", "one", "1..2", "1.", "-1"] {
            assert_eq!(
                gate().evaluate(Some(value)),
                Err(VersionRejection::MalformedHeader),
                "{value:?}"
            );
        }
    }

    #[test]
    fn repeated_header_is_malformed() {
        let mut headers = HeaderMap::new();
        headers.append(DEFAULT_VERSION_HEADER, HeaderValue::from_static("1"));
        headers.append(DEFAULT_VERSION_HEADER, HeaderValue::from_static("1"));
        assert_eq!(
            gate().evaluate_headers(&headers),
            Err(VersionRejection::MalformedHeader)
        );
    }

    #[test]
    fn non_ascii_header_is_malformed() {
        let mut headers = HeaderMap::new();
        headers.insert(
            DEFAULT_VERSION_HEADER,
            HeaderValue::from_bytes(&[0xC3, 0xA9]).unwrap(),
        );
        assert_eq!(
            gate().evaluate_headers(&headers),
            Err(VersionRejection::MalformedHeader)
        );
    }

    #[test]
    fn header_name_is_case_insensitive() {
        let gate = VersionGate::new("X-Version", "1").unwrap();
        assert_eq!(gate.header().as_str(), "x-version");
        assert!(VersionGate::new("bad header", "1").is_err());
    }

    async fn call(version: Option<&str>) -> Response {
        let app = versioned(Router::new().route("/ping", get(|| async { "pong" })), gate());
        let mut builder = Request::builder().uri("/ping");
        if let Some(version) = version {
            builder = builder.header(DEFAULT_VERSION_HEADER, version);
        }
        app.oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn reason_of(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        json["reason"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn middleware_dispatches_on_match() {
        let response = call(Some("1")).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn middleware_rejects_before_the_handler() {
        let response = call(None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(reason_of(response).await, "missing-header");

        let response = call(Some("2")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(reason_of(response).await, "version-mismatch");
    }
}
