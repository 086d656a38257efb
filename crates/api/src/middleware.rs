use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, Request},
};
use tower_http::request_id::{MakeRequestId, RequestId};
use tracing::{Span, info_span};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Mints a UUIDv7 for requests that arrive without an `x-request-id`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::now_v7().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Span for one request, tagged with the id set by the request-id layer.
pub fn request_span(req: &Request<Body>) -> Span {
    let request_id = req
        .extensions()
        .get::<RequestId>()
        .and_then(|id| id.header_value().to_str().ok())
        .unwrap_or_default();

    info_span!(
        "request",
        method = %req.method(),
        path = %req.uri().path(),
        request_id = %request_id,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, http, http::StatusCode, routing::get};
    use tower::ServiceExt;
    use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};

    fn app() -> Router {
        Router::new()
            .route("/ping", get(|| async { StatusCode::OK }))
            .layer(PropagateRequestIdLayer::new(REQUEST_ID_HEADER))
            .layer(SetRequestIdLayer::new(REQUEST_ID_HEADER, MakeRequestUuid))
    }

    #[tokio::test]
    async fn mints_request_id_when_absent() {
        let resp = app()
            .oneshot(http::Request::builder().uri("/ping").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let id = resp.headers().get(&REQUEST_ID_HEADER).unwrap().to_str().unwrap();
        let id = Uuid::parse_str(id).unwrap();
        assert_eq!(id.get_version_num(), 7);
    }

    #[tokio::test]
    async fn echoes_caller_request_id() {
        let resp = app()
            .oneshot(
                http::Request::builder()
                    .uri("/ping")
                    .header("x-request-id", "trace-123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.headers().get(&REQUEST_ID_HEADER).unwrap(), "trace-123");
    }
}
