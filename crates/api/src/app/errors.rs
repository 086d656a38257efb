use axum::http::{Method, StatusCode, Uri};
use axum::response::IntoResponse;
use serde_json::json;
use thiserror::Error;

use shop_core::{DomainError, ValidationErrors};
use shop_infra::read_model::StoreError;

/// Every failure a handler can surface, mapped onto one status code each.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("method not allowed")]
    MethodNotAllowed,

    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn not_found(what: impl core::fmt::Display) -> Self {
        Self::NotFound(what.to_string())
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(errors) => Self::Validation(errors),
            DomainError::InvalidId(_) | DomainError::NotFound => Self::NotFound("resource".to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            ApiError::NotFound(_) => json_error(StatusCode::NOT_FOUND, "not_found", self.to_string()),
            ApiError::MethodNotAllowed => json_error(
                StatusCode::METHOD_NOT_ALLOWED,
                "method_not_allowed",
                "this endpoint is read-only",
            ),
            ApiError::Validation(fields) => (
                StatusCode::BAD_REQUEST,
                axum::Json(json!({
                    "error": "validation_error",
                    "fields": fields,
                })),
            )
                .into_response(),
            ApiError::Store(e) => {
                tracing::error!(error = %e, "catalog store failure");
                json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", e.to_string())
            }
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal error");
                json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg)
            }
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// Fallback for verbs a known route does not serve. Touches nothing.
pub async fn method_not_allowed(method: Method, uri: Uri) -> ApiError {
    tracing::info!(%method, path = %uri.path(), "rejected write on read-only route");
    ApiError::MethodNotAllowed
}

/// Fallback for paths no route matches.
pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::not_found(format!("path {}", uri.path()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(resp: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn validation_errors_render_field_map() {
        let err: ApiError = DomainError::validation("price", "price must be greater than 1").into();
        let resp = err.into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(resp).await,
            json!({"error": "validation_error", "fields": {"price": ["price must be greater than 1"]}})
        );
    }

    #[tokio::test]
    async fn status_codes_follow_error_kind() {
        assert_eq!(ApiError::not_found("category 3").into_response().status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::MethodNotAllowed.into_response().status(),
            StatusCode::METHOD_NOT_ALLOWED
        );
        assert_eq!(
            ApiError::from(StoreError::Unavailable("down".into())).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::from(DomainError::invalid_id("CategoryId: invalid digit"))
                .into_response()
                .status(),
            StatusCode::NOT_FOUND
        );
    }

    #[tokio::test]
    async fn not_found_body_names_the_target() {
        let body = body_json(ApiError::not_found("product 9").into_response()).await;
        assert_eq!(body, json!({"error": "not_found", "message": "product 9 not found"}));
    }
}
