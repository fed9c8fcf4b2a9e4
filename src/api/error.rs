//! Mapping from service errors to HTTP responses.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::decompose::ServiceError;

/// An error response with a `{"detail": ...}` body.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub detail: String,
}

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            // Duplicate registration keeps the 400 status existing clients expect.
            ServiceError::Conflict(msg) => ApiError::new(StatusCode::BAD_REQUEST, msg),
            ServiceError::NotFound(msg) => ApiError::new(StatusCode::NOT_FOUND, msg),
            ServiceError::InvalidArgument(msg) => ApiError::new(StatusCode::BAD_REQUEST, msg),
            err @ ServiceError::Upstream(_) => {
                ApiError::new(StatusCode::BAD_GATEWAY, err.to_string())
            }
            ServiceError::Storage(e) => {
                tracing::error!("Storage failure: {}", e);
                ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal storage error")
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::new(rejection.status(), rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::new(rejection.status(), rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LlmError;
    use crate::store::StoreError;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ServiceError::Conflict("dup".into()), StatusCode::BAD_REQUEST),
            (ServiceError::NotFound("gone".into()), StatusCode::NOT_FOUND),
            (ServiceError::InvalidArgument("bad".into()), StatusCode::BAD_REQUEST),
            (
                ServiceError::Upstream(LlmError::network_error("timeout".into())),
                StatusCode::BAD_GATEWAY,
            ),
            (
                ServiceError::Storage(StoreError::Backend("locked".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status, status);
        }
    }

    #[test]
    fn test_storage_detail_is_generic() {
        let err = ApiError::from(ServiceError::Storage(StoreError::Backend(
            "/var/db/users.db is locked".into(),
        )));
        assert_eq!(err.detail, "Internal storage error");
    }
}
