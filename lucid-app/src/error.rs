use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use lucid_acquire::AcquireError;
use serde_json::json;
use thiserror::Error;

/// Everything a request can fail with, each with a readable message.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("invalid url '{0}': an absolute http(s) URL is required")]
    InvalidUrl(String),
    /// Live site and archive both failed.
    #[error("the source site and its archived copy are both unreachable ({0})")]
    Unreachable(AcquireError),
    #[error("could not parse the page structure (extracted {chars} characters)")]
    Unparseable { chars: usize },
    #[error("request cancelled")]
    Cancelled,
}

impl From<AcquireError> for ServiceError {
    fn from(err: AcquireError) -> Self {
        match err {
            AcquireError::Cancelled => ServiceError::Cancelled,
            other => ServiceError::Unreachable(other),
        }
    }
}

impl ServiceError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::InvalidUrl(_) => StatusCode::BAD_REQUEST,
            ServiceError::Unreachable(_) => StatusCode::BAD_GATEWAY,
            ServiceError::Unparseable { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            // "client closed request"
            ServiceError::Cancelled => {
                StatusCode::from_u16(499).unwrap_or(StatusCode::SERVICE_UNAVAILABLE)
            }
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "detail": self.to_string() }))).into_response()
    }
}
