use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use service::auth::errors::AuthError;
use service::errors::ServiceError;

/// JSON error body: `{"title", "status", "detail"?}`.
#[derive(Debug, Serialize)]
pub struct JsonApiError {
    #[serde(skip)]
    pub status_code: StatusCode,
    pub title: String,
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl JsonApiError {
    pub fn new(status: StatusCode, title: impl Into<String>, detail: Option<String>) -> Self {
        Self { status_code: status, title: title.into(), status: status.as_u16(), detail }
    }

    pub fn unauthorized() -> Self { Self::new(StatusCode::UNAUTHORIZED, "Unauthorized", None) }

    pub fn forbidden() -> Self { Self::new(StatusCode::FORBIDDEN, "Forbidden", None) }

    /// 500 without internals; the cause is logged instead.
    pub fn internal(cause: &dyn std::fmt::Display) -> Self {
        error!(err = %cause, "request failed");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error", None)
    }
}

impl IntoResponse for JsonApiError {
    fn into_response(self) -> Response {
        (self.status_code, Json(self)).into_response()
    }
}

impl From<ServiceError> for JsonApiError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::Validation(msg) => Self::new(StatusCode::BAD_REQUEST, "Validation Error", Some(msg)),
            ServiceError::NotFound(msg) => Self::new(StatusCode::NOT_FOUND, "Not Found", Some(msg)),
            ServiceError::Conflict(msg) => Self::new(StatusCode::CONFLICT, "Conflict", Some(msg)),
            ServiceError::Internal(_) | ServiceError::Db(_) => Self::internal(&e),
        }
    }
}

impl From<AuthError> for JsonApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Unauthorized | AuthError::TokenError(_) => Self::unauthorized(),
            AuthError::Validation(msg) => Self::new(StatusCode::BAD_REQUEST, "Validation Error", Some(msg)),
            AuthError::Conflict => Self::new(StatusCode::CONFLICT, "Conflict", Some(e.to_string())),
            AuthError::NotFound => Self::new(StatusCode::NOT_FOUND, "Not Found", None),
            AuthError::HashError(_) | AuthError::Repository(_) => Self::internal(&e),
        }
    }
}

impl From<JsonRejection> for JsonApiError {
    fn from(e: JsonRejection) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "Invalid Body", Some(e.body_text()))
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Any(#[from] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_errors_map_to_status() {
        let cases = [
            (ServiceError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (ServiceError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (ServiceError::Conflict("x".into()), StatusCode::CONFLICT),
            (ServiceError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (ServiceError::Db("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(JsonApiError::from(err).status_code, status);
        }
    }

    #[test]
    fn internal_errors_hide_detail() {
        let e = JsonApiError::from(ServiceError::Db("password=hunter2".into()));
        assert!(e.detail.is_none());
        let body = serde_json::to_value(&e).unwrap();
        assert_eq!(body["status"], 500);
        assert!(!body.to_string().contains("hunter2"));
    }

    #[test]
    fn token_errors_are_unauthorized() {
        assert_eq!(JsonApiError::from(AuthError::TokenError("bad".into())).status_code, StatusCode::UNAUTHORIZED);
        assert_eq!(JsonApiError::from(AuthError::Unauthorized).status_code, StatusCode::UNAUTHORIZED);
    }
}
