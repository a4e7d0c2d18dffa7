use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::any::Any;
use stubby_core::{MappingError, Signal};
use tracing::error;

use crate::model::ApiResponse;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug)]
pub enum AppError {
    /// The request body could not be decoded into the expected shape.
    BadRequest { status: StatusCode, reason: String },
    InvalidUrl(String),
    Mapping(MappingError),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest {
            status: rejection.status(),
            reason: rejection.body_text(),
        }
    }
}

impl From<MappingError> for AppError {
    fn from(value: MappingError) -> Self {
        AppError::Mapping(value)
    }
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest { status, .. } => *status,
            AppError::InvalidUrl(_) => StatusCode::BAD_REQUEST,
            AppError::Mapping(err) => match err.signal() {
                Signal::Conflict => StatusCode::CONFLICT,
                Signal::NotFound => StatusCode::NOT_FOUND,
                Signal::InvalidInput => StatusCode::BAD_REQUEST,
                Signal::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn message(&self) -> String {
        match self {
            AppError::BadRequest { reason, .. } => format!("failed to decode request: {reason}"),
            AppError::InvalidUrl(reason) => format!("invalid url: {reason}"),
            // storage details stay in the logs
            AppError::Mapping(err) if err.signal() == Signal::Internal => {
                "internal error".to_string()
            }
            AppError::Mapping(err) => err.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(ApiResponse::error(self.message()))).into_response()
    }
}

/// Turns a panic caught in a handler into the standard error envelope.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic payload");
    error!(panic = detail, "handler panicked");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiResponse::error("internal error")),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use stubby_core::StorageError;

    #[test]
    fn signals_map_to_status_codes() {
        let cases = [
            (MappingError::AliasExists("a".into()), StatusCode::CONFLICT),
            (
                MappingError::AliasExhausted { attempts: 8 },
                StatusCode::CONFLICT,
            ),
            (MappingError::AliasNotFound("a".into()), StatusCode::NOT_FOUND),
            (MappingError::InvalidAlias("a".into()), StatusCode::BAD_REQUEST),
            (MappingError::Timeout, StatusCode::INTERNAL_SERVER_ERROR),
            (
                MappingError::StorageUnavailable(StorageError::Unavailable("io".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(AppError::from(err).status_code(), expected);
        }
    }

    #[test]
    fn internal_details_are_not_exposed() {
        let err = AppError::from(MappingError::StorageUnavailable(StorageError::Query(
            "no such table: url_records".into(),
        )));
        assert_eq!(err.message(), "internal error");
    }

    #[test]
    fn bad_request_keeps_rejection_status() {
        let err = AppError::BadRequest {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            reason: "missing field `url`".into(),
        };
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            err.message(),
            "failed to decode request: missing field `url`"
        );
    }

    #[test]
    fn panics_become_internal_errors() {
        let response = panic_response(Box::new("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
