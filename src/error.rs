use std::any::Any;

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::{error, warn};

use crate::catalog::CatalogError;
use crate::ledger::BookingError;
use crate::models::ErrorBody;
use crate::validation::ValidationError;

const INTERNAL_MESSAGE: &str = "Internal server error. Please try again later.";

#[derive(Debug)]
pub enum ApiError {
    InvalidTimezone(String),
    InvalidEmail(String),
    InvalidRequest(String),
    SessionNotFound(String),
    DuplicateBooking(String),
    SessionFull(String),
    Internal(String),
}

impl ApiError {
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::InvalidTimezone(_) => "InvalidTimezone",
            ApiError::InvalidEmail(_) => "InvalidEmail",
            ApiError::InvalidRequest(_) => "InvalidRequest",
            ApiError::SessionNotFound(_) => "SessionNotFound",
            ApiError::DuplicateBooking(_) => "DuplicateBooking",
            ApiError::SessionFull(_) => "SessionFull",
            ApiError::Internal(_) => "Internal",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidTimezone(_)
            | ApiError::InvalidEmail(_)
            | ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::DuplicateBooking(_) | ApiError::SessionFull(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let kind = self.kind();
        let message = match self {
            ApiError::Internal(detail) => {
                error!(kind, "Unexpected error: {detail}");
                INTERNAL_MESSAGE.to_string()
            }
            ApiError::InvalidTimezone(msg)
            | ApiError::InvalidEmail(msg)
            | ApiError::InvalidRequest(msg)
            | ApiError::SessionNotFound(msg)
            | ApiError::DuplicateBooking(msg)
            | ApiError::SessionFull(msg) => {
                warn!(kind, status = status.as_u16(), "Request rejected: {msg}");
                msg
            }
        };

        let body = ErrorBody {
            error: kind.to_string(),
            message,
        };
        (status, Json(body)).into_response()
    }
}

impl From<CatalogError> for ApiError {
    fn from(value: CatalogError) -> Self {
        match value {
            CatalogError::InvalidTimezone(_) => ApiError::InvalidTimezone(value.to_string()),
            CatalogError::InvalidCapacity(_)
            | CatalogError::DuplicateSessionId(_)
            | CatalogError::UnparseableStartTime { .. }
            | CatalogError::InvalidStartTime { .. } => ApiError::Internal(value.to_string()),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(value: ValidationError) -> Self {
        match value {
            ValidationError::InvalidEmail(_) => ApiError::InvalidEmail(value.to_string()),
            ValidationError::InvalidClientName => ApiError::InvalidRequest(value.to_string()),
        }
    }
}

impl From<BookingError> for ApiError {
    fn from(value: BookingError) -> Self {
        match value {
            BookingError::Invalid(err) => err.into(),
            BookingError::SessionNotFound(_) => ApiError::SessionNotFound(value.to_string()),
            BookingError::DuplicateBooking { .. } => ApiError::DuplicateBooking(value.to_string()),
            BookingError::SessionFull(_) => ApiError::SessionFull(value.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(value: JsonRejection) -> Self {
        ApiError::InvalidRequest(value.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(value: QueryRejection) -> Self {
        ApiError::InvalidRequest(value.body_text())
    }
}

/// Turns a handler panic into the generic internal error response.
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "unknown panic payload".to_string()
    };
    ApiError::Internal(format!("handler panicked: {detail}")).into_response()
}
