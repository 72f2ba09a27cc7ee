//!
//! # Custom Error Handling
//!
//! This module defines the domain error type `AppError` used throughout the
//! application. Handlers catch store-layer failures locally and re-raise them
//! as one of these kinds; the `ResponseError` implementation then converts
//! each kind into its fixed HTTP status code and a stable JSON error body of
//! the shape `{"message": <string>, "status": <int>}`.
//!
//! `From` implementations for `sqlx::Error`, `validator::ValidationErrors`,
//! `jsonwebtoken::errors::Error`, and `bcrypt::BcryptError` allow conversion
//! with the `?` operator. Internal detail is logged, never sent to the client.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde_json::json;
use std::fmt;
use validator::ValidationErrors;

/// Represents all domain errors surfaced by the API.
///
/// Every variant has a fixed status code and a fixed client-facing message,
/// except `BadRequest` (context message) and `Internal` (detail is logged
/// server-side and replaced by a generic message).
#[derive(Debug)]
pub enum AppError {
    /// Malformed request body: missing required fields, wrong types,
    /// unknown fields where the schema is closed, or an update that would
    /// break a data invariant (HTTP 400).
    SchemaValidation,
    /// A movie violating a unique constraint already exists (HTTP 409).
    MovieAlreadyExists,
    /// A user with the given email is already registered (HTTP 409).
    EmailAlreadyExists,
    /// No movie with the given id (HTTP 404).
    MovieNotFound,
    /// Update target absent or owned by another user (HTTP 404).
    UpdatingMovie,
    /// Delete target absent or owned by another user (HTTP 404).
    DeletingMovie,
    /// Bad credentials or a missing/invalid/expired token (HTTP 401).
    Unauthorized,
    /// A request that is well-formed but rejected, e.g. a counter bound
    /// violation (HTTP 400).
    BadRequest(String),
    /// Catch-all for unexpected server-side failures (HTTP 500).
    Internal(String),
}

impl AppError {
    /// The stable client-facing message for this error kind.
    pub fn message(&self) -> &str {
        match self {
            AppError::SchemaValidation => {
                "Request is missing required fields or contains invalid data"
            }
            AppError::MovieAlreadyExists => "Movie with given details already exists",
            AppError::EmailAlreadyExists => "User with given email address already exists",
            AppError::MovieNotFound => "Movie with given id doesn't exist",
            AppError::UpdatingMovie => "Updating movie added by other is forbidden",
            AppError::DeletingMovie => "Deleting movie added by other is forbidden",
            AppError::Unauthorized => "Invalid username or password",
            AppError::BadRequest(msg) => msg,
            AppError::Internal(_) => "Something went wrong",
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::Internal(detail) => write!(f, "Internal Server Error: {}", detail),
            other => write!(f, "{}", other.message()),
        }
    }
}

/// Converts `AppError` variants into `HttpResponse` objects.
///
/// This lets Actix Web translate `Err(AppError)` results from handlers and
/// middleware into the fixed status-code table automatically.
impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::SchemaValidation | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::MovieAlreadyExists | AppError::EmailAlreadyExists => StatusCode::CONFLICT,
            AppError::MovieNotFound | AppError::UpdatingMovie | AppError::DeletingMovie => {
                StatusCode::NOT_FOUND
            }
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let AppError::Internal(detail) = self {
            log::error!("internal error: {}", detail);
        }
        let status = self.status_code();
        HttpResponse::build(status).json(json!({
            "message": self.message(),
            "status": status.as_u16(),
        }))
    }
}

/// Converts `sqlx::Error` into `AppError`.
///
/// `RowNotFound` maps to `MovieNotFound`; anything else is an internal
/// error. Unique-constraint violations carry context the blanket conversion
/// lacks, so handlers test for them with [`is_unique_violation`] before
/// falling back to `?`.
impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> AppError {
        match error {
            sqlx::Error::RowNotFound => AppError::MovieNotFound,
            _ => AppError::Internal(error.to_string()),
        }
    }
}

/// Returns true when the database rejected a write for violating a unique
/// constraint (duplicate email, duplicate movie title).
pub fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(db) if db.is_unique_violation())
}

impl From<ValidationErrors> for AppError {
    fn from(_: ValidationErrors) -> AppError {
        AppError::SchemaValidation
    }
}

/// JWT processing failures (bad signature, expiry, garbage input) all
/// surface as a plain 401.
impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(_: jsonwebtoken::errors::Error) -> AppError {
        AppError::Unauthorized
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(error: bcrypt::BcryptError) -> AppError {
        AppError::Internal(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::SchemaValidation.status_code(), 400);
        assert_eq!(AppError::MovieAlreadyExists.status_code(), 409);
        assert_eq!(AppError::EmailAlreadyExists.status_code(), 409);
        assert_eq!(AppError::MovieNotFound.status_code(), 404);
        assert_eq!(AppError::UpdatingMovie.status_code(), 404);
        assert_eq!(AppError::DeletingMovie.status_code(), 404);
        assert_eq!(AppError::Unauthorized.status_code(), 401);
        assert_eq!(AppError::BadRequest("loc out of bounds".into()).status_code(), 400);
        assert_eq!(AppError::Internal("boom".into()).status_code(), 500);
    }

    #[test]
    fn test_internal_detail_never_leaks() {
        let error = AppError::Internal("connection reset by peer".into());
        assert_eq!(error.message(), "Something went wrong");

        let response = error.error_response();
        assert_eq!(response.status(), 500);
    }

    #[test]
    fn test_stable_messages() {
        assert_eq!(
            AppError::SchemaValidation.message(),
            "Request is missing required fields or contains invalid data"
        );
        assert_eq!(
            AppError::EmailAlreadyExists.message(),
            "User with given email address already exists"
        );
        assert_eq!(
            AppError::Unauthorized.message(),
            "Invalid username or password"
        );
    }
}
