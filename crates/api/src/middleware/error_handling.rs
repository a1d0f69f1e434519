//! # Error Handling Middleware
//!
//! Maps the domain error taxonomy to HTTP responses. Every response body
//! carries both a stable `kind` and the human-readable reason, so a
//! client can tell "term already taken" (re-query availability) apart
//! from "too late to cancel" (policy refusal) without parsing prose.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use visita_core::errors::ClinicError;

/// Application error wrapper that provides HTTP status code mapping.
///
/// `AppError` wraps domain-specific `ClinicError` instances and
/// implements `IntoResponse` to convert them into HTTP responses with
/// appropriate status codes and JSON payloads.
#[derive(Debug)]
pub struct AppError(pub ClinicError);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Map error types to HTTP status codes
        let status = match &self.0 {
            ClinicError::NotFound(_) => StatusCode::NOT_FOUND,
            ClinicError::Validation(_) => StatusCode::BAD_REQUEST,
            ClinicError::Conflict(_) => StatusCode::CONFLICT,
            ClinicError::Policy(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ClinicError::Authentication(_) => StatusCode::UNAUTHORIZED,
            ClinicError::Authorization(_) => StatusCode::FORBIDDEN,
            ClinicError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ClinicError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Format the error kind and message as JSON
        let body = Json(json!({
            "kind": self.0.kind(),
            "error": self.0.to_string(),
        }));

        (status, body).into_response()
    }
}

/// Automatic conversion from ClinicError to AppError, so handlers can use
/// the `?` operator on functions returning `Result<T, ClinicError>`.
impl From<ClinicError> for AppError {
    fn from(err: ClinicError) -> Self {
        AppError(err)
    }
}

/// Automatic conversion from eyre::Report to AppError, wrapping the
/// report in the Database variant. Repository failures bubble straight
/// out of handlers this way.
impl From<eyre::Report> for AppError {
    fn from(err: eyre::Report) -> Self {
        AppError(ClinicError::Database(err))
    }
}

/// Maps a ClinicError directly to an HTTP response.
pub fn map_error(err: ClinicError) -> Response {
    AppError(err).into_response()
}
