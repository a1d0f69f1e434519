//! # Authentication Module
//!
//! Bearer-token verification for the Visita API. Token *issuance* is the
//! job of the external auth service; this module only validates the
//! signature and expiry of incoming tokens and extracts the principal
//! (id + role) that the rest of the engine trusts as given.

use axum::http::{header, HeaderMap};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use visita_core::{
    errors::{ClinicError, ClinicResult},
    models::principal::{Principal, Role},
};

/// Claims carried by the auth service's tokens.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Principal id
    pub sub: Uuid,
    /// `patient` or `staff`
    pub role: Role,
    /// Expiry as a unix timestamp
    pub exp: u64,
}

/// Pulls the bearer token out of the `Authorization` header.
pub fn bearer_token(headers: &HeaderMap) -> ClinicResult<&str> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| ClinicError::Authentication("Missing authorization header".to_string()))?
        .to_str()
        .map_err(|_| ClinicError::Authentication("Invalid authorization header".to_string()))?;

    value
        .strip_prefix("Bearer ")
        .ok_or_else(|| ClinicError::Authentication("Expected a bearer token".to_string()))
}

/// Verifies a token's signature and expiry and returns its principal.
pub fn verify_token(token: &str, jwt_secret: &str) -> ClinicResult<Principal> {
    let validation = Validation::new(Algorithm::HS256);

    let data = jsonwebtoken::decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_secret.as_bytes()),
        &validation,
    )
    .map_err(|e| ClinicError::Authentication(format!("Invalid token: {}", e)))?;

    Ok(Principal {
        id: data.claims.sub,
        role: data.claims.role,
    })
}

/// Authenticates a request: header extraction plus token verification.
pub fn authenticate(headers: &HeaderMap, jwt_secret: &str) -> ClinicResult<Principal> {
    let token = bearer_token(headers)?;
    verify_token(token, jwt_secret)
}

/// Gate for staff-only operations.
pub fn require_staff(principal: &Principal) -> ClinicResult<()> {
    if principal.is_staff() {
        Ok(())
    } else {
        Err(ClinicError::Authorization(
            "This operation requires a staff role".to_string(),
        ))
    }
}
