use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClinicError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Policy violation: {0}")]
    Policy(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Authorization error: {0}")]
    Authorization(String),

    #[error("Database error: {0}")]
    Database(#[from] eyre::Report),

    #[error("Internal server error: {0}")]
    Internal(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl ClinicError {
    /// Stable machine-checkable discriminator, carried alongside the
    /// human-readable message so clients can react to the exact rule that
    /// fired (e.g. re-query availability on a conflict instead of retrying).
    pub fn kind(&self) -> &'static str {
        match self {
            ClinicError::NotFound(_) => "not_found",
            ClinicError::Validation(_) => "validation",
            ClinicError::Conflict(_) => "conflict",
            ClinicError::Policy(_) => "policy_violation",
            ClinicError::Authentication(_) => "authentication",
            ClinicError::Authorization(_) => "authorization",
            ClinicError::Database(_) => "database",
            ClinicError::Internal(_) => "internal",
        }
    }
}

pub type ClinicResult<T> = Result<T, ClinicError>;
