use thiserror::Error;
use actix_web::{ResponseError, HttpResponse, http::StatusCode};
use serde_json::json;
use tracing::error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AppError::Database(DatabaseError::NotFound),
            _ => AppError::Database(DatabaseError::Query(err.to_string())),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();

        // Server-side failures are logged in full but never echoed back.
        let message = if status.is_server_error() {
            error!(detail = %self, "request failed");
            "Internal server error".to_string()
        } else {
            self.public_message()
        };

        HttpResponse::build(status).json(json!({ "error": message }))
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Auth(e) => e.status_code(),
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Database(DatabaseError::NotFound) => StatusCode::NOT_FOUND,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Config(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl AppError {
    /// Client-facing message. Auth variants already carry uniform wording;
    /// everything else exposes only its outer description.
    fn public_message(&self) -> String {
        match self {
            AppError::Auth(e) => e.to_string(),
            AppError::Validation(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}

/// Failure taxonomy of the authentication core. External wording is fixed
/// here; signature-mismatch vs. expiry and unknown-email vs. wrong-password
/// are indistinguishable by construction.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum AuthError {
    #[error("Missing or malformed authorization header")]
    MissingToken,

    #[error("Invalid or expired token")]
    InvalidOrExpiredToken,

    #[error("User not found")]
    UserNotFound,

    #[error("Account is inactive")]
    AccountInactive,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid session")]
    InvalidSession,

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Insufficient permissions")]
    Forbidden,

    #[error("Too many login attempts")]
    RateLimited,
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::Forbidden => StatusCode::FORBIDDEN,
            AuthError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::UNAUTHORIZED,
        }
    }
}

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Record not found")]
    NotFound,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let app_err: AppError = io_err.into();
        assert!(matches!(app_err, AppError::Internal(_)));

        let config_err = config::ConfigError::NotFound(String::from("key not found"));
        let app_err: AppError = config_err.into();
        assert!(matches!(app_err, AppError::Config(_)));

        let db_err = sqlx::Error::RowNotFound;
        let app_err: AppError = db_err.into();
        assert!(matches!(app_err, AppError::Database(DatabaseError::NotFound)));
    }

    #[test]
    fn test_auth_status_codes() {
        for variant in [
            AuthError::MissingToken,
            AuthError::InvalidOrExpiredToken,
            AuthError::UserNotFound,
            AuthError::AccountInactive,
            AuthError::InvalidCredentials,
            AuthError::InvalidSession,
            AuthError::Unauthenticated,
        ] {
            assert_eq!(AppError::Auth(variant).status_code(), StatusCode::UNAUTHORIZED);
        }

        assert_eq!(
            AppError::Auth(AuthError::Forbidden).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::Auth(AuthError::RateLimited).status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            AppError::Validation("bad input".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Database(DatabaseError::NotFound).status_code(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_uniform_credential_wording() {
        // Unknown email and wrong password both surface this exact string.
        assert_eq!(
            AuthError::InvalidCredentials.to_string(),
            "Invalid credentials"
        );
        assert_eq!(
            AuthError::InvalidOrExpiredToken.to_string(),
            "Invalid or expired token"
        );
    }
}
