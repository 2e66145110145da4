pub mod auth;
pub mod config;
pub mod db;
pub mod error;

use std::sync::Arc;

use actix_web::{HttpRequest, HttpResponse};
use chrono::Duration;

pub use config::Settings;
pub use error::{AppError, AuthError};
pub type Result<T> = std::result::Result<T, AppError>;

pub use auth::{AuthGate, AuthService, Identity, RequireRole, TokenCodec};
pub use db::{CredentialStore, Role, SessionStore, User};

/// Health check endpoint handler
/// Returns a JSON response with server status and timestamp
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Catch-all for unknown API paths.
pub async fn not_found(req: HttpRequest) -> HttpResponse {
    HttpResponse::NotFound().json(serde_json::json!({
        "error": "Not found",
        "path": req.path(),
        "method": req.method().as_str(),
    }))
}

/// Application state shared across all components
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub credentials: Arc<dyn CredentialStore>,
    pub sessions: Arc<dyn SessionStore>,
    pub codec: Arc<TokenCodec>,
    pub auth_service: Arc<AuthService>,
}

impl AppState {
    /// Production wiring: Postgres-backed stores over a shared pool.
    pub async fn new(config: Settings) -> Result<Self> {
        let pool = db::connect_pool(&config.database).await?;
        let credentials: Arc<dyn CredentialStore> = Arc::new(db::PgCredentialStore::new(pool.clone()));
        let sessions: Arc<dyn SessionStore> = Arc::new(db::PgSessionStore::new(pool));

        Ok(Self::with_stores(config, credentials, sessions))
    }

    /// Wiring over caller-provided stores; the test harness and local
    /// development use this with the in-memory implementations.
    pub fn with_stores(
        config: Settings,
        credentials: Arc<dyn CredentialStore>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        let codec = Arc::new(TokenCodec::new(
            &config.auth.jwt_secret,
            Duration::minutes(config.auth.access_ttl_minutes),
        ));
        let auth_service = Arc::new(AuthService::new(
            credentials.clone(),
            sessions.clone(),
            codec.clone(),
            Duration::days(config.auth.refresh_ttl_days),
        ));

        Self {
            config: Arc::new(config),
            credentials,
            sessions,
            codec,
            auth_service,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryCredentialStore, MemorySessionStore};

    #[tokio::test]
    async fn test_app_state_clone_shares_components() {
        let config = Settings::new_for_test().expect("Failed to load test config");
        let state = AppState::with_stores(
            config,
            Arc::new(MemoryCredentialStore::new()),
            Arc::new(MemorySessionStore::new()),
        );

        let cloned = state.clone();

        assert!(Arc::ptr_eq(&state.config, &cloned.config));
        assert!(Arc::ptr_eq(&state.codec, &cloned.codec));
        assert!(Arc::ptr_eq(&state.auth_service, &cloned.auth_service));
    }
}
