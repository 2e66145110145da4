use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use rand::rngs::OsRng;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::rate_limit::{LoginRateLimitConfig, LoginRateLimiter};
use crate::auth::tokens::{
    compose_refresh_token, generate_refresh_secret, hash_refresh_secret, parse_refresh_token,
    Identity, TokenCodec,
};
use crate::db::models::{Role, User};
use crate::db::store::{CredentialStore, SessionStore};
use crate::error::{AppError, AuthError};
use crate::Result;

/// Credential pair returned by login and refresh.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

/// Orchestrates login, refresh, and revocation over the token codec and the
/// stores. Refresh tokens are single-use: every successful refresh revokes
/// the consumed session and issues a successor.
pub struct AuthService {
    credentials: Arc<dyn CredentialStore>,
    sessions: Arc<dyn SessionStore>,
    codec: Arc<TokenCodec>,
    rate_limiter: LoginRateLimiter,
    refresh_ttl: Duration,
}

impl AuthService {
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        sessions: Arc<dyn SessionStore>,
        codec: Arc<TokenCodec>,
        refresh_ttl: Duration,
    ) -> Self {
        Self {
            credentials,
            sessions,
            codec,
            rate_limiter: LoginRateLimiter::new(LoginRateLimitConfig::default()),
            refresh_ttl,
        }
    }

    pub fn with_rate_limit(mut self, config: LoginRateLimitConfig) -> Self {
        self.rate_limiter = LoginRateLimiter::new(config);
        self
    }

    pub async fn register(
        &self,
        full_name: &str,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<User> {
        validate_registration(full_name, email, password, role)?;

        let password_hash = hash_password(password)?;
        let user = User::new(
            full_name.trim().to_string(),
            email.trim().to_ascii_lowercase(),
            password_hash,
            role,
        );

        let created = self.credentials.create_user(&user).await?;
        info!(user_id = %created.id, role = %created.role, "user registered");
        Ok(created)
    }

    /// Unknown email and wrong password fail with the identical error;
    /// matching credentials on a deactivated account fail `AccountInactive`.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        device_fingerprint: Option<String>,
    ) -> Result<TokenPair> {
        if !self.rate_limiter.check_attempt(email).await {
            warn!("login throttled");
            return Err(AuthError::RateLimited.into());
        }

        let email = email.trim().to_ascii_lowercase();
        let user = match self.credentials.find_by_email(&email).await? {
            Some(user) => user,
            None => {
                warn!("login rejected: unknown email");
                return Err(AuthError::InvalidCredentials.into());
            }
        };

        if !verify_password(&user.password_hash, password) {
            warn!(user_id = %user.id, "login rejected: password mismatch");
            return Err(AuthError::InvalidCredentials.into());
        }

        if !user.is_active {
            warn!(user_id = %user.id, "login rejected: account inactive");
            return Err(AuthError::AccountInactive.into());
        }

        let pair = self.issue_session(&user, device_fingerprint).await?;
        self.credentials.record_login(user.id).await?;
        info!(user_id = %user.id, "login succeeded");
        Ok(pair)
    }

    /// Resolves the presented refresh token, rotates the session, and issues
    /// a new pair. Revoked, expired, unknown, and malformed tokens all fail
    /// `InvalidSession`.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair> {
        let (session_id, secret) =
            parse_refresh_token(refresh_token).ok_or(AuthError::InvalidSession)?;

        let session = self
            .sessions
            .find_active_session(session_id)
            .await?
            .ok_or(AuthError::InvalidSession)?;

        if hash_refresh_secret(secret) != session.token_hash {
            warn!(session_id = %session_id, "refresh rejected: secret mismatch");
            return Err(AuthError::InvalidSession.into());
        }

        let user = self
            .credentials
            .find_by_id(session.user_id)
            .await?
            .ok_or(AuthError::InvalidSession)?;

        if !user.is_active {
            warn!(user_id = %user.id, "refresh rejected: account inactive");
            return Err(AuthError::AccountInactive.into());
        }

        self.sessions.touch_last_used(session.id).await?;
        self.sessions.revoke(session.id).await?;

        let pair = self
            .issue_session(&user, session.device_fingerprint.clone())
            .await?;
        info!(user_id = %user.id, rotated_from = %session.id, "refresh succeeded");
        Ok(pair)
    }

    /// Best-effort single-session revocation. Malformed tokens, unknown
    /// sessions, and store failures are logged and swallowed; logout is
    /// never a user-visible failure.
    pub async fn logout(&self, refresh_token: &str) {
        let Some((session_id, secret)) = parse_refresh_token(refresh_token) else {
            return;
        };

        match self.sessions.find_active_session(session_id).await {
            Ok(Some(session)) if hash_refresh_secret(secret) == session.token_hash => {
                if let Err(e) = self.sessions.revoke(session_id).await {
                    warn!(session_id = %session_id, error = %e, "logout revoke failed");
                } else {
                    info!(session_id = %session_id, "logout revoked session");
                }
            }
            Ok(_) => {}
            Err(e) => warn!(session_id = %session_id, error = %e, "logout lookup failed"),
        }
    }

    /// Revokes every live session of the user in one atomic store update.
    /// Idempotent.
    pub async fn logout_all(&self, user_id: Uuid) -> Result<u64> {
        let affected = self.sessions.revoke_all_for_user(user_id).await?;
        info!(user_id = %user_id, sessions = affected, "logout-all revoked sessions");
        Ok(affected)
    }

    async fn issue_session(
        &self,
        user: &User,
        device_fingerprint: Option<String>,
    ) -> Result<TokenPair> {
        let identity = Identity {
            id: user.id,
            email: user.email.clone(),
            role: user.role,
        };
        let (access_token, expires_at) = self.codec.issue_access_token(&identity)?;

        let secret = generate_refresh_secret();
        let session = self
            .sessions
            .create_session(
                user.id,
                hash_refresh_secret(&secret),
                device_fingerprint,
                Utc::now() + self.refresh_ttl,
            )
            .await?;

        Ok(TokenPair {
            access_token,
            refresh_token: compose_refresh_token(session.id, &secret),
            expires_at,
        })
    }
}

/// Argon2 PHC-string hash. Also used by out-of-band provisioning tooling
/// and the test harness to seed accounts.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}

pub fn verify_password(password_hash: &str, password: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

fn validate_registration(full_name: &str, email: &str, password: &str, role: Role) -> Result<()> {
    if full_name.trim().is_empty() {
        return Err(AppError::Validation("Full name must not be empty".into()));
    }

    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => {}
        _ => return Err(AppError::Validation("Email address is not valid".into())),
    }

    if password.chars().count() < 8 {
        return Err(AppError::Validation(
            "Password must be at least 8 characters".into(),
        ));
    }

    // Admin accounts are provisioned out-of-band, never self-registered.
    if role == Role::Admin {
        return Err(AppError::Validation(
            "Role must be STUDENT or TUTOR".into(),
        ));
    }

    Ok(())
}
