//! Postgres-backed store implementations.
//!
//! All mutations are single-statement: per-session updates keyed by id and
//! the bulk revocation as one conditional `UPDATE` scoped by user, so there
//! is no read-modify-write window to lose updates in.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool};
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::db::models::{RefreshSession, Role, User};
use crate::db::store::{CredentialStore, SessionStore};
use crate::error::AppError;
use crate::Result;

pub async fn connect_pool(config: &DatabaseConfig) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&config.url)
        .await?;

    Ok(pool)
}

/// Raw row shape; `role` comes back as TEXT and is parsed into the typed
/// enum before the record leaves the store.
#[derive(FromRow)]
struct UserRow {
    id: Uuid,
    full_name: String,
    email: String,
    password_hash: String,
    role: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    last_login: Option<DateTime<Utc>>,
}

impl TryFrom<UserRow> for User {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<User> {
        Ok(User {
            id: row.id,
            full_name: row.full_name,
            email: row.email,
            password_hash: row.password_hash,
            role: Role::from_str(&row.role)?,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
            last_login: row.last_login,
        })
    }
}

const USER_COLUMNS: &str =
    "id, full_name, email, password_hash, role, is_active, created_at, updated_at, last_login";

#[derive(Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn create_user(&self, user: &User) -> Result<User> {
        let row = sqlx::query_as::<_, UserRow>(
            "INSERT INTO users (id, full_name, email, password_hash, role, is_active, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING id, full_name, email, password_hash, role, is_active, created_at, updated_at, last_login",
        )
        .bind(user.id)
        .bind(&user.full_name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.is_active)
        .bind(user.created_at)
        .bind(user.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e.as_database_error() {
            Some(db) if db.is_unique_violation() => {
                AppError::Validation("Email is already registered".into())
            }
            _ => AppError::from(e),
        })?;

        row.try_into()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn set_active(&self, id: Uuid, active: bool) -> Result<()> {
        sqlx::query("UPDATE users SET is_active = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(active)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn record_login(&self, id: Uuid) -> Result<()> {
        sqlx::query("UPDATE users SET last_login = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

const SESSION_COLUMNS: &str =
    "id, user_id, token_hash, device_fingerprint, created_at, expires_at, last_used_at, revoked";

#[derive(Clone)]
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn create_session(
        &self,
        user_id: Uuid,
        token_hash: String,
        device_fingerprint: Option<String>,
        expires_at: DateTime<Utc>,
    ) -> Result<RefreshSession> {
        let session = RefreshSession::new(user_id, token_hash, device_fingerprint, expires_at);

        let created = sqlx::query_as::<_, RefreshSession>(
            "INSERT INTO refresh_sessions (id, user_id, token_hash, device_fingerprint, created_at, expires_at, last_used_at, revoked)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING id, user_id, token_hash, device_fingerprint, created_at, expires_at, last_used_at, revoked",
        )
        .bind(session.id)
        .bind(session.user_id)
        .bind(&session.token_hash)
        .bind(&session.device_fingerprint)
        .bind(session.created_at)
        .bind(session.expires_at)
        .bind(session.last_used_at)
        .bind(session.revoked)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn find_active_session(&self, id: Uuid) -> Result<Option<RefreshSession>> {
        let session = sqlx::query_as::<_, RefreshSession>(&format!(
            "SELECT {SESSION_COLUMNS} FROM refresh_sessions
             WHERE id = $1 AND revoked = FALSE AND expires_at > NOW()"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    async fn touch_last_used(&self, id: Uuid) -> Result<()> {
        sqlx::query("UPDATE refresh_sessions SET last_used_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn revoke(&self, id: Uuid) -> Result<()> {
        sqlx::query("UPDATE refresh_sessions SET revoked = TRUE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn revoke_all_for_user(&self, user_id: Uuid) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE refresh_sessions SET revoked = TRUE WHERE user_id = $1 AND revoked = FALSE",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM refresh_sessions WHERE expires_at < $1")
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
