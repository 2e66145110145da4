//! Store contracts the authentication core depends on.
//!
//! The credential store is the boundary to user records owned by the CRUD
//! layer; the session store owns refresh-session lifecycle. Both are traits
//! so the service and gate can run against Postgres in production and
//! in-memory stores (or mocks) in tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::db::models::{RefreshSession, User};
use crate::Result;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Inserts a new user record. A duplicate email fails with a validation
    /// error, not a database error.
    async fn create_user(&self, user: &User) -> Result<User>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Flips the account's active flag. Deactivation takes effect at the
    /// gate on the very next request, before token expiry.
    async fn set_active(&self, id: Uuid, active: bool) -> Result<()>;

    async fn record_login(&self, id: Uuid) -> Result<()>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Allocates a fresh session id and persists the record.
    async fn create_session(
        &self,
        user_id: Uuid,
        token_hash: String,
        device_fingerprint: Option<String>,
        expires_at: DateTime<Utc>,
    ) -> Result<RefreshSession>;

    /// Returns the session only if it is neither revoked nor expired;
    /// callers cannot distinguish revoked/expired from absent.
    async fn find_active_session(&self, id: Uuid) -> Result<Option<RefreshSession>>;

    async fn touch_last_used(&self, id: Uuid) -> Result<()>;

    /// Idempotent: revoking a revoked or unknown session is not an error.
    async fn revoke(&self, id: Uuid) -> Result<()>;

    /// Marks every non-revoked session of the user revoked in one atomic
    /// predicate update. Returns the number of sessions affected.
    async fn revoke_all_for_user(&self, user_id: Uuid) -> Result<u64>;

    /// Housekeeping: drops sessions whose expiry is in the past. Revocation
    /// audit rows that have not yet expired are untouched.
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64>;
}
