//! In-memory store implementations backing the DB-free test harness and
//! local development. A single write lock per store makes every mutation,
//! including bulk revocation, linearizable.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::db::models::{RefreshSession, User};
use crate::db::store::{CredentialStore, SessionStore};
use crate::error::AppError;
use crate::Result;

#[derive(Default)]
pub struct MemoryCredentialStore {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn create_user(&self, user: &User) -> Result<User> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == user.email) {
            return Err(AppError::Validation("Email is already registered".into()));
        }
        users.insert(user.id, user.clone());
        Ok(user.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn set_active(&self, id: Uuid, active: bool) -> Result<()> {
        let mut users = self.users.write().await;
        if let Some(user) = users.get_mut(&id) {
            user.is_active = active;
            user.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn record_login(&self, id: Uuid) -> Result<()> {
        let mut users = self.users.write().await;
        if let Some(user) = users.get_mut(&id) {
            user.last_login = Some(Utc::now());
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemorySessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, RefreshSession>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every stored session for the user, revoked ones included.
    pub async fn sessions_for_user(&self, user_id: Uuid) -> Vec<RefreshSession> {
        self.sessions
            .read()
            .await
            .values()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create_session(
        &self,
        user_id: Uuid,
        token_hash: String,
        device_fingerprint: Option<String>,
        expires_at: DateTime<Utc>,
    ) -> Result<RefreshSession> {
        let session = RefreshSession::new(user_id, token_hash, device_fingerprint, expires_at);
        self.sessions
            .write()
            .await
            .insert(session.id, session.clone());
        Ok(session)
    }

    async fn find_active_session(&self, id: Uuid) -> Result<Option<RefreshSession>> {
        Ok(self
            .sessions
            .read()
            .await
            .get(&id)
            .filter(|s| s.is_active())
            .cloned())
    }

    async fn touch_last_used(&self, id: Uuid) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        if let Some(session) = sessions.get_mut(&id) {
            session.last_used_at = Utc::now();
        }
        Ok(())
    }

    async fn revoke(&self, id: Uuid) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        if let Some(session) = sessions.get_mut(&id) {
            session.revoked = true;
        }
        Ok(())
    }

    async fn revoke_all_for_user(&self, user_id: Uuid) -> Result<u64> {
        // Single pass under the write lock; a create_session racing this
        // call serializes either entirely before or entirely after it.
        let mut sessions = self.sessions.write().await;
        let mut affected = 0;
        for session in sessions.values_mut() {
            if session.user_id == user_id && !session.revoked {
                session.revoked = true;
                affected += 1;
            }
        }
        Ok(affected)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| s.expires_at >= now);
        Ok((before - sessions.len()) as u64)
    }
}
