use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::AppError;

/// Marketplace roles. Stored as TEXT, carried in access-token claims, and
/// checked by the authorization policy as a typed set membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Student,
    Tutor,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "STUDENT",
            Role::Tutor => "TUTOR",
            Role::Admin => "ADMIN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "STUDENT" => Ok(Role::Student),
            "TUTOR" => Ok(Role::Tutor),
            "ADMIN" => Ok(Role::Admin),
            other => Err(AppError::Validation(format!("Unknown role '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl User {
    pub fn new(full_name: String, email: String, password_hash: String, role: Role) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            full_name,
            email,
            password_hash,
            role,
            is_active: true,
            created_at: now,
            updated_at: now,
            last_login: None,
        }
    }
}

/// Server-side record behind one refresh token. Only `revoked` and
/// `last_used_at` ever change after creation; rows are kept for audit and
/// swept out by the maintenance task once expired.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RefreshSession {
    pub id: Uuid,
    pub user_id: Uuid,
    /// SHA-256 of the secret half of the refresh token; the token itself is
    /// never stored.
    pub token_hash: String,
    pub device_fingerprint: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub last_used_at: DateTime<Utc>,
    pub revoked: bool,
}

impl RefreshSession {
    pub fn new(
        user_id: Uuid,
        token_hash: String,
        device_fingerprint: Option<String>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            token_hash,
            device_fingerprint,
            created_at: now,
            expires_at,
            last_used_at: now,
            revoked: false,
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }

    pub fn is_active(&self) -> bool {
        !self.revoked && !self.is_expired()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_role_round_trip() {
        for role in [Role::Student, Role::Tutor, Role::Admin] {
            assert_eq!(Role::from_str(role.as_str()).unwrap(), role);
        }
        assert!(Role::from_str("SUPERUSER").is_err());
        assert!(Role::from_str("student").is_err());
    }

    #[test]
    fn test_session_activity() {
        let live = RefreshSession::new(
            Uuid::new_v4(),
            "hash".into(),
            None,
            Utc::now() + Duration::days(14),
        );
        assert!(live.is_active());

        let expired = RefreshSession::new(
            Uuid::new_v4(),
            "hash".into(),
            None,
            Utc::now() - Duration::seconds(1),
        );
        assert!(expired.is_expired());
        assert!(!expired.is_active());

        let mut revoked = live.clone();
        revoked.revoked = true;
        assert!(!revoked.is_active());
    }
}
