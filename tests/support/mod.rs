//! Shared harness for the integration suite: application state over the
//! in-memory stores, plus account seeding helpers.

#![allow(dead_code)]

use std::sync::Arc;

use tutorlink_server::auth::hash_password;
use tutorlink_server::db::{
    CredentialStore, MemoryCredentialStore, MemorySessionStore, Role, User,
};
use tutorlink_server::{AppState, Settings};

pub struct TestHarness {
    pub state: AppState,
    pub credentials: Arc<MemoryCredentialStore>,
    pub sessions: Arc<MemorySessionStore>,
}

pub fn test_harness() -> TestHarness {
    let credentials = Arc::new(MemoryCredentialStore::new());
    let sessions = Arc::new(MemorySessionStore::new());
    let config = Settings::new_for_test().expect("Failed to load test config");

    let state = AppState::with_stores(config, credentials.clone(), sessions.clone());

    TestHarness {
        state,
        credentials,
        sessions,
    }
}

pub async fn seed_user(
    harness: &TestHarness,
    email: &str,
    password: &str,
    role: Role,
    active: bool,
) -> User {
    let mut user = User::new(
        "Test User".to_string(),
        email.to_string(),
        hash_password(password).expect("Failed to hash password"),
        role,
    );
    user.is_active = active;

    harness
        .credentials
        .create_user(&user)
        .await
        .expect("Failed to seed user")
}
