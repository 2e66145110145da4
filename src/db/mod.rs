//! Persistence layer: domain records, store contracts, and the Postgres and
//! in-memory implementations behind them.

pub mod memory;
pub mod models;
pub mod postgres;
pub mod store;

pub use memory::{MemoryCredentialStore, MemorySessionStore};
pub use models::{RefreshSession, Role, User};
pub use postgres::{connect_pool, PgCredentialStore, PgSessionStore};
pub use store::{CredentialStore, SessionStore};
