//! Authentication core: token codec, session-backed auth service, the
//! request gate, and the role policy.

pub mod gate;
pub mod handlers;
pub mod policy;
pub mod rate_limit;
pub mod service;
pub mod tokens;

pub use gate::AuthGate;
pub use policy::RequireRole;
pub use rate_limit::{LoginRateLimitConfig, LoginRateLimiter};
pub use service::{hash_password, verify_password, AuthService, TokenPair};
pub use tokens::{AccessClaims, Identity, TokenCodec};
