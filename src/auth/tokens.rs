//! Stateless token codec: signs and verifies access tokens, and provides the
//! opaque refresh-token format backing stored sessions.
//!
//! Access-token verification is purely computational. It consults no store,
//! so it can only fail for cryptographic or temporal reasons.

use actix_web::http::header::HeaderValue;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;
use uuid::Uuid;

use crate::db::models::Role;
use crate::error::{AppError, AuthError};
use crate::Result;

/// Resolved caller identity, attached to the request by the gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

/// Self-contained access-token claims. Never persisted; validity is proven
/// by signature and expiry alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: Uuid,
    pub email: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl: Duration,
    validation: Validation,
}

impl TokenCodec {
    pub fn new(secret: &str, access_ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is exact: a token is honored only while now < exp.
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_ttl,
            validation,
        }
    }

    pub fn issue_access_token(&self, identity: &Identity) -> Result<(String, DateTime<Utc>)> {
        let now = Utc::now();
        let expires_at = now + self.access_ttl;
        let claims = AccessClaims {
            sub: identity.id,
            email: identity.email.clone(),
            role: identity.role,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to sign access token: {e}")))?;

        Ok((token, expires_at))
    }

    /// All decode failures collapse to one external error; the concrete
    /// cause is only visible to operators.
    pub fn verify_access_token(&self, token: &str) -> std::result::Result<AccessClaims, AuthError> {
        decode::<AccessClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!(cause = %e, "access token rejected");
                AuthError::InvalidOrExpiredToken
            })
    }

    /// Requires `Authorization: Bearer <token>`. An absent header and a
    /// malformed one fail identically.
    pub fn extract_bearer(value: Option<&HeaderValue>) -> std::result::Result<&str, AuthError> {
        let raw = value
            .and_then(|v| v.to_str().ok())
            .ok_or(AuthError::MissingToken)?;

        let token = raw
            .strip_prefix("Bearer ")
            .map(str::trim)
            .ok_or(AuthError::MissingToken)?;

        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }

        Ok(token)
    }
}

/// Random secret half of a refresh token.
pub fn generate_refresh_secret() -> String {
    let mut bytes = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Only this digest is persisted; a leaked session table cannot be replayed.
pub fn hash_refresh_secret(secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    URL_SAFE_NO_PAD.encode(hasher.finalize())
}

/// Wire format: `"{session_id}.{secret}"`.
pub fn compose_refresh_token(session_id: Uuid, secret: &str) -> String {
    format!("{session_id}.{secret}")
}

pub fn parse_refresh_token(token: &str) -> Option<(Uuid, &str)> {
    let (id, secret) = token.split_once('.')?;
    let session_id = Uuid::parse_str(id).ok()?;
    if secret.is_empty() {
        return None;
    }
    Some((session_id, secret))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn student_identity() -> Identity {
        Identity {
            id: Uuid::new_v4(),
            email: "a@x.com".into(),
            role: Role::Student,
        }
    }

    #[test]
    fn test_issue_and_verify_round_trip() {
        let codec = TokenCodec::new("test_secret", Duration::minutes(15));
        let identity = student_identity();

        let (token, expires_at) = codec.issue_access_token(&identity).unwrap();
        assert!(expires_at > Utc::now());

        let claims = codec.verify_access_token(&token).unwrap();
        assert_eq!(claims.sub, identity.id);
        assert_eq!(claims.email, identity.email);
        assert_eq!(claims.role, Role::Student);
        assert_eq!(claims.exp, expires_at.timestamp());
    }

    #[test]
    fn test_expired_token_rejected() {
        let codec = TokenCodec::new("test_secret", Duration::seconds(-1));
        let (token, _) = codec.issue_access_token(&student_identity()).unwrap();

        assert_eq!(
            codec.verify_access_token(&token),
            Err(AuthError::InvalidOrExpiredToken)
        );
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let codec = TokenCodec::new("test_secret", Duration::minutes(15));
        let other = TokenCodec::new("other_secret", Duration::minutes(15));

        let (token, _) = codec.issue_access_token(&student_identity()).unwrap();
        assert!(other.verify_access_token(&token).is_err());
    }

    #[test]
    fn test_tampered_token_rejected() {
        let codec = TokenCodec::new("test_secret", Duration::minutes(15));
        let (token, _) = codec.issue_access_token(&student_identity()).unwrap();

        let mut tampered = token.into_bytes();
        let last = tampered.len() - 1;
        tampered[last] = if tampered[last] == b'A' { b'B' } else { b'A' };
        let tampered = String::from_utf8(tampered).unwrap();

        assert!(codec.verify_access_token(&tampered).is_err());
    }

    #[test]
    fn test_extract_bearer_shapes() {
        let ok = HeaderValue::from_static("Bearer abc.def.ghi");
        assert_eq!(TokenCodec::extract_bearer(Some(&ok)).unwrap(), "abc.def.ghi");

        let cases = [
            None,
            Some(HeaderValue::from_static("Basic credentials")),
            Some(HeaderValue::from_static("Bearer")),
            Some(HeaderValue::from_static("Bearer    ")),
            Some(HeaderValue::from_static("bearer abc")),
        ];
        for value in &cases {
            assert_eq!(
                TokenCodec::extract_bearer(value.as_ref()),
                Err(AuthError::MissingToken)
            );
        }
    }

    #[test]
    fn test_refresh_token_round_trip() {
        let session_id = Uuid::new_v4();
        let secret = generate_refresh_secret();
        let token = compose_refresh_token(session_id, &secret);

        let (parsed_id, parsed_secret) = parse_refresh_token(&token).unwrap();
        assert_eq!(parsed_id, session_id);
        assert_eq!(parsed_secret, secret);

        assert!(parse_refresh_token("no-separator").is_none());
        assert!(parse_refresh_token("not-a-uuid.secret").is_none());
        assert!(parse_refresh_token(&format!("{session_id}.")).is_none());
    }

    #[test]
    fn test_refresh_hash_is_stable_and_distinct() {
        let secret = generate_refresh_secret();
        assert_eq!(hash_refresh_secret(&secret), hash_refresh_secret(&secret));
        assert_ne!(
            hash_refresh_secret(&secret),
            hash_refresh_secret(&generate_refresh_secret())
        );
    }
}
