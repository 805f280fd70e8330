//! services/api/src/auth.rs
//!
//! Bearer-token issuance and verification. Tokens are HS256-signed and
//! carry the account id and role; the secret and lifetime come from
//! configuration.

use chrono::{Duration, Utc};
use course_market_core::domain::Role;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The claims embedded in every issued token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the account id.
    pub sub: Uuid,
    /// `teacher` or `student`.
    pub role: Role,
    /// Expiry, seconds since the epoch.
    pub exp: i64,
}

/// The authenticated identity extracted from a verified token and passed
/// to handlers through request extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: Role,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("failed to encode token: {0}")]
    Encode(#[source] jsonwebtoken::errors::Error),
    #[error("invalid or expired token")]
    Invalid(#[source] jsonwebtoken::errors::Error),
}

/// Issues and verifies bearer tokens with a shared HS256 secret.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::hours(ttl_hours),
        }
    }

    /// Signs a token for the given account.
    pub fn issue(&self, account_id: Uuid, role: Role) -> Result<String, TokenError> {
        let claims = Claims {
            sub: account_id,
            role,
            exp: (Utc::now() + self.ttl).timestamp(),
        };
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(TokenError::Encode)
    }

    /// Verifies a token's signature and expiry and returns the identity it
    /// carries.
    pub fn verify(&self, token: &str) -> Result<AuthUser, TokenError> {
        let validation = Validation::new(Algorithm::HS256);
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(TokenError::Invalid)?;
        Ok(AuthUser {
            id: data.claims.sub,
            role: data.claims.role,
        })
    }
}
