//! Session tokens (HS256 JWT).
//!
//! Verification never errors: anything other than a valid, unexpired token
//! signed with our secret is treated as "no session".

use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::db::AccountRecord;
use crate::errors::Result;

/// Payload stored in a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    /// Account id (stable across user-id renames).
    pub sub: String,
    pub user_id: String,
    pub provider: String,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and checks session tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: i64,
}

impl TokenIssuer {
    pub fn new(secret: &str, ttl_secs: u64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_secs: i64::try_from(ttl_secs).unwrap_or(i64::MAX),
        }
    }

    pub fn issue(&self, account: &AccountRecord) -> Result<String> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: account.id.clone(),
            user_id: account.user_id.clone(),
            provider: account.provider.clone(),
            iat: now,
            exp: now.saturating_add(self.ttl_secs),
        };
        Ok(encode(&Header::default(), &claims, &self.encoding)?)
    }

    /// Decode a token. Expired, malformed or foreign tokens yield `None`.
    pub fn verify(&self, token: &str) -> Option<Claims> {
        match decode::<Claims>(token, &self.decoding, &Validation::default()) {
            Ok(data) => Some(data.claims),
            Err(err) => {
                debug!("Rejected session token: {err}");
                None
            }
        }
    }
}

/// Pull the token out of an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: Option<&str>) -> Option<&str> {
    let token = header?.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}
