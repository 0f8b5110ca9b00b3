/// JWT Claims structure
///
/// The claim set carried by every access token: issuer, subject (the user
/// id as text), issued-at and expiry, all times in Unix seconds.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AuthError;

/// Issuer written into and required from every access token
pub const ISSUER: &str = "chirpy";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    /// Issuer
    pub iss: String,
    /// Subject (user ID as UUID string)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Claims for `user_id` issued at `now`, valid for `ttl_seconds`
    pub fn new(user_id: Uuid, now: i64, ttl_seconds: i64) -> Self {
        Self {
            iss: ISSUER.to_string(),
            sub: user_id.to_string(),
            iat: now,
            exp: now + ttl_seconds,
        }
    }

    /// Parse the subject back into a user ID
    pub fn user_id(&self) -> Result<Uuid, AuthError> {
        Uuid::parse_str(&self.sub).map_err(|_| AuthError::TokenBadSubject)
    }

    /// Expired once `exp` is no longer strictly in the future
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.exp <= now
    }
}
