/// Access Token Generation and Validation
///
/// Access tokens are compact HS256 JWTs signed with the server secret.
/// There is no server-side deny list: expiry is authoritative.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::auth::claims::{Claims, ISSUER};
use crate::error::{AppError, AuthError};

/// Lifetime of access tokens minted by `/api/refresh`, and the upper bound
/// for tokens minted at login.
pub const DEFAULT_ACCESS_TOKEN_TTL_SECONDS: i64 = 3600;

/// Mint a signed access token for `user_id`
///
/// # Errors
/// Returns an internal error if signing fails
pub fn generate_access_token(user_id: Uuid, secret: &str, ttl: Duration) -> Result<String, AppError> {
    let claims = Claims::new(user_id, Utc::now().timestamp(), ttl.num_seconds());

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
}

/// Validate an access token and return the user it was minted for
///
/// # Errors
/// Malformed, badly signed, expired, foreign-issuer and bad-subject tokens
/// each produce their own `AuthError`; callers surface all of them as 401.
pub fn validate_access_token(token: &str, secret: &str) -> Result<Uuid, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.set_issuer(&[ISSUER]);
    validation.set_required_spec_claims(&["exp", "iss", "sub"]);

    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| {
        tracing::debug!("JWT validation error: {}", e);
        match e.kind() {
            ErrorKind::InvalidSignature => AuthError::TokenBadSignature,
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            ErrorKind::InvalidIssuer => AuthError::TokenWrongIssuer,
            _ => AuthError::TokenMalformed,
        }
    })?;

    // jsonwebtoken still accepts exp == now; a token is only valid while exp > now.
    if claims.is_expired_at(Utc::now().timestamp()) {
        return Err(AuthError::TokenExpired);
    }

    claims.user_id()
}
