/// Password Hashing and Verification
///
/// bcrypt with a per-hash random salt. The produced string embeds the
/// algorithm version, cost and salt, so verification needs nothing else.

use bcrypt::{hash, verify};

use crate::error::{AppError, AuthError};

/// bcrypt work factor for newly created hashes.
pub const HASH_COST: u32 = bcrypt::DEFAULT_COST;

/// Hash a plaintext password
///
/// # Errors
/// Returns an internal error only if bcrypt itself fails (e.g. entropy).
pub fn hash_password(password: &str) -> Result<String, AppError> {
    hash(password, HASH_COST)
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

/// Verify a candidate password against a stored hash
///
/// Empty candidates, malformed hashes and wrong passwords all collapse to
/// `InvalidCredentials`. bcrypt compares digests in constant time.
pub fn verify_password(password: &str, hashed_password: &str) -> Result<(), AuthError> {
    if password.is_empty() {
        return Err(AuthError::InvalidCredentials);
    }

    match verify(password, hashed_password) {
        Ok(true) => Ok(()),
        Ok(false) => Err(AuthError::InvalidCredentials),
        Err(e) => {
            tracing::warn!("Stored password hash could not be parsed: {}", e);
            Err(AuthError::InvalidCredentials)
        }
    }
}
