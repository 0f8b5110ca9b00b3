/// Refresh Token Management
///
/// Refresh tokens are:
/// - 32 bytes from the OS random source, rendered as 64 lowercase hex chars
/// - stored verbatim as the primary key of `refresh_tokens`
/// - valid for 60 days unless revoked
/// - not rotated on use; the same token keeps working until expiry or revocation
///
/// Expiry is evaluated lazily when a token is resolved.

use chrono::{DateTime, Duration, Utc};
use rand::rngs::OsRng;
use rand::RngCore;
use uuid::Uuid;

use crate::domain::RefreshToken;
use crate::error::{AppError, AuthError};
use crate::store::Store;

const REFRESH_TOKEN_BYTES: usize = 32;
pub const REFRESH_TOKEN_LIFETIME_DAYS: i64 = 60;

/// Lifecycle state of a stored refresh token at a given instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTokenState {
    Active,
    Expired,
    Revoked,
}

impl RefreshToken {
    /// Expiry is checked before revocation.
    pub fn state_at(&self, now: DateTime<Utc>) -> RefreshTokenState {
        if self.expires_at <= now {
            RefreshTokenState::Expired
        } else if self.revoked_at.is_some() {
            RefreshTokenState::Revoked
        } else {
            RefreshTokenState::Active
        }
    }
}

/// Generate a new opaque refresh token string
///
/// # Errors
/// Returns an internal error if the OS random source fails
pub fn generate_refresh_token() -> Result<String, AppError> {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| AppError::Internal(format!("Refresh token generation failed: {}", e)))?;

    Ok(hex::encode(bytes))
}

/// Issue and persist a fresh refresh token for `user_id`
pub async fn issue_refresh_token(store: &dyn Store, user_id: Uuid) -> Result<RefreshToken, AppError> {
    let now = Utc::now();
    let refresh_token = RefreshToken {
        token: generate_refresh_token()?,
        user_id,
        created_at: now,
        updated_at: now,
        expires_at: now + Duration::days(REFRESH_TOKEN_LIFETIME_DAYS),
        revoked_at: None,
    };

    store.create_refresh_token(&refresh_token).await?;

    Ok(refresh_token)
}

/// Resolve a refresh token back to its owner
///
/// # Errors
/// `RefreshTokenNotFound`, `RefreshTokenExpired` or `RefreshTokenRevoked`
/// for unusable tokens; database errors pass through.
pub async fn resolve_refresh_token(store: &dyn Store, token: &str) -> Result<Uuid, AppError> {
    let refresh_token = store
        .get_refresh_token(token)
        .await?
        .ok_or(AuthError::RefreshTokenNotFound)?;

    match refresh_token.state_at(Utc::now()) {
        RefreshTokenState::Active => Ok(refresh_token.user_id),
        RefreshTokenState::Expired => {
            tracing::info!(user_id = %refresh_token.user_id, "Refresh token expired");
            Err(AuthError::RefreshTokenExpired.into())
        }
        RefreshTokenState::Revoked => {
            tracing::warn!(user_id = %refresh_token.user_id, "Attempt to use revoked refresh token");
            Err(AuthError::RefreshTokenRevoked.into())
        }
    }
}

/// Revoke a refresh token
///
/// Revoking an already revoked token succeeds and keeps the original
/// revocation time.
pub async fn revoke_refresh_token(store: &dyn Store, token: &str) -> Result<(), AppError> {
    let rows_affected = store.revoke_refresh_token(token, Utc::now()).await?;

    if rows_affected == 0 {
        return Err(AuthError::RefreshTokenNotFound.into());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    async fn store_with_user() -> (MemoryStore, Uuid) {
        let store = MemoryStore::new();
        let user = store
            .create_user("alice@example.com", "hash")
            .await
            .expect("Failed to create user");
        (store, user.id)
    }

    #[test]
    fn test_generate_refresh_token() {
        let token = generate_refresh_token().expect("Failed to generate token");

        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn test_tokens_are_unique() {
        let first = generate_refresh_token().unwrap();
        let second = generate_refresh_token().unwrap();

        assert_ne!(first, second);
    }

    #[test]
    fn test_state_machine() {
        let now = Utc::now();
        let mut token = RefreshToken {
            token: "t".to_string(),
            user_id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            expires_at: now + Duration::days(1),
            revoked_at: None,
        };
        assert_eq!(token.state_at(now), RefreshTokenState::Active);
        assert_eq!(token.state_at(token.expires_at), RefreshTokenState::Expired);

        token.revoked_at = Some(now);
        assert_eq!(token.state_at(now), RefreshTokenState::Revoked);
        assert_eq!(
            token.state_at(now + Duration::days(2)),
            RefreshTokenState::Expired
        );
    }

    #[tokio::test]
    async fn test_issue_then_resolve_twice() {
        let (store, user_id) = store_with_user().await;

        let issued = issue_refresh_token(&store, user_id).await.unwrap();
        assert_eq!(
            issued.expires_at - issued.created_at,
            Duration::days(REFRESH_TOKEN_LIFETIME_DAYS)
        );

        assert_eq!(resolve_refresh_token(&store, &issued.token).await.unwrap(), user_id);
        assert_eq!(resolve_refresh_token(&store, &issued.token).await.unwrap(), user_id);
    }

    #[tokio::test]
    async fn test_unknown_token_not_found() {
        let (store, _) = store_with_user().await;

        let err = resolve_refresh_token(&store, "deadbeef").await.unwrap_err();
        assert!(matches!(err, AppError::Auth(AuthError::RefreshTokenNotFound)));
    }

    #[tokio::test]
    async fn test_revoked_token_is_rejected() {
        let (store, user_id) = store_with_user().await;
        let issued = issue_refresh_token(&store, user_id).await.unwrap();

        revoke_refresh_token(&store, &issued.token).await.unwrap();

        let err = resolve_refresh_token(&store, &issued.token).await.unwrap_err();
        assert!(matches!(err, AppError::Auth(AuthError::RefreshTokenRevoked)));
    }

    #[tokio::test]
    async fn test_revocation_is_monotonic() {
        let (store, user_id) = store_with_user().await;
        let issued = issue_refresh_token(&store, user_id).await.unwrap();

        revoke_refresh_token(&store, &issued.token).await.unwrap();
        let first = store.get_refresh_token(&issued.token).await.unwrap().unwrap();

        revoke_refresh_token(&store, &issued.token).await.unwrap();
        let second = store.get_refresh_token(&issued.token).await.unwrap().unwrap();

        assert_eq!(first.revoked_at, second.revoked_at);
        assert!(second.revoked_at.is_some());
        assert!(resolve_refresh_token(&store, &issued.token).await.is_err());
    }

    #[tokio::test]
    async fn test_revoke_unknown_token() {
        let (store, _) = store_with_user().await;

        let err = revoke_refresh_token(&store, "missing").await.unwrap_err();
        assert!(matches!(err, AppError::Auth(AuthError::RefreshTokenNotFound)));
    }

    #[tokio::test]
    async fn test_expired_token_is_rejected() {
        let (store, user_id) = store_with_user().await;
        let long_ago = Utc::now() - Duration::days(REFRESH_TOKEN_LIFETIME_DAYS + 1);
        let stale = RefreshToken {
            token: generate_refresh_token().unwrap(),
            user_id,
            created_at: long_ago,
            updated_at: long_ago,
            expires_at: long_ago + Duration::days(REFRESH_TOKEN_LIFETIME_DAYS),
            revoked_at: None,
        };
        store.create_refresh_token(&stale).await.unwrap();

        let err = resolve_refresh_token(&store, &stale.token).await.unwrap_err();
        assert!(matches!(err, AppError::Auth(AuthError::RefreshTokenExpired)));
    }
}
