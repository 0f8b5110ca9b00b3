/// Session orchestration
///
/// The operations the HTTP layer invokes: register, login, refresh, revoke,
/// credential update, the chirp-mutation authorization gate and the billing
/// webhook upgrade. Handlers extract credentials from headers and bodies;
/// everything else happens here.

use chrono::Duration;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::{
    generate_access_token, hash_password, issue_refresh_token, resolve_refresh_token,
    revoke_refresh_token, validate_access_token, verify_password,
    DEFAULT_ACCESS_TOKEN_TTL_SECONDS,
};
use crate::configuration::JwtSettings;
use crate::domain::{SessionResponse, User, UserResponse};
use crate::error::{AppError, AuthError, DatabaseError, ErrorContext, ValidationError};
use crate::store::Store;

/// Webhook event that grants Chirpy Red
pub const USER_UPGRADED_EVENT: &str = "user.upgraded";

/// Outcome of a billing webhook delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookOutcome {
    Upgraded,
    Ignored,
}

/// Access token lifetime for a login request
///
/// Absent, non-positive or over-long requests get the one hour default.
pub fn clamp_access_token_ttl(requested_seconds: Option<i64>) -> Duration {
    let seconds = match requested_seconds {
        Some(seconds) if seconds > 0 && seconds <= DEFAULT_ACCESS_TOKEN_TTL_SECONDS => seconds,
        _ => DEFAULT_ACCESS_TOKEN_TTL_SECONDS,
    };
    Duration::seconds(seconds)
}

pub struct SessionService {
    store: Arc<dyn Store>,
    jwt: JwtSettings,
    polka_key: String,
}

impl SessionService {
    pub fn new(store: Arc<dyn Store>, jwt: JwtSettings, polka_key: String) -> Self {
        Self {
            store,
            jwt,
            polka_key,
        }
    }

    /// Create a user from an email and plaintext password
    pub async fn register(&self, email: &str, password: &str) -> Result<UserResponse, AppError> {
        let context = ErrorContext::new("user_registration");

        let hashed_password = hash_in_background(password).await?;
        let user = self
            .store
            .create_user(email, &hashed_password)
            .await
            .map_err(|e| {
                let err = AppError::Database(e);
                context.log_error(&err);
                err
            })?;

        tracing::info!(
            request_id = %context.request_id,
            user_id = %user.id,
            "User registered successfully"
        );

        Ok(UserResponse::from(&user))
    }

    /// Exchange email and password for an access token and a refresh token
    ///
    /// Unknown email and wrong password are indistinguishable to the caller.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        requested_ttl_seconds: Option<i64>,
    ) -> Result<SessionResponse, AppError> {
        let context = ErrorContext::new("user_login");

        let user = match self.store.get_user_by_email(email).await? {
            Some(user) => user,
            None => {
                tracing::warn!(request_id = %context.request_id, "Login for unknown email");
                return Err(AuthError::InvalidCredentials.into());
            }
        };
        let context = context.with_user_id(user.id);

        verify_in_background(password, &user.hashed_password)
            .await
            .map_err(|e| {
                context.log_error(&e);
                e
            })?;

        let ttl = clamp_access_token_ttl(requested_ttl_seconds);
        let token = generate_access_token(user.id, &self.jwt.secret, ttl)?;
        let refresh_token = issue_refresh_token(self.store.as_ref(), user.id).await?;

        tracing::info!(
            request_id = %context.request_id,
            user_id = %user.id,
            ttl_seconds = ttl.num_seconds(),
            "User logged in successfully"
        );

        Ok(SessionResponse {
            user: UserResponse::from(&user),
            token,
            refresh_token: refresh_token.token,
        })
    }

    /// Mint a one hour access token from a live refresh token
    ///
    /// The refresh token is not rotated.
    pub async fn refresh(&self, refresh_token: &str) -> Result<String, AppError> {
        let context = ErrorContext::new("token_refresh");

        let user_id = resolve_refresh_token(self.store.as_ref(), refresh_token).await?;
        let token = generate_access_token(
            user_id,
            &self.jwt.secret,
            Duration::seconds(DEFAULT_ACCESS_TOKEN_TTL_SECONDS),
        )?;

        tracing::info!(
            request_id = %context.request_id,
            user_id = %user_id,
            "Access token refreshed"
        );

        Ok(token)
    }

    pub async fn revoke(&self, refresh_token: &str) -> Result<(), AppError> {
        let context = ErrorContext::new("token_revocation");

        revoke_refresh_token(self.store.as_ref(), refresh_token).await?;

        tracing::info!(request_id = %context.request_id, "Refresh token revoked");
        Ok(())
    }

    /// Replace the email and password of an authenticated user
    pub async fn update_credentials(
        &self,
        user_id: Uuid,
        email: &str,
        password: &str,
    ) -> Result<UserResponse, AppError> {
        let context = ErrorContext::new("credential_update").with_user_id(user_id);

        if email.is_empty() || password.is_empty() {
            let err = AppError::Auth(AuthError::InvalidCredentials);
            context.log_error(&err);
            return Err(err);
        }

        let hashed_password = hash_in_background(password).await?;
        let user: User = self
            .store
            .update_user_credentials(user_id, email, &hashed_password)
            .await?
            .ok_or_else(|| {
                // Token outlived its user (e.g. a dev reset).
                AppError::Database(DatabaseError::NotFound(format!("user {}", user_id)))
            })?;

        tracing::info!(
            request_id = %context.request_id,
            user_id = %user_id,
            "User credentials updated"
        );

        Ok(UserResponse::from(&user))
    }

    /// Resolve an access token to the acting user
    pub fn authorize(&self, access_token: &str) -> Result<Uuid, AppError> {
        validate_access_token(access_token, &self.jwt.secret).map_err(AppError::from)
    }

    /// Only the author of a chirp may mutate it
    pub fn ensure_author(&self, acting_user: Uuid, author: Uuid) -> Result<(), AppError> {
        if acting_user != author {
            return Err(AppError::Forbidden(format!(
                "user {} is not the author",
                acting_user
            )));
        }
        Ok(())
    }

    /// Check the key presented by the billing webhook
    pub fn verify_api_key(&self, api_key: &str) -> Result<(), AppError> {
        if !keys_match(api_key.as_bytes(), self.polka_key.as_bytes()) {
            return Err(AuthError::InvalidApiKey.into());
        }
        Ok(())
    }

    /// Apply a billing webhook event from a verified caller
    ///
    /// Only `user.upgraded` reads `user_id`; other events are ignored whatever
    /// their payload.
    pub async fn upgrade_user(
        &self,
        event: &str,
        user_id: Option<&str>,
    ) -> Result<WebhookOutcome, AppError> {
        let context = ErrorContext::new("billing_webhook");

        if event != USER_UPGRADED_EVENT {
            tracing::info!(request_id = %context.request_id, event = %event, "Ignoring webhook event");
            return Ok(WebhookOutcome::Ignored);
        }

        let raw_user_id =
            user_id.ok_or_else(|| ValidationError::EmptyField("data.user_id".to_string()))?;
        let user_id = Uuid::parse_str(raw_user_id)
            .map_err(|_| ValidationError::MalformedId(raw_user_id.to_string()))?;

        if self.store.upgrade_user_to_chirpy_red(user_id).await? == 0 {
            return Err(DatabaseError::NotFound(format!("user {}", user_id)).into());
        }

        tracing::info!(
            request_id = %context.request_id,
            user_id = %user_id,
            "User upgraded to Chirpy Red"
        );
        Ok(WebhookOutcome::Upgraded)
    }
}

/// Compares every byte regardless of where the first mismatch is.
fn keys_match(presented: &[u8], expected: &[u8]) -> bool {
    if presented.len() != expected.len() {
        return false;
    }
    presented
        .iter()
        .zip(expected)
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

async fn hash_in_background(password: &str) -> Result<String, AppError> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AppError::Internal(format!("Password hashing task failed: {}", e)))?
}

async fn verify_in_background(password: &str, hashed_password: &str) -> Result<(), AppError> {
    let password = password.to_string();
    let hashed_password = hashed_password.to_string();
    tokio::task::spawn_blocking(move || verify_password(&password, &hashed_password))
        .await
        .map_err(|e| AppError::Internal(format!("Password verification task failed: {}", e)))?
        .map_err(AppError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    const SECRET: &str = "test-secret";
    const POLKA_KEY: &str = "f271c81ff7084ee5b99a5091b42d486e";

    fn service() -> (SessionService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let service = SessionService::new(
            store.clone(),
            JwtSettings {
                secret: SECRET.to_string(),
            },
            POLKA_KEY.to_string(),
        );
        (service, store)
    }

    #[test]
    fn test_ttl_clamping() {
        assert_eq!(clamp_access_token_ttl(None), Duration::seconds(3600));
        assert_eq!(clamp_access_token_ttl(Some(0)), Duration::seconds(3600));
        assert_eq!(clamp_access_token_ttl(Some(-5)), Duration::seconds(3600));
        assert_eq!(clamp_access_token_ttl(Some(7200)), Duration::seconds(3600));
        assert_eq!(clamp_access_token_ttl(Some(3600)), Duration::seconds(3600));
        assert_eq!(clamp_access_token_ttl(Some(1)), Duration::seconds(1));
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let (service, _) = service();

        let registered = service.register("alice@x", "pw1").await.unwrap();
        let session = service.login("alice@x", "pw1", None).await.unwrap();

        assert_eq!(session.user.id, registered.id);
        assert_eq!(session.refresh_token.len(), 64);
        assert_eq!(service.authorize(&session.token).unwrap(), registered.id);
    }

    #[tokio::test]
    async fn test_register_stores_hash_not_plaintext() {
        let (service, store) = service();

        let registered = service.register("alice@x", "pw1").await.unwrap();
        let user = store.get_user_by_id(registered.id).await.unwrap().unwrap();

        assert_ne!(user.hashed_password, "pw1");
        assert!(!user.is_chirpy_red);
    }

    #[tokio::test]
    async fn test_duplicate_registration_conflicts() {
        let (service, _) = service();
        service.register("alice@x", "pw1").await.unwrap();

        let err = service.register("alice@x", "pw2").await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Database(DatabaseError::UniqueConstraintViolation(_))
        ));
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let (service, _) = service();
        service.register("alice@x", "pw1").await.unwrap();

        let wrong_password = service.login("alice@x", "nope", None).await.unwrap_err();
        let unknown_user = service.login("bob@x", "pw1", None).await.unwrap_err();

        assert!(matches!(wrong_password, AppError::Auth(AuthError::InvalidCredentials)));
        assert!(matches!(unknown_user, AppError::Auth(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_refresh_then_revoke() {
        let (service, _) = service();
        let user = service.register("alice@x", "pw1").await.unwrap();
        let session = service.login("alice@x", "pw1", None).await.unwrap();

        let token = service.refresh(&session.refresh_token).await.unwrap();
        assert_eq!(service.authorize(&token).unwrap(), user.id);

        // No rotation: the same refresh token still works.
        assert!(service.refresh(&session.refresh_token).await.is_ok());

        service.revoke(&session.refresh_token).await.unwrap();
        let err = service.refresh(&session.refresh_token).await.unwrap_err();
        assert!(matches!(err, AppError::Auth(AuthError::RefreshTokenRevoked)));
    }

    #[tokio::test]
    async fn test_revoke_unknown_token_is_unauthorized() {
        let (service, _) = service();

        let err = service.revoke("unknown").await.unwrap_err();
        assert!(matches!(err, AppError::Auth(AuthError::RefreshTokenNotFound)));
    }

    #[tokio::test]
    async fn test_update_credentials() {
        let (service, _) = service();
        service.register("alice@x", "pw1").await.unwrap();
        let session = service.login("alice@x", "pw1", None).await.unwrap();

        let updated = service
            .update_credentials(session.user.id, "alice@y", "pw2")
            .await
            .unwrap();
        assert_eq!(updated.email, "alice@y");

        assert!(service.login("alice@x", "pw1", None).await.is_err());
        assert!(service.login("alice@y", "pw2", None).await.is_ok());
    }

    #[tokio::test]
    async fn test_update_credentials_rejects_empty_fields() {
        let (service, _) = service();
        service.register("alice@x", "pw1").await.unwrap();
        let session = service.login("alice@x", "pw1", None).await.unwrap();

        let err = service
            .update_credentials(session.user.id, "", "pw2")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Auth(_)));

        let err = service
            .update_credentials(session.user.id, "alice@y", "")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Auth(_)));
    }

    #[tokio::test]
    async fn test_refresh_token_does_not_authorize() {
        let (service, _) = service();
        service.register("alice@x", "pw1").await.unwrap();
        let session = service.login("alice@x", "pw1", None).await.unwrap();

        let err = service.authorize(&session.refresh_token).unwrap_err();
        assert!(matches!(err, AppError::Auth(AuthError::TokenMalformed)));
    }

    #[tokio::test]
    async fn test_update_credentials_for_deleted_user() {
        let (service, _) = service();

        let err = service
            .update_credentials(Uuid::new_v4(), "alice@y", "pw2")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Database(DatabaseError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_ensure_author() {
        let (service, _) = service();
        let author = Uuid::new_v4();

        assert!(service.ensure_author(author, author).is_ok());
        assert!(matches!(
            service.ensure_author(Uuid::new_v4(), author),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn test_keys_match() {
        assert!(keys_match(b"f271c81f", b"f271c81f"));
        assert!(!keys_match(b"f271c81f", b"f271c81e"));
        assert!(!keys_match(b"f271c81", b"f271c81f"));
        assert!(!keys_match(b"", b"f271c81f"));
    }

    #[test]
    fn test_verify_api_key() {
        let (service, _) = service();

        assert!(service.verify_api_key(POLKA_KEY).is_ok());
        assert!(matches!(
            service.verify_api_key("wrong"),
            Err(AppError::Auth(AuthError::InvalidApiKey))
        ));
        assert!(service.verify_api_key("").is_err());
    }

    #[tokio::test]
    async fn test_webhook_upgrade() {
        let (service, store) = service();
        let user = service.register("alice@x", "pw1").await.unwrap();

        let outcome = service
            .upgrade_user(USER_UPGRADED_EVENT, Some(&user.id.to_string()))
            .await
            .unwrap();

        assert_eq!(outcome, WebhookOutcome::Upgraded);
        assert!(store.get_user_by_id(user.id).await.unwrap().unwrap().is_chirpy_red);
    }

    #[tokio::test]
    async fn test_webhook_ignores_other_events() {
        let (service, store) = service();
        let user = service.register("alice@x", "pw1").await.unwrap();

        let outcome = service
            .upgrade_user("user.payment_failed", Some(&user.id.to_string()))
            .await
            .unwrap();
        assert_eq!(outcome, WebhookOutcome::Ignored);

        // The payload of an ignored event is never inspected.
        let outcome = service
            .upgrade_user("user.payment_failed", Some("abc"))
            .await
            .unwrap();
        assert_eq!(outcome, WebhookOutcome::Ignored);

        assert!(!store.get_user_by_id(user.id).await.unwrap().unwrap().is_chirpy_red);
    }

    #[tokio::test]
    async fn test_webhook_upgrade_requires_valid_user_id() {
        let (service, _) = service();

        let missing = service.upgrade_user(USER_UPGRADED_EVENT, None).await.unwrap_err();
        assert!(matches!(
            missing,
            AppError::Validation(ValidationError::EmptyField(_))
        ));

        let malformed = service
            .upgrade_user(USER_UPGRADED_EVENT, Some("abc"))
            .await
            .unwrap_err();
        assert!(matches!(
            malformed,
            AppError::Validation(ValidationError::MalformedId(_))
        ));
    }

    #[tokio::test]
    async fn test_webhook_unknown_user() {
        let (service, _) = service();

        let err = service
            .upgrade_user(USER_UPGRADED_EVENT, Some(&Uuid::new_v4().to_string()))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Database(DatabaseError::NotFound(_))));
    }
}
