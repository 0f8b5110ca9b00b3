/// Persistence layer
///
/// Handlers and the session service only see `Arc<dyn Store>`. `PgStore`
/// backs production; `MemoryStore` backs the test suite.

mod memory;
mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{Chirp, RefreshToken, User};
use crate::error::DatabaseError;

pub use memory::MemoryStore;
pub use postgres::PgStore;

pub type Result<T> = std::result::Result<T, DatabaseError>;

#[async_trait]
pub trait Store: Send + Sync {
    /// Fails with `UniqueConstraintViolation` when the email is taken.
    async fn create_user(&self, email: &str, hashed_password: &str) -> Result<User>;
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn get_user_by_id(&self, user_id: Uuid) -> Result<Option<User>>;
    /// Returns `None` when no such user exists.
    async fn update_user_credentials(
        &self,
        user_id: Uuid,
        email: &str,
        hashed_password: &str,
    ) -> Result<Option<User>>;
    /// Returns the number of rows touched (0 or 1).
    async fn upgrade_user_to_chirpy_red(&self, user_id: Uuid) -> Result<u64>;
    /// Also removes every chirp and refresh token.
    async fn delete_all_users(&self) -> Result<()>;

    async fn create_refresh_token(&self, refresh_token: &RefreshToken) -> Result<()>;
    async fn get_refresh_token(&self, token: &str) -> Result<Option<RefreshToken>>;
    /// Sets `revoked_at` if unset and bumps `updated_at`; returns rows touched.
    async fn revoke_refresh_token(&self, token: &str, revoked_at: DateTime<Utc>) -> Result<u64>;

    async fn create_chirp(&self, user_id: Uuid, body: &str) -> Result<Chirp>;
    /// Oldest first.
    async fn list_chirps(&self) -> Result<Vec<Chirp>>;
    async fn get_chirp(&self, chirp_id: Uuid) -> Result<Option<Chirp>>;
    async fn delete_chirp(&self, chirp_id: Uuid) -> Result<u64>;
}
