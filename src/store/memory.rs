use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Result, Store};
use crate::domain::{Chirp, RefreshToken, User};
use crate::error::DatabaseError;

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    refresh_tokens: HashMap<String, RefreshToken>,
    chirps: Vec<Chirp>,
}

/// In-process store with the same constraints as the Postgres schema:
/// unique emails, foreign keys to users, cascading user deletion.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn email_taken(tables: &Tables, email: &str, except: Option<Uuid>) -> bool {
    tables
        .users
        .values()
        .any(|user| user.email == email && Some(user.id) != except)
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_user(&self, email: &str, hashed_password: &str) -> Result<User> {
        let mut tables = self.tables.write().await;
        if email_taken(&tables, email, None) {
            return Err(DatabaseError::UniqueConstraintViolation(
                "users_email_key".to_string(),
            ));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            email: email.to_string(),
            hashed_password: hashed_password.to_string(),
            is_chirpy_red: false,
        };
        tables.users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|user| user.email == email).cloned())
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> Result<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.get(&user_id).cloned())
    }

    async fn update_user_credentials(
        &self,
        user_id: Uuid,
        email: &str,
        hashed_password: &str,
    ) -> Result<Option<User>> {
        let mut tables = self.tables.write().await;
        if email_taken(&tables, email, Some(user_id)) {
            return Err(DatabaseError::UniqueConstraintViolation(
                "users_email_key".to_string(),
            ));
        }

        let updated = tables.users.get_mut(&user_id).map(|user| {
            user.email = email.to_string();
            user.hashed_password = hashed_password.to_string();
            user.updated_at = Utc::now();
            user.clone()
        });

        Ok(updated)
    }

    async fn upgrade_user_to_chirpy_red(&self, user_id: Uuid) -> Result<u64> {
        let mut tables = self.tables.write().await;
        match tables.users.get_mut(&user_id) {
            Some(user) => {
                user.is_chirpy_red = true;
                user.updated_at = Utc::now();
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_all_users(&self) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables.users.clear();
        tables.refresh_tokens.clear();
        tables.chirps.clear();
        Ok(())
    }

    async fn create_refresh_token(&self, refresh_token: &RefreshToken) -> Result<()> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&refresh_token.user_id) {
            return Err(DatabaseError::QueryExecution(
                "refresh_tokens_user_id_fkey".to_string(),
            ));
        }
        if tables.refresh_tokens.contains_key(&refresh_token.token) {
            return Err(DatabaseError::UniqueConstraintViolation(
                "refresh_tokens_pkey".to_string(),
            ));
        }

        tables
            .refresh_tokens
            .insert(refresh_token.token.clone(), refresh_token.clone());
        Ok(())
    }

    async fn get_refresh_token(&self, token: &str) -> Result<Option<RefreshToken>> {
        let tables = self.tables.read().await;
        Ok(tables.refresh_tokens.get(token).cloned())
    }

    async fn revoke_refresh_token(&self, token: &str, revoked_at: DateTime<Utc>) -> Result<u64> {
        let mut tables = self.tables.write().await;
        match tables.refresh_tokens.get_mut(token) {
            Some(refresh_token) => {
                refresh_token.revoked_at.get_or_insert(revoked_at);
                refresh_token.updated_at = revoked_at;
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn create_chirp(&self, user_id: Uuid, body: &str) -> Result<Chirp> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&user_id) {
            return Err(DatabaseError::QueryExecution(
                "chirps_user_id_fkey".to_string(),
            ));
        }

        let now = Utc::now();
        let chirp = Chirp {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            body: body.to_string(),
            user_id,
        };
        tables.chirps.push(chirp.clone());

        Ok(chirp)
    }

    async fn list_chirps(&self) -> Result<Vec<Chirp>> {
        let tables = self.tables.read().await;
        // Insertion order is creation order.
        Ok(tables.chirps.clone())
    }

    async fn get_chirp(&self, chirp_id: Uuid) -> Result<Option<Chirp>> {
        let tables = self.tables.read().await;
        Ok(tables.chirps.iter().find(|chirp| chirp.id == chirp_id).cloned())
    }

    async fn delete_chirp(&self, chirp_id: Uuid) -> Result<u64> {
        let mut tables = self.tables.write().await;
        let before = tables.chirps.len();
        tables.chirps.retain(|chirp| chirp.id != chirp_id);
        Ok((before - tables.chirps.len()) as u64)
    }
}
