use chrono::Utc;
use secrecy::ExposeSecret;
use sqlx::Row;

use cartwheel_core::domain::user::{Credentials, Identity, SessionToken, User, UserId};
use cartwheel_core::errors::StoreError;
use cartwheel_core::store::IdentityStore;

use super::{decode, parse_timestamp, RepositoryError};
use crate::DbPool;

pub struct SqlUserRepository {
    pool: DbPool,
}

impl SqlUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn insert(&self, credentials: &Credentials) -> Result<User, RepositoryError> {
        let now = Utc::now();
        let id = sqlx::query(
            "INSERT INTO users (username, password, token, created_at, updated_at)
             VALUES (?, ?, NULL, ?, ?)",
        )
        .bind(&credentials.username)
        .bind(credentials.password.expose_secret())
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        Ok(User { id: UserId(id), username: credentials.username.clone(), created_at: now })
    }

    async fn select_all(&self) -> Result<Vec<User>, RepositoryError> {
        let rows = sqlx::query("SELECT id, username, created_at FROM users ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_user).collect()
    }

    async fn select_by_credentials(
        &self,
        credentials: &Credentials,
    ) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, username, created_at FROM users WHERE username = ? AND password = ?",
        )
        .bind(&credentials.username)
        .bind(credentials.password.expose_secret())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_user).transpose()
    }

    async fn update_token(
        &self,
        user_id: UserId,
        token: &SessionToken,
    ) -> Result<(), RepositoryError> {
        let updated = sqlx::query("UPDATE users SET token = ?, updated_at = ? WHERE id = ?")
            .bind(token.expose())
            .bind(Utc::now().to_rfc3339())
            .bind(user_id.0)
            .execute(&self.pool)
            .await?;

        if updated.rows_affected() == 0 {
            return Err(RepositoryError::Decode(format!("user {user_id} not found")));
        }
        Ok(())
    }

    async fn select_by_token(&self, token: &str) -> Result<Option<Identity>, RepositoryError> {
        if token.is_empty() {
            return Ok(None);
        }

        let row = sqlx::query("SELECT id, username FROM users WHERE token IS NOT NULL AND token = ?")
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| -> Result<Identity, RepositoryError> {
            Ok(Identity {
                user_id: UserId(row.try_get("id").map_err(decode)?),
                username: row.try_get("username").map_err(decode)?,
            })
        })
        .transpose()
    }
}

fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> Result<User, RepositoryError> {
    let id: i64 = row.try_get("id").map_err(decode)?;
    let username: String = row.try_get("username").map_err(decode)?;
    let created_at: String = row.try_get("created_at").map_err(decode)?;

    Ok(User { id: UserId(id), username, created_at: parse_timestamp(&created_at)? })
}

#[async_trait::async_trait]
impl IdentityStore for SqlUserRepository {
    async fn create_user(&self, credentials: &Credentials) -> Result<User, StoreError> {
        Ok(self.insert(credentials).await?)
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        Ok(self.select_all().await?)
    }

    async fn find_by_credentials(
        &self,
        credentials: &Credentials,
    ) -> Result<Option<User>, StoreError> {
        Ok(self.select_by_credentials(credentials).await?)
    }

    async fn assign_token(&self, user_id: UserId, token: &SessionToken) -> Result<(), StoreError> {
        Ok(self.update_token(user_id, token).await?)
    }

    async fn resolve_token(&self, token: &str) -> Result<Option<Identity>, StoreError> {
        Ok(self.select_by_token(token).await?)
    }
}
