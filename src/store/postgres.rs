use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{CredentialStore, UserCredential};
use crate::error::DatabaseError;

/// Credential store backed by the Postgres `users` table
///
/// Uniqueness is enforced by the `users_username_key` index, not by the
/// caller checking first.
#[derive(Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies the migrations under `./migrations`
    pub async fn migrate(&self) -> Result<(), DatabaseError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| DatabaseError::QueryExecution(format!("Migration failed: {}", e)))
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserCredential>, DatabaseError> {
        let row = sqlx::query_as::<_, (String, String, DateTime<Utc>)>(
            "SELECT username, password_hash, created_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(username, password_hash, created_at)| UserCredential {
            username,
            password_hash,
            created_at,
        }))
    }

    async fn insert(&self, credential: &UserCredential) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (id, username, password_hash, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (username) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&credential.username)
        .bind(&credential.password_hash)
        .bind(credential.created_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            tracing::debug!(username = %credential.username, "Insert skipped, username taken");
            return Err(DatabaseError::DuplicateUser(credential.username.clone()));
        }

        Ok(())
    }
}
