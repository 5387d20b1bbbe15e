/// Credential storage
///
/// `CredentialStore` abstracts where user records live so the auth service
/// can run against Postgres in production and an in-process map in tests
/// or single-node deployments.

mod memory;
mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt;

use crate::error::DatabaseError;

pub use memory::InMemoryCredentialStore;
pub use postgres::PgCredentialStore;

/// A registered user's stored credentials
#[derive(Clone, PartialEq)]
pub struct UserCredential {
    pub username: String,
    /// bcrypt hash, never the plaintext password
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl UserCredential {
    pub fn new(username: impl Into<String>, password_hash: String) -> Self {
        Self {
            username: username.into(),
            password_hash,
            created_at: Utc::now(),
        }
    }
}

impl fmt::Debug for UserCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserCredential")
            .field("username", &self.username)
            .field("password_hash", &"[REDACTED]")
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Persistence for user credentials
///
/// Implementations must make `insert` an atomic insert-if-absent: two
/// concurrent inserts for the same username yield exactly one `Ok(())` and
/// one `DatabaseError::DuplicateUser`. A successful `insert` is visible to
/// every later `find_by_username`.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Looks up a user. `Ok(None)` means the username is not registered.
    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserCredential>, DatabaseError>;

    /// Stores a new user, failing with `DuplicateUser` if the name is taken.
    async fn insert(&self, credential: &UserCredential) -> Result<(), DatabaseError>;
}
