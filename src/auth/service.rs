/// Authentication Service
///
/// Registers users and exchanges valid credentials for signed tokens.
/// Holds no per-request state; one instance is shared by all workers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::auth::jwt::{IssuedToken, TokenIssuer};
use crate::auth::password::{hash_password, verify_password};
use crate::error::{AppError, AuthError, DatabaseError};
use crate::store::{CredentialStore, UserCredential};
use crate::validators::{is_valid_password, is_valid_username, MAX_PASSWORD_BYTES};

/// User registration request
#[derive(Deserialize)]
pub struct RegistrationRequest {
    pub username: String,
    pub password: String,
}

/// User login request
#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Public view of a newly registered user
#[derive(Debug, Serialize, PartialEq)]
pub struct RegisteredUser {
    pub username: String,
    pub created_at: DateTime<Utc>,
}

impl From<&UserCredential> for RegisteredUser {
    fn from(credential: &UserCredential) -> Self {
        Self {
            username: credential.username.clone(),
            created_at: credential.created_at,
        }
    }
}

#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    issuer: TokenIssuer,
    hash_cost: u32,
}

impl AuthService {
    pub fn new(store: Arc<dyn CredentialStore>, issuer: TokenIssuer, hash_cost: u32) -> Self {
        Self {
            store,
            issuer,
            hash_cost,
        }
    }

    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }

    /// Register a new user
    ///
    /// # Errors
    /// - `Validation` for a blank/oversized username or an empty/oversized password
    /// - `Auth(UserAlreadyExists)` if the username is taken
    /// - `Database` if the store fails
    pub async fn register(&self, request: RegistrationRequest) -> Result<RegisteredUser, AppError> {
        let username = is_valid_username(&request.username)?.to_string();
        is_valid_password(&request.password)?;

        let cost = self.hash_cost;
        let password = request.password;
        let password_hash = run_blocking(move || hash_password(&password, cost)).await?;

        let credential = UserCredential::new(username, password_hash);
        match self.store.insert(&credential).await {
            Ok(()) => {}
            Err(DatabaseError::DuplicateUser(_)) => {
                return Err(AuthError::UserAlreadyExists.into());
            }
            Err(e) => return Err(e.into()),
        }

        tracing::info!(username = %credential.username, "Credential stored");
        Ok(RegisteredUser::from(&credential))
    }

    /// Verify credentials and issue a token
    ///
    /// # Errors
    /// - `Auth(UserNotFound)` if the username is not registered
    /// - `Auth(WrongPassword)` if the password does not match
    /// - `Database` if the store fails
    pub async fn login(&self, request: LoginRequest) -> Result<IssuedToken, AppError> {
        let credential = self
            .store
            .find_by_username(&request.username)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        // Registration never stores a longer password, and bcrypt would
        // compare only its first 72 bytes.
        if request.password.len() > MAX_PASSWORD_BYTES {
            return Err(AuthError::WrongPassword.into());
        }

        let password = request.password;
        let password_hash = credential.password_hash.clone();
        let matches = run_blocking(move || verify_password(&password, &password_hash)).await?;
        if !matches {
            return Err(AuthError::WrongPassword.into());
        }

        self.issuer.issue(&credential)
    }
}

/// Run CPU-bound bcrypt work off the async workers
async fn run_blocking<F, T>(f: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, AppError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::Internal(format!("Blocking task failed: {}", e)))?
}
