/// Password Hashing and Verification
///
/// bcrypt with a configurable cost factor. Both calls are CPU-bound; async
/// callers should run them on the blocking pool.

use bcrypt::{hash, verify};

use crate::error::AppError;

/// Hash a password using bcrypt
///
/// # Arguments
/// * `password` - Plain text password to hash
/// * `cost` - bcrypt cost factor (4..=31)
///
/// # Errors
/// Returns error if bcrypt rejects the cost or fails to generate a salt
pub fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    hash(password, cost).map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

/// Verify a password against its hash
///
/// `Ok(false)` is a mismatch; an error means the stored hash is unreadable.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    verify(password, hash)
        .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))
}
