/// Input validators for credentials
/// Features:
/// 1. DoS Protection: input length limits
/// 2. Log/storage safety: rejects control characters in usernames
/// 3. bcrypt safety: rejects passwords bcrypt would silently truncate

use crate::error::ValidationError;

const MAX_USERNAME_LENGTH: usize = 64;
/// bcrypt only looks at the first 72 bytes of its input
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Validates a username for registration
/// - Rejects blank input
/// - Verifies length constraints
/// - Rejects control characters and null bytes
pub fn is_valid_username(username: &str) -> Result<&str, ValidationError> {
    if username.trim().is_empty() {
        return Err(ValidationError::EmptyField("username".to_string()));
    }

    if username.chars().count() > MAX_USERNAME_LENGTH {
        return Err(ValidationError::TooLong(
            "username".to_string(),
            MAX_USERNAME_LENGTH,
        ));
    }

    if username.chars().any(|c| c.is_control()) {
        return Err(ValidationError::SuspiciousContent("username".to_string()));
    }

    Ok(username)
}

/// Validates a plaintext password for registration
pub fn is_valid_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::EmptyField("password".to_string()));
    }

    if password.len() > MAX_PASSWORD_BYTES {
        return Err(ValidationError::TooLong(
            "password".to_string(),
            MAX_PASSWORD_BYTES,
        ));
    }

    Ok(())
}
