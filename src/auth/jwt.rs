/// JWT Token Issuance and Verification
///
/// Tokens are HS512-signed compact JWTs carrying a `name` claim and an
/// expiry 24 hours after issue. The signing key is derived once from
/// configuration when the issuer is built.

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::Serialize;
use std::sync::Arc;

use crate::auth::claims::TokenClaims;
use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError, ConfigError};
use crate::store::UserCredential;

/// Lifetime of every issued token
pub const TOKEN_LIFETIME_HOURS: i64 = 24;

/// 256 bits
const MIN_SECRET_BYTES: usize = 32;

const ALGORITHM: Algorithm = Algorithm::HS512;

/// A freshly signed token
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

struct SigningKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

/// Signs and verifies tokens with the configured HMAC secret
///
/// Cheap to clone; all clones share the same keys.
#[derive(Clone)]
pub struct TokenIssuer {
    keys: Arc<SigningKeys>,
    lifetime: Duration,
}

impl TokenIssuer {
    /// Build the issuer from settings
    ///
    /// # Errors
    /// - `MissingRequired` if the secret is empty or blank
    /// - `InvalidValue` if the secret is shorter than 32 bytes
    pub fn new(settings: &JwtSettings) -> Result<Self, ConfigError> {
        let secret = settings.token.as_bytes();

        if settings.token.trim().is_empty() {
            return Err(ConfigError::MissingRequired("JwtSettings:Token".to_string()));
        }

        if secret.len() < MIN_SECRET_BYTES {
            return Err(ConfigError::InvalidValue(format!(
                "JwtSettings:Token must be at least {} bytes, got {}",
                MIN_SECRET_BYTES,
                secret.len()
            )));
        }

        Ok(Self {
            keys: Arc::new(SigningKeys {
                encoding: EncodingKey::from_secret(secret),
                decoding: DecodingKey::from_secret(secret),
            }),
            lifetime: Duration::hours(TOKEN_LIFETIME_HOURS),
        })
    }

    /// Issue a token for `credential`, valid for 24 hours from now
    pub fn issue(&self, credential: &UserCredential) -> Result<IssuedToken, AppError> {
        self.issue_at(credential, Utc::now())
    }

    /// Issue a token as if the current time were `now`
    ///
    /// `now` is truncated to whole seconds, the resolution of `exp`.
    pub fn issue_at(
        &self,
        credential: &UserCredential,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, AppError> {
        let issued_at = Utc
            .timestamp_opt(now.timestamp(), 0)
            .single()
            .ok_or_else(|| AppError::Internal("Issue time out of range".to_string()))?;
        let expires_at = issued_at + self.lifetime;
        let claims = TokenClaims::new(credential.username.clone(), expires_at);

        let token = encode(&Header::new(ALGORITHM), &claims, &self.keys.encoding)
            .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Verify signature and expiry, returning the claims
    pub fn verify(&self, token: &str) -> Result<TokenClaims, AuthError> {
        self.verify_at(token, Utc::now())
    }

    /// Verify as if the current time were `now`
    ///
    /// # Errors
    /// - `TokenExpired` if `now` is at or past `exp`
    /// - `TokenInvalid` for a bad signature, wrong algorithm or malformed token
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<TokenClaims, AuthError> {
        let mut validation = Validation::new(ALGORITHM);
        // Expiry is checked below against `now` with no leeway
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        let claims = decode::<TokenClaims>(token, &self.keys.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::warn!("JWT validation error: {}", e);
                match e.kind() {
                    ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                    _ => AuthError::TokenInvalid,
                }
            })?;

        if claims.is_expired_at(now) {
            return Err(AuthError::TokenExpired);
        }

        Ok(claims)
    }
}
