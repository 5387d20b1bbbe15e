/// Authentication module
///
/// Password hashing, token issuance/verification, and the register/login
/// service built on them.

mod claims;
mod jwt;
mod password;
mod service;

pub use claims::TokenClaims;
pub use jwt::{IssuedToken, TokenIssuer, TOKEN_LIFETIME_HOURS};
pub use password::{hash_password, verify_password};
pub use service::{AuthService, LoginRequest, RegisteredUser, RegistrationRequest};
