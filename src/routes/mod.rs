mod auth;
mod health_check;

pub use auth::{current_session_token, login, me, register};
pub use health_check::health_check;
