use config::ConfigError;

use crate::error;

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub database: DatabaseSettings,
    #[serde(rename = "JwtSettings", alias = "jwtsettings")]
    pub jwt: JwtSettings,
}

#[derive(serde::Deserialize, Clone)]
pub struct ApplicationSettings {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
    #[serde(default)]
    pub credential_store: CredentialStoreKind,
}

/// Which credential store backs the auth service
#[derive(serde::Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CredentialStoreKind {
    #[default]
    Postgres,
    Memory,
}

#[derive(serde::Deserialize, Clone)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: String,
    pub port: u16,
    pub host: String,
    pub database_name: String,
}

impl DatabaseSettings {
    pub fn connection_string(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database_name
        )
    }

    pub fn connection_string_without_db(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}",
            self.username, self.password, self.host, self.port
        )
    }
}

/// JWT signing settings, read from the `JwtSettings:Token` key
#[derive(serde::Deserialize, Clone)]
pub struct JwtSettings {
    #[serde(rename = "Token", alias = "token")]
    pub token: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_bcrypt_cost() -> u32 {
    bcrypt::DEFAULT_COST
}

const MIN_BCRYPT_COST: u32 = 4;
const MAX_BCRYPT_COST: u32 = 31;

impl Settings {
    /// Checks values serde cannot. The signing secret is checked separately
    /// when the token issuer is built.
    pub fn validate(&self) -> Result<(), error::ConfigError> {
        let cost = self.application.bcrypt_cost;
        if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&cost) {
            return Err(error::ConfigError::InvalidValue(format!(
                "application.bcrypt_cost must be between {} and {}, got {}",
                MIN_BCRYPT_COST, MAX_BCRYPT_COST, cost
            )));
        }
        Ok(())
    }
}

/// Environment variable that overrides `JwtSettings:Token`
pub const JWT_TOKEN_ENV: &str = "JwtSettings__Token";

/// Loads `configuration.*` from the working directory, overridden by
/// `APP_`-prefixed environment variables (`APP_APPLICATION__PORT=...`).
/// The signing secret is overridden by `JwtSettings__Token`.
pub fn get_configuration() -> Result<Settings, ConfigError> {
    let mut builder = config::Config::builder()
        .add_source(config::File::with_name("configuration").required(false))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        );

    if let Ok(token) = std::env::var(JWT_TOKEN_ENV) {
        builder = builder.set_override("JwtSettings.Token", token)?;
    }

    builder.build()?.try_deserialize::<Settings>()
}
