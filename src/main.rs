use sqlx::postgres::PgPoolOptions;
use std::net::TcpListener;
use std::sync::Arc;

use jwt_auth::auth::{AuthService, TokenIssuer};
use jwt_auth::configuration::{get_configuration, CredentialStoreKind, DatabaseSettings};
use jwt_auth::startup::run;
use jwt_auth::store::{CredentialStore, InMemoryCredentialStore, PgCredentialStore};
use jwt_auth::telemetry::init_telemetry;

fn startup_error(kind: std::io::ErrorKind, message: &str) -> std::io::Error {
    std::io::Error::new(kind, message.to_string())
}

async fn postgres_store(settings: &DatabaseSettings) -> std::io::Result<PgCredentialStore> {
    tracing::info!("Attempting to connect to database");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&settings.connection_string())
        .await
        .map_err(|e| {
            tracing::error!("Failed to create connection pool: {}", e);
            startup_error(std::io::ErrorKind::ConnectionRefused, "Database connection error")
        })?;

    let store = PgCredentialStore::new(pool);
    store.migrate().await.map_err(|e| {
        tracing::error!("Failed to migrate database: {}", e);
        startup_error(std::io::ErrorKind::Other, "Database migration error")
    })?;

    tracing::info!("Database connection pool created successfully");
    Ok(store)
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // 구조화된 로깅 초기화
    init_telemetry("info");

    tracing::info!("Starting application");

    // 설정 로드
    let configuration = match get_configuration() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to read configuration: {}", e);
            return Err(startup_error(std::io::ErrorKind::InvalidInput, "Configuration error"));
        }
    };
    if let Err(e) = configuration.validate() {
        tracing::error!("Invalid configuration: {}", e);
        return Err(startup_error(std::io::ErrorKind::InvalidInput, "Configuration error"));
    }

    // 서명 키는 요청을 받기 전에 검증
    let issuer = TokenIssuer::new(&configuration.jwt).map_err(|e| {
        tracing::error!("Invalid JWT settings: {}", e);
        startup_error(std::io::ErrorKind::InvalidInput, "JWT configuration error")
    })?;
    tracing::info!("Configuration loaded successfully");

    let store: Arc<dyn CredentialStore> = match configuration.application.credential_store {
        CredentialStoreKind::Postgres => Arc::new(postgres_store(&configuration.database).await?),
        CredentialStoreKind::Memory => {
            tracing::warn!("Using in-memory credential store; users are lost on restart");
            Arc::new(InMemoryCredentialStore::new())
        }
    };

    let auth_service = AuthService::new(store, issuer, configuration.application.bcrypt_cost);

    // 서버 주소 설정
    let address = format!(
        "{}:{}",
        configuration.application.host, configuration.application.port
    );
    let listener = TcpListener::bind(&address)?;
    tracing::info!("Server listening on: {}", address);

    run(listener, auth_service)?.await
}
