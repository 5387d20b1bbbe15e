use actix_web::dev::Server;
use actix_web::{error::JsonPayloadError, middleware::Logger, web, App, HttpRequest, HttpServer};
use std::net::TcpListener;

use crate::auth::AuthService;
use crate::error::{ErrorContext, ValidationError};
use crate::logger::LoggerMiddleware;
use crate::middleware::JwtMiddleware;
use crate::routes::{current_session_token, health_check, login, me, register};
use crate::session::SessionTokens;

/// Credentials bodies are tiny
const MAX_JSON_BODY_BYTES: usize = 4096;

fn json_error_handler(err: JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    tracing::debug!("Rejected request body: {}", err);
    ErrorContext::new(req, "parse_request_body")
        .fail(ValidationError::InvalidFormat("request body".to_string()))
        .into()
}

pub fn run(listener: TcpListener, auth_service: AuthService) -> Result<Server, std::io::Error> {
    let issuer = auth_service.issuer().clone();
    let auth_service = web::Data::new(auth_service);
    let sessions = web::Data::new(SessionTokens::new());

    let server = HttpServer::new(move || {
        App::new()
            // Global middleware
            .wrap(Logger::default())
            .wrap(LoggerMiddleware)

            // Shared state
            .app_data(auth_service.clone())
            .app_data(sessions.clone())
            .app_data(
                web::JsonConfig::default()
                    .limit(MAX_JSON_BODY_BYTES)
                    .error_handler(json_error_handler),
            )

            .route("/health_check", web::get().to(health_check))
            .service(
                web::scope("/api/auth")
                    .route("/register", web::post().to(register))
                    .route("/login", web::post().to(login))
                    .route("/session", web::get().to(current_session_token))
                    // Protected (require a bearer token)
                    .service(
                        web::resource("/me")
                            .wrap(JwtMiddleware::new(issuer.clone()))
                            .route(web::get().to(me)),
                    ),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
