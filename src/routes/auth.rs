/// Authentication Routes
///
/// Registration, login, the session token mirror, and the bearer-protected
/// identity endpoint.

use actix_web::cookie::{Cookie, SameSite};
use actix_web::http::header::ContentType;
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Serialize;

use crate::auth::{AuthService, LoginRequest, RegistrationRequest, TokenClaims};
use crate::error::{AuthError, ErrorContext, RequestError};
use crate::session::{SessionTokens, SESSION_COOKIE};

/// Identity carried by a verified bearer token
#[derive(Serialize)]
pub struct MeResponse {
    pub name: String,
    pub expires_at: String,
}

/// POST /api/auth/register
///
/// Stores a new user and returns its public fields. The password hash is
/// never part of the response.
///
/// # Errors
/// - 400: Username taken ("User already exists") or invalid input
/// - 500: Credential store unavailable
pub async fn register(
    req: HttpRequest,
    form: web::Json<RegistrationRequest>,
    service: web::Data<AuthService>,
) -> Result<HttpResponse, RequestError> {
    let context = ErrorContext::new(&req, "user_registration");

    let user = service
        .register(form.into_inner())
        .await
        .map_err(|e| context.fail(e))?;

    tracing::info!(
        request_id = %context.request_id,
        operation = context.operation,
        username = %user.username,
        "User registered successfully"
    );

    Ok(HttpResponse::Ok().json(user))
}

/// POST /api/auth/login
///
/// Returns the signed token as plain text and mirrors it into a newly
/// minted session slot; any previous slot for this client is dropped.
///
/// # Errors
/// - 404: Username not registered
/// - 400: Wrong password
/// - 500: Credential store unavailable
pub async fn login(
    req: HttpRequest,
    form: web::Json<LoginRequest>,
    service: web::Data<AuthService>,
    sessions: web::Data<SessionTokens>,
) -> Result<HttpResponse, RequestError> {
    let context = ErrorContext::new(&req, "user_login");
    let form = form.into_inner();
    let username = form.username.clone();

    let issued = service.login(form).await.map_err(|e| context.fail(e))?;

    let previous = req.cookie(SESSION_COOKIE);
    let session_id = sessions.start(previous.as_ref().map(|c| c.value()), &issued);

    tracing::info!(
        request_id = %context.request_id,
        operation = context.operation,
        username = %username,
        expires_at = %issued.expires_at.to_rfc3339(),
        "User logged in successfully"
    );

    let cookie = Cookie::build(SESSION_COOKIE, session_id.to_string())
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .finish();

    Ok(HttpResponse::Ok()
        .cookie(cookie)
        .content_type(ContentType::plaintext())
        .body(issued.token))
}

/// GET /api/auth/session
///
/// The token last issued to this session, if still unexpired. Informational
/// only; it grants nothing by itself.
///
/// # Errors
/// - 401: No session cookie or no live token for it
pub async fn current_session_token(
    req: HttpRequest,
    sessions: web::Data<SessionTokens>,
) -> Result<HttpResponse, RequestError> {
    let context = ErrorContext::new(&req, "session_token");

    let token = req
        .cookie(SESSION_COOKIE)
        .and_then(|cookie| uuid::Uuid::parse_str(cookie.value()).ok())
        .and_then(|session_id| sessions.get(session_id))
        .ok_or_else(|| context.fail(AuthError::MissingToken))?;

    Ok(HttpResponse::Ok()
        .content_type(ContentType::plaintext())
        .body(token))
}

/// GET /api/auth/me
///
/// **Requires a valid bearer token**; claims are injected by `JwtMiddleware`.
pub async fn me(claims: web::ReqData<TokenClaims>) -> HttpResponse {
    let claims = claims.into_inner();

    HttpResponse::Ok().json(MeResponse {
        expires_at: claims.expires_at().to_rfc3339(),
        name: claims.name,
    })
}
