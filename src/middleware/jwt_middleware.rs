/// JWT Authentication Middleware
///
/// Verifies the bearer token from the Authorization header and injects its
/// claims into request extensions for route handlers.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage, HttpResponse,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;

use crate::auth::TokenIssuer;
use crate::error::{AuthError, ErrorResponse};
use crate::logger::RequestId;

/// JWT middleware for protecting routes
pub struct JwtMiddleware {
    issuer: TokenIssuer,
}

impl JwtMiddleware {
    pub fn new(issuer: TokenIssuer) -> Self {
        Self { issuer }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtMiddlewareService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(JwtMiddlewareService {
            service: Rc::new(service),
            issuer: self.issuer.clone(),
        }))
    }
}

pub struct JwtMiddlewareService<S> {
    service: Rc<S>,
    issuer: TokenIssuer,
}

/// Token from `Authorization: Bearer <token>`, if present and non-empty
fn bearer_token(req: &ServiceRequest) -> Option<String> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

fn unauthorized(err: AuthError, request_id: String) -> Error {
    let code = match err {
        AuthError::MissingToken => "MISSING_TOKEN",
        _ => "TOKEN_INVALID",
    };
    let body = ErrorResponse::new(request_id, err.to_string(), code.to_string(), 401);
    let response = HttpResponse::Unauthorized().json(body);
    actix_web::error::InternalError::from_response(err, response).into()
}

impl<S, B> Service<ServiceRequest> for JwtMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let request_id = RequestId::of(req.request());

        let token = match bearer_token(&req) {
            Some(token) => token,
            None => {
                tracing::warn!(request_id = %request_id, "Missing or invalid Authorization header");
                return Box::pin(async move {
                    Err(unauthorized(AuthError::MissingToken, request_id))
                });
            }
        };

        match self.issuer.verify(&token) {
            Ok(claims) => {
                tracing::debug!(name = %claims.name, "JWT validated successfully");
                req.extensions_mut().insert(claims);

                let service = self.service.clone();
                Box::pin(async move { service.call(req).await })
            }
            Err(e) => {
                tracing::warn!(request_id = %request_id, "JWT validation failed: {}", e);
                Box::pin(async move { Err(unauthorized(e, request_id)) })
            }
        }
    }
}
