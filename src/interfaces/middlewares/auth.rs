use std::{
    rc::Rc,
    task::{Context, Poll},
};

use actix_web::{
    body::BoxBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{HeaderMap, AUTHORIZATION},
    web, Error, HttpMessage, HttpResponse,
};
use futures_util::future::{ok, LocalBoxFuture, Ready};

use crate::{errors::AuthError, repositories::token::TokenServiceRepository, AppState};

const ADMIN_PREFIX: &str = "/api/v1/admin";
const LOGOUT_PATH: &str = "/api/v1/auth/logout";

/// Decodes the bearer token on protected routes and stores the claims in
/// the request extensions for `AuthClaims` / `AdminClaims`.
pub struct AuthMiddleware;

impl<S> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<BoxBody>, Error = Error> + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AuthMiddlewareService {
            service: Rc::new(service),
        })
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
}

impl<S> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<BoxBody>, Error = Error> + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, ctx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            if !requires_auth(req.path(), req.method().as_str()) {
                return service.call(req).await;
            }

            let Some(state) = req.app_data::<web::Data<AppState>>().cloned() else {
                tracing::error!("AppState missing in middleware");
                return Ok(reject(req, AuthError::MissingJwtService));
            };

            let Some(token) = extract_token(req.headers()) else {
                tracing::warn!(path = %req.path(), "Missing or malformed Authorization header");
                return Ok(reject(req, AuthError::MissingCredentials));
            };

            match state.auth_handler.is_access_revoked(&token).await {
                Ok(true) => return Ok(reject(req, AuthError::TokenRevoked)),
                Ok(false) => {}
                Err(e) => tracing::warn!(error = %e, "Revocation check unavailable"),
            }

            let mut claims = match state.auth_handler.token_service.decode_jwt(&token) {
                Ok(data) => data.claims,
                Err(e) => {
                    tracing::warn!(error = %e, "Rejected bearer token");
                    return Ok(reject(req, e));
                }
            };

            // The allow-list is authoritative, not the flag baked into the token.
            claims.admin = state.auth_handler.is_admin(&claims.email);

            if req.path().starts_with(ADMIN_PREFIX) && !claims.admin {
                tracing::warn!(path = %req.path(), "Admin access required");
                return Ok(reject(req, AuthError::Forbidden("Admin access required".into())));
            }

            req.extensions_mut().insert(claims);
            service.call(req).await
        })
    }
}

fn requires_auth(path: &str, method: &str) -> bool {
    if method == "OPTIONS" {
        return false;
    }
    path.starts_with(ADMIN_PREFIX) || path == LOGOUT_PATH
}

pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    let header = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = header.trim().split_once(' ')?;
    let token = token.trim();

    if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
        Some(token.to_string())
    } else {
        None
    }
}

fn reject(req: ServiceRequest, err: AuthError) -> ServiceResponse<BoxBody> {
    let response: HttpResponse = actix_web::ResponseError::error_response(&err);
    req.into_response(response)
}
