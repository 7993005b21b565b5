use actix_web::{http::StatusCode, post, web, HttpRequest, HttpResponse, Responder};
use tracing::instrument;

use crate::entities::token::{LoginRequest, LogoutRequest, RefreshTokenRequest};
use crate::handlers::json_error::{handle_auth_handler_error, json_error};
use crate::limiter::rate_limiter::RateDecision;
use crate::middlewares::auth::extract_token;
use crate::use_cases::extractors::AuthClaims;
use crate::utils::get_client_ip::get_client_ip;
use crate::errors::AuthError;
use crate::AppState;

#[post("/login")]
#[instrument(skip(request, state, credentials))]
pub async fn login(
    request: HttpRequest,
    state: web::Data<AppState>,
    credentials: web::Json<LoginRequest>,
) -> impl Responder {
    let client_ip = get_client_ip(&request, state.config.trust_x_forwarded_for);

    if let RateDecision::Limited { retry_after_secs } = state.login_limiter.check(&client_ip) {
        tracing::warn!(%client_ip, retry_after_secs, "Sign-in rate limited");
        return handle_auth_handler_error(AuthError::RateLimited(retry_after_secs));
    }

    match state.auth_handler.login(credentials.into_inner()).await {
        Ok(auth_response) => {
            state.login_limiter.reset(&client_ip);
            HttpResponse::Ok().json(auth_response)
        }
        Err(e) => handle_auth_handler_error(e),
    }
}

#[post("/refresh-token")]
#[instrument(skip(state, request))]
pub async fn refresh_token(state: web::Data<AppState>, request: web::Json<RefreshTokenRequest>) -> impl Responder {
    match state.auth_handler.refresh_token(&request.refresh_token).await {
        Ok(auth_response) => HttpResponse::Ok().json(auth_response),
        Err(e) => handle_auth_handler_error(e),
    }
}

#[post("/logout")]
#[instrument(skip(request, claims, state, body))]
pub async fn logout(
    request: HttpRequest,
    claims: AuthClaims,
    state: web::Data<AppState>,
    body: web::Json<LogoutRequest>,
) -> impl Responder {
    let Some(access_token) = extract_token(request.headers()) else {
        return json_error(
            StatusCode::UNAUTHORIZED,
            "Unauthorized",
            "Missing access token in Authorization header",
        );
    };

    match state.auth_handler.logout(&body.refresh_token, &access_token).await {
        Ok(()) => {
            tracing::debug!(email = %claims.0.email, "Tokens revoked");
            HttpResponse::Ok().json(serde_json::json!({
                "message": "Logged out successfully",
                "revoked": state.auth_handler.has_revocation_store(),
            }))
        }
        Err(e) => handle_auth_handler_error(e),
    }
}
