use actix_web::{http::StatusCode, HttpResponse, ResponseError};

use crate::errors::AuthError;

pub fn json_error(status: StatusCode, error: &str, details: &str) -> HttpResponse {
    HttpResponse::build(status).json(serde_json::json!({
        "error": error,
        "details": details
    }))
}

/// Auth failures keep their own status mapping; server-side ones are logged.
pub fn handle_auth_handler_error(err: AuthError) -> HttpResponse {
    match &err {
        AuthError::TokenCreation | AuthError::MissingJwtService | AuthError::RedisOperation(_) => {
            tracing::error!(error = %err, "Auth request failed");
        }
        _ => tracing::debug!(error = %err, "Auth request rejected"),
    }
    err.error_response()
}
