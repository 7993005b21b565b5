use actix_multipart::{form::MultipartFormConfig, MultipartError};
use actix_web::{
    error::{JsonPayloadError, QueryPayloadError},
    http::StatusCode,
    web, HttpResponse, ResponseError,
};
use serde_json::json;

const MULTIPART_TOTAL_LIMIT: usize = 30 * 1024 * 1024;

/// Makes extractor failures answer with the same `{ "error": ... }` body as
/// handler errors.
pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| JsonError::from(err).into()))
        .app_data(web::QueryConfig::default().error_handler(|err, _req| JsonError::from(err).into()))
        .app_data(
            MultipartFormConfig::default()
                .total_limit(MULTIPART_TOTAL_LIMIT)
                .error_handler(|err, _req| JsonError::from(err).into()),
        );
}

#[derive(Debug)]
pub struct JsonError {
    message: String,
    status: StatusCode,
}

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl ResponseError for JsonError {
    fn status_code(&self) -> StatusCode {
        self.status
    }

    fn error_response(&self) -> HttpResponse<actix_web::body::BoxBody> {
        HttpResponse::build(self.status).json(json!({ "error": self.message }))
    }
}

impl From<JsonPayloadError> for JsonError {
    fn from(err: JsonPayloadError) -> Self {
        let status = match err {
            JsonPayloadError::OverflowKnownLength { .. } | JsonPayloadError::Overflow { .. } => {
                StatusCode::PAYLOAD_TOO_LARGE
            }
            JsonPayloadError::ContentType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            _ => StatusCode::BAD_REQUEST,
        };
        JsonError {
            message: format!("JSON payload error: {}", err),
            status,
        }
    }
}

impl From<QueryPayloadError> for JsonError {
    fn from(err: QueryPayloadError) -> Self {
        JsonError {
            message: format!("Query error: {}", err),
            status: StatusCode::BAD_REQUEST,
        }
    }
}

impl From<MultipartError> for JsonError {
    fn from(err: MultipartError) -> Self {
        JsonError {
            status: err.status_code(),
            message: format!("Upload error: {}", err),
        }
    }
}
