use actix_cors::Cors;
use actix_web::http::{header, Method};

/// `*` (or an empty list) opens the API to any origin; otherwise only the
/// listed origins may call it.
pub fn cors_middleware(origins: &[String]) -> Cors {
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);
    }

    let allowed = origins.to_vec();
    Cors::default()
        .allowed_origin_fn(move |origin, _| {
            origin
                .to_str()
                .map(|origin| allowed.iter().any(|o| o == origin))
                .unwrap_or(false)
        })
        .allowed_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE])
        .allowed_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::RETRY_AFTER])
        .supports_credentials()
        .max_age(3600)
}
