use actix_web::{http::header, web, HttpResponse, Responder};
use tracing::instrument;

use crate::{constants::ASSET_CACHE_CONTROL, errors::AppError, AppState};

/// Serves stored image bytes under the public asset base URL.
#[instrument(skip(state))]
pub async fn serve_asset(path: web::Path<String>, state: web::Data<AppState>) -> Result<impl Responder, AppError> {
    let bytes = state.storage.get(&path).await?;
    let content_type = infer::get(&bytes)
        .map(|kind| kind.mime_type())
        .unwrap_or("application/octet-stream");

    Ok(HttpResponse::Ok()
        .insert_header((header::CONTENT_TYPE, content_type))
        .insert_header((header::CACHE_CONTROL, ASSET_CACHE_CONTROL))
        .body(bytes))
}
