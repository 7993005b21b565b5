use actix_web::{web, HttpResponse, Responder};
use tracing::instrument;

use crate::{errors::AppError, use_cases::extractors::AdminClaims, AppState};

#[instrument(skip(state))]
pub async fn get_setting(key: web::Path<String>, state: web::Data<AppState>) -> Result<impl Responder, AppError> {
    let setting = state.site_settings.get(&key).await?;
    Ok(HttpResponse::Ok().json(setting))
}

#[instrument(skip(_claims, state, body))]
pub async fn put_setting(
    _claims: AdminClaims,
    key: web::Path<String>,
    state: web::Data<AppState>,
    body: web::Json<serde_json::Value>,
) -> Result<impl Responder, AppError> {
    let setting = state.site_settings.put(&key, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(setting))
}

#[instrument(skip(_claims, state))]
pub async fn clear_setting(
    _claims: AdminClaims,
    key: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    state.site_settings.clear(&key).await?;
    Ok(HttpResponse::NoContent().finish())
}
