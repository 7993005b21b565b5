use actix_multipart::form::MultipartForm;
use actix_web::{web, HttpResponse, Responder};
use tracing::instrument;
use validator::Validate;

use crate::{
    entities::image::{
        parse_category_field, DeleteImageParams, ImageUploadForm, MoveImageRequest, NewImageUpload,
        OrphanQueryParams, UpdateImageRequest,
    },
    errors::AppError,
    use_cases::extractors::AdminClaims,
    utils::valid_uuid::valid_uuid,
    AppState,
};

#[instrument(skip(claims, state, form))]
pub async fn upload_image(
    claims: AdminClaims,
    state: web::Data<AppState>,
    form: MultipartForm<ImageUploadForm>,
) -> Result<impl Responder, AppError> {
    let form = form.into_inner();
    tracing::debug!(admin = %claims.0.email, size = form.file.size, "Upload received");

    let bytes = tokio::fs::read(form.file.file.path()).await?;
    let original_name = form
        .file
        .file_name
        .clone()
        .unwrap_or_else(|| "image".to_string());

    let upload = NewImageUpload {
        bytes,
        original_name,
        category: form.category.into_inner(),
        subcategory: form.subcategory.map(|text| text.into_inner()),
        custom_name: form.custom_name.map(|text| text.into_inner()),
        price: form.price.map(|text| text.into_inner()),
        description: form.description.map(|text| text.into_inner()),
    };

    let record = state.admin_images.upload(upload).await?;

    Ok(HttpResponse::Created().json(record))
}

#[instrument(skip(_claims, state, data))]
pub async fn update_image(
    _claims: AdminClaims,
    image_id: web::Path<String>,
    state: web::Data<AppState>,
    data: web::Json<UpdateImageRequest>,
) -> Result<impl Responder, AppError> {
    let id = valid_uuid(&image_id)?;

    let record = state.admin_images.update(&id, data.into_inner()).await?;

    Ok(HttpResponse::Ok().json(record))
}

#[instrument(skip(_claims, state, params))]
pub async fn delete_image(
    _claims: AdminClaims,
    image_id: web::Path<String>,
    state: web::Data<AppState>,
    params: web::Query<DeleteImageParams>,
) -> Result<impl Responder, AppError> {
    let id = valid_uuid(&image_id)?;

    let asset_removed = state.admin_images.delete(&id, params.confirm).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Image deleted",
        "id": id,
        "assetRemoved": asset_removed,
    })))
}

#[instrument(skip(_claims, state, data))]
pub async fn move_image(
    _claims: AdminClaims,
    image_id: web::Path<String>,
    state: web::Data<AppState>,
    data: web::Json<MoveImageRequest>,
) -> Result<impl Responder, AppError> {
    let id = valid_uuid(&image_id)?;
    let request = data.into_inner();
    request.validate()?;

    let siblings = state
        .admin_images
        .move_image(&id, request.direction, request.subcategory.as_deref())
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "count": siblings.len(),
        "images": siblings,
    })))
}

#[instrument(skip(_claims, state, params))]
pub async fn list_orphans(
    _claims: AdminClaims,
    state: web::Data<AppState>,
    params: web::Query<OrphanQueryParams>,
) -> Result<impl Responder, AppError> {
    let params = params.into_inner();
    params.validate()?;
    let category = params
        .category
        .as_deref()
        .map(parse_category_field)
        .transpose()?;

    let orphans = state.admin_images.orphans(category).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "count": orphans.len(),
        "images": orphans,
    })))
}

#[instrument(skip(_claims, state))]
pub async fn list_pending_deletions(
    _claims: AdminClaims,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let pending = state.admin_images.pending_deletions().await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "count": pending.len(),
        "pending": pending,
    })))
}
