use actix_web::{web, HttpResponse, Responder};
use tracing::instrument;
use validator::Validate;

use crate::{
    constants::DEFAULT_SAMPLE_SIZE,
    entities::image::{parse_category_field, ImageListResponse, ImageQuery, ImageQueryParams, SampleQueryParams},
    errors::AppError,
    utils::valid_uuid::valid_uuid,
    AppState,
};

#[instrument(skip(state, params))]
pub async fn list_images(
    state: web::Data<AppState>,
    params: web::Query<ImageQueryParams>,
) -> Result<impl Responder, AppError> {
    let query = ImageQuery::try_from(params.into_inner())?;

    let images = state.catalog.images_for(&query).await;

    Ok(HttpResponse::Ok().json(ImageListResponse::new(&query, images)))
}

#[instrument(skip(state, params))]
pub async fn sample_images(
    state: web::Data<AppState>,
    params: web::Query<SampleQueryParams>,
) -> Result<impl Responder, AppError> {
    let params = params.into_inner();
    params.validate()?;

    let category = parse_category_field(&params.category)?;
    let query = ImageQuery::new(category, params.subcategory.as_deref());
    let count = params.count.unwrap_or(DEFAULT_SAMPLE_SIZE) as usize;

    let images = state.catalog.random_images(&query, count).await;

    Ok(HttpResponse::Ok().json(ImageListResponse::new(&query, images)))
}

#[instrument(skip(state))]
pub async fn get_image(
    image_id: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let id = valid_uuid(&image_id)?;

    let image = state.catalog.image_by_id(&id).await?;

    Ok(HttpResponse::Ok().json(image))
}
