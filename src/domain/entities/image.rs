use std::{borrow::Cow, fmt, str::FromStr};

use actix_multipart::form::{tempfile::TempFile, text::Text, MultipartForm};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::entities::option_fields::PatchField;

// ───── Constants ──────────────────────────────────────────────────────
pub const MAX_SUBCATEGORY_LENGTH: u64 = 64;
pub const MAX_SAMPLE_SIZE: u32 = 50;

// ───── Category ──────────────────────────────────────────────────────

/// Top-level site section an image belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Featured,
    Gallery,
    Store,
    Collaborations,
    About,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Featured,
        Category::Gallery,
        Category::Store,
        Category::Collaborations,
        Category::About,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Featured => "featured",
            Category::Gallery => "gallery",
            Category::Store => "store",
            Category::Collaborations => "collaborations",
            Category::About => "about",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| new_validation_error("unknown_category", "Unknown category"))
    }
}

// ───── Database Models ───────────────────────────────────────────────

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ImageRow {
    pub id: Uuid,
    pub url: String,
    pub storage_path: String,
    pub filename: String,
    pub original_name: String,
    pub category: String,
    pub subcategory: Option<String>,
    pub custom_name: Option<String>,
    pub price: Option<String>,
    pub description: Option<String>,
    pub sort_order: Option<i64>,
    pub uploaded_at: Option<DateTime<Utc>>,
    pub size_bytes: i64,
    pub content_type: String,
}

/// A single image metadata record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRecord {
    pub id: Uuid,
    pub url: String,
    #[serde(skip_serializing, default)]
    pub storage_path: String,
    pub filename: String,
    pub original_name: String,
    pub category: Category,
    pub subcategory: Option<String>,
    pub custom_name: Option<String>,
    pub price: Option<String>,
    pub description: Option<String>,
    pub sort_order: Option<i64>,
    pub uploaded_at: Option<DateTime<Utc>>,
    pub size: i64,
    #[serde(rename = "type")]
    pub content_type: String,
}

impl ImageRecord {
    /// Name shown to visitors: the custom name, else the original file stem.
    pub fn display_name(&self) -> &str {
        match self.custom_name.as_deref() {
            Some(name) => name,
            None => self
                .original_name
                .rsplit_once('.')
                .map(|(stem, _)| stem)
                .filter(|stem| !stem.is_empty())
                .unwrap_or(&self.original_name),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ImageInsert {
    pub url: String,
    pub storage_path: String,
    pub filename: String,
    pub original_name: String,
    pub category: Category,
    pub subcategory: Option<String>,
    pub custom_name: Option<String>,
    pub price: Option<String>,
    pub description: Option<String>,
    pub sort_order: Option<i64>,
    pub uploaded_at: DateTime<Utc>,
    pub size: i64,
    pub content_type: String,
}

impl ImageInsert {
    pub fn into_record(self, id: Uuid) -> ImageRecord {
        ImageRecord {
            id,
            url: self.url,
            storage_path: self.storage_path,
            filename: self.filename,
            original_name: self.original_name,
            category: self.category,
            subcategory: self.subcategory,
            custom_name: self.custom_name,
            price: self.price,
            description: self.description,
            sort_order: self.sort_order,
            uploaded_at: Some(self.uploaded_at),
            size: self.size,
            content_type: self.content_type,
        }
    }
}

/// Editable metadata after the three-way patch has been resolved.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataChanges {
    pub custom_name: PatchField<String>,
    pub price: PatchField<String>,
    pub description: PatchField<String>,
}

impl MetadataChanges {
    pub fn is_empty(&self) -> bool {
        self.custom_name.is_unchanged() && self.price.is_unchanged() && self.description.is_unchanged()
    }

    pub fn apply_to(&self, record: &mut ImageRecord) {
        self.custom_name.apply_to(&mut record.custom_name);
        self.price.apply_to(&mut record.price);
        self.description.apply_to(&mut record.description);
    }
}

// ───── Input & Validation Requests ──────────────────────────────────

/// Category filter shared by every listing endpoint.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ImageQueryParams {
    #[validate(custom(function = "validate_category"))]
    pub category: String,

    #[validate(length(max = MAX_SUBCATEGORY_LENGTH))]
    pub subcategory: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SampleQueryParams {
    #[validate(custom(function = "validate_category"))]
    pub category: String,

    #[validate(length(max = MAX_SUBCATEGORY_LENGTH))]
    pub subcategory: Option<String>,

    #[validate(range(min = 1, max = MAX_SAMPLE_SIZE))]
    pub count: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct OrphanQueryParams {
    #[validate(custom(function = "validate_category"))]
    pub category: Option<String>,
}

/// A resolved category/subcategory pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageQuery {
    pub category: Category,
    pub subcategory: Option<String>,
}

impl ImageQuery {
    pub fn new(category: Category, subcategory: Option<&str>) -> Self {
        ImageQuery {
            category,
            subcategory: normalize_subcategory(subcategory),
        }
    }
}

impl TryFrom<ImageQueryParams> for ImageQuery {
    type Error = validator::ValidationErrors;

    fn try_from(params: ImageQueryParams) -> Result<Self, Self::Error> {
        params.validate()?;
        let category = parse_category_field(&params.category)?;
        Ok(ImageQuery::new(category, params.subcategory.as_deref()))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UpdateImageRequest {
    #[serde(deserialize_with = "crate::entities::option_fields::deserialize_patch")]
    pub custom_name: PatchField<String>,

    #[serde(deserialize_with = "crate::entities::option_fields::deserialize_patch")]
    pub price: PatchField<String>,

    #[serde(deserialize_with = "crate::entities::option_fields::deserialize_patch")]
    pub description: PatchField<String>,
}

impl From<UpdateImageRequest> for MetadataChanges {
    fn from(request: UpdateImageRequest) -> Self {
        MetadataChanges {
            custom_name: request.custom_name.normalized(),
            price: request.price.normalized(),
            description: request.description.normalized(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveDirection {
    Up,
    Down,
}

/// `subcategory` is the filter of the list the admin is looking at; without
/// it the move happens within the whole category.
#[derive(Debug, Deserialize, Validate)]
pub struct MoveImageRequest {
    pub direction: MoveDirection,

    #[validate(length(max = MAX_SUBCATEGORY_LENGTH))]
    pub subcategory: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DeleteImageParams {
    #[serde(default)]
    pub confirm: bool,
}

#[derive(Debug, MultipartForm)]
pub struct ImageUploadForm {
    #[multipart(limit = "25MB")]
    pub file: TempFile,

    pub category: Text<String>,

    pub subcategory: Option<Text<String>>,

    #[multipart(rename = "customName")]
    pub custom_name: Option<Text<String>>,

    pub price: Option<Text<String>>,

    pub description: Option<Text<String>>,
}

/// Raw upload as received from the admin form.
#[derive(Debug)]
pub struct NewImageUpload {
    pub bytes: Vec<u8>,
    pub original_name: String,
    pub category: String,
    pub subcategory: Option<String>,
    pub custom_name: Option<String>,
    pub price: Option<String>,
    pub description: Option<String>,
}

// ───── API Response Models ──────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageListResponse {
    pub category: Category,
    pub subcategory: Option<String>,
    pub count: usize,
    pub images: Vec<ImageRecord>,
}

impl ImageListResponse {
    pub fn new(query: &ImageQuery, images: Vec<ImageRecord>) -> Self {
        ImageListResponse {
            category: query.category,
            subcategory: query.subcategory.clone(),
            count: images.len(),
            images,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrphanReason {
    MissingSubcategory,
    ProfileNamed,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrphanedImage {
    pub reason: OrphanReason,
    #[serde(flatten)]
    pub image: ImageRecord,
}

// ───── Validation Helpers ───────────────────────────────────────────

pub fn validate_category(value: &str) -> Result<(), ValidationError> {
    Category::from_str(value).map(|_| ())
}

pub fn parse_category_field(value: &str) -> Result<Category, validator::ValidationErrors> {
    Category::from_str(value).map_err(|err| {
        let mut errors = validator::ValidationErrors::new();
        errors.add("category", err);
        errors
    })
}

/// Trims a subcategory tag; blank means "no subcategory".
pub fn normalize_subcategory(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn new_validation_error(code: &'static str, msg: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(msg));
    err
}

// ───── Conversions ──────────────────────────────────────────────────

impl TryFrom<ImageRow> for ImageRecord {
    type Error = crate::errors::AppError;

    fn try_from(row: ImageRow) -> Result<Self, Self::Error> {
        let category = Category::from_str(&row.category).map_err(|_| {
            crate::errors::AppError::InternalError(format!(
                "Image {} has unknown category '{}'",
                row.id, row.category
            ))
        })?;

        Ok(ImageRecord {
            id: row.id,
            url: row.url,
            storage_path: row.storage_path,
            filename: row.filename,
            original_name: row.original_name,
            category,
            subcategory: row.subcategory,
            custom_name: row.custom_name,
            price: row.price,
            description: row.description,
            sort_order: row.sort_order,
            uploaded_at: row.uploaded_at,
            size: row.size_bytes,
            content_type: row.content_type,
        })
    }
}
