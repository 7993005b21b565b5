use std::sync::Arc;

use chrono::Utc;
use futures::{stream, StreamExt};
use infer::MatcherType;
use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;

use crate::{
    entities::{
        image::{
            normalize_subcategory, parse_category_field, Category, ImageInsert, ImageQuery, ImageRecord,
            MetadataChanges, MoveDirection, NewImageUpload, OrphanReason, OrphanedImage, UpdateImageRequest,
            MAX_SUBCATEGORY_LENGTH,
        },
        pending_deletion::{PendingDeletion, SweepReport, REASON_UPLOAD_ABORTED},
    },
    errors::AppError,
    ordering::{matches_query, plan_swap, sort_for_display},
    repositories::{image::ImageRepository, pending_deletion::PendingDeletionRepository},
    storage::AssetStorage,
};

const MAX_FILE_NAME_LENGTH: usize = 100;
const PENDING_LIST_LIMIT: i64 = 100;
const SWEEP_CONCURRENCY: usize = 4;

static UNSAFE_NAME_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9._-]+").expect("file name pattern is valid"));

/// Keeps letters, digits, `.`, `_` and `-`; everything else becomes `_`.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned = UNSAFE_NAME_CHARS.replace_all(base.trim(), "_");
    let cleaned = cleaned.trim_start_matches(['.', '_']);
    cleaned.chars().take(MAX_FILE_NAME_LENGTH).collect()
}

fn trimmed(value: Option<String>) -> Option<String> {
    normalize_subcategory(value.as_deref())
}

/// `category[/subcategory]/{millis}_{name}`
pub fn storage_path_for(category: Category, subcategory: Option<&str>, millis: i64, file_name: &str) -> String {
    match subcategory.map(sanitize_file_name).filter(|segment| !segment.is_empty()) {
        Some(segment) => format!("{category}/{segment}/{millis}_{file_name}"),
        None => format!("{category}/{millis}_{file_name}"),
    }
}

/// Admin-only mutations over images and their stored assets.
pub struct AdminImageHandler {
    pub image_repo: Arc<dyn ImageRepository>,
    pub pending_repo: Arc<dyn PendingDeletionRepository>,
    pub storage: Arc<dyn AssetStorage>,
    pub max_upload_bytes: usize,
}

impl AdminImageHandler {
    pub fn new(
        image_repo: Arc<dyn ImageRepository>,
        pending_repo: Arc<dyn PendingDeletionRepository>,
        storage: Arc<dyn AssetStorage>,
        max_upload_bytes: usize,
    ) -> Self {
        AdminImageHandler {
            image_repo,
            pending_repo,
            storage,
            max_upload_bytes,
        }
    }

    /// Stores the asset, then writes its record. A failed record write queues
    /// the fresh asset for removal before the error is returned.
    pub async fn upload(&self, upload: NewImageUpload) -> Result<ImageRecord, AppError> {
        let category = parse_category_field(&upload.category)?;
        let subcategory = normalize_subcategory(upload.subcategory.as_deref());
        if subcategory.as_ref().is_some_and(|s| s.chars().count() as u64 > MAX_SUBCATEGORY_LENGTH) {
            return Err(AppError::field("subcategory", "Subcategory is too long"));
        }

        if upload.bytes.is_empty() {
            return Err(AppError::field("file", "File is empty"));
        }
        if upload.bytes.len() > self.max_upload_bytes {
            return Err(AppError::PayloadTooLarge(format!(
                "File exceeds the {} byte upload limit",
                self.max_upload_bytes
            )));
        }

        let kind = infer::get(&upload.bytes)
            .filter(|kind| kind.matcher_type() == MatcherType::Image)
            .ok_or_else(|| AppError::UnsupportedMediaType("Only image files can be uploaded".into()))?;

        let mut file_name = sanitize_file_name(&upload.original_name);
        if file_name.is_empty() {
            file_name = format!("image.{}", kind.extension());
        }

        let now = Utc::now();
        let millis = now.timestamp_millis();
        let filename = format!("{millis}_{file_name}");
        let storage_path = storage_path_for(category, subcategory.as_deref(), millis, &file_name);

        let url = self.storage.put(&storage_path, &upload.bytes, kind.mime_type()).await?;

        let insert = ImageInsert {
            url,
            storage_path: storage_path.clone(),
            filename,
            original_name: upload.original_name,
            category,
            subcategory,
            custom_name: trimmed(upload.custom_name),
            price: trimmed(upload.price),
            description: trimmed(upload.description),
            sort_order: Some(millis),
            uploaded_at: now,
            size: upload.bytes.len() as i64,
            content_type: kind.mime_type().to_string(),
        };

        match self.image_repo.insert_image(&insert).await {
            Ok(record) => {
                tracing::info!(id = %record.id, path = %storage_path, "Image uploaded");
                Ok(record)
            }
            Err(e) => {
                tracing::error!(path = %storage_path, error = %e, "Record write failed after asset write");
                self.discard_asset(&storage_path).await;
                Err(e)
            }
        }
    }

    async fn discard_asset(&self, storage_path: &str) {
        if let Err(queue_err) = self.pending_repo.queue_deletion(storage_path, REASON_UPLOAD_ABORTED).await {
            tracing::warn!(path = storage_path, error = %queue_err, "Could not queue asset cleanup, deleting now");
            if let Err(delete_err) = self.storage.delete(storage_path).await {
                tracing::error!(path = storage_path, error = %delete_err, "Stray asset left in storage");
            }
        }
    }

    pub async fn update(&self, id: &Uuid, request: UpdateImageRequest) -> Result<ImageRecord, AppError> {
        let changes = MetadataChanges::from(request);
        if changes.is_empty() {
            return self.image_repo.get_image(id).await;
        }

        let record = self.image_repo.update_metadata(id, &changes).await?;
        tracing::info!(%id, "Image metadata updated");
        Ok(record)
    }

    /// Removes the record together with a deletion intent, then the asset.
    /// Returns whether the asset is already gone.
    pub async fn delete(&self, id: &Uuid, confirmed: bool) -> Result<bool, AppError> {
        if !confirmed {
            return Err(AppError::InvalidInput(
                "Deleting an image must be confirmed with ?confirm=true".into(),
            ));
        }

        let intent = self.image_repo.delete_image_with_intent(id).await?;
        tracing::info!(%id, path = %intent.storage_path, "Image record deleted");

        Ok(self.remove_asset(&intent).await)
    }

    async fn remove_asset(&self, intent: &PendingDeletion) -> bool {
        match self.storage.delete(&intent.storage_path).await {
            Ok(()) => {
                if let Err(e) = self.pending_repo.clear_pending(&intent.id).await {
                    tracing::warn!(intent = %intent.id, error = %e, "Asset removed but intent not cleared");
                }
                true
            }
            Err(e) => {
                tracing::warn!(path = %intent.storage_path, error = %e, "Asset delete failed, left for sweep");
                if let Err(record_err) = self.pending_repo.record_failure(&intent.id, &e.to_string()).await {
                    tracing::warn!(intent = %intent.id, error = %record_err, "Could not record sweep failure");
                }
                false
            }
        }
    }

    /// Swaps the record with its neighbour in the displayed list and returns
    /// the list in its new order. The list is the record's category, narrowed
    /// by `subcategory` when the admin view is filtered. Edge positions leave
    /// it untouched.
    pub async fn move_image(
        &self,
        id: &Uuid,
        direction: MoveDirection,
        subcategory: Option<&str>,
    ) -> Result<Vec<ImageRecord>, AppError> {
        let record = self.image_repo.get_image(id).await?;
        let query = ImageQuery::new(record.category, subcategory);
        if !matches_query(&record, &query) {
            return Err(AppError::InvalidInput(
                "Image is not part of the displayed subcategory".into(),
            ));
        }

        let mut siblings = self.image_repo.list_images(&query).await?;
        sort_for_display(&mut siblings);

        let Some(plan) = plan_swap(&siblings, *id, direction) else {
            return Ok(siblings);
        };

        self.image_repo.swap_sort_orders(&plan).await?;

        for image in siblings.iter_mut() {
            if image.id == plan.target {
                image.sort_order = Some(plan.target_order);
            } else if image.id == plan.neighbour {
                image.sort_order = Some(plan.neighbour_order);
            }
        }
        sort_for_display(&mut siblings);

        tracing::info!(%id, ?direction, "Image moved");
        Ok(siblings)
    }

    /// Featured by default: records missing a subcategory, or named like a
    /// profile picture.
    pub async fn orphans(&self, category: Option<Category>) -> Result<Vec<OrphanedImage>, AppError> {
        let mut records = self
            .image_repo
            .list_orphans(category.unwrap_or(Category::Featured))
            .await?;
        sort_for_display(&mut records);

        Ok(records
            .into_iter()
            .map(|image| {
                let reason = match image.subcategory.as_deref().map(str::trim) {
                    None | Some("") => OrphanReason::MissingSubcategory,
                    Some(_) => OrphanReason::ProfileNamed,
                };
                OrphanedImage { reason, image }
            })
            .collect())
    }

    pub async fn pending_deletions(&self) -> Result<Vec<PendingDeletion>, AppError> {
        self.pending_repo.list_pending(PENDING_LIST_LIMIT).await
    }

    /// One pass over queued asset deletions.
    pub async fn sweep_pending(&self, batch: i64) -> Result<SweepReport, AppError> {
        let pending = self.pending_repo.list_pending(batch).await?;
        if pending.is_empty() {
            return Ok(SweepReport::default());
        }

        let outcomes: Vec<bool> = stream::iter(pending)
            .map(|intent| async move { self.remove_asset(&intent).await })
            .buffer_unordered(SWEEP_CONCURRENCY)
            .collect()
            .await;

        let removed = outcomes.iter().filter(|removed| **removed).count();
        Ok(SweepReport {
            attempted: outcomes.len(),
            removed,
            failed: outcomes.len() - removed,
        })
    }
}
