use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::{
    entities::{
        image::{Category, ImageInsert, ImageQuery, ImageRecord, MetadataChanges},
        pending_deletion::{PendingDeletion, REASON_IMAGE_DELETED},
        settings::{SettingKey, StoredSetting},
    },
    errors::AppError,
    ordering::{matches_query, SwapPlan},
    repositories::{
        image::ImageRepository, pending_deletion::PendingDeletionRepository, settings::SettingsRepository,
    },
};

#[derive(Default)]
struct MemoryState {
    images: HashMap<Uuid, ImageRecord>,
    pending: Vec<PendingDeletion>,
    settings: HashMap<SettingKey, StoredSetting>,
}

/// Process-local record store used when no database is configured.
///
/// One lock guards all three collections, so multi-record writes are atomic
/// just like their Postgres transactions.
#[derive(Clone, Default)]
pub struct MemoryRepo {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

fn not_found(id: &Uuid) -> AppError {
    AppError::NotFound(format!("Image {id} not found"))
}

fn new_intent(storage_path: &str, reason: &str) -> PendingDeletion {
    PendingDeletion {
        id: Uuid::new_v4(),
        storage_path: storage_path.to_string(),
        reason: reason.to_string(),
        attempts: 0,
        last_error: None,
        created_at: Utc::now(),
    }
}

fn contains_profile(value: &str) -> bool {
    value.to_lowercase().contains("profile")
}

#[async_trait]
impl ImageRepository for MemoryRepo {
    async fn check_connection(&self) -> Result<(), AppError> {
        Ok(())
    }

    async fn insert_image(&self, image: &ImageInsert) -> Result<ImageRecord, AppError> {
        let record = image.clone().into_record(Uuid::new_v4());
        self.state.write().images.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get_image(&self, id: &Uuid) -> Result<ImageRecord, AppError> {
        self.state.read().images.get(id).cloned().ok_or_else(|| not_found(id))
    }

    async fn list_images(&self, query: &ImageQuery) -> Result<Vec<ImageRecord>, AppError> {
        Ok(self
            .state
            .read()
            .images
            .values()
            .filter(|record| matches_query(record, query))
            .cloned()
            .collect())
    }

    async fn update_metadata(&self, id: &Uuid, changes: &MetadataChanges) -> Result<ImageRecord, AppError> {
        let mut state = self.state.write();
        let record = state.images.get_mut(id).ok_or_else(|| not_found(id))?;
        changes.apply_to(record);
        Ok(record.clone())
    }

    async fn swap_sort_orders(&self, plan: &SwapPlan) -> Result<(), AppError> {
        let mut state = self.state.write();
        for id in [&plan.target, &plan.neighbour] {
            if !state.images.contains_key(id) {
                return Err(not_found(id));
            }
        }

        if let Some(record) = state.images.get_mut(&plan.target) {
            record.sort_order = Some(plan.target_order);
        }
        if let Some(record) = state.images.get_mut(&plan.neighbour) {
            record.sort_order = Some(plan.neighbour_order);
        }
        Ok(())
    }

    async fn delete_image_with_intent(&self, id: &Uuid) -> Result<PendingDeletion, AppError> {
        let mut state = self.state.write();
        let record = state.images.remove(id).ok_or_else(|| not_found(id))?;
        let intent = new_intent(&record.storage_path, REASON_IMAGE_DELETED);
        state.pending.push(intent.clone());
        Ok(intent)
    }

    async fn list_orphans(&self, category: Category) -> Result<Vec<ImageRecord>, AppError> {
        Ok(self
            .state
            .read()
            .images
            .values()
            .filter(|record| record.category == category)
            .filter(|record| {
                record.subcategory.as_deref().is_none_or(|s| s.trim().is_empty())
                    || contains_profile(&record.filename)
                    || contains_profile(&record.original_name)
            })
            .cloned()
            .collect())
    }
}

#[async_trait]
impl PendingDeletionRepository for MemoryRepo {
    async fn queue_deletion(&self, storage_path: &str, reason: &str) -> Result<PendingDeletion, AppError> {
        let intent = new_intent(storage_path, reason);
        self.state.write().pending.push(intent.clone());
        Ok(intent)
    }

    async fn list_pending(&self, limit: i64) -> Result<Vec<PendingDeletion>, AppError> {
        let limit = usize::try_from(limit).unwrap_or(0);
        let mut pending = self.state.read().pending.clone();
        pending.sort_by_key(|intent| intent.created_at);
        pending.truncate(limit);
        Ok(pending)
    }

    async fn clear_pending(&self, id: &Uuid) -> Result<(), AppError> {
        self.state.write().pending.retain(|intent| intent.id != *id);
        Ok(())
    }

    async fn record_failure(&self, id: &Uuid, error: &str) -> Result<(), AppError> {
        let mut state = self.state.write();
        if let Some(intent) = state.pending.iter_mut().find(|intent| intent.id == *id) {
            intent.attempts += 1;
            intent.last_error = Some(error.to_string());
        }
        Ok(())
    }
}

#[async_trait]
impl SettingsRepository for MemoryRepo {
    async fn get_setting(&self, key: SettingKey) -> Result<Option<StoredSetting>, AppError> {
        Ok(self.state.read().settings.get(&key).cloned())
    }

    async fn put_setting(&self, key: SettingKey, value: &serde_json::Value) -> Result<StoredSetting, AppError> {
        let stored = StoredSetting {
            key,
            value: value.clone(),
            updated_at: Utc::now(),
        };
        self.state.write().settings.insert(key, stored.clone());
        Ok(stored)
    }

    async fn delete_setting(&self, key: SettingKey) -> Result<bool, AppError> {
        Ok(self.state.write().settings.remove(&key).is_some())
    }
}
