use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// A stored asset whose record is already gone but whose bytes still need
/// removing. Cleared once the storage delete succeeds.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PendingDeletion {
    pub id: Uuid,
    pub storage_path: String,
    pub reason: String,
    pub attempts: i32,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
}

pub const REASON_IMAGE_DELETED: &str = "image_deleted";
pub const REASON_UPLOAD_ABORTED: &str = "upload_aborted";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepReport {
    pub attempted: usize,
    pub removed: usize,
    pub failed: usize,
}
