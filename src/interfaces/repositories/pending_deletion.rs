use async_trait::async_trait;
use uuid::Uuid;

use crate::{entities::pending_deletion::PendingDeletion, errors::AppError, repositories::sqlx_repo::SqlxRepo};

#[async_trait]
pub trait PendingDeletionRepository: Send + Sync {
    async fn queue_deletion(&self, storage_path: &str, reason: &str) -> Result<PendingDeletion, AppError>;
    /// Oldest first.
    async fn list_pending(&self, limit: i64) -> Result<Vec<PendingDeletion>, AppError>;
    async fn clear_pending(&self, id: &Uuid) -> Result<(), AppError>;
    async fn record_failure(&self, id: &Uuid, error: &str) -> Result<(), AppError>;
}

#[async_trait]
impl PendingDeletionRepository for SqlxRepo {
    async fn queue_deletion(&self, storage_path: &str, reason: &str) -> Result<PendingDeletion, AppError> {
        let intent = sqlx::query_as::<_, PendingDeletion>(
            r#"
            INSERT INTO pending_asset_deletions (storage_path, reason)
            VALUES ($1, $2)
            RETURNING id, storage_path, reason, attempts, last_error, created_at
            "#,
        )
        .bind(storage_path)
        .bind(reason)
        .fetch_one(&self.pool)
        .await?;

        Ok(intent)
    }

    async fn list_pending(&self, limit: i64) -> Result<Vec<PendingDeletion>, AppError> {
        let rows = sqlx::query_as::<_, PendingDeletion>(
            r#"
            SELECT id, storage_path, reason, attempts, last_error, created_at
            FROM pending_asset_deletions
            ORDER BY created_at ASC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn clear_pending(&self, id: &Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM pending_asset_deletions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn record_failure(&self, id: &Uuid, error: &str) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE pending_asset_deletions
            SET attempts = attempts + 1, last_error = $2
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(error)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
