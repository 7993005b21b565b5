use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    entities::{
        image::{Category, ImageInsert, ImageQuery, ImageRecord, ImageRow, MetadataChanges},
        pending_deletion::{PendingDeletion, REASON_IMAGE_DELETED},
    },
    errors::AppError,
    ordering::SwapPlan,
    repositories::sqlx_repo::SqlxRepo,
};

const IMAGE_COLUMNS: &str = "id, url, storage_path, filename, original_name, category, subcategory, \
    custom_name, price, description, sort_order, uploaded_at, size_bytes, content_type";

#[async_trait]
pub trait ImageRepository: Send + Sync {
    async fn check_connection(&self) -> Result<(), AppError>;
    async fn insert_image(&self, image: &ImageInsert) -> Result<ImageRecord, AppError>;
    async fn get_image(&self, id: &Uuid) -> Result<ImageRecord, AppError>;
    /// Equality filter on category and, when given, subcategory. Unsorted.
    async fn list_images(&self, query: &ImageQuery) -> Result<Vec<ImageRecord>, AppError>;
    async fn update_metadata(&self, id: &Uuid, changes: &MetadataChanges) -> Result<ImageRecord, AppError>;
    /// Applies both writes of a move or neither.
    async fn swap_sort_orders(&self, plan: &SwapPlan) -> Result<(), AppError>;
    /// Removes the record and queues its asset for deletion in one step.
    async fn delete_image_with_intent(&self, id: &Uuid) -> Result<PendingDeletion, AppError>;
    /// Records in `category` lacking a subcategory or named like a profile picture.
    async fn list_orphans(&self, category: Category) -> Result<Vec<ImageRecord>, AppError>;
}

fn into_records(rows: Vec<ImageRow>) -> Result<Vec<ImageRecord>, AppError> {
    rows.into_iter().map(ImageRecord::try_from).collect()
}

#[async_trait]
impl ImageRepository for SqlxRepo {
    async fn check_connection(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(AppError::from)
    }

    async fn insert_image(&self, image: &ImageInsert) -> Result<ImageRecord, AppError> {
        let sql = format!(
            r#"
            INSERT INTO images (
                url, storage_path, filename, original_name, category, subcategory,
                custom_name, price, description, sort_order, uploaded_at, size_bytes, content_type
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING {IMAGE_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, ImageRow>(&sql)
            .bind(&image.url)
            .bind(&image.storage_path)
            .bind(&image.filename)
            .bind(&image.original_name)
            .bind(image.category.as_str())
            .bind(&image.subcategory)
            .bind(&image.custom_name)
            .bind(&image.price)
            .bind(&image.description)
            .bind(image.sort_order)
            .bind(image.uploaded_at)
            .bind(image.size)
            .bind(&image.content_type)
            .fetch_one(&self.pool)
            .await?;

        ImageRecord::try_from(row)
    }

    async fn get_image(&self, id: &Uuid) -> Result<ImageRecord, AppError> {
        let sql = format!("SELECT {IMAGE_COLUMNS} FROM images WHERE id = $1");

        let row = sqlx::query_as::<_, ImageRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Image {id} not found")))?;

        ImageRecord::try_from(row)
    }

    async fn list_images(&self, query: &ImageQuery) -> Result<Vec<ImageRecord>, AppError> {
        let sql = format!(
            r#"
            SELECT {IMAGE_COLUMNS} FROM images
            WHERE category = $1
              AND ($2::TEXT IS NULL OR subcategory = $2)
            "#
        );

        let rows = sqlx::query_as::<_, ImageRow>(&sql)
            .bind(query.category.as_str())
            .bind(query.subcategory.as_deref())
            .fetch_all(&self.pool)
            .await?;

        into_records(rows)
    }

    async fn update_metadata(&self, id: &Uuid, changes: &MetadataChanges) -> Result<ImageRecord, AppError> {
        // Each field is (touched, new value); untouched columns keep their value.
        let sql = format!(
            r#"
            UPDATE images SET
                custom_name = CASE WHEN $2 THEN $3 ELSE custom_name END,
                price = CASE WHEN $4 THEN $5 ELSE price END,
                description = CASE WHEN $6 THEN $7 ELSE description END
            WHERE id = $1
            RETURNING {IMAGE_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, ImageRow>(&sql)
            .bind(id)
            .bind(!changes.custom_name.is_unchanged())
            .bind(changes.custom_name.value_ref())
            .bind(!changes.price.is_unchanged())
            .bind(changes.price.value_ref())
            .bind(!changes.description.is_unchanged())
            .bind(changes.description.value_ref())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Image {id} not found")))?;

        ImageRecord::try_from(row)
    }

    async fn swap_sort_orders(&self, plan: &SwapPlan) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        for (id, order) in [(plan.target, plan.target_order), (plan.neighbour, plan.neighbour_order)] {
            let result = sqlx::query("UPDATE images SET sort_order = $1 WHERE id = $2")
                .bind(order)
                .bind(id)
                .execute(&mut *tx)
                .await?;

            if result.rows_affected() == 0 {
                return Err(AppError::NotFound(format!("Image {id} not found")));
            }
        }

        tx.commit().await?;
        Ok(())
    }

    async fn delete_image_with_intent(&self, id: &Uuid) -> Result<PendingDeletion, AppError> {
        let mut tx = self.pool.begin().await?;

        let storage_path: String = sqlx::query_scalar("DELETE FROM images WHERE id = $1 RETURNING storage_path")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Image {id} not found")))?;

        let intent = sqlx::query_as::<_, PendingDeletion>(
            r#"
            INSERT INTO pending_asset_deletions (storage_path, reason)
            VALUES ($1, $2)
            RETURNING id, storage_path, reason, attempts, last_error, created_at
            "#,
        )
        .bind(&storage_path)
        .bind(REASON_IMAGE_DELETED)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(intent)
    }

    async fn list_orphans(&self, category: Category) -> Result<Vec<ImageRecord>, AppError> {
        let sql = format!(
            r#"
            SELECT {IMAGE_COLUMNS} FROM images
            WHERE category = $1
              AND (
                subcategory IS NULL
                OR btrim(subcategory) = ''
                OR lower(filename) LIKE '%profile%'
                OR lower(original_name) LIKE '%profile%'
              )
            "#
        );

        let rows = sqlx::query_as::<_, ImageRow>(&sql)
            .bind(category.as_str())
            .fetch_all(&self.pool)
            .await?;

        into_records(rows)
    }
}
