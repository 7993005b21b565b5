use async_trait::async_trait;
use sqlx::types::Json;

use crate::{
    entities::settings::{SettingKey, SettingRow, StoredSetting},
    errors::AppError,
    repositories::sqlx_repo::SqlxRepo,
};

#[async_trait]
pub trait SettingsRepository: Send + Sync {
    async fn get_setting(&self, key: SettingKey) -> Result<Option<StoredSetting>, AppError>;
    async fn put_setting(&self, key: SettingKey, value: &serde_json::Value) -> Result<StoredSetting, AppError>;
    /// Returns whether a document was removed.
    async fn delete_setting(&self, key: SettingKey) -> Result<bool, AppError>;
}

fn into_stored(row: SettingRow) -> Result<StoredSetting, AppError> {
    let id = row.id.clone();
    Option::<StoredSetting>::from(row)
        .ok_or_else(|| AppError::InternalError(format!("Unknown settings document '{id}'")))
}

#[async_trait]
impl SettingsRepository for SqlxRepo {
    async fn get_setting(&self, key: SettingKey) -> Result<Option<StoredSetting>, AppError> {
        let row = sqlx::query_as::<_, SettingRow>("SELECT id, value, updated_at FROM site_settings WHERE id = $1")
            .bind(key.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.map(into_stored).transpose()
    }

    async fn put_setting(&self, key: SettingKey, value: &serde_json::Value) -> Result<StoredSetting, AppError> {
        let row = sqlx::query_as::<_, SettingRow>(
            r#"
            INSERT INTO site_settings (id, value, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (id) DO UPDATE SET value = EXCLUDED.value, updated_at = EXCLUDED.updated_at
            RETURNING id, value, updated_at
            "#,
        )
        .bind(key.as_str())
        .bind(Json(value))
        .fetch_one(&self.pool)
        .await?;

        into_stored(row)
    }

    async fn delete_setting(&self, key: SettingKey) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM site_settings WHERE id = $1")
            .bind(key.as_str())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
