use std::{str::FromStr, sync::Arc};

use serde::de::DeserializeOwned;
use validator::Validate;

use crate::{
    entities::settings::{BackgroundImage, FeaturedText, PurchaseLink, SettingKey, SettingResponse, StoredSetting},
    errors::AppError,
    repositories::settings::SettingsRepository,
};

pub fn parse_key(raw: &str) -> Result<SettingKey, AppError> {
    SettingKey::from_str(raw).map_err(|_| AppError::NotFound(format!("Unknown setting '{raw}'")))
}

fn decode<T: DeserializeOwned>(value: serde_json::Value) -> Result<T, AppError> {
    serde_json::from_value(value).map_err(|e| AppError::InvalidInput(format!("Invalid setting body: {e}")))
}

/// Singleton site documents: caption text, purchase link, background image.
pub struct SiteSettingsHandler {
    pub settings_repo: Arc<dyn SettingsRepository>,
}

impl SiteSettingsHandler {
    pub fn new(settings_repo: Arc<dyn SettingsRepository>) -> Self {
        SiteSettingsHandler { settings_repo }
    }

    /// Public read. Anything unreadable falls back to the default document.
    pub async fn get(&self, raw_key: &str) -> Result<SettingResponse, AppError> {
        let key = parse_key(raw_key)?;

        let stored = match self.settings_repo.get_setting(key).await {
            Ok(Some(stored)) => stored,
            Ok(None) => return Ok(SettingResponse::fallback(key)),
            Err(e) => {
                tracing::error!(%key, error = %e, "Failed to load setting");
                return Ok(SettingResponse::fallback(key));
            }
        };

        Ok(Self::render(stored).unwrap_or_else(|e| {
            tracing::warn!(%key, error = %e, "Stored setting is malformed");
            SettingResponse::fallback(key)
        }))
    }

    fn render(stored: StoredSetting) -> Result<SettingResponse, AppError> {
        let updated_at = Some(stored.updated_at);
        match stored.key {
            SettingKey::FeaturedText => {
                let text: FeaturedText = decode(stored.value)?;
                Ok(SettingResponse::featured_text(text, updated_at))
            }
            SettingKey::BannerPurchaseUrl => {
                let link: PurchaseLink = decode(stored.value)?;
                Ok(SettingResponse::link(stored.key, Some(link.url), updated_at))
            }
            SettingKey::BackgroundImage => {
                let image: BackgroundImage = decode(stored.value)?;
                Ok(SettingResponse::link(stored.key, Some(image.url), updated_at))
            }
        }
    }

    /// Validates the body against the key's document shape and stores it.
    pub async fn put(&self, raw_key: &str, body: serde_json::Value) -> Result<SettingResponse, AppError> {
        let key = parse_key(raw_key)?;

        let value = match key {
            SettingKey::FeaturedText => {
                let text = decode::<FeaturedText>(body)?.trimmed();
                text.validate()?;
                serde_json::to_value(text)
            }
            SettingKey::BannerPurchaseUrl => {
                let mut link: PurchaseLink = decode(body)?;
                link.url = link.url.trim().to_string();
                link.validate()?;
                serde_json::to_value(link)
            }
            SettingKey::BackgroundImage => {
                let mut image: BackgroundImage = decode(body)?;
                image.url = image.url.trim().to_string();
                image.validate()?;
                serde_json::to_value(image)
            }
        }
        .map_err(|e| AppError::InternalError(format!("Failed to encode setting: {e}")))?;

        let stored = self.settings_repo.put_setting(key, &value).await?;
        tracing::info!(%key, "Setting updated");
        Self::render(stored)
    }

    /// Idempotent; the public read returns the default afterwards.
    pub async fn clear(&self, raw_key: &str) -> Result<(), AppError> {
        let key = parse_key(raw_key)?;
        if self.settings_repo.delete_setting(key).await? {
            tracing::info!(%key, "Setting cleared");
        }
        Ok(())
    }
}
