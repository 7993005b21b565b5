use std::{borrow::Cow, fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::utils::markdown::safe_markdown_to_html;

const MAX_TITLE_LENGTH: u64 = 120;
const MAX_CONTENT_LENGTH: u64 = 5_000;
const MAX_URL_LENGTH: u64 = 2_048;

pub const DEFAULT_FEATURED_TITLE: &str = "About This Piece";
pub const DEFAULT_FEATURED_CONTENT: &str = "\"Art is Alchemy\" represents the transformative power of artistic creation. \
This mixed media piece combines traditional techniques with modern experimentation, embodying the philosophy \
that art has the ability to transmute ordinary materials into something extraordinary.";

/// Well-known settings document ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SettingKey {
    FeaturedText,
    BannerPurchaseUrl,
    BackgroundImage,
}

impl SettingKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SettingKey::FeaturedText => "featured-text",
            SettingKey::BannerPurchaseUrl => "banner-purchase-url",
            SettingKey::BackgroundImage => "background-image",
        }
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SettingKey {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "featured-text" => Ok(SettingKey::FeaturedText),
            "banner-purchase-url" => Ok(SettingKey::BannerPurchaseUrl),
            "background-image" => Ok(SettingKey::BackgroundImage),
            _ => Err(()),
        }
    }
}

// ───── Database Models ───────────────────────────────────────────────

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SettingRow {
    pub id: String,
    pub value: sqlx::types::Json<serde_json::Value>,
    pub updated_at: DateTime<Utc>,
}

/// A stored settings document, value still untyped.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredSetting {
    pub key: SettingKey,
    pub value: serde_json::Value,
    pub updated_at: DateTime<Utc>,
}

// ───── Typed documents ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct FeaturedText {
    #[validate(length(min = 1, max = MAX_TITLE_LENGTH))]
    pub title: String,

    #[validate(length(max = MAX_CONTENT_LENGTH))]
    pub content: String,
}

impl Default for FeaturedText {
    fn default() -> Self {
        FeaturedText {
            title: DEFAULT_FEATURED_TITLE.to_string(),
            content: DEFAULT_FEATURED_CONTENT.to_string(),
        }
    }
}

impl FeaturedText {
    pub fn trimmed(self) -> Self {
        FeaturedText {
            title: self.title.trim().to_string(),
            content: self.content.trim().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct PurchaseLink {
    #[validate(length(max = MAX_URL_LENGTH), custom(function = "validate_http_url"))]
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct BackgroundImage {
    #[validate(length(max = MAX_URL_LENGTH), custom(function = "validate_image_location"))]
    pub url: String,
}

// ───── API Response Models ──────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum SettingValue {
    #[serde(rename_all = "camelCase")]
    FeaturedText {
        title: String,
        content: String,
        content_html: String,
    },
    Link {
        url: Option<String>,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingResponse {
    pub key: SettingKey,
    #[serde(flatten)]
    pub value: SettingValue,
    pub updated_at: Option<DateTime<Utc>>,
    /// True when nothing is stored and the fallback is shown.
    pub is_default: bool,
}

impl SettingResponse {
    pub fn featured_text(text: FeaturedText, updated_at: Option<DateTime<Utc>>) -> Self {
        let content_html = safe_markdown_to_html(&text.content);
        SettingResponse {
            key: SettingKey::FeaturedText,
            value: SettingValue::FeaturedText {
                title: text.title,
                content: text.content,
                content_html,
            },
            is_default: updated_at.is_none(),
            updated_at,
        }
    }

    pub fn link(key: SettingKey, url: Option<String>, updated_at: Option<DateTime<Utc>>) -> Self {
        SettingResponse {
            key,
            value: SettingValue::Link { url },
            is_default: updated_at.is_none(),
            updated_at,
        }
    }

    /// What visitors see when the document is absent or unreadable.
    pub fn fallback(key: SettingKey) -> Self {
        match key {
            SettingKey::FeaturedText => SettingResponse::featured_text(FeaturedText::default(), None),
            other => SettingResponse::link(other, None, None),
        }
    }
}

// ───── Validation Helpers ───────────────────────────────────────────

pub fn validate_http_url(value: &str) -> Result<(), ValidationError> {
    match url::Url::parse(value) {
        Ok(parsed) if parsed.scheme() == "http" || parsed.scheme() == "https" => Ok(()),
        Ok(_) => Err(new_validation_error("invalid_url_scheme", "URL must start with http:// or https://")),
        Err(_) => Err(new_validation_error("invalid_url", "Invalid URL format")),
    }
}

/// Absolute http(s) URL, or a site-relative path such as `/assets/...`.
pub fn validate_image_location(value: &str) -> Result<(), ValidationError> {
    if value.starts_with('/') && !value.starts_with("//") {
        if value.split('/').any(|segment| segment == "..") {
            return Err(new_validation_error("invalid_path", "Path must not contain '..'"));
        }
        return Ok(());
    }
    validate_http_url(value)
}

fn new_validation_error(code: &'static str, msg: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(msg));
    err
}

impl From<SettingRow> for Option<StoredSetting> {
    fn from(row: SettingRow) -> Self {
        let key = SettingKey::from_str(&row.id).ok()?;
        Some(StoredSetting {
            key,
            value: row.value.0,
            updated_at: row.updated_at,
        })
    }
}
