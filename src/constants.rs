use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;

pub static START_TIME: Lazy<DateTime<Utc>> = Lazy::new(Utc::now);

/// Seconds a health snapshot is reused.
pub const HEALTH_CACHE_SECS: i64 = 5;

/// Images returned by the sample endpoint when `count` is omitted.
pub const DEFAULT_SAMPLE_SIZE: u32 = 1;

pub const ASSET_CACHE_CONTROL: &str = "public, max-age=86400";
