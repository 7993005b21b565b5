use std::sync::Arc;

use deadpool_redis::{Pool as RedisPool, Runtime};

mod domain;
mod infrastructure;
mod interfaces;
pub mod background_task;
pub mod constants;
pub mod errors;
pub mod graceful_shutdown;
pub mod settings;
pub mod shared_repos;

pub use domain::{entities, ordering, use_cases};
pub use infrastructure::{auth, db, limiter, storage, utils};
pub use interfaces::{handlers, middlewares, repositories, routes};

use auth::jwt::JwtService;
use limiter::rate_limiter::{RateLimitPolicy, RateLimiterStore};
use shared_repos::SharedRepositories;
use storage::AssetStorage;
use use_cases::{admin_images::AdminImageHandler, auth::AuthHandler, catalog::ImageCatalog, settings::SiteSettingsHandler};

pub type AppAuthHandler = AuthHandler<JwtService>;

pub struct AppState {
    pub catalog: ImageCatalog,
    pub admin_images: Arc<AdminImageHandler>,
    pub site_settings: SiteSettingsHandler,
    pub auth_handler: AppAuthHandler,
    pub login_limiter: RateLimiterStore,
    pub storage: Arc<dyn AssetStorage>,
    pub redis_pool: Option<RedisPool>,
    pub backend: &'static str,
    pub config: settings::AppConfig,
}

impl AppState {
    pub fn new(config: &settings::AppConfig, repos: SharedRepositories, storage: Arc<dyn AssetStorage>) -> Self {
        let redis_pool = config.redis_url.as_ref().and_then(|url| {
            deadpool_redis::Config::from_url(url)
                .create_pool(Some(Runtime::Tokio1))
                .map_err(|e| tracing::error!("Redis pool creation error: {}", e))
                .ok()
        });

        let admin_images = AdminImageHandler::new(
            repos.images.clone(),
            repos.pending_deletions.clone(),
            storage.clone(),
            config.max_upload_bytes,
        );

        AppState {
            catalog: ImageCatalog::new(repos.images.clone()),
            admin_images: Arc::new(admin_images),
            site_settings: SiteSettingsHandler::new(repos.settings.clone()),
            auth_handler: AuthHandler::new(JwtService::new(config), config, redis_pool.clone()),
            login_limiter: RateLimiterStore::new(RateLimitPolicy::login()),
            storage,
            redis_pool,
            backend: repos.backend,
            config: config.clone(),
        }
    }
}
