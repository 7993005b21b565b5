use std::{net::TcpListener, sync::Arc, time::Duration};

use actix_web::{middleware::NormalizePath, web, App, HttpServer};
use artfolio_backend::{
    background_task::start_asset_sweep,
    db::postgres::{create_pool, run_migrations},
    graceful_shutdown::shutdown_signal,
    middlewares::{auth::AuthMiddleware, cors::cors_middleware},
    routes::configure_routes,
    settings::AppConfig,
    shared_repos::SharedRepositories,
    storage::{local::LocalAssetStorage, AssetStorage},
    AppState,
};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::EnvFilter;

const LIMITER_EVICTION_EVERY: Duration = Duration::from_secs(60);

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let config = match AppConfig::new() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    init_tracing(config.is_production());
    tracing::info!("Loaded configuration: {:?}", config);

    let repos = if config.has_database() {
        let pool = match create_pool(&config.database_url).await {
            Ok(pool) => pool,
            Err(e) => {
                tracing::error!("Failed to create database connection pool: {}", e);
                std::process::exit(1);
            }
        };
        if let Err(e) = run_migrations(&pool).await {
            tracing::error!("Failed to run migrations: {}", e);
            std::process::exit(1);
        }
        SharedRepositories::postgres(pool)
    } else {
        tracing::warn!("APP_DATABASE_URL not set; records are kept in memory and lost on restart");
        SharedRepositories::in_memory()
    };

    let storage: Arc<dyn AssetStorage> = Arc::new(LocalAssetStorage::new(
        config.storage_root.clone(),
        &config.public_asset_base_url,
    ));

    let app_state = web::Data::new(AppState::new(&config, repos, storage));

    app_state.login_limiter.spawn_eviction(LIMITER_EVICTION_EVERY);
    tokio::spawn(start_asset_sweep(
        app_state.admin_images.clone(),
        Duration::from_secs(config.asset_sweep_interval_secs.max(1)),
    ));

    let server_addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&server_addr)?;

    tracing::info!(
        "Starting {} v{} on {} ({} record store)",
        config.name,
        env!("CARGO_PKG_VERSION"),
        server_addr,
        app_state.backend
    );

    let cors_origins = config.cors_origins();

    let server = HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(AuthMiddleware)
            .wrap(NormalizePath::trim())
            .wrap(cors_middleware(&cors_origins))
            .wrap(TracingLogger::default())
            .configure(configure_routes)
    })
    .listen(listener)?
    .workers(config.worker_count.max(1))
    .run();

    tokio::select! {
        res = server => res,
        _ = shutdown_signal() => Ok(()),
    }
}
