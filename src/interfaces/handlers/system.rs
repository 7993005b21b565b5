use std::{
    sync::{
        atomic::{AtomicI64, Ordering},
        RwLock,
    },
    time::Duration,
};

use actix_web::{get, web, HttpResponse, Responder};
use chrono::Utc;
use humantime::format_duration;
use once_cell::sync::Lazy;
use serde::Serialize;
use sysinfo::System;

use crate::{
    constants::{HEALTH_CACHE_SECS, START_TIME},
    use_cases::extractors::AdminClaims,
    AppState,
};

#[derive(Serialize, Clone, Default)]
struct SystemInfo {
    os: String,
    kernel: String,
    hostname: String,
    cpu_count: usize,
    memory_total: String,
}

#[derive(Serialize, Clone, Default)]
struct HealthCheckResponse {
    status: String,
    uptime: String,
    timestamp: String,
    start_at: String,
    version: String,
    record_store: String,
    record_store_backend: String,
    redis_status: String,
    pending_asset_deletions: Option<usize>,
    login_clients_tracked: usize,
    memory_usage: String,
    system: SystemInfo,
}

static LAST_CHECK: AtomicI64 = AtomicI64::new(0);
static CACHED_STATUS: Lazy<RwLock<HealthCheckResponse>> = Lazy::new(|| RwLock::new(HealthCheckResponse::default()));

async fn redis_status(state: &AppState) -> &'static str {
    let Some(pool) = &state.redis_pool else {
        return "Not configured";
    };

    match pool.get().await {
        Ok(mut conn) => match redis::cmd("PING").query_async::<String>(&mut conn).await {
            Ok(pong) if pong == "PONG" => "OK",
            _ => "Unavailable",
        },
        Err(_) => "Unavailable",
    }
}

async fn build_health_response(state: &AppState) -> HealthCheckResponse {
    let now_utc = Utc::now();
    let uptime = now_utc.signed_duration_since(*START_TIME);
    let human_uptime = format_duration(Duration::from_secs(uptime.num_seconds().max(0) as u64));

    let mut sys = System::new_all();
    sys.refresh_all();

    let system = SystemInfo {
        os: System::name().unwrap_or_else(|| "Unknown".to_string()),
        kernel: System::kernel_version().unwrap_or_else(|| "Unknown".to_string()),
        hostname: System::host_name().unwrap_or_else(|| "Unknown".to_string()),
        cpu_count: sys.cpus().len(),
        memory_total: format!("{:.2} GB", sys.total_memory() as f64 / 1024.0 / 1024.0 / 1024.0),
    };

    let record_store = match state.catalog.image_repo.check_connection().await {
        Ok(()) => "OK",
        Err(e) => {
            tracing::warn!(error = %e, "Record store health check failed");
            "Unavailable"
        }
    };

    let pending_asset_deletions = state
        .admin_images
        .pending_deletions()
        .await
        .map(|pending| pending.len())
        .ok();

    let memory_usage = sysinfo::get_current_pid()
        .ok()
        .and_then(|pid| sys.process(pid))
        .map_or_else(
            || "Unknown".to_string(),
            |p| format!("{:.2} MB", p.memory() as f64 / 1024.0 / 1024.0),
        );

    HealthCheckResponse {
        status: if record_store == "OK" { "healthy" } else { "degraded" }.to_string(),
        uptime: human_uptime.to_string(),
        timestamp: now_utc.to_rfc3339(),
        start_at: START_TIME.to_rfc3339(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        record_store: record_store.to_string(),
        record_store_backend: state.backend.to_string(),
        redis_status: redis_status(state).await.to_string(),
        pending_asset_deletions,
        login_clients_tracked: state.login_limiter.tracked_clients(),
        memory_usage,
        system,
    }
}

/// Full snapshot, rebuilt at most every `HEALTH_CACHE_SECS`.
async fn cached_health(state: &AppState) -> HealthCheckResponse {
    let now = Utc::now().timestamp();
    let last = LAST_CHECK.load(Ordering::Relaxed);

    if now - last <= HEALTH_CACHE_SECS {
        match CACHED_STATUS.read() {
            Ok(cached) => return cached.clone(),
            Err(e) => tracing::warn!("Health check cache lock poisoned: {}", e),
        }
    }

    let response = build_health_response(state).await;
    if let Ok(mut cache) = CACHED_STATUS.write() {
        *cache = response.clone();
        LAST_CHECK.store(now, Ordering::Relaxed);
    }
    response
}

#[get("/health")]
pub async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let health = cached_health(&state).await;

    HttpResponse::Ok().json(serde_json::json!({
        "status": health.status,
        "uptime": health.uptime,
        "timestamp": health.timestamp,
        "version": health.version,
        "recordStore": health.record_store,
    }))
}

#[get("/health")]
pub async fn admin_health_check(_claims: AdminClaims, state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(cached_health(&state).await)
}
