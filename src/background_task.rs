use std::sync::Arc;

use tokio::time::{interval, Duration, MissedTickBehavior};

use crate::use_cases::admin_images::AdminImageHandler;

const SWEEP_BATCH: i64 = 50;

/// Retries queued asset deletions left behind by failed deletes and aborted
/// uploads.
pub async fn start_asset_sweep(handler: Arc<AdminImageHandler>, every: Duration) {
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        match handler.sweep_pending(SWEEP_BATCH).await {
            Ok(report) if report.attempted == 0 => {}
            Ok(report) => tracing::info!(
                attempted = report.attempted,
                removed = report.removed,
                failed = report.failed,
                "Asset sweep finished"
            ),
            Err(e) => tracing::error!(error = %e, "Asset sweep failed"),
        }
    }
}
