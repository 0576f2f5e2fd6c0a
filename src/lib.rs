// src/lib.rs
// Public library surface for the service binary and integration tests.

pub mod api;
pub mod catalog;
pub mod config;
pub mod dashboard;
pub mod metrics;
pub mod model;
pub mod source;
pub mod tasks;

// ---- Re-exports for stable public API ----
pub use crate::api::router;
pub use crate::dashboard::AppState;

use axum::Router;
use tracing::info;

/// Build the full in-process app: config, state, first load, routes, `/metrics`.
/// Must be called inside a Tokio runtime (the task poller starts here).
pub async fn app() -> anyhow::Result<Router> {
    let cfg = config::DashboardConfig::load_default()?;
    let state = AppState::from_config(&cfg);

    let (overview, page) = state.refresh_all().await;
    info!(
        cards = overview.entries.len(),
        rows = page.view().map(|v| v.rows.len()).unwrap_or(0),
        "initial catalog load finished"
    );

    let metrics = crate::metrics::Metrics::init(cfg.poll_interval_ms, cfg.page_size)?;
    Ok(api::router(state).merge(metrics.router()))
}
