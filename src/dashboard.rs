// src/dashboard.rs
//! Wires sources into the coordinator, overview aggregator and task poller,
//! and owns their lifetimes for the HTTP layer.

use std::sync::Arc;

use crate::catalog::{AggregationCoordinator, LoadOutcome, OverviewAggregator, OverviewSnapshot};
use crate::config::DashboardConfig;
use crate::source::http::HttpSource;
use crate::source::{CatalogSource, StatusSource};
use crate::tasks::{PollerHandle, TaskPoller, TaskRanker};

/// Shared app state used by Axum. Cloning is cheap; the poller stops once
/// the last clone is dropped.
#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<AggregationCoordinator>,
    pub overview: Arc<OverviewAggregator>,
    pub poller: Arc<PollerHandle>,
}

impl AppState {
    /// Build from explicit sources and start the task poller.
    /// Must be called inside a Tokio runtime.
    pub fn build(
        catalog: Vec<Arc<dyn CatalogSource>>,
        status: Vec<Arc<dyn StatusSource>>,
        cfg: &DashboardConfig,
    ) -> Self {
        let coordinator = AggregationCoordinator::new(catalog.clone(), cfg.page_size)
            .with_query_debounce(cfg.query_debounce());
        let overview = OverviewAggregator::new(catalog);
        let ranker = TaskRanker::new(cfg.task_name_filter.clone(), cfg.recent_tasks_limit);
        let poller = TaskPoller::new(status, cfg.poll_interval(), ranker).spawn();

        tracing::info!(
            page_size = cfg.page_size,
            poll_ms = cfg.poll_interval_ms,
            sources = ?coordinator.source_names(),
            "dashboard state built"
        );

        Self {
            coordinator: Arc::new(coordinator),
            overview: Arc::new(overview),
            poller: Arc::new(poller),
        }
    }

    /// HTTP-backed sources from configuration.
    pub fn from_config(cfg: &DashboardConfig) -> Self {
        let http = |s: &crate::config::SourceCfg| {
            Arc::new(HttpSource::new(&s.name, &s.base_url).with_timeout(cfg.request_timeout_secs))
        };
        let catalog: Vec<Arc<dyn CatalogSource>> = cfg
            .sources
            .iter()
            .map(|s| http(s) as Arc<dyn CatalogSource>)
            .collect();
        let status: Vec<Arc<dyn StatusSource>> = cfg
            .effective_status_sources()
            .iter()
            .map(|s| http(s) as Arc<dyn StatusSource>)
            .collect();
        Self::build(catalog, status, cfg)
    }

    /// Overview cards, filter vocabulary and catalog page 0, in parallel.
    /// Runs at startup and on the explicit refresh action.
    pub async fn refresh_all(&self) -> (OverviewSnapshot, LoadOutcome) {
        tokio::join!(self.overview.refresh(), self.coordinator.reload(0))
    }
}
