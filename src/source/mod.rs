// src/source/mod.rs
pub mod http;

use crate::model::{
    AutomationTask, CatalogRow, FilterOptions, OverviewEntry, PageRequest, SupplierIntegration,
};
use serde::Serialize;
use std::future::Future;

/// Failure of a single remote call. Never fatal for an aggregation cycle:
/// callers fold it into a [`SourceOutcome`].
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected HTTP status {0}")]
    Status(u16),
    #[error("malformed response: {0}")]
    Malformed(#[from] serde_json::Error),
}

pub type SourceResult<T> = std::result::Result<T, SourceError>;

/// Catalog side of one backend integration. No caching: every call is a
/// fresh round-trip.
#[async_trait::async_trait]
pub trait CatalogSource: Send + Sync {
    fn name(&self) -> &str;
    async fn fetch_overview(&self) -> SourceResult<Vec<OverviewEntry>>;
    /// Returns at most `req.limit` rows.
    async fn fetch_rows(&self, req: &PageRequest) -> SourceResult<Vec<CatalogRow>>;
    async fn fetch_filter_options(&self) -> SourceResult<FilterOptions>;
}

/// Automation side of one backend: task list and supplier health.
#[async_trait::async_trait]
pub trait StatusSource: Send + Sync {
    fn name(&self) -> &str;
    async fn fetch_tasks(&self) -> SourceResult<Vec<AutomationTask>>;
    async fn fetch_supplier_status(&self) -> SourceResult<Vec<SupplierIntegration>>;
}

/// Per-source health flag published next to merged data, so presentation can
/// tell "no data" from "source failed".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceHealth {
    pub source: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Settled result of one call: the value (empty on failure) plus health.
#[derive(Debug, Clone)]
pub struct SourceOutcome<T> {
    pub source: String,
    pub value: T,
    pub error: Option<String>,
}

impl<T: Default> SourceOutcome<T> {
    /// Folds a call result into an outcome; errors become an empty
    /// contribution, logged and counted per source and `op`.
    pub fn settle(source: &str, op: &'static str, res: SourceResult<T>) -> Self {
        match res {
            Ok(value) => Self {
                source: source.to_string(),
                value,
                error: None,
            },
            Err(e) => {
                tracing::warn!(target: "source", error = %e, source, op, "source call failed");
                metrics::counter!("source_errors_total", "source" => source.to_string(), "op" => op)
                    .increment(1);
                Self {
                    source: source.to_string(),
                    value: T::default(),
                    error: Some(e.to_string()),
                }
            }
        }
    }
}

impl<T> SourceOutcome<T> {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    pub fn health(&self) -> SourceHealth {
        SourceHealth {
            source: self.source.clone(),
            ok: self.error.is_none(),
            error: self.error.clone(),
        }
    }
}

/// Runs one call against every item concurrently and waits until all have
/// settled. Output order equals input order.
pub async fn settle_all<'a, S, T, F, Fut>(
    items: &'a [S],
    op: &'static str,
    name: impl Fn(&S) -> String,
    call: F,
) -> Vec<SourceOutcome<T>>
where
    T: Default,
    F: Fn(&'a S) -> Fut,
    Fut: Future<Output = SourceResult<T>> + 'a,
{
    let names: Vec<String> = items.iter().map(&name).collect();
    let results = futures::future::join_all(items.iter().map(call)).await;
    names
        .iter()
        .zip(results)
        .map(|(n, r)| SourceOutcome::settle(n, op, r))
        .collect()
}
