// src/catalog/overview.rs
use chrono::{DateTime, Utc};
use metrics::counter;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;

use crate::model::{FilterOptions, OverviewEntry};
use crate::source::{settle_all, CatalogSource, SourceHealth};

/// Summary cards and filter vocabulary from every source, concatenated in
/// registration order without reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewSnapshot {
    pub entries: Vec<OverviewEntry>,
    pub filters: FilterOptions,
    pub sources: Vec<SourceHealth>,
    pub refreshed_at: Option<DateTime<Utc>>,
}

/// Not time-driven: refreshed at startup and on explicit request.
pub struct OverviewAggregator {
    sources: Vec<Arc<dyn CatalogSource>>,
    tx: watch::Sender<OverviewSnapshot>,
}

impl OverviewAggregator {
    pub fn new(sources: Vec<Arc<dyn CatalogSource>>) -> Self {
        super::ensure_metrics_described();
        let (tx, _rx) = watch::channel(OverviewSnapshot::default());
        Self { sources, tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<OverviewSnapshot> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> OverviewSnapshot {
        self.tx.borrow().clone()
    }

    pub async fn refresh(&self) -> OverviewSnapshot {
        let name = |s: &Arc<dyn CatalogSource>| s.name().to_string();
        let (overviews, options) = tokio::join!(
            settle_all(&self.sources, "overview", name, |s| s.fetch_overview()),
            settle_all(&self.sources, "filters", name, |s| s.fetch_filter_options()),
        );

        // a source is healthy only if both of its calls succeeded
        let sources = overviews
            .iter()
            .zip(options.iter())
            .map(|(o, f)| SourceHealth {
                source: o.source.clone(),
                ok: o.is_ok() && f.is_ok(),
                error: o.error.clone().or_else(|| f.error.clone()),
            })
            .collect::<Vec<_>>();

        let mut entries = Vec::new();
        for o in overviews {
            entries.extend(o.value);
        }
        let mut filters = FilterOptions::default();
        for f in options {
            filters.extend(f.value);
        }

        counter!("catalog_overview_refresh_total").increment(1);
        tracing::info!(
            target: "catalog",
            cards = entries.len(),
            brands = filters.brands.len(),
            suppliers = filters.suppliers.len(),
            "overview refreshed"
        );

        let snap = OverviewSnapshot {
            entries,
            filters,
            sources,
            refreshed_at: Some(Utc::now()),
        };
        self.tx.send_replace(snap.clone());
        snap
    }
}
