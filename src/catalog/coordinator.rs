// src/catalog/coordinator.rs
//! Merge cycle across all registered catalog sources plus the stateful,
//! published page view the dashboard binds to.

use metrics::{counter, histogram};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};

use crate::catalog::filter::{FilterState, QueryDebouncer};
use crate::model::{CatalogRow, PageRequest};
use crate::source::{settle_all, CatalogSource, SourceHealth, SourceOutcome};

pub const DEFAULT_PAGE_SIZE: usize = 50;
pub const MAX_PAGE_SIZE: usize = 1000;

/// Rows of one merged page plus the "more pages exist" signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedPage {
    pub rows: Vec<CatalogRow>,
    pub has_next: bool,
}

/// Concatenate contributions in the given (registration) order, derive
/// `has_next` from the untruncated length, then cut to `page_size`.
pub fn merge_rows<I>(page_size: usize, contributions: I) -> MergedPage
where
    I: IntoIterator<Item = Vec<CatalogRow>>,
{
    let mut rows: Vec<CatalogRow> = contributions.into_iter().flatten().collect();
    let has_next = rows.len() > page_size;
    rows.truncate(page_size);
    MergedPage { rows, has_next }
}

/// View model published to presentation code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageView {
    pub rows: Vec<CatalogRow>,
    pub has_next: bool,
    pub page: usize,
    pub filter: FilterState,
    pub sources: Vec<SourceHealth>,
}

/// What happened to a reload once its responses arrived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Committed(PageView),
    /// A newer request or a filter change superseded this one.
    Stale,
}

impl LoadOutcome {
    pub fn view(&self) -> Option<&PageView> {
        match self {
            LoadOutcome::Committed(v) => Some(v),
            LoadOutcome::Stale => None,
        }
    }
}

#[derive(Debug, Default)]
struct ViewState {
    filter: FilterState,
    page: usize,
    /// Bumped on every effective filter change.
    epoch: u64,
    /// Last ticket handed out / last ticket whose response was published.
    issued: u64,
    committed: u64,
    /// Epoch and `has_next` of the published view. While `view_epoch` lags
    /// `epoch` a filter reload is pending and paging is refused.
    view_epoch: u64,
    has_next: bool,
}

impl ViewState {
    fn reset_pending(&self) -> bool {
        self.view_epoch != self.epoch
    }
}

pub struct AggregationCoordinator {
    sources: Vec<Arc<dyn CatalogSource>>,
    page_size: usize,
    state: Mutex<ViewState>,
    tx: watch::Sender<PageView>,
    debouncer: QueryDebouncer,
}

impl AggregationCoordinator {
    /// `sources` order is the merge order.
    pub fn new(sources: Vec<Arc<dyn CatalogSource>>, page_size: usize) -> Self {
        super::ensure_metrics_described();
        let (tx, _rx) = watch::channel(PageView::default());
        Self {
            sources,
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
            state: Mutex::new(ViewState::default()),
            tx,
            debouncer: QueryDebouncer::new(Duration::ZERO),
        }
    }

    pub fn with_query_debounce(mut self, window: Duration) -> Self {
        self.debouncer = QueryDebouncer::new(window);
        self
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn source_names(&self) -> Vec<String> {
        self.sources.iter().map(|s| s.name().to_string()).collect()
    }

    pub fn subscribe(&self) -> watch::Receiver<PageView> {
        self.tx.subscribe()
    }

    /// Last committed view.
    pub fn current(&self) -> PageView {
        self.tx.borrow().clone()
    }

    pub async fn filter(&self) -> FilterState {
        self.state.lock().await.filter.clone()
    }

    /// One stateless merge cycle: fan out, wait for every source to settle,
    /// merge. Failing sources contribute nothing.
    pub async fn fetch_page(&self, page: usize, filter: &FilterState) -> PageView {
        let t0 = std::time::Instant::now();
        let req = PageRequest {
            start: page.saturating_mul(self.page_size),
            limit: self.page_size.saturating_add(1),
            q: filter.q.clone(),
            brand: filter.brand.clone(),
            supplier: filter.supplier.clone(),
        };

        let outcomes: Vec<SourceOutcome<Vec<CatalogRow>>> = settle_all(
            &self.sources,
            "rows",
            |s| s.name().to_string(),
            |s| s.fetch_rows(&req),
        )
        .await;

        let sources: Vec<SourceHealth> = outcomes.iter().map(|o| o.health()).collect();
        let merged = merge_rows(self.page_size, outcomes.into_iter().map(|o| o.value));

        counter!("catalog_merge_cycles_total").increment(1);
        histogram!("catalog_merge_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        tracing::debug!(
            target: "catalog",
            page,
            rows = merged.rows.len(),
            has_next = merged.has_next,
            failed = sources.iter().filter(|h| !h.ok).count(),
            "merge cycle done"
        );

        PageView {
            rows: merged.rows,
            has_next: merged.has_next,
            page,
            filter: filter.clone(),
            sources,
        }
    }

    /// Load `page` under the current filter and publish it unless a newer
    /// request has already landed or the filter moved on meanwhile. Only
    /// page 0 may load while a filter change is still in flight.
    pub async fn reload(&self, page: usize) -> LoadOutcome {
        let (ticket, epoch, filter) = {
            let mut s = self.state.lock().await;
            if page != 0 && s.reset_pending() {
                counter!("catalog_stale_responses_total").increment(1);
                tracing::debug!(
                    target: "catalog",
                    page,
                    epoch = s.epoch,
                    "page request refused; filter reload pending"
                );
                return LoadOutcome::Stale;
            }
            s.issued += 1;
            (s.issued, s.epoch, s.filter.clone())
        };

        let view = self.fetch_page(page, &filter).await;

        let mut s = self.state.lock().await;
        if ticket <= s.committed || epoch != s.epoch {
            counter!("catalog_stale_responses_total").increment(1);
            tracing::debug!(
                target: "catalog",
                ticket,
                committed = s.committed,
                page,
                "discarding stale page response"
            );
            return LoadOutcome::Stale;
        }
        s.committed = ticket;
        s.page = page;
        s.view_epoch = epoch;
        s.has_next = view.has_next;
        self.tx.send_replace(view.clone());
        LoadOutcome::Committed(view)
    }

    /// Reload whatever page is current.
    pub async fn refresh(&self) -> LoadOutcome {
        let page = self.state.lock().await.page;
        self.reload(page).await
    }

    /// `None` when the current view reports no further page or a filter
    /// change has not landed yet.
    pub async fn next_page(&self) -> Option<LoadOutcome> {
        let page = {
            let s = self.state.lock().await;
            if s.reset_pending() || !s.has_next {
                return None;
            }
            s.page + 1
        };
        Some(self.reload(page).await)
    }

    /// `None` when already on the first page or a filter change has not
    /// landed yet.
    pub async fn prev_page(&self) -> Option<LoadOutcome> {
        let page = {
            let s = self.state.lock().await;
            if s.reset_pending() || s.page == 0 {
                return None;
            }
            s.page - 1
        };
        Some(self.reload(page).await)
    }

    /// Apply `f` to the filter; an effective change resets to page 0 and
    /// reloads. Returns `None` when nothing changed.
    async fn mutate_filter<F>(&self, f: F) -> Option<LoadOutcome>
    where
        F: FnOnce(&mut FilterState) -> bool,
    {
        {
            let mut s = self.state.lock().await;
            if !f(&mut s.filter) {
                return None;
            }
            s.epoch += 1;
            s.page = 0;
            tracing::info!(
                target: "catalog",
                q = %s.filter.q,
                brand = %s.filter.brand,
                supplier = %s.filter.supplier,
                "filter changed; back to page 0"
            );
        }
        Some(self.reload(0).await)
    }

    pub async fn set_filter(&self, filter: &FilterState) -> Option<LoadOutcome> {
        self.mutate_filter(|f| f.replace(filter)).await
    }

    pub async fn set_query(&self, q: &str) -> Option<LoadOutcome> {
        self.mutate_filter(|f| f.set_query(q)).await
    }

    pub async fn set_brand(&self, brand: &str) -> Option<LoadOutcome> {
        self.mutate_filter(|f| f.set_brand(brand)).await
    }

    pub async fn set_supplier(&self, supplier: &str) -> Option<LoadOutcome> {
        self.mutate_filter(|f| f.set_supplier(supplier)).await
    }

    /// Text-input path: only the last keystroke in a debounce window reaches
    /// `set_query`.
    pub async fn type_query(&self, q: String) -> Option<LoadOutcome> {
        let q = self.debouncer.push(q).await?;
        self.set_query(&q).await
    }
}
