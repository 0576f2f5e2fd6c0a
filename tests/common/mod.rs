// tests/common/mod.rs
//
// In-memory supplier backend used by the integration tests.
#![allow(dead_code)]

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use supplier_dashboard::model::{
    AutomationTask, CatalogRow, FilterOptions, OverviewEntry, PageRequest, SupplierIntegration,
    TaskStatus,
};
use supplier_dashboard::source::{CatalogSource, SourceError, SourceResult, StatusSource};

type DelayFn = Box<dyn Fn(&PageRequest) -> Duration + Send + Sync>;

pub struct FakeSource {
    pub name: String,
    pub rows: Vec<CatalogRow>,
    pub overview: Vec<OverviewEntry>,
    pub options: FilterOptions,
    pub tasks: Mutex<Vec<AutomationTask>>,
    pub suppliers: Vec<SupplierIntegration>,
    pub failing: AtomicBool,
    pub row_delay: Option<DelayFn>,
    pub task_delay: Duration,
    pub row_calls: AtomicUsize,
    pub task_calls: AtomicUsize,
    pub status_calls: AtomicUsize,
    pub last_request: Mutex<Option<PageRequest>>,
}

impl FakeSource {
    pub fn new(name: &str, n_rows: usize) -> Self {
        let rows = (0..n_rows).map(|i| row(name, i, "Acme")).collect();
        Self {
            name: name.to_string(),
            rows,
            overview: vec![OverviewEntry {
                supplier: name.to_string(),
                active: n_rows as i64,
                last_updated: "2024-05-01".into(),
            }],
            options: FilterOptions {
                brands: vec!["Acme".into()],
                suppliers: vec![name.to_string()],
            },
            tasks: Mutex::new(Vec::new()),
            suppliers: vec![SupplierIntegration {
                id: name.to_lowercase(),
                name: name.to_string(),
                integration_type: "ftp".into(),
                status: Default::default(),
                last_sync: String::new(),
                item_count: n_rows as i64,
                locations: 1,
            }],
            failing: AtomicBool::new(false),
            row_delay: None,
            task_delay: Duration::ZERO,
            row_calls: AtomicUsize::new(0),
            task_calls: AtomicUsize::new(0),
            status_calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    pub fn with_rows(mut self, rows: Vec<CatalogRow>) -> Self {
        self.rows = rows;
        self
    }

    pub fn with_row_delay<F>(mut self, f: F) -> Self
    where
        F: Fn(&PageRequest) -> Duration + Send + Sync + 'static,
    {
        self.row_delay = Some(Box::new(f));
        self
    }

    pub fn with_tasks(self, tasks: Vec<AutomationTask>) -> Self {
        *self.tasks.lock() = tasks;
        self
    }

    pub fn with_task_delay(mut self, d: Duration) -> Self {
        self.task_delay = d;
        self
    }

    pub fn failing(self) -> Self {
        self.failing.store(true, Ordering::SeqCst);
        self
    }

    pub fn set_failing(&self, on: bool) {
        self.failing.store(on, Ordering::SeqCst);
    }

    fn check(&self) -> SourceResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(SourceError::Status(503));
        }
        Ok(())
    }
}

pub fn row(supplier: &str, i: usize, brand: &str) -> CatalogRow {
    CatalogRow {
        sku: format!("{supplier}-{i:03}"),
        name: format!("Part {i}"),
        supplier: supplier.to_string(),
        brand: brand.to_string(),
        stock: i as i64,
        status: "active".into(),
    }
}

pub fn task(id: &str, status: TaskStatus, finished: Option<i64>) -> AutomationTask {
    AutomationTask {
        id: id.into(),
        name: format!("{id} Inventory Sync"),
        task_type: "inventory".into(),
        status,
        progress: 0,
        supplier: "Keystone".into(),
        started: None,
        finished,
        next_run: None,
    }
}

#[async_trait::async_trait]
impl CatalogSource for FakeSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_overview(&self) -> SourceResult<Vec<OverviewEntry>> {
        self.check()?;
        Ok(self.overview.clone())
    }

    async fn fetch_rows(&self, req: &PageRequest) -> SourceResult<Vec<CatalogRow>> {
        self.row_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock() = Some(req.clone());
        if let Some(delay) = &self.row_delay {
            tokio::time::sleep(delay(req)).await;
        }
        self.check()?;
        let q = req.q.to_lowercase();
        Ok(self
            .rows
            .iter()
            .filter(|r| q.is_empty() || r.name.to_lowercase().contains(&q) || r.sku.to_lowercase().contains(&q))
            .filter(|r| req.brand.is_empty() || r.brand == req.brand)
            .filter(|r| req.supplier.is_empty() || r.supplier == req.supplier)
            .skip(req.start)
            .take(req.limit)
            .cloned()
            .collect())
    }

    async fn fetch_filter_options(&self) -> SourceResult<FilterOptions> {
        self.check()?;
        Ok(self.options.clone())
    }
}

#[async_trait::async_trait]
impl StatusSource for FakeSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_tasks(&self) -> SourceResult<Vec<AutomationTask>> {
        self.task_calls.fetch_add(1, Ordering::SeqCst);
        if !self.task_delay.is_zero() {
            tokio::time::sleep(self.task_delay).await;
        }
        self.check()?;
        Ok(self.tasks.lock().clone())
    }

    async fn fetch_supplier_status(&self) -> SourceResult<Vec<SupplierIntegration>> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self.suppliers.clone())
    }
}

pub fn catalog(v: &[Arc<FakeSource>]) -> Vec<Arc<dyn CatalogSource>> {
    v.iter().map(|s| s.clone() as Arc<dyn CatalogSource>).collect()
}

pub fn status(v: &[Arc<FakeSource>]) -> Vec<Arc<dyn StatusSource>> {
    v.iter().map(|s| s.clone() as Arc<dyn StatusSource>).collect()
}
