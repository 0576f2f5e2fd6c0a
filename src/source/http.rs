// src/source/http.rs
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

use crate::model::{
    null_as_default, AutomationTask, CatalogRow, FilterOptions, OverviewEntry, PageRequest,
    SupplierIntegration,
};
use crate::source::{CatalogSource, SourceError, SourceResult, StatusSource};

// --- wire envelopes; absent or null arrays default to empty here and nowhere else ---

#[derive(Debug, Deserialize)]
struct OverviewEnvelope {
    #[serde(default, deserialize_with = "null_as_default")]
    overview: Vec<OverviewEntry>,
}

#[derive(Debug, Deserialize)]
struct RowsEnvelope {
    #[serde(default, deserialize_with = "null_as_default")]
    rows: Vec<CatalogRow>,
}

#[derive(Debug, Deserialize)]
struct SuppliersEnvelope {
    #[serde(default, deserialize_with = "null_as_default")]
    suppliers: Vec<SupplierIntegration>,
}

#[derive(Debug, Deserialize)]
struct TasksEnvelope {
    #[serde(default, deserialize_with = "null_as_default")]
    tasks: Vec<AutomationTask>,
}

/// One backend integration reached over its REST contract.
#[derive(Clone)]
pub struct HttpSource {
    name: String,
    base_url: String,
    client: Client,
    timeout: Duration,
}

impl HttpSource {
    pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> Self {
        let base = base_url.into();
        Self {
            name: name.into(),
            base_url: base.trim_end_matches('/').to_string(),
            client: Client::new(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs.max(1));
        self
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> SourceResult<T> {
        let resp = self
            .client
            .get(self.url(path))
            .query(query)
            .timeout(self.timeout)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(SourceError::Status(status.as_u16()));
        }
        let body = resp.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

fn rows_query(req: &PageRequest) -> Vec<(&'static str, String)> {
    let mut q = vec![
        ("start", req.start.to_string()),
        ("limit", req.limit.to_string()),
    ];
    for (k, v) in [("q", &req.q), ("brand", &req.brand), ("supplier", &req.supplier)] {
        if !v.is_empty() {
            q.push((k, v.clone()));
        }
    }
    q
}

#[async_trait]
impl CatalogSource for HttpSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_overview(&self) -> SourceResult<Vec<OverviewEntry>> {
        let env: OverviewEnvelope = self.get_json("catalog/overview", &[]).await?;
        Ok(env.overview)
    }

    async fn fetch_rows(&self, req: &PageRequest) -> SourceResult<Vec<CatalogRow>> {
        let env: RowsEnvelope = self.get_json("catalog/rows", &rows_query(req)).await?;
        let mut rows = env.rows;
        if rows.len() > req.limit {
            tracing::debug!(
                target: "source",
                source = %self.name,
                got = rows.len(),
                limit = req.limit,
                "backend ignored limit; truncating"
            );
            rows.truncate(req.limit);
        }
        Ok(rows)
    }

    async fn fetch_filter_options(&self) -> SourceResult<FilterOptions> {
        self.get_json("catalog/filters", &[]).await
    }
}

#[async_trait]
impl StatusSource for HttpSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_tasks(&self) -> SourceResult<Vec<AutomationTask>> {
        // cache buster; some proxies in front of the job service cache GETs
        let bust = chrono::Utc::now().timestamp_millis().to_string();
        let env: TasksEnvelope = self.get_json("tasks", &[("_", bust)]).await?;
        Ok(env.tasks)
    }

    async fn fetch_supplier_status(&self) -> SourceResult<Vec<SupplierIntegration>> {
        let env: SuppliersEnvelope = self.get_json("suppliers/status", &[]).await?;
        Ok(env.suppliers)
    }
}
