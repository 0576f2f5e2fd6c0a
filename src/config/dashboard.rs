// src/config/dashboard.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::catalog::coordinator::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::catalog::filter::clamp_debounce;
use crate::tasks::poller::{clamp_interval, DEFAULT_POLL_INTERVAL};
use crate::tasks::ranker::DEFAULT_RECENT_LIMIT;

pub const ENV_CONFIG_PATH: &str = "DASHBOARD_CONFIG_PATH";
pub const ENV_PAGE_SIZE: &str = "DASHBOARD_PAGE_SIZE";
pub const ENV_POLL_INTERVAL_MS: &str = "DASHBOARD_POLL_INTERVAL_MS";

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}
fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL.as_millis() as u64
}
fn default_query_debounce_ms() -> u64 {
    300
}
fn default_recent_tasks_limit() -> usize {
    DEFAULT_RECENT_LIMIT
}
fn default_request_timeout_secs() -> u64 {
    10
}

/// One backend integration endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceCfg {
    pub name: String,
    pub base_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Catalog sources; order is the merge order.
    #[serde(default)]
    pub sources: Vec<SourceCfg>,
    /// Task/status endpoints. Empty means "same as `sources`".
    #[serde(default)]
    pub status_sources: Vec<SourceCfg>,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_query_debounce_ms")]
    pub query_debounce_ms: u64,
    #[serde(default = "default_recent_tasks_limit")]
    pub recent_tasks_limit: usize,
    #[serde(default)]
    pub task_name_filter: Option<String>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            status_sources: Vec::new(),
            page_size: default_page_size(),
            poll_interval_ms: default_poll_interval_ms(),
            query_debounce_ms: default_query_debounce_ms(),
            recent_tasks_limit: default_recent_tasks_limit(),
            task_name_filter: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl DashboardConfig {
    /// Load from an explicit path. TOML or JSON, picked by extension with a
    /// content-sniffing fallback.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading dashboard config from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let mut cfg = parse_config(&content, ext.as_str())?;
        cfg.sanitize();
        Ok(cfg)
    }

    /// Resolution order:
    /// 1) $DASHBOARD_CONFIG_PATH
    /// 2) config/dashboard.toml
    /// 3) config/dashboard.json
    /// 4) built-in defaults
    ///
    /// Env overrides for page size and poll interval are applied last.
    pub fn load_default() -> Result<Self> {
        let mut cfg = if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            Self::load_from(&pb)?
        } else {
            let toml_p = PathBuf::from("config/dashboard.toml");
            let json_p = PathBuf::from("config/dashboard.json");
            if toml_p.exists() {
                Self::load_from(&toml_p)?
            } else if json_p.exists() {
                Self::load_from(&json_p)?
            } else {
                Self::default()
            }
        };
        cfg.apply_env_overrides();
        cfg.sanitize();
        Ok(cfg)
    }

    fn apply_env_overrides(&mut self) {
        if let Some(v) = env_parse::<usize>(ENV_PAGE_SIZE) {
            self.page_size = v;
        }
        if let Some(v) = env_parse::<u64>(ENV_POLL_INTERVAL_MS) {
            self.poll_interval_ms = v;
        }
    }

    /// Clamp ranges and drop unusable source entries.
    fn sanitize(&mut self) {
        if self.page_size == 0 {
            self.page_size = default_page_size();
        }
        self.page_size = self.page_size.min(MAX_PAGE_SIZE);
        if self.recent_tasks_limit == 0 {
            self.recent_tasks_limit = default_recent_tasks_limit();
        }
        self.poll_interval_ms = clamp_interval(Duration::from_millis(self.poll_interval_ms))
            .as_millis() as u64;
        self.query_debounce_ms =
            clamp_debounce(self.query_debounce(), self.poll_interval()).as_millis() as u64;
        self.sources = clean_sources(std::mem::take(&mut self.sources));
        self.status_sources = clean_sources(std::mem::take(&mut self.status_sources));
        self.task_name_filter = self
            .task_name_filter
            .take()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn query_debounce(&self) -> Duration {
        Duration::from_millis(self.query_debounce_ms)
    }

    pub fn effective_status_sources(&self) -> &[SourceCfg] {
        if self.status_sources.is_empty() {
            &self.sources
        } else {
            &self.status_sources
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

fn parse_config(s: &str, hint_ext: &str) -> Result<DashboardConfig> {
    match hint_ext {
        "toml" => return toml::from_str(s).context("parsing dashboard TOML"),
        "json" => return serde_json::from_str(s).context("parsing dashboard JSON"),
        _ => {}
    }
    if let Ok(v) = serde_json::from_str(s) {
        return Ok(v);
    }
    toml::from_str(s).map_err(|_| anyhow!("unsupported dashboard config format"))
}

fn clean_sources(items: Vec<SourceCfg>) -> Vec<SourceCfg> {
    let mut out: Vec<SourceCfg> = Vec::with_capacity(items.len());
    for it in items {
        let name = it.name.trim();
        let url = it.base_url.trim();
        if name.is_empty() || url.is_empty() {
            tracing::warn!(target: "config", name, url, "skipping incomplete source entry");
            continue;
        }
        if out.iter().any(|s| s.name == name) {
            tracing::warn!(target: "config", name, "duplicate source name; keeping first");
            continue;
        }
        out.push(SourceCfg {
            name: name.to_string(),
            base_url: url.to_string(),
        });
    }
    out
}
