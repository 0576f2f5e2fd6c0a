// src/model.rs
//! Entities exchanged with the supplier integrations and published upward to
//! presentation code. Everything here is ephemeral: re-fetched on every poll
//! or reload tick, never persisted.

use serde::{Deserialize, Deserializer, Serialize};

/// One catalog line as reported by a single source.
/// Identity is `(supplier, sku)`; uniqueness is assumed, not enforced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogRow {
    pub sku: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub supplier: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub stock: i64,
    #[serde(default)]
    pub status: String,
}

/// Summary counters for one supplier card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverviewEntry {
    pub supplier: String,
    #[serde(default)]
    pub active: i64,
    #[serde(default)]
    pub last_updated: String,
}

/// Filter vocabulary. Kept as vectors: concatenation across sources keeps
/// duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOptions {
    #[serde(default, deserialize_with = "null_as_default")]
    pub brands: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub suppliers: Vec<String>,
}

impl FilterOptions {
    /// Appends `other` after `self`, preserving order and duplicates.
    pub fn extend(&mut self, other: FilterOptions) {
        self.brands.extend(other.brands);
        self.suppliers.extend(other.suppliers);
    }
}

/// Query sent to every source. `start` is the same numeric offset for every
/// source, not a global offset into the merged list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageRequest {
    pub start: usize,
    pub limit: usize,
    pub q: String,
    pub brand: String,
    pub supplier: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Running,
    Completed,
    Failed,
    Scheduled,
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutomationTask {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub task_type: String,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default, deserialize_with = "de_progress")]
    pub progress: u8,
    #[serde(default)]
    pub supplier: String,
    /// Unix seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started: Option<i64>,
    /// Unix seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished: Option<i64>,
    #[serde(
        rename = "nextRun",
        default,
        deserialize_with = "de_blank_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub next_run: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntegrationStatus {
    Active,
    Inactive,
    Error,
    Syncing,
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplierIntegration {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub integration_type: String,
    #[serde(default)]
    pub status: IntegrationStatus,
    #[serde(default)]
    pub last_sync: String,
    #[serde(default)]
    pub item_count: i64,
    #[serde(default)]
    pub locations: i64,
}

/// `null` and absent both mean "empty" on the wire.
pub(crate) fn null_as_default<'de, D, T>(de: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(de)?.unwrap_or_default())
}

// Backends report progress as a float or an int; anything outside 0..=100 is clamped.
fn de_progress<'de, D>(de: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<f64>::deserialize(de)?.unwrap_or(0.0);
    if raw.is_nan() {
        return Ok(0);
    }
    Ok(raw.clamp(0.0, 100.0).round() as u8)
}

fn de_blank_as_none<'de, D>(de: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(de)?;
    Ok(raw.filter(|s| !s.trim().is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_from_backend_shape() {
        let json = r#"{
            "id": "a1", "name": "Keystone Inventory Sync", "supplier": "Keystone",
            "status": "completed", "progress": 100, "nextRun": "",
            "started": 1700000000, "finished": 1700000042
        }"#;
        let t: AutomationTask = serde_json::from_str(json).unwrap();
        assert_eq!(t.status, TaskStatus::Completed);
        assert_eq!(t.finished, Some(1_700_000_042));
        assert_eq!(t.next_run, None);
        assert_eq!(t.task_type, "");
    }

    #[test]
    fn unknown_status_and_wild_progress_do_not_fail() {
        let json = r#"{"id": "x", "status": "paused", "progress": 250.7}"#;
        let t: AutomationTask = serde_json::from_str(json).unwrap();
        assert_eq!(t.status, TaskStatus::Unknown);
        assert_eq!(t.progress, 100);

        let json = r#"{"id": "y", "progress": -3}"#;
        let t: AutomationTask = serde_json::from_str(json).unwrap();
        assert_eq!(t.progress, 0);
    }

    #[test]
    fn supplier_integration_uses_camel_case() {
        let json = r#"{"id":"ks","name":"Keystone","type":"ftp","status":"syncing",
                       "lastSync":"2024-05-01T10:00:00Z","itemCount":1200,"locations":3}"#;
        let s: SupplierIntegration = serde_json::from_str(json).unwrap();
        assert_eq!(s.status, IntegrationStatus::Syncing);
        assert_eq!(s.item_count, 1200);
        assert_eq!(s.integration_type, "ftp");
    }

    #[test]
    fn filter_options_extend_keeps_duplicates() {
        let mut a = FilterOptions {
            brands: vec!["Bosch".into()],
            suppliers: vec!["Keystone".into()],
        };
        a.extend(FilterOptions {
            brands: vec!["Bosch".into(), "Denso".into()],
            suppliers: vec![],
        });
        assert_eq!(a.brands, vec!["Bosch", "Bosch", "Denso"]);
        assert_eq!(a.suppliers, vec!["Keystone"]);
    }
}
