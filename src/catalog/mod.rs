// src/catalog/mod.rs
pub mod coordinator;
pub mod filter;
pub mod overview;

pub use coordinator::{merge_rows, AggregationCoordinator, LoadOutcome, MergedPage, PageView};
pub use filter::{FilterState, QueryDebouncer};
pub use overview::{OverviewAggregator, OverviewSnapshot};

use metrics::{describe_counter, describe_histogram};
use once_cell::sync::OnceCell;

/// One-time metrics registration (so series show up on /metrics).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "catalog_merge_cycles_total",
            "Merge cycles run across all catalog sources."
        );
        describe_counter!(
            "catalog_stale_responses_total",
            "Page responses discarded because a newer request or filter superseded them."
        );
        describe_counter!(
            "catalog_overview_refresh_total",
            "Overview + filter vocabulary refreshes."
        );
        describe_counter!(
            "source_errors_total",
            "Soft failures of individual source calls, by source and operation."
        );
        describe_histogram!("catalog_merge_ms", "Merge cycle wall time in milliseconds.");
    });
}
