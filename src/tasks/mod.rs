// src/tasks/mod.rs
pub mod poller;
pub mod ranker;

pub use poller::{PollerHandle, TaskPoller, TaskSnapshot};
pub use ranker::TaskRanker;

use metrics::{describe_counter, describe_gauge};
use once_cell::sync::OnceCell;

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("task_poll_ticks_total", "Completed task poll ticks.");
        describe_counter!(
            "task_poll_errors_total",
            "Failed task/supplier-status calls across poll ticks."
        );
        describe_gauge!(
            "task_poll_last_tick_ts",
            "Unix ts of the last completed task poll tick."
        );
    });
}
