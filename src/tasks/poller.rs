// src/tasks/poller.rs
use chrono::{DateTime, Utc};
use metrics::{counter, gauge};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::model::{AutomationTask, SupplierIntegration};
use crate::source::{settle_all, SourceHealth, StatusSource};
use crate::tasks::ranker::TaskRanker;

pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(1);
pub const MAX_POLL_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

pub fn clamp_interval(d: Duration) -> Duration {
    d.clamp(MIN_POLL_INTERVAL, MAX_POLL_INTERVAL)
}

/// Result of one poll tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSnapshot {
    pub tick: u64,
    /// Ranked and truncated for the recent-activity panel.
    pub tasks: Vec<AutomationTask>,
    /// Task count before filtering/truncation.
    pub total_tasks: usize,
    pub suppliers: Vec<SupplierIntegration>,
    pub sources: Vec<SourceHealth>,
    pub polled_at: Option<DateTime<Utc>>,
}

pub struct TaskPoller {
    sources: Vec<Arc<dyn StatusSource>>,
    interval: Duration,
    ranker: TaskRanker,
}

impl TaskPoller {
    pub fn new(sources: Vec<Arc<dyn StatusSource>>, interval: Duration, ranker: TaskRanker) -> Self {
        super::ensure_metrics_described();
        Self {
            sources,
            interval: clamp_interval(interval),
            ranker,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Fetch tasks and supplier status from every source concurrently.
    /// Failed calls contribute empty lists.
    pub async fn poll_once(&self, tick: u64) -> TaskSnapshot {
        let name = |s: &Arc<dyn StatusSource>| s.name().to_string();
        let (tasks, suppliers) = tokio::join!(
            settle_all(&self.sources, "tasks", name, |s| s.fetch_tasks()),
            settle_all(&self.sources, "suppliers", name, |s| s.fetch_supplier_status()),
        );

        let mut sources: Vec<SourceHealth> = Vec::with_capacity(self.sources.len());
        for (t, s) in tasks.iter().zip(suppliers.iter()) {
            sources.push(SourceHealth {
                source: t.source.clone(),
                ok: t.is_ok() && s.is_ok(),
                error: t.error.clone().or_else(|| s.error.clone()),
            });
        }
        let errors = tasks.iter().filter(|o| !o.is_ok()).count()
            + suppliers.iter().filter(|o| !o.is_ok()).count();
        if errors > 0 {
            counter!("task_poll_errors_total").increment(errors as u64);
        }

        let all: Vec<AutomationTask> = tasks.into_iter().flat_map(|o| o.value).collect();
        let suppliers: Vec<SupplierIntegration> =
            suppliers.into_iter().flat_map(|o| o.value).collect();

        TaskSnapshot {
            tick,
            tasks: self.ranker.rank(&all),
            total_tasks: all.len(),
            suppliers,
            sources,
            polled_at: Some(Utc::now()),
        }
    }

    /// Start the fixed-interval loop. The first tick fires immediately.
    /// Dropping or stopping the handle ends the loop.
    pub fn spawn(self) -> PollerHandle {
        let cancel = CancellationToken::new();
        let (tx, rx) = watch::channel(TaskSnapshot::default());
        let token = cancel.clone();

        let join = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut tick: u64 = 0;
            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {}
                }
                tick += 1;

                // an in-flight fetch is dropped on teardown, never published
                let snap = tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    snap = self.poll_once(tick) => snap,
                };

                counter!("task_poll_ticks_total").increment(1);
                gauge!("task_poll_last_tick_ts").set(Utc::now().timestamp().max(0) as f64);
                tracing::debug!(
                    target: "tasks",
                    tick,
                    tasks = snap.total_tasks,
                    suppliers = snap.suppliers.len(),
                    "poll tick"
                );
                tx.send_replace(snap);
            }
            tracing::info!(target: "tasks", ticks = tick, "task poller stopped");
        });

        PollerHandle {
            cancel,
            rx,
            join: Some(join),
        }
    }
}

/// Owned poller lifetime. Cancels the loop when stopped or dropped.
pub struct PollerHandle {
    cancel: CancellationToken,
    rx: watch::Receiver<TaskSnapshot>,
    join: Option<JoinHandle<()>>,
}

impl PollerHandle {
    pub fn subscribe(&self) -> watch::Receiver<TaskSnapshot> {
        self.rx.clone()
    }

    pub fn latest(&self) -> TaskSnapshot {
        self.rx.borrow().clone()
    }

    /// Idempotent; a second call is a no-op.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Stop and wait for the loop to exit.
    pub async fn shutdown(mut self) {
        self.stop();
        if let Some(join) = self.join.take() {
            if let Err(e) = join.await {
                tracing::warn!(target: "tasks", error = %e, "task poller join failed");
            }
        }
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
