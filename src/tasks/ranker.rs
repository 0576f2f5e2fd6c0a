// src/tasks/ranker.rs
use std::cmp::Reverse;

use crate::model::{AutomationTask, TaskStatus};

pub const DEFAULT_RECENT_LIMIT: usize = 4;

/// Picks the tasks shown in the "recent activity" panel.
#[derive(Debug, Clone)]
pub struct TaskRanker {
    name_filter: Option<String>,
    limit: usize,
}

impl Default for TaskRanker {
    fn default() -> Self {
        Self::new(None, DEFAULT_RECENT_LIMIT)
    }
}

// Running first, then ended runs, then not-yet-run (scheduled or unknown).
fn status_rank(s: TaskStatus) -> u8 {
    match s {
        TaskStatus::Running => 0,
        TaskStatus::Completed | TaskStatus::Failed => 1,
        TaskStatus::Scheduled | TaskStatus::Unknown => 2,
    }
}

impl TaskRanker {
    /// `name_filter` is a case-insensitive substring; blank means no filter.
    pub fn new(name_filter: Option<String>, limit: usize) -> Self {
        let name_filter = name_filter
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());
        Self { name_filter, limit }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn matches(&self, task: &AutomationTask) -> bool {
        match &self.name_filter {
            Some(needle) => task.name.to_lowercase().contains(needle.as_str()),
            None => true,
        }
    }

    /// Filter, stable sort, truncate. Missing `finished` counts as 0.
    pub fn rank(&self, tasks: &[AutomationTask]) -> Vec<AutomationTask> {
        let mut out: Vec<AutomationTask> =
            tasks.iter().filter(|t| self.matches(t)).cloned().collect();
        out.sort_by_key(|t| (status_rank(t.status), Reverse(t.finished.unwrap_or(0))));
        out.truncate(self.limit);
        out
    }
}
