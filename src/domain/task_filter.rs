use chrono::NaiveDateTime;
use serde::Serialize;

use crate::domain::task::Task;
use crate::domain::task_collection::TaskCollection;

/// Selection criteria for the analysis population.
///
/// Every criterion left as `None` (or `false` for `has_estimation`) is not
/// applied. Structural consistency of the timestamps is always checked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaskFilter {
    pub created_until: Option<NaiveDateTime>,
    pub closed_since: Option<NaiveDateTime>,
    pub closed_until: Option<NaiveDateTime>,
    pub max_cycle_time: Option<i64>,
    pub has_estimation: bool,
    pub valid_types: Option<Vec<String>>,
}

impl TaskFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&self, tasks: &[Task]) -> TaskCollection {
        let selected: Vec<Task> = tasks
            .iter()
            .filter(|task| self.accepts(task))
            .cloned()
            .collect();
        tracing::debug!(
            total = tasks.len(),
            selected = selected.len(),
            "filtered analysis population"
        );
        TaskCollection::with_filter(selected, self.clone())
    }

    pub fn accepts(&self, task: &Task) -> bool {
        if !is_consistent(task) {
            return false;
        }
        // both present after the consistency check
        let (Some(created_at), Some(closed_at)) = (task.created_at, task.closed_at) else {
            return false;
        };

        if self.created_until.is_some_and(|until| created_at > until) {
            return false;
        }
        if self.closed_since.is_some_and(|since| closed_at < since) {
            return false;
        }
        if self.closed_until.is_some_and(|until| closed_at > until) {
            return false;
        }
        if let Some(max_cycle_time) = self.max_cycle_time {
            match task.cycle_time() {
                Some(cycle_time) if cycle_time <= max_cycle_time => {}
                _ => return false,
            }
        }
        if self.has_estimation && !task.has_estimation() {
            return false;
        }
        if let Some(valid_types) = &self.valid_types {
            match &task.task_type {
                Some(task_type) if valid_types.contains(task_type) => {}
                _ => return false,
            }
        }
        true
    }
}

/// `created_at <= started_at <= closed_at`, with `created_at` and `closed_at`
/// required.
fn is_consistent(task: &Task) -> bool {
    let (Some(created_at), Some(closed_at)) = (task.created_at, task.closed_at) else {
        return false;
    };
    if closed_at < created_at {
        return false;
    }
    match task.started_at {
        Some(started_at) => created_at <= started_at && started_at <= closed_at,
        None => true,
    }
}
