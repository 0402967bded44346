use chrono::NaiveDateTime;

use crate::domain::task::Task;
use crate::domain::task_filter::TaskFilter;

/// The analysis population, together with the filter that produced it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskCollection {
    tasks: Vec<Task>,
    filters: Option<TaskFilter>,
}

impl TaskCollection {
    pub fn new(tasks: Vec<Task>) -> Self {
        Self {
            tasks,
            filters: None,
        }
    }

    pub fn with_filter(tasks: Vec<Task>, filters: TaskFilter) -> Self {
        Self {
            tasks,
            filters: Some(filters),
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn filters(&self) -> Option<&TaskFilter> {
        self.filters.as_ref()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn is_estimated_only(&self) -> bool {
        self.filters.as_ref().is_some_and(|f| f.has_estimation)
    }

    pub fn first_creation_date(&self) -> Option<NaiveDateTime> {
        self.tasks.iter().filter_map(|task| task.created_at).min()
    }

    pub fn first_closing_date(&self) -> Option<NaiveDateTime> {
        self.tasks.iter().filter_map(|task| task.closed_at).min()
    }

    pub fn last_closing_date(&self) -> Option<NaiveDateTime> {
        self.tasks.iter().filter_map(|task| task.closed_at).max()
    }

    pub fn max_cycle_time(&self) -> Option<i64> {
        self.tasks.iter().filter_map(Task::cycle_time).max()
    }

    pub fn cycle_times(&self) -> Vec<i64> {
        self.tasks.iter().filter_map(Task::cycle_time).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{at, build_closed_task};

    #[test]
    fn empty_collection_has_no_aggregates() {
        let collection = TaskCollection::new(vec![]);
        assert_eq!(collection.first_creation_date(), None);
        assert_eq!(collection.first_closing_date(), None);
        assert_eq!(collection.last_closing_date(), None);
        assert_eq!(collection.max_cycle_time(), None);
        assert!(!collection.is_estimated_only());
    }

    #[test]
    fn aggregates_skip_missing_fields() {
        let mut open = build_closed_task(at(2023, 12, 1, 9), None, at(2024, 1, 1, 9));
        open.closed_at = None;
        let collection = TaskCollection::new(vec![
            build_closed_task(at(2024, 1, 1, 9), None, at(2024, 1, 10, 9)),
            build_closed_task(at(2024, 1, 2, 9), Some(at(2024, 1, 3, 9)), at(2024, 1, 4, 9)),
            open,
        ]);

        assert_eq!(collection.first_creation_date(), Some(at(2023, 12, 1, 9)));
        assert_eq!(collection.first_closing_date(), Some(at(2024, 1, 4, 9)));
        assert_eq!(collection.last_closing_date(), Some(at(2024, 1, 10, 9)));
        assert_eq!(collection.max_cycle_time(), Some(10));
        assert_eq!(collection.cycle_times(), vec![10, 2]);
    }
}
