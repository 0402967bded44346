use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::domain::task::Task;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Throughput {
    pub date: NaiveDate,
    pub completed_tasks: usize,
}

/// Number of tasks closed per calendar day.
///
/// Only days on which something was observed are present; each key is one
/// historical day sample for the Monte Carlo forecaster.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThroughputDistribution {
    per_day: BTreeMap<NaiveDate, usize>,
}

impl ThroughputDistribution {
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let mut per_day = BTreeMap::new();
        for closed_at in tasks.iter().filter_map(|task| task.closed_at) {
            *per_day.entry(closed_at.date()).or_insert(0usize) += 1;
        }
        Self { per_day }
    }

    /// Builds a distribution from exported entries. Later entries for the same
    /// date replace earlier ones.
    pub fn from_entries(entries: &[Throughput]) -> Self {
        let per_day = entries
            .iter()
            .map(|entry| (entry.date, entry.completed_tasks))
            .collect();
        Self { per_day }
    }

    pub fn is_empty(&self) -> bool {
        self.per_day.is_empty()
    }

    pub fn len(&self) -> usize {
        self.per_day.len()
    }

    pub fn get(&self, date: NaiveDate) -> Option<usize> {
        self.per_day.get(&date).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, usize)> + '_ {
        self.per_day.iter().map(|(date, count)| (*date, *count))
    }

    /// Day counts in chronological order of their dates.
    pub fn day_samples(&self) -> Vec<usize> {
        self.per_day.values().copied().collect()
    }

    pub fn to_entries(&self) -> Vec<Throughput> {
        self.iter()
            .map(|(date, completed_tasks)| Throughput {
                date,
                completed_tasks,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{at, build_closed_task, on_date};

    #[test]
    fn counts_tasks_per_closing_day() {
        let tasks = vec![
            build_closed_task(at(2023, 12, 20, 9), None, at(2024, 1, 1, 9)),
            build_closed_task(at(2023, 12, 20, 9), None, at(2024, 1, 1, 12)),
            build_closed_task(at(2023, 12, 20, 9), None, at(2024, 1, 1, 23)),
            build_closed_task(at(2023, 12, 20, 9), None, at(2024, 1, 2, 10)),
            build_closed_task(at(2023, 12, 20, 9), None, at(2024, 1, 3, 8)),
            build_closed_task(at(2023, 12, 20, 9), None, at(2024, 1, 3, 16)),
        ];

        let distribution = ThroughputDistribution::from_tasks(&tasks);

        assert_eq!(distribution.len(), 3);
        assert_eq!(distribution.get(on_date(2024, 1, 1)), Some(3));
        assert_eq!(distribution.get(on_date(2024, 1, 2)), Some(1));
        assert_eq!(distribution.get(on_date(2024, 1, 3)), Some(2));
    }

    #[test]
    fn distinct_closing_days_each_count_once() {
        let tasks: Vec<Task> = (1..=5)
            .map(|day| build_closed_task(at(2024, 1, 1, 0), None, at(2024, 2, day, 10)))
            .collect();

        let distribution = ThroughputDistribution::from_tasks(&tasks);

        assert_eq!(distribution.len(), 5);
        assert!(distribution.iter().all(|(_, count)| count == 1));
    }

    #[test]
    fn open_tasks_are_ignored() {
        let mut open = build_closed_task(at(2024, 1, 1, 0), None, at(2024, 1, 2, 0));
        open.closed_at = None;

        let distribution = ThroughputDistribution::from_tasks(&[open]);

        assert!(distribution.is_empty());
        assert!(distribution.day_samples().is_empty());
    }

    #[test]
    fn entries_round_trip_in_date_order() {
        let entries = vec![
            Throughput {
                date: on_date(2026, 2, 10),
                completed_tasks: 3,
            },
            Throughput {
                date: on_date(2026, 2, 9),
                completed_tasks: 5,
            },
        ];

        let distribution = ThroughputDistribution::from_entries(&entries);

        assert_eq!(distribution.day_samples(), vec![5, 3]);
        assert_eq!(distribution.to_entries()[0].date, on_date(2026, 2, 9));
    }
}
