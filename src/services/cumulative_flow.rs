use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::task_collection::TaskCollection;

/// Cumulative counts at the end of one day. `created >= started >= closed`
/// always holds, so the three values are the tops of the To Do, In Progress
/// and Done bands.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowDay {
    pub date: NaiveDate,
    pub created: usize,
    pub started: usize,
    pub closed: usize,
}

impl FlowDay {
    pub fn to_do(&self) -> usize {
        self.created - self.started
    }

    pub fn in_progress(&self) -> usize {
        self.started - self.closed
    }
}

/// One entry per calendar day from the first creation to the last closing.
///
/// A task without `started_at` counts as started on the day it closed.
pub fn cumulative_flow(collection: &TaskCollection) -> Vec<FlowDay> {
    let (Some(first), Some(last)) = (
        collection.first_creation_date(),
        collection.last_closing_date(),
    ) else {
        return Vec::new();
    };

    let mut created_per_day: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    let mut started_per_day: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    let mut closed_per_day: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for task in collection.tasks() {
        if let Some(created_at) = task.created_at {
            *created_per_day.entry(created_at.date()).or_default() += 1;
        }
        if let Some(started_at) = task.started_at.or(task.closed_at) {
            *started_per_day.entry(started_at.date()).or_default() += 1;
        }
        if let Some(closed_at) = task.closed_at {
            *closed_per_day.entry(closed_at.date()).or_default() += 1;
        }
    }

    let mut flow = Vec::new();
    let (mut created, mut started, mut closed) = (0, 0, 0);
    for date in first.date().iter_days().take_while(|date| *date <= last.date()) {
        created += created_per_day.get(&date).copied().unwrap_or(0);
        started += started_per_day.get(&date).copied().unwrap_or(0);
        closed += closed_per_day.get(&date).copied().unwrap_or(0);
        flow.push(FlowDay {
            date,
            created,
            started: started.min(created),
            closed: closed.min(started).min(created),
        });
    }
    flow
}
