use chrono::{NaiveDate, NaiveDateTime};

use crate::domain::task::Task;

pub fn on_date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub fn at(year: i32, month: u32, day: u32, hour: u32) -> NaiveDateTime {
    on_date(year, month, day).and_hms_opt(hour, 0, 0).unwrap()
}

pub fn build_closed_task(
    created_at: NaiveDateTime,
    started_at: Option<NaiveDateTime>,
    closed_at: NaiveDateTime,
) -> Task {
    let mut task = Task::new();
    task.task_type = Some("Story".to_string());
    task.status = Some("Done".to_string());
    task.created_at = Some(created_at);
    task.started_at = started_at;
    task.closed_at = Some(closed_at);
    task
}

pub fn build_estimated_task(
    points: i64,
    created_at: NaiveDateTime,
    closed_at: NaiveDateTime,
) -> Task {
    let mut task = build_closed_task(created_at, None, closed_at);
    task.estimation = Some(points);
    task.description = Some(format!("Task worth {points} points"));
    task
}

/// One task per listed closing day, all created on 2024-01-01.
pub fn tasks_closed_on(days: &[NaiveDate]) -> Vec<Task> {
    days.iter()
        .map(|day| build_closed_task(at(2024, 1, 1, 0), None, day.and_hms_opt(12, 0, 0).unwrap()))
        .collect()
}
