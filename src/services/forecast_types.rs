use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::services::cycle_time::{CycleTimeSummary, EstimationRelationship};

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct HistoryRange {
    pub from: String,
    pub to: String,
}

/// "When will `target_task_count` tasks be finished?"
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct FinishDateReport {
    pub data_source: String,
    pub start_date: String,
    pub iterations: usize,
    pub target_task_count: usize,
    pub history: Option<HistoryRange>,
    /// Percentile -> date by which the tasks are done with that confidence.
    pub percentiles: BTreeMap<u8, String>,
}

/// "How many tasks will be finished by `target_date`?"
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct TaskCountReport {
    pub data_source: String,
    pub start_date: String,
    pub iterations: usize,
    pub target_date: String,
    pub history: Option<HistoryRange>,
    /// Percentile -> tasks done at least, with that confidence.
    pub percentiles: BTreeMap<u8, usize>,
}

#[derive(Serialize, Debug, Clone)]
pub struct FinishDateForecast {
    pub report: FinishDateReport,
    pub outcomes: Vec<NaiveDate>,
}

#[derive(Serialize, Debug, Clone)]
pub struct TaskCountForecast {
    pub report: TaskCountReport,
    pub outcomes: Vec<usize>,
}

/// Everything `analyze` computed, written as `summary.yaml`.
#[derive(Serialize, Debug, Clone, Default)]
pub struct AnalysisSummary {
    pub data_source: String,
    pub tasks: usize,
    pub history: Option<HistoryRange>,
    pub cycle_time: Option<CycleTimeSummary>,
    pub estimation_relationship: Option<EstimationRelationship>,
    pub finish_date: Option<FinishDateReport>,
    pub task_count: Option<TaskCountReport>,
    pub reports: Vec<String>,
}
