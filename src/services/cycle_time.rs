use serde::Serialize;

use crate::domain::task_collection::TaskCollection;
use crate::services::percentiles::{summarize_values, PercentileSummary, DEFAULT_PERCENTILES};

/// Cycle-time distribution of the analysis population.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct CycleTimeSummary {
    pub tasks: usize,
    pub estimated_only: bool,
    pub min_days: i64,
    pub max_days: i64,
    /// Percentile -> days within which that share of tasks was completed.
    pub percentiles: PercentileSummary<f64>,
}

impl CycleTimeSummary {
    /// `None` when no task in the collection has a cycle time.
    pub fn from_collection(collection: &TaskCollection) -> Option<Self> {
        let cycle_times = collection.cycle_times();
        let min_days = *cycle_times.iter().min()?;
        let max_days = *cycle_times.iter().max()?;
        let values: Vec<f64> = cycle_times.iter().map(|days| *days as f64).collect();
        Some(Self {
            tasks: cycle_times.len(),
            estimated_only: collection.is_estimated_only(),
            min_days,
            max_days,
            percentiles: summarize_values(&values, &DEFAULT_PERCENTILES),
        })
    }
}

/// (estimation, cycle time) of every task with a non-zero estimation and a
/// non-zero cycle time.
pub fn estimation_pairs(collection: &TaskCollection) -> Vec<(f64, f64)> {
    collection
        .tasks()
        .iter()
        .filter(|task| task.has_estimation())
        .filter_map(|task| {
            let cycle_time = task.cycle_time().filter(|days| *days != 0)?;
            let estimation = task.estimation?;
            Some((estimation as f64, cycle_time as f64))
        })
        .collect()
}

/// Least-squares fit of cycle time (days) against estimation (points).
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct EstimationRelationship {
    pub points: usize,
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
}

impl EstimationRelationship {
    /// Uses tasks with a non-zero estimation and a non-zero cycle time.
    /// `None` with fewer than two such tasks or when every estimation is the
    /// same.
    pub fn from_collection(collection: &TaskCollection) -> Option<Self> {
        let pairs = estimation_pairs(collection);
        if pairs.len() < 2 {
            return None;
        }

        let n = pairs.len() as f64;
        let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / n;
        let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / n;
        let (mut sxx, mut sxy, mut syy) = (0.0, 0.0, 0.0);
        for (x, y) in &pairs {
            sxx += (x - mean_x) * (x - mean_x);
            sxy += (x - mean_x) * (y - mean_y);
            syy += (y - mean_y) * (y - mean_y);
        }
        if sxx == 0.0 {
            return None;
        }

        let slope = sxy / sxx;
        let r_squared = if syy == 0.0 {
            0.0
        } else {
            (sxy * sxy) / (sxx * syy)
        };
        Some(Self {
            points: pairs.len(),
            slope,
            intercept: mean_y - slope * mean_x,
            r_squared,
        })
    }
}
