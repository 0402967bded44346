use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::domain::task_collection::TaskCollection;
use crate::domain::throughput::{Throughput, ThroughputDistribution};
use crate::services::forecast_types::{
    FinishDateForecast, FinishDateReport, HistoryRange, TaskCountForecast, TaskCountReport,
};
use crate::services::monte_carlo::{
    ForecastError, ForecastMode, ForecastOutcomes, ForecastSummary, MonteCarloForecaster,
};
use crate::services::percentiles::DEFAULT_PERCENTILES;

/// Historical throughput a forecast samples from.
#[derive(Debug, Clone)]
pub struct ForecastInput {
    pub distribution: ThroughputDistribution,
    pub history: Option<HistoryRange>,
}

impl ForecastInput {
    pub fn from_collection(collection: &TaskCollection) -> Self {
        Self {
            distribution: ThroughputDistribution::from_tasks(collection.tasks()),
            history: history_range(collection),
        }
    }

    /// From an exported throughput file.
    pub fn from_throughput(entries: &[Throughput]) -> Self {
        let from = entries.iter().map(|entry| entry.date).min();
        let to = entries.iter().map(|entry| entry.date).max();
        let history = from.zip(to).map(|(from, to)| HistoryRange {
            from: format_date(from),
            to: format_date(to),
        });
        Self {
            distribution: ThroughputDistribution::from_entries(entries),
            history,
        }
    }
}

/// Seeded generator when `seed` is given, otherwise one seeded from the OS.
pub fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

pub fn forecast_finish_date<R: Rng + ?Sized>(
    input: &ForecastInput,
    target_task_count: usize,
    iterations: usize,
    today: NaiveDate,
    rng: &mut R,
) -> Result<FinishDateForecast, ForecastError> {
    let forecaster = MonteCarloForecaster::new(&input.distribution)?;
    let mode = ForecastMode::FinishDate { target_task_count };
    let outcomes = forecaster.run(mode, iterations, today, rng)?;

    let (ForecastSummary::FinishDates(summary), ForecastOutcomes::FinishDates(outcomes)) =
        (outcomes.summarize(&DEFAULT_PERCENTILES), outcomes)
    else {
        return Err(mismatched_outcomes(mode));
    };
    let percentiles = summary
        .iter()
        .map(|(percentile, date)| (percentile, format_date(date)))
        .collect();

    Ok(FinishDateForecast {
        report: FinishDateReport {
            data_source: String::new(),
            start_date: format_date(today),
            iterations,
            target_task_count,
            history: input.history.clone(),
            percentiles,
        },
        outcomes,
    })
}

pub fn forecast_tasks_done_by<R: Rng + ?Sized>(
    input: &ForecastInput,
    target_date: NaiveDate,
    iterations: usize,
    today: NaiveDate,
    rng: &mut R,
) -> Result<TaskCountForecast, ForecastError> {
    let forecaster = MonteCarloForecaster::new(&input.distribution)?;
    let mode = ForecastMode::TasksDoneBy { target_date };
    let outcomes = forecaster.run(mode, iterations, today, rng)?;

    let (ForecastSummary::TaskCounts(summary), ForecastOutcomes::TaskCounts(outcomes)) =
        (outcomes.summarize(&DEFAULT_PERCENTILES), outcomes)
    else {
        return Err(mismatched_outcomes(mode));
    };
    let percentiles = summary
        .iter()
        .map(|(percentile, tasks)| (percentile, tasks.max(0.0) as usize))
        .collect();

    Ok(TaskCountForecast {
        report: TaskCountReport {
            data_source: String::new(),
            start_date: format_date(today),
            iterations,
            target_date: format_date(target_date),
            history: input.history.clone(),
            percentiles,
        },
        outcomes,
    })
}

/// `today` plus `days`, rejecting horizons outside the calendar.
pub fn date_after(today: NaiveDate, days: i64) -> Result<NaiveDate, ForecastError> {
    Duration::try_days(days)
        .and_then(|offset| today.checked_add_signed(offset))
        .ok_or_else(|| {
            ForecastError::InvalidArgument(format!("{days} days from {today} is out of range"))
        })
}

fn mismatched_outcomes(mode: ForecastMode) -> ForecastError {
    ForecastError::InvalidArgument(format!("outcomes do not match {mode:?}"))
}

/// Closing dates the forecast history spans.
pub fn history_range(collection: &TaskCollection) -> Option<HistoryRange> {
    let from = collection.first_closing_date()?;
    let to = collection.last_closing_date()?;
    Some(HistoryRange {
        from: format_date(from.date()),
        to: format_date(to.date()),
    })
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
