use chrono::NaiveDate;
use rand::Rng;
use rand::seq::SliceRandom;
use thiserror::Error;

use crate::domain::throughput::ThroughputDistribution;
use crate::services::percentiles::{summarize_dates, summarize_task_counts, PercentileSummary};

const PROGRESS_INTERVAL: usize = 1000;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ForecastError {
    #[error("throughput distribution is empty")]
    EmptyDistribution,
    #[error("throughput distribution has no nonzero days")]
    ZeroThroughput,
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// What a forecast is asked to answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForecastMode {
    /// When will `target_task_count` more tasks be finished?
    FinishDate { target_task_count: usize },
    /// How many tasks will be finished before `target_date`?
    TasksDoneBy { target_date: NaiveDate },
}

/// Raw trial outcomes of one batch, in trial order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForecastOutcomes {
    FinishDates(Vec<NaiveDate>),
    TaskCounts(Vec<usize>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ForecastSummary {
    FinishDates(PercentileSummary<NaiveDate>),
    TaskCounts(PercentileSummary<f64>),
}

impl ForecastOutcomes {
    pub fn len(&self) -> usize {
        match self {
            ForecastOutcomes::FinishDates(dates) => dates.len(),
            ForecastOutcomes::TaskCounts(counts) => counts.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Task counts use inverted percentiles, finish dates the direct ones.
    pub fn summarize(&self, percentiles: &[u8]) -> ForecastSummary {
        match self {
            ForecastOutcomes::FinishDates(dates) => {
                ForecastSummary::FinishDates(summarize_dates(dates, percentiles))
            }
            ForecastOutcomes::TaskCounts(counts) => {
                ForecastSummary::TaskCounts(summarize_task_counts(counts, percentiles))
            }
        }
    }
}

/// Bootstrap forecaster: every simulated day behaves like one historical day
/// drawn uniformly at random from the distribution.
#[derive(Debug)]
pub struct MonteCarloForecaster {
    day_samples: Vec<usize>,
}

impl MonteCarloForecaster {
    pub fn new(distribution: &ThroughputDistribution) -> Result<Self, ForecastError> {
        if distribution.is_empty() {
            return Err(ForecastError::EmptyDistribution);
        }
        Ok(Self {
            day_samples: distribution.day_samples(),
        })
    }

    pub fn run<R: Rng + ?Sized>(
        &self,
        mode: ForecastMode,
        num_trials: usize,
        today: NaiveDate,
        rng: &mut R,
    ) -> Result<ForecastOutcomes, ForecastError> {
        match mode {
            ForecastMode::FinishDate { target_task_count } => self
                .forecast_finish_date(target_task_count, num_trials, today, rng)
                .map(ForecastOutcomes::FinishDates),
            ForecastMode::TasksDoneBy { target_date } => self
                .forecast_tasks_done_by(target_date, num_trials, today, rng)
                .map(ForecastOutcomes::TaskCounts),
        }
    }

    pub fn forecast_finish_date<R: Rng + ?Sized>(
        &self,
        target_task_count: usize,
        num_trials: usize,
        today: NaiveDate,
        rng: &mut R,
    ) -> Result<Vec<NaiveDate>, ForecastError> {
        validate_trials(num_trials)?;
        if target_task_count == 0 {
            return Err(ForecastError::InvalidArgument(
                "target task count must be greater than zero".to_string(),
            ));
        }
        if self.day_samples.iter().all(|count| *count == 0) {
            return Err(ForecastError::ZeroThroughput);
        }

        tracing::info!(
            num_trials,
            target_task_count,
            "running finish date simulations"
        );
        let mut outcomes = Vec::with_capacity(num_trials);
        for trial in 0..num_trials {
            outcomes.push(self.simulate_finish_date(target_task_count, today, rng));
            log_progress(trial + 1, num_trials);
        }
        Ok(outcomes)
    }

    pub fn forecast_tasks_done_by<R: Rng + ?Sized>(
        &self,
        target_date: NaiveDate,
        num_trials: usize,
        today: NaiveDate,
        rng: &mut R,
    ) -> Result<Vec<usize>, ForecastError> {
        validate_trials(num_trials)?;

        tracing::info!(num_trials, %target_date, "running task count simulations");
        let mut outcomes = Vec::with_capacity(num_trials);
        for trial in 0..num_trials {
            outcomes.push(self.simulate_tasks_done_by(target_date, today, rng));
            log_progress(trial + 1, num_trials);
        }
        Ok(outcomes)
    }

    fn simulate_finish_date<R: Rng + ?Sized>(
        &self,
        target_task_count: usize,
        today: NaiveDate,
        rng: &mut R,
    ) -> NaiveDate {
        let mut remaining = target_task_count;
        let mut date = today;
        while remaining > 0 {
            remaining = remaining.saturating_sub(self.sample_day(rng));
            date = next_day(date);
        }
        date
    }

    fn simulate_tasks_done_by<R: Rng + ?Sized>(
        &self,
        target_date: NaiveDate,
        today: NaiveDate,
        rng: &mut R,
    ) -> usize {
        let mut done = 0;
        let mut date = today;
        while date < target_date {
            done += self.sample_day(rng);
            date = next_day(date);
        }
        done
    }

    fn sample_day<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        // non-empty, checked in `new`
        self.day_samples.choose(rng).copied().unwrap_or(0)
    }
}

fn validate_trials(num_trials: usize) -> Result<(), ForecastError> {
    if num_trials == 0 {
        return Err(ForecastError::InvalidArgument(
            "number of trials must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

fn next_day(date: NaiveDate) -> NaiveDate {
    date.succ_opt().unwrap_or(NaiveDate::MAX)
}

fn log_progress(completed: usize, total: usize) {
    if completed % PROGRESS_INTERVAL == 0 || completed == total {
        tracing::debug!(completed, total, "simulation progress");
    }
}
