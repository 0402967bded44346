//! Percentile helpers shared by forecasts and cycle-time statistics.
//!
//! All estimates interpolate linearly between the two closest ranks, the way
//! `numpy.percentile` does by default:
//!
//! - Empty input => `None` (or an empty summary).
//! - `percentile <= 0` => smallest value.
//! - `percentile >= 100` => largest value.
//! - Otherwise the rank is `percentile / 100 * (len - 1)` and the result is
//!   interpolated between the values at `floor(rank)` and `ceil(rank)`.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

/// Percentiles reported for every forecast and cycle-time summary.
pub const DEFAULT_PERCENTILES: [u8; 3] = [50, 85, 95];

/// Percentile -> estimated value.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(transparent)]
pub struct PercentileSummary<T> {
    values: BTreeMap<u8, T>,
}

impl<T: Copy> PercentileSummary<T> {
    pub fn get(&self, percentile: u8) -> Option<T> {
        self.values.get(&percentile).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u8, T)> + '_ {
        self.values.iter().map(|(p, v)| (*p, *v))
    }
}

impl<T> FromIterator<(u8, T)> for PercentileSummary<T> {
    fn from_iter<I: IntoIterator<Item = (u8, T)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Interpolated percentile of a slice that is already sorted in ascending
/// order.
pub fn interpolated_sorted(sorted_values: &[f64], percentile: f64) -> Option<f64> {
    let (lower, upper, fraction) = rank(sorted_values.len(), percentile)?;
    let low = sorted_values[lower];
    let high = sorted_values[upper];
    Some(low + (high - low) * fraction)
}

/// Plain numeric series, e.g. cycle times in days.
pub fn summarize_values(values: &[f64], percentiles: &[u8]) -> PercentileSummary<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    percentiles
        .iter()
        .filter_map(|p| interpolated_sorted(&sorted, *p as f64).map(|value| (*p, value)))
        .collect()
}

/// Finish dates of a count->date forecast: "p% chance of being done by".
///
/// A fractional day between two neighbouring dates is dropped, so the result
/// is always one of the whole days between them.
pub fn summarize_dates(dates: &[NaiveDate], percentiles: &[u8]) -> PercentileSummary<NaiveDate> {
    let mut sorted = dates.to_vec();
    sorted.sort();
    percentiles
        .iter()
        .filter_map(|p| {
            let (lower, upper, fraction) = rank(sorted.len(), *p as f64)?;
            let low = sorted[lower];
            let span = (sorted[upper] - low).num_days() as f64;
            let offset = (span * fraction).floor() as i64;
            low.checked_add_signed(chrono::Duration::days(offset))
                .map(|date| (*p, date))
        })
        .collect()
}

/// Task counts of a date->count forecast: "p% chance of completing at least".
///
/// Small counts are the likely outcome and large counts the optimistic tail,
/// so percentile `p` is read from the `(100 - p)`th rank of the raw outcomes.
pub fn summarize_task_counts(counts: &[usize], percentiles: &[u8]) -> PercentileSummary<f64> {
    let mut sorted: Vec<f64> = counts.iter().map(|count| *count as f64).collect();
    sorted.sort_by(|a, b| a.total_cmp(b));
    percentiles
        .iter()
        .filter_map(|p| {
            let inverted = 100.0 - (*p).min(100) as f64;
            interpolated_sorted(&sorted, inverted).map(|value| (*p, value))
        })
        .collect()
}

fn rank(len: usize, percentile: f64) -> Option<(usize, usize, f64)> {
    if len == 0 {
        return None;
    }
    if percentile <= 0.0 {
        return Some((0, 0, 0.0));
    }
    if percentile >= 100.0 {
        return Some((len - 1, len - 1, 0.0));
    }
    let position = (percentile / 100.0) * (len as f64 - 1.0);
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    Some((lower, upper, position - lower as f64))
}
