use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use thiserror::Error;

use crate::domain::task_collection::TaskCollection;
use crate::services::cumulative_flow::cumulative_flow;
use crate::services::cumulative_flow_plot::{write_cumulative_flow_png, ChartError};
use crate::services::cycle_time::{CycleTimeSummary, EstimationRelationship};
use crate::services::cycle_time_plot::{write_cycle_time_scatter_png, write_estimation_scatter_png};
use crate::services::forecast_types::{AnalysisSummary, FinishDateForecast, TaskCountForecast};
use crate::services::forecasting::{
    date_after, forecast_finish_date, forecast_tasks_done_by, format_date, history_range,
    seeded_rng, ForecastInput,
};
use crate::services::histogram::{write_histogram_png, HistogramChart, HistogramError};
use crate::services::monte_carlo::ForecastError;
use crate::services::percentiles::DEFAULT_PERCENTILES;

pub const SUMMARY_FILE: &str = "summary.yaml";

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("failed to write report: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Histogram(#[from] HistogramError),
    #[error(transparent)]
    Chart(#[from] ChartError),
    #[error(transparent)]
    Forecast(#[from] ForecastError),
    #[error("failed to serialize summary: {0}")]
    Summary(#[from] serde_yaml::Error),
    #[error("no task has a cycle time")]
    NoCycleTimes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSettings {
    pub iterations: usize,
    pub num_tasks: usize,
    pub next_days: i64,
    pub today: NaiveDate,
    pub seed: Option<u64>,
    /// Label every point of the cycle time scatter plot.
    pub show_labels: bool,
}

/// Writes every report of one analysis run into a single folder.
pub struct ReportGenerator {
    output_dir: PathBuf,
    data_source: String,
    settings: ReportSettings,
}

impl ReportGenerator {
    pub fn new(output_dir: PathBuf, data_source: &str, settings: ReportSettings) -> Self {
        Self {
            output_dir,
            data_source: data_source.to_string(),
            settings,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Runs all reports. A failing report is logged and skipped; only
    /// creating the folder or writing the summary aborts the run.
    pub fn generate(&self, collection: &TaskCollection) -> Result<AnalysisSummary, ReportError> {
        fs::create_dir_all(&self.output_dir)?;
        tracing::info!(
            output_dir = %self.output_dir.display(),
            tasks = collection.len(),
            "generating reports"
        );

        let mut summary = AnalysisSummary {
            data_source: self.data_source.clone(),
            tasks: collection.len(),
            history: history_range(collection),
            ..AnalysisSummary::default()
        };

        match self.cycle_time_report(collection) {
            Ok((file, cycle_time)) => {
                summary.cycle_time = Some(cycle_time);
                summary.reports.push(file);
            }
            Err(e) => skip_report("cycle time histogram", &e),
        }

        match self.cycle_time_scatter_report(collection) {
            Ok(file) => summary.reports.push(file),
            Err(e) => skip_report("cycle time scatter plot", &e),
        }

        summary.estimation_relationship = EstimationRelationship::from_collection(collection);
        if summary.estimation_relationship.is_none() {
            tracing::warn!("no estimation relationship: not enough estimated tasks");
        }
        match self.estimation_report(collection, summary.estimation_relationship.as_ref()) {
            Ok(file) => summary.reports.push(file),
            Err(e) => skip_report("cycle time vs estimation", &e),
        }

        let input = ForecastInput::from_collection(collection);
        match self.finish_date_report(&input) {
            Ok((file, forecast)) => {
                summary.finish_date = Some(forecast.report);
                summary.reports.push(file);
            }
            Err(e) => skip_report("finish date forecast", &e),
        }

        match self.task_count_report(&input) {
            Ok((file, forecast)) => {
                summary.task_count = Some(forecast.report);
                summary.reports.push(file);
            }
            Err(e) => skip_report("task count forecast", &e),
        }

        match self.cumulative_flow_report(collection) {
            Ok(file) => summary.reports.push(file),
            Err(e) => skip_report("cumulative flow diagram", &e),
        }

        let summary_file = fs::File::create(self.output_dir.join(SUMMARY_FILE))?;
        serde_yaml::to_writer(summary_file, &summary)?;
        Ok(summary)
    }

    fn cycle_time_report(
        &self,
        collection: &TaskCollection,
    ) -> Result<(String, CycleTimeSummary), ReportError> {
        let summary =
            CycleTimeSummary::from_collection(collection).ok_or(ReportError::NoCycleTimes)?;
        let file = "cycle_times_distribution_plot.png".to_string();
        write_cycle_time_histogram(&self.output_dir.join(&file), collection, &summary)?;
        Ok((file, summary))
    }

    fn cycle_time_scatter_report(
        &self,
        collection: &TaskCollection,
    ) -> Result<String, ReportError> {
        let file = "cycle_times_scatter_plot.png".to_string();
        write_cycle_time_scatter_png(
            &self.output_dir.join(&file),
            collection,
            self.settings.show_labels,
        )?;
        Ok(file)
    }

    fn estimation_report(
        &self,
        collection: &TaskCollection,
        relationship: Option<&EstimationRelationship>,
    ) -> Result<String, ReportError> {
        let file = "cycle_time_vs_story_points.png".to_string();
        write_estimation_scatter_png(&self.output_dir.join(&file), collection, relationship)?;
        Ok(file)
    }

    fn finish_date_report(
        &self,
        input: &ForecastInput,
    ) -> Result<(String, FinishDateForecast), ReportError> {
        let mut rng = seeded_rng(self.settings.seed);
        let mut forecast = forecast_finish_date(
            input,
            self.settings.num_tasks,
            self.settings.iterations,
            self.settings.today,
            &mut rng,
        )?;
        forecast.report.data_source = self.data_source.clone();
        let file = format!(
            "monte_carlo_when_will_be_finished_plot_{}.png",
            self.settings.num_tasks
        );
        write_finish_date_histogram(&self.output_dir.join(&file), &forecast, self.settings.today)?;
        Ok((file, forecast))
    }

    fn task_count_report(
        &self,
        input: &ForecastInput,
    ) -> Result<(String, TaskCountForecast), ReportError> {
        let mut rng = seeded_rng(self.settings.seed);
        let target_date = date_after(self.settings.today, self.settings.next_days)?;
        let mut forecast = forecast_tasks_done_by(
            input,
            target_date,
            self.settings.iterations,
            self.settings.today,
            &mut rng,
        )?;
        forecast.report.data_source = self.data_source.clone();
        let file = format!(
            "monte_carlo_how_many_done_plot_{}.png",
            self.settings.next_days
        );
        write_task_count_histogram(&self.output_dir.join(&file), &forecast)?;
        Ok((file, forecast))
    }

    fn cumulative_flow_report(&self, collection: &TaskCollection) -> Result<String, ReportError> {
        let file = "cumulative_flow_diagram.png".to_string();
        write_cumulative_flow_png(&self.output_dir.join(&file), &cumulative_flow(collection))?;
        Ok(file)
    }
}

/// `<base>/<dataset stem>/<first creation>-<last closing>`.
pub fn default_output_dir(base: &Path, dataset: &Path, collection: &TaskCollection) -> PathBuf {
    let stem = dataset
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "dataset".to_string());
    let first = collection
        .first_creation_date()
        .map(|date| format_date(date.date()))
        .unwrap_or_else(|| "none".to_string());
    let last = collection
        .last_closing_date()
        .map(|date| format_date(date.date()))
        .unwrap_or_else(|| "none".to_string());
    base.join(stem).join(format!("{first}-{last}"))
}

pub fn write_cycle_time_histogram(
    output_path: &Path,
    collection: &TaskCollection,
    summary: &CycleTimeSummary,
) -> Result<(), HistogramError> {
    let values: Vec<f64> = collection.cycle_times().iter().map(|days| *days as f64).collect();
    let caption = if summary.estimated_only {
        "Cycle Time Distribution (Estimated Stories/Tasks)"
    } else {
        "Cycle Time Distribution"
    };
    let chart = HistogramChart {
        caption,
        x_desc: "Cycle time in days",
        markers: summary.percentiles.iter().collect(),
    };
    write_histogram_png(output_path, &values, &chart, &|value| format!("{value:.0}"))
}

/// Finish dates are plotted as days after `today`.
pub fn write_finish_date_histogram(
    output_path: &Path,
    forecast: &FinishDateForecast,
    today: NaiveDate,
) -> Result<(), HistogramError> {
    let offset = |date: NaiveDate| (date - today).num_days() as f64;
    let values: Vec<f64> = forecast.outcomes.iter().map(|date| offset(*date)).collect();
    let markers = DEFAULT_PERCENTILES
        .iter()
        .filter_map(|percentile| {
            let date = forecast.report.percentiles.get(percentile)?;
            let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
            Some((*percentile, offset(date)))
        })
        .collect();
    let caption = format!(
        "When will {} tasks be finished? ({} simulations)",
        forecast.report.target_task_count, forecast.report.iterations
    );
    let chart = HistogramChart {
        caption: &caption,
        x_desc: "Finish date",
        markers,
    };
    write_histogram_png(output_path, &values, &chart, &|value| {
        date_after(today, value.round() as i64)
            .map(format_date)
            .unwrap_or_default()
    })
}

pub fn write_task_count_histogram(
    output_path: &Path,
    forecast: &TaskCountForecast,
) -> Result<(), HistogramError> {
    let values: Vec<f64> = forecast.outcomes.iter().map(|count| *count as f64).collect();
    let markers = forecast
        .report
        .percentiles
        .iter()
        .map(|(percentile, tasks)| (*percentile, *tasks as f64))
        .collect();
    let caption = format!(
        "How many tasks will be done by {}? ({} simulations)",
        forecast.report.target_date, forecast.report.iterations
    );
    let chart = HistogramChart {
        caption: &caption,
        x_desc: "Tasks done",
        markers,
    };
    write_histogram_png(output_path, &values, &chart, &|value| format!("{value:.0}"))
}

fn skip_report(name: &str, error: &ReportError) {
    tracing::warn!(report = name, "skipping report: {error}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::task_filter::TaskFilter;
    use crate::test_support::{at, build_closed_task, on_date};
    use assert_fs::prelude::*;
    use predicates::prelude::*;

    fn settings() -> ReportSettings {
        ReportSettings {
            iterations: 200,
            num_tasks: 10,
            next_days: 14,
            today: on_date(2024, 5, 1),
            seed: Some(7),
            show_labels: true,
        }
    }

    fn collection() -> TaskCollection {
        let mut tasks = vec![
            build_closed_task(at(2024, 4, 1, 9), Some(at(2024, 4, 2, 9)), at(2024, 4, 3, 17)),
            build_closed_task(at(2024, 4, 2, 9), None, at(2024, 4, 8, 10)),
            build_closed_task(at(2024, 4, 3, 9), Some(at(2024, 4, 5, 9)), at(2024, 4, 9, 12)),
            build_closed_task(at(2024, 4, 4, 9), Some(at(2024, 4, 4, 9)), at(2024, 4, 9, 15)),
        ];
        for (task, points) in tasks.iter_mut().zip([1, 3, 5, 3]) {
            task.estimation = Some(points);
        }
        TaskFilter::new().apply(&tasks)
    }

    #[test]
    fn default_output_dir_uses_dataset_and_history_dates() {
        let dir =
            default_output_dir(Path::new("output"), Path::new("data/board.json"), &collection());
        assert_eq!(dir, PathBuf::from("output/board/2024-04-01-2024-04-09"));
    }

    #[test]
    fn generate_writes_every_report_and_summary() {
        let temp = assert_fs::TempDir::new().unwrap();
        let generator = ReportGenerator::new(temp.path().join("run"), "board.json", settings());

        let summary = generator.generate(&collection()).unwrap();

        assert_eq!(summary.tasks, 4);
        assert_eq!(summary.reports.len(), 6);
        assert!(summary.reports.contains(&"cycle_times_scatter_plot.png".to_string()));
        assert!(summary.reports.contains(&"cycle_time_vs_story_points.png".to_string()));
        assert!(summary.estimation_relationship.is_some());
        for report in &summary.reports {
            temp.child("run").child(report).assert(predicate::path::exists());
        }
        temp.child("run")
            .child(SUMMARY_FILE)
            .assert(predicate::str::contains("target_task_count: 10"));
        assert_eq!(summary.finish_date.unwrap().data_source, "board.json");
        assert_eq!(summary.task_count.unwrap().target_date, "2024-05-15");
    }

    #[test]
    fn horizon_outside_the_calendar_skips_only_the_task_count_report() {
        let temp = assert_fs::TempDir::new().unwrap();
        let settings = ReportSettings {
            next_days: 1_000_000_000,
            ..settings()
        };
        let generator = ReportGenerator::new(temp.path().to_path_buf(), "board.json", settings);

        let summary = generator.generate(&collection()).unwrap();

        assert!(summary.task_count.is_none());
        assert!(summary.finish_date.is_some());
        assert!(
            !summary
                .reports
                .iter()
                .any(|file| file.starts_with("monte_carlo_how_many_done"))
        );
    }

    #[test]
    fn generate_skips_failing_reports_and_keeps_going() {
        let temp = assert_fs::TempDir::new().unwrap();
        let generator = ReportGenerator::new(temp.path().to_path_buf(), "empty.json", settings());

        let summary = generator.generate(&TaskCollection::new(vec![])).unwrap();

        assert!(summary.reports.is_empty());
        assert!(summary.cycle_time.is_none());
        assert!(summary.finish_date.is_none());
        temp.child(SUMMARY_FILE).assert(predicate::path::exists());
    }
}
