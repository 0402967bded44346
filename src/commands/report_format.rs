use crate::services::cycle_time::{CycleTimeSummary, EstimationRelationship};
use crate::services::forecast_types::{FinishDateReport, HistoryRange, TaskCountReport};

pub fn format_finish_date_report(report: &FinishDateReport) -> String {
    let mut lines = header(
        "When Will It Be Done?",
        &report.data_source,
        &report.start_date,
        report.iterations,
        report.history.as_ref(),
    );
    lines.push(format!("Tasks to finish: {}", report.target_task_count));
    lines.push(String::new());
    lines.push("Percentile | Finished by".to_string());
    lines.push("-----------|------------".to_string());
    for (percentile, date) in &report.percentiles {
        lines.push(format!("P{percentile} | {date}"));
    }
    lines.join("\n")
}

pub fn format_task_count_report(report: &TaskCountReport) -> String {
    let mut lines = header(
        "How Many Tasks Will Be Done?",
        &report.data_source,
        &report.start_date,
        report.iterations,
        report.history.as_ref(),
    );
    lines.push(format!("Target date: {}", report.target_date));
    lines.push(String::new());
    lines.push("Percentile | At least".to_string());
    lines.push("-----------|---------".to_string());
    // most confident first
    for (percentile, tasks) in report.percentiles.iter().rev() {
        lines.push(format!("P{percentile} | {tasks}"));
    }
    lines.join("\n")
}

pub fn format_cycle_time_report(
    summary: &CycleTimeSummary,
    relationship: Option<&EstimationRelationship>,
) -> String {
    let mut lines = Vec::new();
    if summary.estimated_only {
        lines.push("Cycle Time Report (Estimated Stories/Tasks)".to_string());
    } else {
        lines.push("Cycle Time Report".to_string());
    }
    lines.push(format!("Tasks: {}", summary.tasks));
    lines.push(format!("Min: {} days", summary.min_days));
    lines.push(format!("Max: {} days", summary.max_days));
    lines.push(String::new());
    lines.push("Percentile | Days".to_string());
    lines.push("-----------|-----".to_string());
    for (percentile, days) in summary.percentiles.iter() {
        lines.push(format!("P{percentile} | {days:.2}"));
    }
    lines.push(String::new());
    match relationship {
        Some(fit) => lines.push(format!(
            "Cycle time vs estimation: {:.2} days/point + {:.2} (R² = {:.2}, {} tasks)",
            fit.slope, fit.intercept, fit.r_squared, fit.points
        )),
        None => lines.push("Cycle time vs estimation: n/a".to_string()),
    }
    lines.join("\n")
}

fn header(
    title: &str,
    data_source: &str,
    start_date: &str,
    iterations: usize,
    history: Option<&HistoryRange>,
) -> Vec<String> {
    let history = match history {
        Some(range) => format!("{} to {}", range.from, range.to),
        None => "n/a".to_string(),
    };
    vec![
        title.to_string(),
        format!("Data source: {data_source}"),
        format!("History: {history}"),
        format!("Start date: {start_date}"),
        format!("Iterations: {iterations}"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::percentiles::summarize_values;
    use std::collections::BTreeMap;

    fn history() -> Option<HistoryRange> {
        Some(HistoryRange {
            from: "2026-01-05".to_string(),
            to: "2026-01-30".to_string(),
        })
    }

    #[test]
    fn format_finish_date_report_includes_header_and_table() {
        let report = FinishDateReport {
            data_source: "tasks.json".to_string(),
            start_date: "2026-02-01".to_string(),
            iterations: 100,
            target_task_count: 12,
            history: history(),
            percentiles: BTreeMap::from([
                (50, "2026-02-10".to_string()),
                (85, "2026-02-14".to_string()),
                (95, "2026-02-17".to_string()),
            ]),
        };

        let output = format_finish_date_report(&report);

        assert!(output.contains("When Will It Be Done?"));
        assert!(output.contains("Data source: tasks.json"));
        assert!(output.contains("History: 2026-01-05 to 2026-01-30"));
        assert!(output.contains("Iterations: 100"));
        assert!(output.contains("Tasks to finish: 12"));
        assert!(output.contains("P50 | 2026-02-10"));
        assert!(output.contains("P95 | 2026-02-17"));
    }

    #[test]
    fn format_task_count_report_lists_most_confident_first() {
        let report = TaskCountReport {
            data_source: "throughput.yaml".to_string(),
            start_date: "2026-02-01".to_string(),
            iterations: 100,
            target_date: "2026-03-01".to_string(),
            history: None,
            percentiles: BTreeMap::from([(50, 30), (85, 24), (95, 20)]),
        };

        let output = format_task_count_report(&report);

        assert!(output.contains("History: n/a"));
        assert!(output.contains("Target date: 2026-03-01"));
        let p95 = output.find("P95 | 20").unwrap();
        let p50 = output.find("P50 | 30").unwrap();
        assert!(p95 < p50);
    }

    #[test]
    fn format_cycle_time_report_marks_estimated_only_population() {
        let summary = CycleTimeSummary {
            tasks: 4,
            estimated_only: true,
            min_days: 1,
            max_days: 4,
            percentiles: summarize_values(&[1.0, 2.0, 3.0, 4.0], &[50]),
        };

        let output = format_cycle_time_report(&summary, None);

        assert!(output.contains("Cycle Time Report (Estimated Stories/Tasks)"));
        assert!(output.contains("P50 | 2.50"));
        assert!(output.contains("Cycle time vs estimation: n/a"));
    }

    #[test]
    fn format_cycle_time_report_includes_regression() {
        let summary = CycleTimeSummary {
            tasks: 2,
            estimated_only: false,
            min_days: 2,
            max_days: 4,
            percentiles: summarize_values(&[2.0, 4.0], &[50]),
        };
        let fit = EstimationRelationship {
            points: 2,
            slope: 2.0,
            intercept: 0.0,
            r_squared: 1.0,
        };

        let output = format_cycle_time_report(&summary, Some(&fit));

        assert!(output.starts_with("Cycle Time Report\n"));
        assert!(output.contains("2.00 days/point + 0.00 (R² = 1.00, 2 tasks)"));
    }
}
