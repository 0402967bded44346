use std::path::Path;

use chrono::NaiveDate;
use plotters::prelude::*;

use crate::domain::task::Task;
use crate::domain::task_collection::TaskCollection;
use crate::services::cumulative_flow_plot::ChartError;
use crate::services::cycle_time::{estimation_pairs, EstimationRelationship};
use crate::services::forecasting::{date_after, format_date};
use crate::services::percentiles::{summarize_values, DEFAULT_PERCENTILES};

/// Days of padding on both sides of the scatter plot's date axis.
const DATE_PADDING: i32 = 5;
const TABLE_ROW_HEIGHT: i32 = 20;

/// One closed task placed on the scatter plot.
struct ScatterPoint<'a> {
    task: &'a Task,
    done: NaiveDate,
    cycle_time: i64,
}

fn scatter_points(collection: &TaskCollection) -> Vec<ScatterPoint<'_>> {
    let mut points: Vec<ScatterPoint> = collection
        .tasks()
        .iter()
        .filter_map(|task| {
            Some(ScatterPoint {
                task,
                done: task.closed_at?.date(),
                cycle_time: task.cycle_time()?,
            })
        })
        .collect();
    // latest first, the order of the table
    points.sort_by(|a, b| b.done.cmp(&a.done));
    points
}

/// Cycle time of every closed task against its closing date, next to a
/// table of the same tasks. `show_labels` writes a short label on each point.
pub fn write_cycle_time_scatter_png(
    output_path: &Path,
    collection: &TaskCollection,
    show_labels: bool,
) -> Result<(), ChartError> {
    let points = scatter_points(collection);
    let (Some(last), Some(first)) = (points.first(), points.last()) else {
        return Err(ChartError::Empty);
    };
    let first_day = first.done;
    let span = (last.done - first_day).num_days() as i32;
    let offset = |date: NaiveDate| (date - first_day).num_days() as i32 + DATE_PADDING;

    let values: Vec<f64> = points.iter().map(|point| point.cycle_time as f64).collect();
    let percentiles = summarize_values(&values, &DEFAULT_PERCENTILES);
    let max_cycle_time = values.iter().cloned().fold(0.0, f64::max);
    let max_x = span + 2 * DATE_PADDING;
    let max_y = max_cycle_time * 1.1 + 1.0;

    let root = BitMapBackend::new(output_path, (1800, 800)).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| ChartError::Plot(e.to_string()))?;
    let (scatter_area, table_area) = root.split_horizontally(1000);

    let estimated = if collection.is_estimated_only() {
        " (Estimated Stories/Tasks)"
    } else {
        ""
    };
    let caption = format!(
        "Cycle Time Scatter Plot for {} completed tasks{estimated}",
        points.len()
    );
    let mut chart = ChartBuilder::on(&scatter_area)
        .margin(20)
        .caption(caption, ("sans-serif", 26))
        .x_label_area_size(90)
        .y_label_area_size(65)
        .build_cartesian_2d(0..max_x, 0.0..max_y)
        .map_err(|e| ChartError::Plot(e.to_string()))?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc(format!(
            "Date (history from {} to {})",
            format_date(first_day),
            format_date(last.done)
        ))
        .y_desc("Cycle Time in Days")
        .label_style(("sans-serif", 16))
        .axis_desc_style(("sans-serif", 20))
        .x_labels(((max_x + 1) as usize).clamp(2, 10))
        .x_label_formatter(&|index| {
            date_after(first_day, (*index - DATE_PADDING) as i64)
                .map(format_date)
                .unwrap_or_default()
        })
        .draw()
        .map_err(|e| ChartError::Plot(e.to_string()))?;

    let marker_colors = [
        RGBColor(204, 60, 30),
        RGBColor(230, 162, 60),
        RGBColor(76, 175, 80),
    ];
    for ((percentile, days), color) in percentiles.iter().zip(marker_colors.iter().cycle()) {
        let color = *color;
        chart
            .draw_series(LineSeries::new(
                [(0, days), (max_x, days)],
                ShapeStyle::from(&color).stroke_width(2),
            ))
            .map_err(|e| ChartError::Plot(e.to_string()))?
            .label(format!("{percentile}% of tasks done within {days:.2} days"))
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
    }

    let point_color = RGBColor(114, 202, 252);
    chart
        .draw_series(points.iter().map(|point| {
            Circle::new(
                (offset(point.done), point.cycle_time as f64),
                5,
                point_color.filled(),
            )
        }))
        .map_err(|e| ChartError::Plot(e.to_string()))?;
    if show_labels {
        chart
            .draw_series(points.iter().map(|point| {
                Text::new(
                    point.task.short_label(),
                    (offset(point.done), point.cycle_time as f64),
                    ("sans-serif", 12),
                )
            }))
            .map_err(|e| ChartError::Plot(e.to_string()))?;
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(&WHITE)
        .border_style(&BLACK)
        .draw()
        .map_err(|e| ChartError::Plot(e.to_string()))?;

    draw_task_table(&table_area, &points)?;

    root.present()
        .map_err(|e| ChartError::Plot(e.to_string()))?;
    Ok(())
}

/// Done date, cycle time and full label per row; rows that do not fit are
/// summarized on the last line.
fn draw_task_table<DB: DrawingBackend>(
    area: &DrawingArea<DB, plotters::coord::Shift>,
    points: &[ScatterPoint],
) -> Result<(), ChartError> {
    let columns = [10, 130, 240];
    let header_style = ("sans-serif", 16).into_font().style(FontStyle::Bold);
    let row_style = ("sans-serif", 14).into_font();

    for (x, title) in columns.iter().zip(["Done Date", "Cycle Time", "Task"]) {
        area.draw(&Text::new(title, (*x, 30), header_style.clone()))
            .map_err(|e| ChartError::Plot(e.to_string()))?;
    }

    let (_, height) = area.dim_in_pixel();
    let capacity = ((height as i32 - 60) / TABLE_ROW_HEIGHT).max(1) as usize;
    let shown = if points.len() > capacity {
        capacity - 1
    } else {
        points.len()
    };

    for (row, point) in points.iter().take(shown).enumerate() {
        let y = 30 + TABLE_ROW_HEIGHT * (row as i32 + 1);
        let cells = [
            format_date(point.done),
            point.cycle_time.to_string(),
            point.task.full_label(),
        ];
        for (x, cell) in columns.iter().zip(cells) {
            area.draw(&Text::new(cell, (*x, y), row_style.clone()))
                .map_err(|e| ChartError::Plot(e.to_string()))?;
        }
    }
    if shown < points.len() {
        let y = 30 + TABLE_ROW_HEIGHT * (shown as i32 + 1);
        let more = format!("... and {} more tasks", points.len() - shown);
        area.draw(&Text::new(more, (columns[0], y), row_style))
            .map_err(|e| ChartError::Plot(e.to_string()))?;
    }
    Ok(())
}

/// Cycle time against estimation for estimated tasks, with the fitted
/// regression line when there is one.
pub fn write_estimation_scatter_png(
    output_path: &Path,
    collection: &TaskCollection,
    relationship: Option<&EstimationRelationship>,
) -> Result<(), ChartError> {
    let pairs = estimation_pairs(collection);
    if pairs.is_empty() {
        return Err(ChartError::Empty);
    }

    let max_x = pairs.iter().map(|(x, _)| *x).fold(0.0, f64::max) * 1.1 + 1.0;
    let max_y = pairs.iter().map(|(_, y)| *y).fold(0.0, f64::max) * 1.1 + 1.0;

    let caption = match relationship {
        Some(fit) => format!("Cycle Time vs Estimation (R^2 = {:.2})", fit.r_squared),
        None => "Cycle Time vs Estimation".to_string(),
    };

    let root = BitMapBackend::new(output_path, (1000, 600)).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| ChartError::Plot(e.to_string()))?;

    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .caption(caption, ("sans-serif", 26))
        .x_label_area_size(55)
        .y_label_area_size(65)
        .build_cartesian_2d(0.0..max_x, 0.0..max_y)
        .map_err(|e| ChartError::Plot(e.to_string()))?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc("Estimation")
        .y_desc("Cycle Time in Days")
        .label_style(("sans-serif", 18))
        .axis_desc_style(("sans-serif", 22))
        .x_label_formatter(&|value| format!("{value:.0}"))
        .draw()
        .map_err(|e| ChartError::Plot(e.to_string()))?;

    let point_color = RGBColor(114, 202, 252);
    chart
        .draw_series(pairs.iter().map(|point| Circle::new(*point, 5, point_color.filled())))
        .map_err(|e| ChartError::Plot(e.to_string()))?;

    if let Some(fit) = relationship {
        let min_x = pairs.iter().map(|(x, _)| *x).fold(f64::INFINITY, f64::min);
        let max_estimation = pairs.iter().map(|(x, _)| *x).fold(0.0, f64::max);
        let line_color = RGBColor(204, 60, 30);
        chart
            .draw_series(LineSeries::new(
                [min_x, max_estimation]
                    .into_iter()
                    .map(|x| (x, fit.slope * x + fit.intercept)),
                ShapeStyle::from(&line_color).stroke_width(2),
            ))
            .map_err(|e| ChartError::Plot(e.to_string()))?
            .label("Regression line")
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], line_color));

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(&WHITE)
            .border_style(&BLACK)
            .draw()
            .map_err(|e| ChartError::Plot(e.to_string()))?;
    }

    root.present()
        .map_err(|e| ChartError::Plot(e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::task_filter::TaskFilter;
    use crate::test_support::{at, build_closed_task, build_estimated_task, on_date};
    use assert_fs::prelude::*;
    use predicates::prelude::*;

    fn described(description: &str, task: Task) -> Task {
        Task {
            description: Some(description.to_string()),
            ..task
        }
    }

    fn board() -> TaskCollection {
        let tasks = vec![
            described(
                "Checkout page",
                build_closed_task(at(2024, 4, 1, 9), Some(at(2024, 4, 2, 9)), at(2024, 4, 3, 17)),
            ),
            described(
                "Migrate the billing service to the new provider",
                build_closed_task(at(2024, 4, 2, 9), None, at(2024, 4, 8, 10)),
            ),
            build_closed_task(at(2024, 4, 3, 9), Some(at(2024, 4, 5, 9)), at(2024, 4, 9, 12)),
        ];
        TaskFilter::new().apply(&tasks)
    }

    #[test]
    fn scatter_points_are_ordered_latest_first() {
        let collection = board();

        let points = scatter_points(&collection);

        let done: Vec<NaiveDate> = points.iter().map(|point| point.done).collect();
        assert_eq!(
            done,
            vec![on_date(2024, 4, 9), on_date(2024, 4, 8), on_date(2024, 4, 3)]
        );
        assert_eq!(points[1].cycle_time, 7);
    }

    #[test]
    fn write_cycle_time_scatter_png_writes_file_with_labels() {
        let output_file = assert_fs::NamedTempFile::new("scatter.png").unwrap();

        write_cycle_time_scatter_png(output_file.path(), &board(), true).unwrap();

        output_file.assert(predicate::path::exists());
        assert!(std::fs::metadata(output_file.path()).unwrap().len() > 0);
    }

    #[test]
    fn cycle_time_scatter_needs_closed_tasks() {
        let output_file = assert_fs::NamedTempFile::new("empty_scatter.png").unwrap();

        let error =
            write_cycle_time_scatter_png(output_file.path(), &TaskCollection::new(vec![]), false)
                .unwrap_err();

        assert!(matches!(error, ChartError::Empty));
        output_file.assert(predicate::path::missing());
    }

    #[test]
    fn write_estimation_scatter_png_draws_regression() {
        let collection = TaskFilter::new().apply(&[
            build_estimated_task(1, at(2024, 4, 1, 9), at(2024, 4, 2, 9)),
            build_estimated_task(3, at(2024, 4, 1, 9), at(2024, 4, 5, 9)),
            build_estimated_task(5, at(2024, 4, 1, 9), at(2024, 4, 8, 9)),
        ]);
        let fit = EstimationRelationship::from_collection(&collection).unwrap();
        let output_file = assert_fs::NamedTempFile::new("estimation.png").unwrap();

        write_estimation_scatter_png(output_file.path(), &collection, Some(&fit)).unwrap();

        output_file.assert(predicate::path::exists());
    }

    #[test]
    fn estimation_scatter_needs_estimated_tasks() {
        let output_file = assert_fs::NamedTempFile::new("no_estimates.png").unwrap();

        let error = write_estimation_scatter_png(output_file.path(), &board(), None).unwrap_err();

        assert!(matches!(error, ChartError::Empty));
    }
}
