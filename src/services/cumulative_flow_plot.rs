use std::path::Path;

use plotters::prelude::*;
use thiserror::Error;

use crate::services::cumulative_flow::FlowDay;

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("no data to plot")]
    Empty,
    #[error("failed to render chart: {0}")]
    Plot(String),
}

/// Stacked To Do / In Progress / Done bands, one point per day.
pub fn write_cumulative_flow_png(output_path: &Path, flow: &[FlowDay]) -> Result<(), ChartError> {
    if flow.is_empty() {
        return Err(ChartError::Empty);
    }

    let max_created = flow.iter().map(|day| day.created).max().unwrap_or(0);
    let max_y = max_created.saturating_add(1).max(1) as i32;
    let max_x = (flow.len() as i32 - 1).max(1);

    let root = BitMapBackend::new(output_path, (900, 600)).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| ChartError::Plot(e.to_string()))?;

    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .caption("Cumulative Flow Diagram", ("sans-serif", 30))
        .x_label_area_size(55)
        .y_label_area_size(65)
        .build_cartesian_2d(0..max_x, 0..max_y)
        .map_err(|e| ChartError::Plot(e.to_string()))?;

    let label_count = flow.len().clamp(1, 10);
    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc("Date")
        .y_desc("Tasks")
        .label_style(("sans-serif", 18))
        .axis_desc_style(("sans-serif", 22))
        .x_labels(label_count)
        .x_label_formatter(&|index| {
            if *index < 0 {
                return String::new();
            }
            flow.get(*index as usize)
                .map(|day| day.date.format("%Y-%m-%d").to_string())
                .unwrap_or_default()
        })
        .draw()
        .map_err(|e| ChartError::Plot(e.to_string()))?;

    // widest band first so the narrower ones stack on top of it
    let bands: [(&str, RGBColor, fn(&FlowDay) -> usize); 3] = [
        ("To Do", RGBColor(230, 162, 60), |day| day.created),
        ("In Progress", RGBColor(30, 122, 204), |day| day.started),
        ("Done", RGBColor(76, 175, 80), |day| day.closed),
    ];
    for (label, color, top) in bands {
        chart
            .draw_series(AreaSeries::new(
                flow.iter()
                    .enumerate()
                    .map(|(idx, day)| (idx as i32, top(day) as i32)),
                0,
                color,
            ))
            .map_err(|e| ChartError::Plot(e.to_string()))?
            .label(label)
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(&WHITE)
        .border_style(&BLACK)
        .draw()
        .map_err(|e| ChartError::Plot(e.to_string()))?;

    root.present()
        .map_err(|e| ChartError::Plot(e.to_string()))?;
    Ok(())
}
