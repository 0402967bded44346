use std::collections::BTreeMap;
use std::path::Path;

use plotters::prelude::*;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HistogramError {
    #[error("no values to plot")]
    Empty,
    #[error("failed to render histogram: {0}")]
    Render(String),
}

/// Captions and percentile markers of one histogram.
pub struct HistogramChart<'a> {
    pub caption: &'a str,
    pub x_desc: &'a str,
    /// Percentile -> position on the x axis.
    pub markers: Vec<(u8, f64)>,
}

pub fn write_histogram_png(
    output_path: &Path,
    values: &[f64],
    chart: &HistogramChart,
    x_label: &dyn Fn(f64) -> String,
) -> Result<(), HistogramError> {
    if values.is_empty() {
        return Err(HistogramError::Empty);
    }
    render_histogram_png(output_path, values, chart, x_label)
}

fn render_histogram_png(
    output_path: &Path,
    values: &[f64],
    layout: &HistogramChart,
    x_label: &dyn Fn(f64) -> String,
) -> Result<(), HistogramError> {
    let min_value = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max_value = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

    // whole-day or whole-task outcomes never need bins narrower than one
    let range = max_value - min_value;
    let square_root_of_n = (values.len() as f64).sqrt();
    let bin_width = (range / square_root_of_n).max(1.0);

    let mut counts: BTreeMap<i64, usize> = BTreeMap::new();
    for value in values {
        let bucket = ((*value - min_value) / bin_width).floor() as i64;
        *counts.entry(bucket).or_insert(0usize) += 1;
    }
    let max_count = counts.values().copied().max().unwrap_or(1);
    let last_bucket = counts.keys().next_back().copied().unwrap_or(0);

    let x_start = min_value - bin_width;
    let x_end = min_value + (last_bucket + 2) as f64 * bin_width;
    let y_end = max_count + max_count / 10 + 1;

    let root = BitMapBackend::new(output_path, (800, 600)).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| HistogramError::Render(e.to_string()))?;

    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .caption(layout.caption, ("sans-serif", 26))
        .x_label_area_size(55)
        .y_label_area_size(65)
        .build_cartesian_2d(x_start..x_end, 0..y_end)
        .map_err(|e| HistogramError::Render(e.to_string()))?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc(layout.x_desc)
        .y_desc("Frequency")
        .label_style(("sans-serif", 18))
        .axis_desc_style(("sans-serif", 22))
        .x_label_formatter(&|value| x_label(*value))
        .draw()
        .map_err(|e| HistogramError::Render(e.to_string()))?;

    let bar_color = RGBColor(30, 122, 204);
    let bar_style = ShapeStyle::from(&bar_color).filled();
    chart
        .draw_series(counts.iter().map(|(bucket, count)| {
            let left = min_value + *bucket as f64 * bin_width;
            Rectangle::new([(left, 0), (left + bin_width, *count)], bar_style)
        }))
        .map_err(|e| HistogramError::Render(e.to_string()))?;

    let marker_color = RGBColor(204, 60, 30);
    chart
        .draw_series(layout.markers.iter().map(|(_, position)| {
            PathElement::new(
                vec![(*position, 0), (*position, y_end)],
                ShapeStyle::from(&marker_color).stroke_width(2),
            )
        }))
        .map_err(|e| HistogramError::Render(e.to_string()))?;
    chart
        .draw_series(layout.markers.iter().map(|(percentile, position)| {
            Text::new(
                format!("{percentile}%"),
                (*position, max_count + max_count / 20 + 1),
                ("sans-serif", 16).into_font().color(&marker_color),
            )
        }))
        .map_err(|e| HistogramError::Render(e.to_string()))?;

    root.present()
        .map_err(|e| HistogramError::Render(e.to_string()))?;
    Ok(())
}
