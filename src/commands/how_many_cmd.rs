use std::path::Path;
use std::process::ExitCode;

use crate::commands::base_commands::Commands;
use crate::commands::report_format::format_task_count_report;
use crate::services::forecasting::{date_after, forecast_tasks_done_by, seeded_rng};
use crate::services::report::write_task_count_histogram;

pub fn how_many_command(cmd: Commands) -> ExitCode {
    let Commands::HowMany {
        source,
        filter,
        clock,
        days,
        iterations,
        output,
    } = cmd
    else {
        return ExitCode::FAILURE;
    };

    let input = match source.load_input(&filter.to_filter(clock.now())) {
        Ok(input) => input,
        Err(e) => {
            eprintln!("Failed to load forecast input: {e}");
            return ExitCode::FAILURE;
        }
    };

    let today = clock.today();
    let mut rng = seeded_rng(clock.seed);
    let forecast = date_after(today, days).and_then(|target_date| {
        forecast_tasks_done_by(&input, target_date, iterations, today, &mut rng)
    });
    let mut forecast = match forecast {
        Ok(forecast) => forecast,
        Err(e) => {
            eprintln!("Failed to forecast task count: {e}");
            return ExitCode::FAILURE;
        }
    };
    forecast.report.data_source = source.data_source().to_string();
    println!("{}", format_task_count_report(&forecast.report));

    let Some(output) = output else {
        return ExitCode::SUCCESS;
    };
    let yaml = match serde_yaml::to_string(&forecast.report) {
        Ok(contents) => contents,
        Err(e) => {
            eprintln!("Failed to serialize forecast: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = std::fs::write(&output, yaml) {
        eprintln!("Failed to write forecast: {e}");
        return ExitCode::FAILURE;
    }
    let histogram_path = format!("{output}.png");
    if let Err(e) = write_task_count_histogram(Path::new(&histogram_path), &forecast) {
        eprintln!("Failed to write histogram: {e}");
        return ExitCode::FAILURE;
    }

    println!("Forecast for the next {days} days written to {output}");
    println!("Forecast histogram written to {histogram_path}");
    ExitCode::SUCCESS
}
