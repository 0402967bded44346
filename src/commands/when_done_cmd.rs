use std::path::Path;
use std::process::ExitCode;

use crate::commands::base_commands::Commands;
use crate::commands::report_format::format_finish_date_report;
use crate::services::forecasting::{forecast_finish_date, seeded_rng};
use crate::services::report::write_finish_date_histogram;

pub fn when_done_command(cmd: Commands) -> ExitCode {
    let Commands::WhenDone {
        source,
        filter,
        clock,
        tasks,
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
    let mut forecast = match forecast_finish_date(&input, tasks, iterations, today, &mut rng) {
        Ok(forecast) => forecast,
        Err(e) => {
            eprintln!("Failed to forecast finish date: {e}");
            return ExitCode::FAILURE;
        }
    };
    forecast.report.data_source = source.data_source().to_string();
    println!("{}", format_finish_date_report(&forecast.report));

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
    if let Err(e) = write_finish_date_histogram(Path::new(&histogram_path), &forecast, today) {
        eprintln!("Failed to write histogram: {e}");
        return ExitCode::FAILURE;
    }

    println!("Forecast for {tasks} tasks written to {output}");
    println!("Forecast histogram written to {histogram_path}");
    ExitCode::SUCCESS
}
