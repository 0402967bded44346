use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::commands::base_commands::Commands;
use crate::commands::report_format::{
    format_cycle_time_report, format_finish_date_report, format_task_count_report,
};
use crate::services::report::{default_output_dir, ReportGenerator, ReportSettings};

pub fn analyze_command(cmd: Commands) -> ExitCode {
    let Commands::Analyze {
        dataset,
        filter,
        clock,
        num_tasks,
        next_days,
        iterations,
        output_dir,
        show_labels,
    } = cmd
    else {
        return ExitCode::FAILURE;
    };

    let collection = match dataset.load(&filter.to_filter(clock.now())) {
        Ok(collection) => collection,
        Err(e) => {
            eprintln!("Failed to load dataset: {e}");
            return ExitCode::FAILURE;
        }
    };

    let output_dir = output_dir.map(PathBuf::from).unwrap_or_else(|| {
        default_output_dir(Path::new("output"), Path::new(&dataset.dataset), &collection)
    });
    let settings = ReportSettings {
        iterations,
        num_tasks,
        next_days,
        today: clock.today(),
        seed: clock.seed,
        show_labels,
    };
    let generator = ReportGenerator::new(output_dir, &dataset.dataset, settings);
    let summary = match generator.generate(&collection) {
        Ok(summary) => summary,
        Err(e) => {
            eprintln!("Failed to generate reports: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Some(cycle_time) = &summary.cycle_time {
        println!(
            "{}\n",
            format_cycle_time_report(cycle_time, summary.estimation_relationship.as_ref())
        );
    }
    if let Some(report) = &summary.finish_date {
        println!("{}\n", format_finish_date_report(report));
    }
    if let Some(report) = &summary.task_count {
        println!("{}\n", format_task_count_report(report));
    }
    println!(
        "{} reports written to {}",
        summary.reports.len(),
        generator.output_dir().display()
    );
    ExitCode::SUCCESS
}
