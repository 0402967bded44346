use std::process::ExitCode;

use crate::commands::base_commands::Commands;
use crate::commands::report_format::format_cycle_time_report;
use crate::services::cycle_time::{CycleTimeSummary, EstimationRelationship};

pub fn cycle_time_command(cmd: Commands) -> ExitCode {
    let Commands::CycleTime {
        dataset,
        filter,
        clock,
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
    let Some(summary) = CycleTimeSummary::from_collection(&collection) else {
        eprintln!("Failed to summarize cycle times: no task has a cycle time");
        return ExitCode::FAILURE;
    };
    let relationship = EstimationRelationship::from_collection(&collection);

    println!("{}", format_cycle_time_report(&summary, relationship.as_ref()));
    ExitCode::SUCCESS
}
