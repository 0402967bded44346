use std::process::ExitCode;

use crate::commands::base_commands::Commands;
use crate::domain::throughput::ThroughputDistribution;
use crate::services::throughput_yaml::serialize_throughput_to_yaml;

pub fn throughput_command(cmd: Commands) -> ExitCode {
    let Commands::Throughput {
        dataset,
        filter,
        clock,
        output,
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
    let throughput = ThroughputDistribution::from_tasks(collection.tasks()).to_entries();

    let mut buffer = Vec::new();
    if let Err(e) = serialize_throughput_to_yaml(&mut buffer, &throughput) {
        eprintln!("Failed to serialize throughput to YAML: {e}");
        return ExitCode::FAILURE;
    }
    if let Err(e) = std::fs::write(&output, buffer) {
        eprintln!("Failed to write output file: {e}");
        return ExitCode::FAILURE;
    }

    println!("Throughput data for {} days written to {output}", throughput.len());
    ExitCode::SUCCESS
}
