use std::process::ExitCode;

use crate::commands::base_commands::Commands;
use crate::services::data_source::create_data_source;
use crate::services::dataset::write_records;

pub fn import_command(cmd: Commands) -> ExitCode {
    let Commands::Import { source, output } = cmd else {
        return ExitCode::FAILURE;
    };

    let data_source = match create_data_source(&source) {
        Ok(data_source) => data_source,
        Err(e) => {
            eprintln!("Failed to create data source: {e}");
            return ExitCode::FAILURE;
        }
    };
    let records = match data_source.fetch_records() {
        Ok(records) => records,
        Err(e) => {
            eprintln!("Failed to fetch records from {source}: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = write_records(&output, &records) {
        eprintln!("Failed to write dataset: {e}");
        return ExitCode::FAILURE;
    }

    println!("Imported {} records to {output}", records.len());
    ExitCode::SUCCESS
}
