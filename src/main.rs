mod commands;
mod domain;
mod services;
#[cfg(test)]
mod test_support;

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::commands::analyze_cmd::analyze_command;
use crate::commands::base_commands::{CliArgs, Commands};
use crate::commands::completions_cmd::completions_command;
use crate::commands::cycle_time_cmd::cycle_time_command;
use crate::commands::how_many_cmd::how_many_command;
use crate::commands::import_cmd::import_command;
use crate::commands::throughput_cmd::throughput_command;
use crate::commands::when_done_cmd::when_done_command;

fn main() -> ExitCode {
    let args = CliArgs::parse();
    init_tracing(args.verbose);

    match args.command {
        cmd @ Commands::Import { .. } => import_command(cmd),
        cmd @ Commands::Analyze { .. } => analyze_command(cmd),
        cmd @ Commands::WhenDone { .. } => when_done_command(cmd),
        cmd @ Commands::HowMany { .. } => how_many_command(cmd),
        cmd @ Commands::CycleTime { .. } => cycle_time_command(cmd),
        cmd @ Commands::Throughput { .. } => throughput_command(cmd),
        Commands::Completions { shell } => completions_command(shell),
    }
}

/// `RUST_LOG` wins over the verbosity flag.
fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "flow_analyzer=debug,info"
    } else {
        "flow_analyzer=info,warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
