pub mod analyze_cmd;
pub mod base_commands;
pub mod completions_cmd;
pub mod cycle_time_cmd;
pub mod how_many_cmd;
pub mod import_cmd;
pub mod report_format;
pub mod throughput_cmd;
pub mod when_done_cmd;
