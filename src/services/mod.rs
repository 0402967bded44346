pub mod airtable_api;
pub mod cumulative_flow;
pub mod cumulative_flow_plot;
pub mod cycle_time;
pub mod cycle_time_plot;
pub mod data_source;
pub mod dataset;
pub mod forecast_types;
pub mod forecasting;
pub mod histogram;
pub mod monte_carlo;
pub mod percentiles;
pub mod project_schema;
pub mod report;
pub mod throughput_yaml;
