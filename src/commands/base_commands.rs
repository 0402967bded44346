use chrono::{Duration, Local, NaiveDate, NaiveDateTime, NaiveTime};
use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use thiserror::Error;

use crate::domain::task_collection::TaskCollection;
use crate::domain::task_filter::TaskFilter;
use crate::services::dataset::{load_tasks, DatasetError};
use crate::services::forecasting::ForecastInput;
use crate::services::project_schema::{create_project_schema, ProjectSchema, ProjectSchemaError};
use crate::services::throughput_yaml::{deserialize_throughput_from_yaml_str, ThroughputYamlError};

#[derive(Parser)]
#[command(author, version, about)]
pub struct CliArgs {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch task records from a remote source and save them as a dataset
    Import {
        /// Remote data source
        #[arg(short, long, default_value = "airtable")]
        source: String,
        /// Output dataset file (CSV, JSON or YAML)
        #[arg(short, long)]
        output: String,
    },
    /// Generate every report for a dataset
    Analyze {
        #[command(flatten)]
        dataset: DatasetArgs,
        #[command(flatten)]
        filter: FilterArgs,
        #[command(flatten)]
        clock: ClockArgs,
        /// Number of tasks for the finish date forecast
        #[arg(short = 'n', long, default_value_t = 100)]
        num_tasks: usize,
        /// Horizon in days for the task count forecast
        #[arg(long, default_value_t = 30)]
        next_days: i64,
        /// Number of simulation iterations
        #[arg(short, long, default_value_t = 10000)]
        iterations: usize,
        /// Report folder, defaults to output/<dataset>/<first creation>-<last closing>
        #[arg(long)]
        output_dir: Option<String>,
        /// Label every point of the cycle time scatter plot
        #[arg(long)]
        show_labels: bool,
    },
    /// Forecast when a number of tasks will be finished
    WhenDone {
        #[command(flatten)]
        source: ForecastSourceArgs,
        #[command(flatten)]
        filter: FilterArgs,
        #[command(flatten)]
        clock: ClockArgs,
        /// Number of tasks still to finish
        #[arg(short = 'n', long)]
        tasks: usize,
        /// Number of simulation iterations
        #[arg(short, long, default_value_t = 10000)]
        iterations: usize,
        /// Output YAML file, a histogram is written next to it
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Forecast how many tasks will be finished within a number of days
    HowMany {
        #[command(flatten)]
        source: ForecastSourceArgs,
        #[command(flatten)]
        filter: FilterArgs,
        #[command(flatten)]
        clock: ClockArgs,
        /// Days from today
        #[arg(long)]
        days: i64,
        /// Number of simulation iterations
        #[arg(short, long, default_value_t = 10000)]
        iterations: usize,
        /// Output YAML file, a histogram is written next to it
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Summarize cycle times and their relationship to estimations
    CycleTime {
        #[command(flatten)]
        dataset: DatasetArgs,
        #[command(flatten)]
        filter: FilterArgs,
        #[command(flatten)]
        clock: ClockArgs,
    },
    /// Export the daily throughput of a dataset to YAML
    Throughput {
        #[command(flatten)]
        dataset: DatasetArgs,
        #[command(flatten)]
        filter: FilterArgs,
        #[command(flatten)]
        clock: ClockArgs,
        /// Output YAML file
        #[arg(short, long)]
        output: String,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Debug, Clone)]
pub struct DatasetArgs {
    /// Dataset file (CSV, JSON or YAML)
    #[arg(short, long)]
    pub dataset: String,
    /// Built-in project schema
    #[arg(short, long, default_value = "sample_project")]
    pub project: String,
    /// Project schema YAML file, overrides --project
    #[arg(long)]
    pub schema: Option<String>,
}

impl DatasetArgs {
    pub fn load(&self, filter: &TaskFilter) -> Result<TaskCollection, LoadError> {
        load_collection(&self.dataset, &self.project, self.schema.as_deref(), filter)
    }
}

/// A dataset, or a throughput file exported by the `throughput` command.
#[derive(Args, Debug, Clone)]
pub struct ForecastSourceArgs {
    /// Dataset file (CSV, JSON or YAML)
    #[arg(short, long, required_unless_present = "throughput", conflicts_with = "throughput")]
    pub dataset: Option<String>,
    /// Throughput YAML file
    #[arg(short = 'f', long)]
    pub throughput: Option<String>,
    /// Built-in project schema
    #[arg(short, long, default_value = "sample_project")]
    pub project: String,
    /// Project schema YAML file, overrides --project
    #[arg(long)]
    pub schema: Option<String>,
}

impl ForecastSourceArgs {
    pub fn data_source(&self) -> &str {
        self.throughput
            .as_deref()
            .or(self.dataset.as_deref())
            .unwrap_or_default()
    }

    /// Filters only apply to datasets; a throughput file is used as is.
    pub fn load_input(&self, filter: &TaskFilter) -> Result<ForecastInput, LoadError> {
        if let Some(path) = &self.throughput {
            let contents = std::fs::read_to_string(path)?;
            let entries = deserialize_throughput_from_yaml_str(&contents)?;
            return Ok(ForecastInput::from_throughput(&entries));
        }
        let dataset = self.dataset.as_deref().unwrap_or_default();
        let collection = load_collection(dataset, &self.project, self.schema.as_deref(), filter)?;
        Ok(ForecastInput::from_collection(&collection))
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Ignore tasks with a longer cycle time (days)
    #[arg(long)]
    pub max_cycle_time: Option<i64>,
    /// Ignore tasks created within the last N days
    #[arg(long)]
    pub created_last: Option<i64>,
    /// Only tasks closed in the last N days
    #[arg(long)]
    pub closed_last: Option<i64>,
    /// Only tasks with a non-zero estimation
    #[arg(long)]
    pub need_estimate: bool,
    /// Comma separated task types to keep
    #[arg(long, value_delimiter = ',')]
    pub types: Vec<String>,
}

impl FilterArgs {
    /// Windows are measured back from `now`; tasks closed after `now` are
    /// always dropped. Windows reaching past the calendar start there.
    pub fn to_filter(&self, now: NaiveDateTime) -> TaskFilter {
        let days_ago = |days: i64| {
            Duration::try_days(days)
                .and_then(|offset| now.checked_sub_signed(offset))
                .unwrap_or(NaiveDateTime::MIN)
        };
        TaskFilter {
            created_until: Some(self.created_last.map(days_ago).unwrap_or(now)),
            closed_since: self.closed_last.map(days_ago),
            closed_until: Some(now),
            max_cycle_time: self.max_cycle_time,
            has_estimation: self.need_estimate,
            valid_types: if self.types.is_empty() {
                None
            } else {
                Some(self.types.clone())
            },
        }
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct ClockArgs {
    /// Reference date (YYYY-MM-DD), defaults to today
    #[arg(long)]
    pub today: Option<NaiveDate>,
    /// Seed for reproducible simulations
    #[arg(long)]
    pub seed: Option<u64>,
}

impl ClockArgs {
    pub fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(default_today)
    }

    /// End of `--today` when given, otherwise the local clock.
    pub fn now(&self) -> NaiveDateTime {
        match self.today {
            Some(date) => date.and_time(NaiveTime::MIN) + Duration::seconds(86_399),
            None => Local::now().naive_local(),
        }
    }
}

#[derive(Error, Debug)]
pub enum LoadError {
    #[error(transparent)]
    Schema(#[from] ProjectSchemaError),
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    #[error("failed to read throughput file: {0}")]
    ReadThroughput(#[from] std::io::Error),
    #[error(transparent)]
    ParseThroughput(#[from] ThroughputYamlError),
}

pub fn load_collection(
    dataset: &str,
    project: &str,
    schema_file: Option<&str>,
    filter: &TaskFilter,
) -> Result<TaskCollection, LoadError> {
    let schema = match schema_file {
        Some(path) => ProjectSchema::from_yaml_file(path)?,
        None => create_project_schema(project)?,
    };
    let tasks = load_tasks(dataset, &schema)?;
    Ok(filter.apply(&tasks))
}

fn default_today() -> NaiveDate {
    Local::now().date_naive()
}
