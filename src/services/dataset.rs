use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;
use thiserror::Error;

use crate::domain::task::Task;
use crate::services::project_schema::{ProjectSchema, TaskField};

/// One raw row of a dataset: column name -> value.
pub type Record = serde_json::Map<String, Value>;

const FALLBACK_TIMESTAMP_FORMATS: [&str; 3] =
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"];

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("invalid dataset format: {0}")]
    InvalidFormat(String),
    #[error("failed to read dataset {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to write dataset {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error("failed to parse json dataset: {0}")]
    ParseJson(#[from] serde_json::Error),
    #[error("failed to parse yaml dataset: {0}")]
    ParseYaml(#[from] serde_yaml::Error),
    #[error("invalid csv dataset: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid timestamp in column {column}: {value}")]
    InvalidTimestamp { column: String, value: String },
    #[error("invalid estimation in column {column}: {value}")]
    InvalidEstimation { column: String, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetFormat {
    Csv,
    Json,
    Yaml,
}

impl DatasetFormat {
    pub fn from_path(path: &Path) -> Result<Self, DatasetError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("csv") => Ok(DatasetFormat::Csv),
            Some("json") => Ok(DatasetFormat::Json),
            Some("yaml") | Some("yml") => Ok(DatasetFormat::Yaml),
            _ => Err(DatasetError::InvalidFormat(format!(
                "unsupported dataset file {} (expected .csv, .json, .yaml or .yml)",
                path.display()
            ))),
        }
    }
}

/// Reads a dataset file and maps every record onto a [`Task`].
pub fn load_tasks<P: AsRef<Path>>(
    path: P,
    schema: &ProjectSchema,
) -> Result<Vec<Task>, DatasetError> {
    let path = path.as_ref();
    let format = DatasetFormat::from_path(path)?;
    let contents = std::fs::read_to_string(path).map_err(|source| DatasetError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let records = parse_records(&contents, format)?;
    let tasks = records
        .iter()
        .map(|record| task_from_record(record, schema))
        .collect::<Result<Vec<_>, _>>()?;
    tracing::info!(tasks = tasks.len(), path = %path.display(), "loaded dataset");
    Ok(tasks)
}

/// CSV rows are keyed by the header line; JSON and YAML datasets must be an
/// array of objects.
pub fn parse_records(contents: &str, format: DatasetFormat) -> Result<Vec<Record>, DatasetError> {
    let document: Value = match format {
        DatasetFormat::Csv => return parse_csv_records(contents),
        DatasetFormat::Json => serde_json::from_str(contents)?,
        DatasetFormat::Yaml => serde_yaml::from_str(contents)?,
    };
    let Value::Array(rows) = document else {
        return Err(DatasetError::InvalidFormat(
            "dataset must be a list of records".to_string(),
        ));
    };
    rows.into_iter()
        .enumerate()
        .map(|(index, row)| match row {
            Value::Object(record) => Ok(record),
            _ => Err(DatasetError::InvalidFormat(format!(
                "record {index} is not an object"
            ))),
        })
        .collect()
}

/// Every cell stays a string; empty cells become null.
fn parse_csv_records(contents: &str) -> Result<Vec<Record>, DatasetError> {
    let mut reader = csv::Reader::from_reader(contents.as_bytes());
    let headers = reader.headers()?.clone();
    reader
        .records()
        .map(|row| {
            let row = row?;
            Ok(headers
                .iter()
                .zip(row.iter())
                .map(|(column, cell)| {
                    let value = if cell.is_empty() {
                        Value::Null
                    } else {
                        Value::String(cell.to_string())
                    };
                    (column.to_string(), value)
                })
                .collect())
        })
        .collect()
}

pub fn task_from_record(record: &Record, schema: &ProjectSchema) -> Result<Task, DatasetError> {
    Ok(Task {
        task_type: text_field(record, schema, TaskField::Type),
        status: text_field(record, schema, TaskField::Status),
        created_at: timestamp_field(record, schema, TaskField::CreatedAt)?,
        closed_at: timestamp_field(record, schema, TaskField::ClosedAt)?,
        started_at: timestamp_field(record, schema, TaskField::StartedAt)?,
        estimation: estimation_field(record, schema)?,
        description: text_field(record, schema, TaskField::Description),
    })
}

/// Saves raw records in the format named by the file extension.
pub fn write_records<P: AsRef<Path>>(path: P, records: &[Record]) -> Result<(), DatasetError> {
    let path = path.as_ref();
    let contents = match DatasetFormat::from_path(path)? {
        DatasetFormat::Csv => records_to_csv(records)?,
        DatasetFormat::Json => serde_json::to_string_pretty(records)?,
        DatasetFormat::Yaml => serde_yaml::to_string(records)?,
    };
    std::fs::write(path, contents).map_err(|source| DatasetError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// One column per field seen in any record, sorted by name; absent and null
/// fields are empty cells.
fn records_to_csv(records: &[Record]) -> Result<String, DatasetError> {
    let columns: BTreeSet<&str> = records
        .iter()
        .flat_map(|record| record.keys().map(String::as_str))
        .collect();
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&columns)?;
    for record in records {
        writer.write_record(columns.iter().map(|column| match record.get(*column) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(text)) => text.clone(),
            Some(other) => other.to_string(),
        }))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| DatasetError::Csv(e.into_error().into()))?;
    String::from_utf8(bytes)
        .map_err(|e| DatasetError::InvalidFormat(format!("csv output is not utf-8: {e}")))
}

fn raw_value<'a>(
    record: &'a Record,
    schema: &ProjectSchema,
    field: TaskField,
) -> Option<&'a Value> {
    let spec = schema.field(field)?;
    record.get(&spec.column).filter(|value| !value.is_null())
}

fn text_field(record: &Record, schema: &ProjectSchema, field: TaskField) -> Option<String> {
    match raw_value(record, schema, field)? {
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

fn timestamp_field(
    record: &Record,
    schema: &ProjectSchema,
    field: TaskField,
) -> Result<Option<NaiveDateTime>, DatasetError> {
    let Some(spec) = schema.field(field) else {
        return Ok(None);
    };
    let text = match raw_value(record, schema, field) {
        None => return Ok(None),
        Some(Value::String(text)) if text.trim().is_empty() => return Ok(None),
        Some(Value::String(text)) => text.trim().to_string(),
        Some(other) => other.to_string(),
    };
    parse_timestamp(&text, spec.format.as_deref())
        .map(Some)
        .ok_or_else(|| DatasetError::InvalidTimestamp {
            column: spec.column.clone(),
            value: text,
        })
}

fn estimation_field(record: &Record, schema: &ProjectSchema) -> Result<Option<i64>, DatasetError> {
    let Some(spec) = schema.field(TaskField::Estimation) else {
        return Ok(None);
    };
    let invalid = |value: &Value| DatasetError::InvalidEstimation {
        column: spec.column.clone(),
        value: value.to_string(),
    };
    match raw_value(record, schema, TaskField::Estimation) {
        None => Ok(None),
        Some(Value::Number(number)) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|points| points.trunc() as i64))
            .map(Some)
            .ok_or_else(|| invalid(&Value::Number(number.clone()))),
        Some(Value::String(text)) if text.trim().is_empty() => Ok(None),
        Some(Value::String(text)) => text
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| invalid(&Value::String(text.clone()))),
        Some(other) => Err(invalid(other)),
    }
}

/// Uses `format` when the schema names one, otherwise RFC 3339 (kept in its
/// own wall-clock time), a few ISO-like layouts, or a plain date at midnight.
pub fn parse_timestamp(text: &str, format: Option<&str>) -> Option<NaiveDateTime> {
    if let Some(format) = format {
        return NaiveDateTime::parse_from_str(text, format)
            .ok()
            .or_else(|| {
                NaiveDate::parse_from_str(text, format)
                    .ok()
                    .and_then(|date| date.and_hms_opt(0, 0, 0))
            });
    }
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(text) {
        return Some(timestamp.naive_local());
    }
    FALLBACK_TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}
