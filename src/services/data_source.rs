use thiserror::Error;

use crate::services::airtable_api::{AirtableClient, AirtableConfig};
use crate::services::dataset::Record;

#[derive(Error, Debug)]
pub enum DataSourceError {
    #[error("resource not found")]
    NotFound,
    #[error("connection error: {0}")]
    Connection(String),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("unauthorized")]
    Unauthorized,
    #[error("missing environment variable {0}")]
    MissingEnv(&'static str),
    #[error("unknown data source: {0}")]
    UnknownSource(String),
}

/// Describes an interface for retrieving raw task records from an external
/// system.
pub trait DataSource {
    fn fetch_records(&self) -> Result<Vec<Record>, DataSourceError>;
}

/// Builds the data source registered under `source`, configured from the
/// environment.
pub fn create_data_source(source: &str) -> Result<Box<dyn DataSource>, DataSourceError> {
    match source {
        "airtable" => {
            let config = AirtableConfig::from_env()?;
            Ok(Box::new(AirtableClient::new(config)?))
        }
        other => Err(DataSourceError::UnknownSource(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_source_is_rejected() {
        let error = create_data_source("spreadsheet").err().unwrap();
        assert!(matches!(error, DataSourceError::UnknownSource(name) if name == "spreadsheet"));
    }
}
