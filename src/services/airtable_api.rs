use std::env;

use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde_json::Value;

use crate::services::data_source::{DataSource, DataSourceError};
use crate::services::dataset::Record;

pub const DEFAULT_API_URL: &str = "https://api.airtable.com/v0";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AirtableConfig {
    pub api_url: String,
    pub api_key: String,
    pub base: String,
    pub table: String,
}

impl AirtableConfig {
    /// Reads `AIRTABLE_API_KEY`, `AIRTABLE_BASE`, `AIRTABLE_TABLE` and the
    /// optional `AIRTABLE_API_URL`.
    pub fn from_env() -> Result<Self, DataSourceError> {
        let required =
            |name: &'static str| env::var(name).map_err(|_| DataSourceError::MissingEnv(name));
        Ok(Self {
            api_url: env::var("AIRTABLE_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            api_key: required("AIRTABLE_API_KEY")?,
            base: required("AIRTABLE_BASE")?,
            table: required("AIRTABLE_TABLE")?,
        })
    }
}

pub struct AirtableClient {
    config: AirtableConfig,
    client: Client,
}

impl AirtableClient {
    pub fn new(config: AirtableConfig) -> Result<Self, DataSourceError> {
        if config.base.is_empty() || config.table.is_empty() {
            return Err(DataSourceError::Parse(
                "airtable config is missing base or table".to_string(),
            ));
        }
        Ok(Self {
            config,
            client: Client::new(),
        })
    }

    fn fetch_page(&self, offset: Option<&str>) -> Result<Value, DataSourceError> {
        let url = format!(
            "{}/{}/{}",
            self.config.api_url.trim_end_matches('/'),
            self.config.base,
            self.config.table
        );
        let mut request = self.client.get(&url).bearer_auth(&self.config.api_key);
        if let Some(offset) = offset {
            request = request.query(&[("offset", offset)]);
        }
        let response = request
            .send()
            .map_err(|e| DataSourceError::Connection(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(DataSourceError::Unauthorized);
        }
        if status == StatusCode::NOT_FOUND {
            return Err(DataSourceError::NotFound);
        }
        if !status.is_success() {
            return Err(DataSourceError::Connection(format!("unexpected status {status}")));
        }

        response
            .json::<Value>()
            .map_err(|e| DataSourceError::Parse(e.to_string()))
    }
}

impl DataSource for AirtableClient {
    /// Follows the `offset` cursor until the last page and keeps the `fields`
    /// object of every record.
    fn fetch_records(&self) -> Result<Vec<Record>, DataSourceError> {
        let mut records = Vec::new();
        let mut offset: Option<String> = None;

        loop {
            let payload = self.fetch_page(offset.as_deref())?;
            let page = payload
                .get("records")
                .and_then(|value| value.as_array())
                .ok_or_else(|| DataSourceError::Parse("response has no records".to_string()))?;

            for record in page {
                let fields = record
                    .get("fields")
                    .and_then(|value| value.as_object())
                    .cloned()
                    .unwrap_or_default();
                records.push(fields);
            }
            tracing::debug!(fetched = records.len(), "fetched airtable page");

            match payload.get("offset").and_then(|value| value.as_str()) {
                Some(next) if offset.as_deref() != Some(next) => offset = Some(next.to_string()),
                _ => break,
            }
        }

        Ok(records)
    }
}
