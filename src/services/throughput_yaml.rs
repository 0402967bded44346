use std::io::{self, Write};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::throughput::Throughput;

#[derive(Error, Debug)]
pub enum ThroughputYamlError {
    #[error("failed to parse throughput yaml: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("invalid date format: {0} (expected YYYY-MM-DD)")]
    InvalidDate(String),
}

#[derive(Serialize, Deserialize)]
struct ThroughputRecord {
    date: String,
    completed_tasks: usize,
}

pub fn serialize_throughput_to_yaml<W: Write>(
    writer: &mut W,
    data: &[Throughput],
) -> io::Result<()> {
    let records: Vec<ThroughputRecord> = data
        .iter()
        .map(|t| ThroughputRecord {
            date: t.date.format("%Y-%m-%d").to_string(),
            completed_tasks: t.completed_tasks,
        })
        .collect();

    let yaml = serde_yaml::to_string(&records).map_err(io::Error::other)?;
    writer.write_all(yaml.as_bytes())
}

pub fn deserialize_throughput_from_yaml_str(
    yaml: &str,
) -> Result<Vec<Throughput>, ThroughputYamlError> {
    let records: Vec<ThroughputRecord> = serde_yaml::from_str(yaml)?;
    records
        .into_iter()
        .map(|record| {
            let date = NaiveDate::parse_from_str(&record.date, "%Y-%m-%d")
                .map_err(|_| ThroughputYamlError::InvalidDate(record.date.clone()))?;
            Ok(Throughput {
                date,
                completed_tasks: record.completed_tasks,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::on_date;

    #[test]
    fn test_serialize_throughput_to_yaml() {
        let data = vec![
            Throughput {
                date: on_date(2026, 2, 9),
                completed_tasks: 5,
            },
            Throughput {
                date: on_date(2026, 2, 10),
                completed_tasks: 3,
            },
        ];
        let mut buf = Vec::new();
        serialize_throughput_to_yaml(&mut buf, &data).unwrap();
        let output = String::from_utf8(buf).unwrap();
        assert!(output.contains("2026-02-09"));
        assert!(output.contains("completed_tasks: 5"));
        assert!(output.contains("2026-02-10"));
        assert!(output.contains("completed_tasks: 3"));
    }

    #[test]
    fn deserialize_reads_dates_and_counts() {
        let yaml = "- date: 2026-01-26\n  completed_tasks: 2\n- date: 2026-01-27\n  completed_tasks: 0\n";
        let throughput = deserialize_throughput_from_yaml_str(yaml).unwrap();
        assert_eq!(
            throughput,
            vec![
                Throughput {
                    date: on_date(2026, 1, 26),
                    completed_tasks: 2,
                },
                Throughput {
                    date: on_date(2026, 1, 27),
                    completed_tasks: 0,
                },
            ]
        );
    }

    #[test]
    fn deserialize_rejects_bad_dates() {
        let yaml = "- date: 26.01.2026\n  completed_tasks: 2\n";
        let error = deserialize_throughput_from_yaml_str(yaml).unwrap_err();
        assert!(matches!(error, ThroughputYamlError::InvalidDate(value) if value == "26.01.2026"));
    }
}
