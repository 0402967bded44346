use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Timestamp layout of the sample project's exports, e.g.
/// `2024-01-05T09:30:00.000Z`.
pub const ISO_MILLIS_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.fZ";

#[derive(Error, Debug)]
pub enum ProjectSchemaError {
    #[error("unknown project schema: {0}")]
    UnknownSchema(String),
    #[error("failed to read project schema {path}: {source}")]
    ReadFile { path: PathBuf, source: io::Error },
    #[error("failed to parse project schema {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("project schema does not map the required field {0}")]
    MissingField(TaskField),
}

/// Task attributes a dataset column can be mapped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskField {
    Description,
    Type,
    Status,
    CreatedAt,
    StartedAt,
    ClosedAt,
    Estimation,
}

impl fmt::Display for TaskField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TaskField::Description => "description",
            TaskField::Type => "type",
            TaskField::Status => "status",
            TaskField::CreatedAt => "created_at",
            TaskField::StartedAt => "started_at",
            TaskField::ClosedAt => "closed_at",
            TaskField::Estimation => "estimation",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FieldSpec {
    pub column: String,
    /// `chrono` format string for timestamp columns.
    #[serde(default)]
    pub format: Option<String>,
}

impl FieldSpec {
    pub fn new(column: &str) -> Self {
        Self {
            column: column.to_string(),
            format: None,
        }
    }

    pub fn timestamp(column: &str, format: &str) -> Self {
        Self {
            column: column.to_string(),
            format: Some(format.to_string()),
        }
    }
}

/// Maps the columns of a dataset onto task fields.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProjectSchema {
    #[serde(default)]
    pub name: String,
    pub fields: BTreeMap<TaskField, FieldSpec>,
}

impl ProjectSchema {
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, ProjectSchemaError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| {
            ProjectSchemaError::ReadFile {
                path: path.to_path_buf(),
                source,
            }
        })?;
        let schema: ProjectSchema =
            serde_yaml::from_str(&contents).map_err(|source| ProjectSchemaError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        schema.validate()?;
        Ok(schema)
    }

    pub fn sample_project() -> Self {
        let fields = BTreeMap::from([
            (TaskField::Description, FieldSpec::new("Name")),
            (TaskField::Type, FieldSpec::new("Type")),
            (TaskField::Status, FieldSpec::new("Status")),
            (
                TaskField::CreatedAt,
                FieldSpec::timestamp("createdAt", ISO_MILLIS_FORMAT),
            ),
            (
                TaskField::StartedAt,
                FieldSpec::timestamp("toInProgress", ISO_MILLIS_FORMAT),
            ),
            (
                TaskField::ClosedAt,
                FieldSpec::timestamp("toDone", ISO_MILLIS_FORMAT),
            ),
            (TaskField::Estimation, FieldSpec::new("Points")),
        ]);
        Self {
            name: "sample_project".to_string(),
            fields,
        }
    }

    pub fn field(&self, field: TaskField) -> Option<&FieldSpec> {
        self.fields.get(&field)
    }

    fn validate(&self) -> Result<(), ProjectSchemaError> {
        for required in [TaskField::CreatedAt, TaskField::ClosedAt] {
            if !self.fields.contains_key(&required) {
                return Err(ProjectSchemaError::MissingField(required));
            }
        }
        Ok(())
    }
}

/// Looks up one of the built-in schemas by name.
pub fn create_project_schema(name: &str) -> Result<ProjectSchema, ProjectSchemaError> {
    match name {
        "sample_project" => Ok(ProjectSchema::sample_project()),
        other => Err(ProjectSchemaError::UnknownSchema(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;

    #[test]
    fn sample_project_maps_every_field() {
        let schema = create_project_schema("sample_project").unwrap();
        assert_eq!(schema.fields.len(), 7);
        assert!(schema.field(TaskField::StartedAt).is_some());
        assert_eq!(schema.field(TaskField::ClosedAt).unwrap().column, "toDone");
        assert_eq!(
            schema.field(TaskField::CreatedAt).unwrap().format.as_deref(),
            Some(ISO_MILLIS_FORMAT)
        );
    }

    #[test]
    fn unknown_schema_name_is_rejected() {
        let error = create_project_schema("jira").unwrap_err();
        assert!(matches!(error, ProjectSchemaError::UnknownSchema(name) if name == "jira"));
    }

    #[test]
    fn from_yaml_file_reads_column_mapping() {
        let file = assert_fs::NamedTempFile::new("schema.yaml").unwrap();
        file.write_str(
            "name: team_board\nfields:\n  description:\n    column: Title\n  created_at:\n    column: Opened\n    format: \"%d.%m.%Y\"\n  closed_at:\n    column: Resolved\n",
        )
        .unwrap();

        let schema = ProjectSchema::from_yaml_file(file.path()).unwrap();

        assert_eq!(schema.name, "team_board");
        assert_eq!(schema.field(TaskField::StartedAt), None);
        assert_eq!(schema.field(TaskField::Description), Some(&FieldSpec::new("Title")));
        assert_eq!(
            schema.field(TaskField::CreatedAt),
            Some(&FieldSpec::timestamp("Opened", "%d.%m.%Y"))
        );
    }

    #[test]
    fn from_yaml_file_requires_closed_at() {
        let file = assert_fs::NamedTempFile::new("schema.yaml").unwrap();
        file.write_str("fields:\n  created_at:\n    column: Opened\n").unwrap();

        let error = ProjectSchema::from_yaml_file(file.path()).unwrap_err();

        assert!(matches!(error, ProjectSchemaError::MissingField(TaskField::ClosedAt)));
    }

    #[test]
    fn from_yaml_file_reports_unknown_fields() {
        let file = assert_fs::NamedTempFile::new("schema.yaml").unwrap();
        file.write_str("fields:\n  assignee:\n    column: Owner\n").unwrap();

        let error = ProjectSchema::from_yaml_file(file.path()).unwrap_err();

        assert!(matches!(error, ProjectSchemaError::Parse { .. }));
    }
}
