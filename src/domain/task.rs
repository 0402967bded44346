use chrono::NaiveDateTime;
use serde::Serialize;

const SHORT_LABEL_LENGTH: usize = 20;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Task {
    #[serde(rename = "type")]
    pub task_type: Option<String>,
    pub status: Option<String>,
    pub created_at: Option<NaiveDateTime>,
    pub closed_at: Option<NaiveDateTime>,
    pub started_at: Option<NaiveDateTime>,
    pub estimation: Option<i64>,
    pub description: Option<String>,
}

impl Task {
    pub fn new() -> Self {
        Self::default()
    }

    /// Days spent on the task, counting both the first and the last day.
    ///
    /// Measured from `started_at` when the task has one, otherwise from
    /// `created_at`.
    pub fn cycle_time(&self) -> Option<i64> {
        let from = match self.started_at {
            Some(started_at) => started_at,
            None => self.created_at?,
        };
        let to = self.closed_at?;
        Some(days_between(from, to) + 1)
    }

    pub fn has_estimation(&self) -> bool {
        self.estimation.is_some_and(|points| points != 0)
    }

    pub fn full_label(&self) -> String {
        let description = self.description.as_deref().unwrap_or("None");
        format!("{description}{}", self.estimation_suffix())
    }

    pub fn short_label(&self) -> String {
        let description = match self.description.as_deref() {
            Some(text) if !text.is_empty() => {
                let truncated: String = text.chars().take(SHORT_LABEL_LENGTH).collect();
                format!("{truncated}...")
            }
            _ => "<no description>".to_string(),
        };
        format!("{description}{}", self.estimation_suffix())
    }

    fn estimation_suffix(&self) -> String {
        match self.estimation {
            Some(points) if points != 0 => format!(" ({points} points)"),
            _ => String::new(),
        }
    }
}

/// Whole days elapsed between two timestamps, rounded towards negative
/// infinity.
pub fn days_between(from: NaiveDateTime, to: NaiveDateTime) -> i64 {
    (to - from).num_seconds().div_euclid(86_400)
}
