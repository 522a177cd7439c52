use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, ToSchema, EnumString, Display, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Overdue,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Task {
    pub id: u64,
    pub title: String,
    pub description: Option<String>,
    pub assigned_to: u64,
    pub assigned_by: u64,
    pub status: TaskStatus,
    /// 0-100
    pub progress: i32,
    #[schema(value_type = Option<String>, format = "date")]
    pub due_date: Option<NaiveDate>,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: NaiveDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_progress_is_snake_case() {
        assert_eq!(TaskStatus::InProgress.as_ref(), "in_progress");
        assert_eq!(
            "in_progress".parse::<TaskStatus>().unwrap(),
            TaskStatus::InProgress
        );
        assert_eq!(
            serde_json::to_string(&TaskStatus::InProgress).unwrap(),
            "\"in_progress\""
        );
    }
}
