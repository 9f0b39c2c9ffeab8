use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

/// Task board column. Stored uppercase, matching the board labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "task_status", rename_all = "UPPERCASE")
)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskStatus {
    Todo,
    Doing,
    Done,
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "TODO" => Ok(TaskStatus::Todo),
            "DOING" => Ok(TaskStatus::Doing),
            "DONE" => Ok(TaskStatus::Done),
            other => Err(format!("invalid task status: {}", other)),
        }
    }
}

/// Task entity
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Task {
    pub task_id: Uuid,
    pub team_id: Uuid,
    /// Assignee; optional, a task may be unassigned.
    pub user_id: Option<Uuid>,
    pub task_name: String,
    pub task_desc: Option<String>,
    pub task_status: TaskStatus,
    pub task_deadline: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Task list row joined with the assignee's username.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct TaskWithAssignee {
    pub task_id: Uuid,
    pub task_name: String,
    pub task_desc: Option<String>,
    pub task_status: TaskStatus,
    pub task_deadline: Option<NaiveDate>,
    pub user_id: Option<Uuid>,
    pub username: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parses_case_insensitively() {
        assert_eq!("todo".parse::<TaskStatus>().unwrap(), TaskStatus::Todo);
        assert_eq!("Doing".parse::<TaskStatus>().unwrap(), TaskStatus::Doing);
        assert_eq!("DONE".parse::<TaskStatus>().unwrap(), TaskStatus::Done);
    }

    #[test]
    fn test_unknown_status_rejected() {
        assert!("SHIPPED".parse::<TaskStatus>().is_err());
        assert!("".parse::<TaskStatus>().is_err());
    }
}
