//! Core types for the task manager.

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AppError;

/// Display name used when a task's assignee does not resolve to a user.
pub const UNASSIGNED: &str = "Unassigned";

/// Lifecycle status of a task. Any status may follow any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TaskStatus {
    #[default]
    Pending,
    #[serde(rename = "In Progress")]
    InProgress,
    Completed,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 3] = [
        TaskStatus::Pending,
        TaskStatus::InProgress,
        TaskStatus::Completed,
    ];

    /// Canonical stored form. Status comparisons are exact matches on this string.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "Pending",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Completed => "Completed",
        }
    }

    /// Sort rank used by the status orderings.
    pub fn rank(&self) -> i32 {
        match self {
            TaskStatus::Pending => 0,
            TaskStatus::InProgress => 1,
            TaskStatus::Completed => 2,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Pending" | "pending" => Ok(TaskStatus::Pending),
            "In Progress" | "in_progress" | "in-progress" | "InProgress" => {
                Ok(TaskStatus::InProgress)
            }
            "Completed" | "completed" => Ok(TaskStatus::Completed),
            other => Err(AppError::invalid_value(
                "status",
                &format!("Unknown status '{}'", other),
            )),
        }
    }
}

/// Task priority. Optional on a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

impl Priority {
    pub const ALL: [Priority; 4] = [
        Priority::Critical,
        Priority::High,
        Priority::Medium,
        Priority::Low,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Critical => "Critical",
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "critical" => Ok(Priority::Critical),
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            _ => Err(AppError::invalid_value(
                "priority",
                &format!("Unknown priority '{}'", s.trim()),
            )),
        }
    }
}

/// Role membership. Every user holds exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::User => "User",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            _ => Err(AppError::invalid_value(
                "role",
                &format!("Unknown role '{}'", s.trim()),
            )),
        }
    }
}

// SQLite mapping: enums are stored as their canonical strings.

macro_rules! sql_text_enum {
    ($ty:ty) => {
        impl ToSql for $ty {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $ty {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                let text = value.as_str()?;
                text.parse().map_err(|e| FromSqlError::Other(Box::new(e)))
            }
        }
    };
}

sql_text_enum!(TaskStatus);
sql_text_enum!(Priority);
sql_text_enum!(Role);

/// A user from the directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub role: Role,
    pub created_at: NaiveDateTime,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// A stored task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    /// Assignee user id. `None` only when the user was removed from the directory.
    pub assigned_to: Option<String>,
    pub priority: Option<Priority>,
    pub deadline: Option<NaiveDate>,
    pub status: TaskStatus,
    pub created_at: NaiveDateTime,
}

/// Input for creating a task. Status and creation time are set by the store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub assigned_to: String,
    pub priority: Option<Priority>,
    pub deadline: Option<NaiveDate>,
}

/// Admin edit of a task's mutable fields. Every field is written as given.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskEdit {
    pub title: String,
    pub description: Option<String>,
    pub assigned_to: String,
    pub priority: Option<Priority>,
    pub deadline: Option<NaiveDate>,
    pub status: TaskStatus,
}

/// Listing projection: a task with its assignee resolved to a display name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskListItem {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub assigned_to: Option<String>,
    /// Assignee's full name, or [`UNASSIGNED`].
    pub assignee_name: String,
    pub priority: Option<Priority>,
    pub deadline: Option<NaiveDate>,
    pub status: TaskStatus,
    pub created_at: NaiveDateTime,
}
