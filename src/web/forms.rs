//! Form and query-string payloads.
//!
//! Every field arrives as an optional string; blank means "not given".

use chrono::NaiveDate;
use serde::Deserialize;

use crate::db::listing::TaskFilter;
use crate::db::report::ReportQuery;
use crate::db::tasks::validate_task_fields;
use crate::error::AppError;
use crate::types::{Priority, Task, TaskStatus};

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(value: &str, field: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::invalid_value(field, "Dates must be in YYYY-MM-DD format"))
}

fn parse_optional_date(value: &Option<String>, field: &str) -> Result<Option<NaiveDate>, AppError> {
    non_empty(value).map(|v| parse_date(v, field)).transpose()
}

/// Parse a task id from a hidden form field.
pub fn parse_id(value: &Option<String>) -> Option<i64> {
    non_empty(value).and_then(|v| v.parse().ok())
}

/// Create/edit task form. `id` and `status` are only posted by the edit form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskForm {
    pub id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub assigned_to: Option<String>,
    pub priority: Option<String>,
    pub deadline: Option<String>,
    pub status: Option<String>,
}

/// A task form that passed field validation.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskInput {
    pub title: String,
    pub description: Option<String>,
    pub assigned_to: String,
    pub priority: Option<Priority>,
    pub deadline: Option<NaiveDate>,
    pub status: Option<TaskStatus>,
}

impl TaskForm {
    /// Prefill the edit form from a stored task.
    pub fn from_task(task: &Task) -> Self {
        Self {
            id: Some(task.id.to_string()),
            title: Some(task.title.clone()),
            description: task.description.clone(),
            assigned_to: task.assigned_to.clone(),
            priority: task.priority.map(|p| p.to_string()),
            deadline: task.deadline.map(|d| d.format("%Y-%m-%d").to_string()),
            status: Some(task.status.to_string()),
        }
    }

    /// Validate every field, collecting all problems.
    pub fn parse(&self) -> Result<TaskInput, Vec<AppError>> {
        let title = self.title.as_deref().unwrap_or_default();
        let assigned_to = self.assigned_to.as_deref().unwrap_or_default();
        let mut errors = validate_task_fields(title, assigned_to);

        let priority = match non_empty(&self.priority).map(str::parse::<Priority>).transpose() {
            Ok(p) => p,
            Err(e) => {
                errors.push(e);
                None
            }
        };
        let deadline = match parse_optional_date(&self.deadline, "deadline") {
            Ok(d) => d,
            Err(e) => {
                errors.push(e);
                None
            }
        };
        let status = match non_empty(&self.status).map(str::parse::<TaskStatus>).transpose() {
            Ok(s) => s,
            Err(e) => {
                errors.push(e);
                None
            }
        };

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(TaskInput {
            title: title.trim().to_string(),
            description: non_empty(&self.description).map(str::to_string),
            assigned_to: assigned_to.trim().to_string(),
            priority,
            deadline,
            status,
        })
    }
}

/// Delete confirmation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IdForm {
    pub id: Option<String>,
}

/// Status-only update by the assignee.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusForm {
    pub id: Option<String>,
    pub status: Option<String>,
}

impl StatusForm {
    pub fn parse_status(&self) -> Result<TaskStatus, AppError> {
        match non_empty(&self.status) {
            Some(s) => s.parse(),
            None => Err(AppError::missing_field("status", "Status is required")),
        }
    }
}

/// `GET /tasks` query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    pub deadline: Option<String>,
    pub status: Option<String>,
    #[serde(rename = "assignedTo")]
    pub assigned_to: Option<String>,
    pub priority: Option<String>,
    #[serde(rename = "sortOrder")]
    pub sort_order: Option<String>,
    pub search: Option<String>,
    pub msg: Option<String>,
}

impl ListParams {
    pub fn filter(&self) -> TaskFilter {
        TaskFilter::from_params(
            self.deadline.as_deref(),
            self.status.as_deref(),
            self.assigned_to.as_deref(),
            self.priority.as_deref(),
            self.sort_order.as_deref(),
            self.search.as_deref(),
        )
    }
}

/// `GET /tasks/report` query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportParams {
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
    #[serde(rename = "startDate")]
    pub start_date: Option<String>,
    #[serde(rename = "endDate")]
    pub end_date: Option<String>,
}

impl ReportParams {
    pub fn query(&self) -> Result<ReportQuery, AppError> {
        Ok(ReportQuery {
            user_id: non_empty(&self.user_id)
                .filter(|id| !id.eq_ignore_ascii_case("all"))
                .map(str::to_string),
            start_date: parse_optional_date(&self.start_date, "startDate")?,
            end_date: parse_optional_date(&self.end_date, "endDate")?,
        })
    }
}

/// Pages that only carry a flash notice.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageParams {
    pub msg: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    fn form(title: &str, assigned_to: &str) -> TaskForm {
        TaskForm {
            title: Some(title.into()),
            assigned_to: Some(assigned_to.into()),
            ..Default::default()
        }
    }

    #[test]
    fn valid_form_parses() {
        let mut f = form(" Write report ", "user-a");
        f.priority = Some("Medium".into());
        f.deadline = Some("2026-11-01".into());
        f.description = Some("   ".into());
        let input = f.parse().unwrap();
        assert_eq!(input.title, "Write report");
        assert_eq!(input.priority, Some(Priority::Medium));
        assert_eq!(input.deadline, NaiveDate::from_ymd_opt(2026, 11, 1));
        assert_eq!(input.description, None);
        assert_eq!(input.status, None);
    }

    #[test]
    fn collects_every_field_error() {
        let mut f = form("", "");
        f.deadline = Some("next tuesday".into());
        f.priority = Some("Urgent".into());
        let errors = f.parse().unwrap_err();
        let fields: Vec<_> = errors.iter().filter_map(|e| e.field.as_deref()).collect();
        assert_eq!(fields, vec!["title", "assigned_to", "priority", "deadline"]);
        assert_eq!(errors[0].message, "Task name is required");
        assert_eq!(errors[1].message, "You must assign the task to a user");
    }

    #[test]
    fn ids_must_be_numeric() {
        assert_eq!(parse_id(&Some("42".into())), Some(42));
        assert_eq!(parse_id(&Some("abc".into())), None);
        assert_eq!(parse_id(&None), None);
    }

    #[test]
    fn status_form_requires_status() {
        let f = StatusForm {
            id: Some("1".into()),
            status: None,
        };
        assert_eq!(f.parse_status().unwrap_err().code, ErrorCode::MissingRequiredField);
        let f = StatusForm {
            id: Some("1".into()),
            status: Some("In Progress".into()),
        };
        assert_eq!(f.parse_status().unwrap(), TaskStatus::InProgress);
    }

    #[test]
    fn report_params_treat_all_and_blank_as_absent() {
        let params = ReportParams {
            user_id: Some("All".into()),
            start_date: Some("".into()),
            end_date: Some("2026-10-31".into()),
        };
        let query = params.query().unwrap();
        assert_eq!(query.user_id, None);
        assert_eq!(query.start_date, None);
        assert_eq!(query.end_date, NaiveDate::from_ymd_opt(2026, 10, 31));
    }

    #[test]
    fn report_params_reject_bad_dates() {
        let params = ReportParams {
            start_date: Some("31/10/2026".into()),
            ..Default::default()
        };
        let err = params.query().unwrap_err();
        assert_eq!(err.field.as_deref(), Some("startDate"));
    }
}
