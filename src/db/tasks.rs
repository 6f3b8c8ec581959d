//! Task CRUD operations.

use super::Database;
use super::users::get_user_internal;
use crate::error::AppError;
use crate::types::{NewTask, Role, Task, TaskEdit, TaskStatus};
use anyhow::Result;
use chrono::NaiveDateTime;
use rusqlite::{Connection, OptionalExtension, Row, params};

const TASK_COLUMNS: &str =
    "id, title, description, assigned_to, priority, deadline, status, created_at";

pub fn parse_task_row(row: &Row) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get("id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        assigned_to: row.get("assigned_to")?,
        priority: row.get("priority")?,
        deadline: row.get("deadline")?,
        status: row.get("status")?,
        created_at: row.get("created_at")?,
    })
}

/// Field-level checks shared by the store and the HTML forms.
///
/// Returns every problem found, in form order.
pub fn validate_task_fields(title: &str, assigned_to: &str) -> Vec<AppError> {
    let mut errors = Vec::new();
    if title.trim().is_empty() {
        errors.push(AppError::missing_field("title", "Task name is required"));
    }
    if assigned_to.trim().is_empty() {
        errors.push(AppError::missing_field(
            "assigned_to",
            "You must assign the task to a user",
        ));
    }
    errors
}

/// Blank descriptions are stored as NULL.
fn normalize_description(description: Option<&str>) -> Option<String> {
    description
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
}

/// Assignees must exist and hold the User role.
fn check_task_input(conn: &Connection, title: &str, assigned_to: &str) -> Result<()> {
    if let Some(err) = validate_task_fields(title, assigned_to).into_iter().next() {
        return Err(err.into());
    }
    match get_user_internal(conn, assigned_to.trim())? {
        None => Err(AppError::invalid_value("assigned_to", "Assigned user does not exist").into()),
        Some(user) if user.role != Role::User => Err(AppError::invalid_value(
            "assigned_to",
            "Tasks can only be assigned to users with the User role",
        )
        .into()),
        Some(_) => Ok(()),
    }
}

fn get_task_internal(conn: &Connection, task_id: i64) -> Result<Option<Task>> {
    let sql = format!("SELECT {} FROM tasks WHERE id = ?1", TASK_COLUMNS);
    let task = conn
        .query_row(&sql, params![task_id], parse_task_row)
        .optional()?;
    Ok(task)
}

impl Database {
    /// Create a task. Status always starts as Pending and `created_at` is stamped here.
    pub fn create_task(&self, input: &NewTask, now: NaiveDateTime) -> Result<Task> {
        self.with_conn(|conn| {
            check_task_input(conn, &input.title, &input.assigned_to)?;

            let title = input.title.trim();
            let assigned_to = input.assigned_to.trim();
            let description = normalize_description(input.description.as_deref());

            conn.execute(
                "INSERT INTO tasks (title, description, assigned_to, priority, deadline, status, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    title,
                    description,
                    assigned_to,
                    input.priority,
                    input.deadline,
                    TaskStatus::Pending,
                    now
                ],
            )?;
            let id = conn.last_insert_rowid();

            tracing::info!(task_id = id, assigned_to = %assigned_to, "Created task");

            Ok(Task {
                id,
                title: title.to_string(),
                description,
                assigned_to: Some(assigned_to.to_string()),
                priority: input.priority,
                deadline: input.deadline,
                status: TaskStatus::Pending,
                created_at: now,
            })
        })
    }

    /// Get a task by id.
    pub fn get_task(&self, task_id: i64) -> Result<Option<Task>> {
        self.with_conn(|conn| get_task_internal(conn, task_id))
    }

    /// Admin edit: overwrite every mutable field. Creation time is never touched.
    pub fn update_task(&self, task_id: i64, edit: &TaskEdit) -> Result<Task> {
        self.with_conn(|conn| {
            check_task_input(conn, &edit.title, &edit.assigned_to)?;

            let description = normalize_description(edit.description.as_deref());
            let rows_affected = conn.execute(
                "UPDATE tasks SET
                    title = ?1,
                    description = ?2,
                    assigned_to = ?3,
                    priority = ?4,
                    deadline = ?5,
                    status = ?6
                 WHERE id = ?7",
                params![
                    edit.title.trim(),
                    description,
                    edit.assigned_to.trim(),
                    edit.priority,
                    edit.deadline,
                    edit.status,
                    task_id
                ],
            )?;

            if rows_affected == 0 {
                return Err(AppError::task_not_found(task_id).into());
            }

            tracing::info!(task_id, status = %edit.status, "Updated task");

            get_task_internal(conn, task_id)?
                .ok_or_else(|| AppError::task_not_found(task_id).into())
        })
    }

    /// Status-only update by the assigned user.
    pub fn update_task_status(
        &self,
        task_id: i64,
        user_id: &str,
        status: TaskStatus,
    ) -> Result<Task> {
        self.with_conn(|conn| {
            let mut task =
                get_task_internal(conn, task_id)?.ok_or_else(|| AppError::task_not_found(task_id))?;

            if task.assigned_to.as_deref() != Some(user_id) {
                return Err(AppError::not_owner(task_id, user_id).into());
            }

            conn.execute(
                "UPDATE tasks SET status = ?1 WHERE id = ?2",
                params![status, task_id],
            )?;

            tracing::info!(task_id, user_id = %user_id, from = %task.status, to = %status, "Task status changed");

            task.status = status;
            Ok(task)
        })
    }

    /// Permanently delete a task.
    pub fn delete_task(&self, task_id: i64) -> Result<()> {
        self.with_conn(|conn| {
            let rows_affected = conn.execute("DELETE FROM tasks WHERE id = ?1", params![task_id])?;

            if rows_affected == 0 {
                return Err(AppError::task_not_found(task_id).into());
            }

            tracing::info!(task_id, "Deleted task");
            Ok(())
        })
    }

    /// Tasks assigned to a user, latest deadline first; tasks without a deadline last.
    pub fn tasks_for_user(&self, user_id: &str) -> Result<Vec<Task>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM tasks WHERE assigned_to = ?1
                 ORDER BY deadline DESC NULLS LAST, id DESC",
                TASK_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let tasks = stmt
                .query_map(params![user_id], parse_task_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(tasks)
        })
    }

    pub fn count_tasks(&self) -> Result<i64> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM tasks", [], |row| row.get(0))?;
            Ok(count)
        })
    }
}
