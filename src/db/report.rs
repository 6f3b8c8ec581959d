//! Completion reports: status totals, completion rate, per-user and per-week
//! completed counts.
//!
//! There is no completion timestamp on a task, so weekly buckets are keyed on the
//! deadline of Completed tasks.

use super::Database;
use super::dashboard::Scope;
use crate::error::AppError;
use crate::types::{TaskStatus, User};
use anyhow::Result;
use chrono::{Days, NaiveDate};
use rusqlite::ToSql;
use serde::Serialize;

/// Number of weekly buckets in a report.
pub const REPORT_WEEKS: u64 = 5;

/// Report criteria. The date range applies to task creation dates, inclusive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportQuery {
    pub user_id: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl ReportQuery {
    pub fn scope(&self) -> Scope {
        match self.user_id {
            Some(ref id) => Scope::User(id.clone()),
            None => Scope::All,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserCompletion {
    pub user_id: String,
    pub full_name: String,
    pub completed: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeeklyCompletion {
    pub label: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub completed: i64,
}

/// Aggregate report for a scope.
#[derive(Debug, Clone, Serialize)]
pub struct TaskReport {
    /// Full name of the selected user, when the report is scoped to one.
    pub full_name: Option<String>,
    pub selected_user_id: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,

    pub total: i64,
    pub pending: i64,
    pub in_progress: i64,
    pub completed: i64,
    /// `deadline < today AND status != Completed`.
    pub overdue: i64,
    pub completion_rate: f64,

    pub chart_labels: Vec<String>,
    pub chart_data: Vec<i64>,

    pub per_user: Vec<UserCompletion>,
    pub weekly: Vec<WeeklyCompletion>,

    /// Users offered in the report's filter.
    pub users: Vec<User>,
}

/// Completed as a percentage of total, rounded to one decimal. Zero when there are no tasks.
pub fn completion_rate(completed: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    let rate = completed as f64 / total as f64 * 100.0;
    (rate * 10.0).round() / 10.0
}

/// The last [`REPORT_WEEKS`] seven-day windows `[start, start + 6]`, oldest first,
/// the newest ending on `today`.
pub fn week_buckets(today: NaiveDate) -> Vec<(NaiveDate, NaiveDate)> {
    (0..REPORT_WEEKS)
        .rev()
        .filter_map(|weeks_back| {
            let end = today.checked_sub_days(Days::new(weeks_back * 7))?;
            let start = end.checked_sub_days(Days::new(6))?;
            Some((start, end))
        })
        .collect()
}

/// WHERE fragments plus their positional parameters, in order.
#[derive(Default)]
struct Conditions {
    sql: String,
    params: Vec<Box<dyn ToSql>>,
}

impl Conditions {
    fn push<T: ToSql + 'static>(&mut self, clause: &str, value: T) {
        self.sql.push_str(clause);
        self.params.push(Box::new(value));
    }

    fn scoped(scope: &Scope, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        let mut conditions = Conditions::default();
        if let Some(user_id) = scope.user_id() {
            conditions.push(" AND t.assigned_to = ?", user_id.to_string());
        }
        conditions.add_date_range(start, end);
        conditions
    }

    fn add_date_range(&mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) {
        if let Some(start) = start {
            self.push(" AND date(t.created_at) >= ?", start);
        }
        if let Some(end) = end {
            self.push(" AND date(t.created_at) <= ?", end);
        }
    }

    fn refs<'a>(&'a self, leading: &[&'a dyn ToSql]) -> Vec<&'a dyn ToSql> {
        leading
            .iter()
            .copied()
            .chain(self.params.iter().map(|b| b.as_ref()))
            .collect()
    }
}

impl Database {
    /// Build the aggregate report for `query`, relative to `today`.
    ///
    /// An unknown `user_id` is `USER_NOT_FOUND`.
    pub fn task_report(&self, query: &ReportQuery, today: NaiveDate) -> Result<TaskReport> {
        let scope = query.scope();
        let full_name = match scope.user_id() {
            Some(id) => match self.get_user(id)? {
                Some(user) => Some(user.full_name),
                None => return Err(AppError::user_not_found(id).into()),
            },
            None => None,
        };
        let users = self.list_users()?;

        self.with_conn(|conn| {
            let conditions = Conditions::scoped(&scope, query.start_date, query.end_date);

            let status_sql = format!(
                "SELECT
                    COUNT(*),
                    COALESCE(SUM(CASE WHEN t.status = 'Pending' THEN 1 ELSE 0 END), 0),
                    COALESCE(SUM(CASE WHEN t.status = 'In Progress' THEN 1 ELSE 0 END), 0),
                    COALESCE(SUM(CASE WHEN t.status = 'Completed' THEN 1 ELSE 0 END), 0),
                    COALESCE(SUM(CASE WHEN t.deadline IS NOT NULL AND t.deadline < ?
                                       AND t.status != 'Completed' THEN 1 ELSE 0 END), 0)
                 FROM tasks t
                 WHERE 1 = 1{}",
                conditions.sql
            );
            let (total, pending, in_progress, completed, overdue): (i64, i64, i64, i64, i64) = conn
                .query_row(
                    &status_sql,
                    conditions.refs(&[&today]).as_slice(),
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?)),
                )?;

            // Per-user: every user appears, zero included. The user filter does not apply.
            let mut per_user_conditions = Conditions::default();
            per_user_conditions.add_date_range(query.start_date, query.end_date);
            let per_user_sql = format!(
                "SELECT u.id, u.full_name, COUNT(t.id)
                 FROM users u
                 LEFT JOIN tasks t
                    ON t.assigned_to = u.id AND t.status = 'Completed'{}
                 GROUP BY u.id, u.full_name
                 ORDER BY u.full_name ASC, u.id ASC",
                per_user_conditions.sql
            );
            let mut stmt = conn.prepare(&per_user_sql)?;
            let per_user = stmt
                .query_map(per_user_conditions.refs(&[]).as_slice(), |row| {
                    Ok(UserCompletion {
                        user_id: row.get(0)?,
                        full_name: row.get(1)?,
                        completed: row.get(2)?,
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            let weekly_sql = format!(
                "SELECT COUNT(*) FROM tasks t
                 WHERE t.status = 'Completed'
                   AND t.deadline IS NOT NULL
                   AND t.deadline >= ? AND t.deadline <= ?{}",
                conditions.sql
            );
            let mut weekly = Vec::with_capacity(REPORT_WEEKS as usize);
            for (start, end) in week_buckets(today) {
                let count: i64 = conn.query_row(
                    &weekly_sql,
                    conditions.refs(&[&start, &end]).as_slice(),
                    |row| row.get(0),
                )?;
                weekly.push(WeeklyCompletion {
                    label: start.format("%b %d").to_string(),
                    start,
                    end,
                    completed: count,
                });
            }

            tracing::debug!(
                scope = ?scope,
                total,
                completed,
                "Computed task report"
            );

            Ok(TaskReport {
                full_name,
                selected_user_id: query.user_id.clone(),
                start_date: query.start_date,
                end_date: query.end_date,
                total,
                pending,
                in_progress,
                completed,
                overdue,
                completion_rate: completion_rate(completed, total),
                chart_labels: TaskStatus::ALL.iter().map(|s| s.to_string()).collect(),
                chart_data: vec![pending, in_progress, completed],
                per_user,
                weekly,
                users,
            })
        })
    }

    /// Personal performance overview for one user.
    pub fn employee_overview(&self, user_id: &str, today: NaiveDate) -> Result<TaskReport> {
        let query = ReportQuery {
            user_id: Some(user_id.to_string()),
            ..Default::default()
        };
        self.task_report(&query, today)
    }
}
