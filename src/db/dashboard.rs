//! Home dashboard counts.
//!
//! Admin and user dashboards run the same counting query; only the [`Scope`]
//! differs.

use super::Database;
use crate::types::{Role, User};
use anyhow::Result;
use chrono::NaiveDate;
use rusqlite::params;
use serde::Serialize;

/// Which tasks a view covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// Every task.
    All,
    /// Tasks assigned to one user id.
    User(String),
}

impl Scope {
    /// The scope a user sees on their own dashboard.
    pub fn for_user(user: &User) -> Self {
        match user.role {
            Role::Admin => Scope::All,
            Role::User => Scope::User(user.id.clone()),
        }
    }

    pub fn user_id(&self) -> Option<&str> {
        match self {
            Scope::All => None,
            Scope::User(id) => Some(id),
        }
    }
}

/// Task counts for one scope.
///
/// `overdue` is `deadline < today AND status != Completed`; `due_today` is an
/// exact date match on today.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusBreakdown {
    pub total: i64,
    pub pending: i64,
    pub in_progress: i64,
    pub completed: i64,
    pub overdue: i64,
    pub no_deadline: i64,
    pub due_today: i64,
}

/// Role-dependent home dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "role")]
pub enum HomeDashboard {
    Admin {
        total_tasks: i64,
        total_users: i64,
        due_today: i64,
        overdue: i64,
        no_deadline: i64,
        pending: i64,
        in_progress: i64,
        completed: i64,
    },
    User {
        my_tasks: i64,
        overdue: i64,
        no_deadline: i64,
        pending: i64,
        in_progress: i64,
        completed: i64,
    },
}

impl Database {
    /// Count tasks by status and deadline state within `scope`.
    pub fn status_breakdown(&self, scope: &Scope, today: NaiveDate) -> Result<StatusBreakdown> {
        self.with_conn(|conn| {
            let breakdown = conn.query_row(
                "SELECT
                    COUNT(*),
                    COALESCE(SUM(CASE WHEN status = 'Pending' THEN 1 ELSE 0 END), 0),
                    COALESCE(SUM(CASE WHEN status = 'In Progress' THEN 1 ELSE 0 END), 0),
                    COALESCE(SUM(CASE WHEN status = 'Completed' THEN 1 ELSE 0 END), 0),
                    COALESCE(SUM(CASE WHEN deadline IS NOT NULL AND deadline < ?1
                                       AND status != 'Completed' THEN 1 ELSE 0 END), 0),
                    COALESCE(SUM(CASE WHEN deadline IS NULL THEN 1 ELSE 0 END), 0),
                    COALESCE(SUM(CASE WHEN deadline = ?1 THEN 1 ELSE 0 END), 0)
                 FROM tasks
                 WHERE (?2 IS NULL OR assigned_to = ?2)",
                params![today, scope.user_id()],
                |row| {
                    Ok(StatusBreakdown {
                        total: row.get(0)?,
                        pending: row.get(1)?,
                        in_progress: row.get(2)?,
                        completed: row.get(3)?,
                        overdue: row.get(4)?,
                        no_deadline: row.get(5)?,
                        due_today: row.get(6)?,
                    })
                },
            )?;
            Ok(breakdown)
        })
    }

    /// Build the home dashboard for `user`.
    pub fn home_dashboard(&self, user: &User, today: NaiveDate) -> Result<HomeDashboard> {
        let scope = Scope::for_user(user);
        let counts = self.status_breakdown(&scope, today)?;

        let dashboard = match scope {
            Scope::All => HomeDashboard::Admin {
                total_tasks: counts.total,
                total_users: self.count_users()?,
                due_today: counts.due_today,
                overdue: counts.overdue,
                no_deadline: counts.no_deadline,
                pending: counts.pending,
                in_progress: counts.in_progress,
                completed: counts.completed,
            },
            Scope::User(_) => HomeDashboard::User {
                my_tasks: counts.total,
                overdue: counts.overdue,
                no_deadline: counts.no_deadline,
                pending: counts.pending,
                in_progress: counts.in_progress,
                completed: counts.completed,
            },
        };

        Ok(dashboard)
    }
}
