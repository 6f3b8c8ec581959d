//! Task listing: filter composition, free-text search and ordering.
//!
//! Every criterion in [`TaskFilter`] is optional; an absent criterion applies no
//! filter. Present criteria are combined with AND.

use super::Database;
use crate::types::{Priority, TaskListItem, TaskStatus, UNASSIGNED};
use anyhow::Result;
use chrono::NaiveDate;
use serde::Serialize;

/// Deadline buckets offered by the admin task list. Mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DeadlineBucket {
    /// Tasks whose deadline lies strictly after today.
    ///
    /// The label says "Due Today" but the bucket has always matched future
    /// deadlines (`deadline > now`); the home dashboard's due-today count is the
    /// exact-date variant.
    DueToday,
    /// Deadline before today, whatever the status.
    Overdue,
    /// No deadline set.
    NoDeadline,
}

impl DeadlineBucket {
    /// Parse a query-string value. Accepts the historical form labels as well as slugs.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "Due Date" | "Due Today" | "due" | "due-today" | "due_today" => {
                Some(DeadlineBucket::DueToday)
            }
            "Overdue" | "overdue" => Some(DeadlineBucket::Overdue),
            "No Deadline" | "no-deadline" | "no_deadline" | "none" => {
                Some(DeadlineBucket::NoDeadline)
            }
            _ => None,
        }
    }

    pub fn slug(&self) -> &'static str {
        match self {
            DeadlineBucket::DueToday => "due",
            DeadlineBucket::Overdue => "overdue",
            DeadlineBucket::NoDeadline => "no-deadline",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DeadlineBucket::DueToday => "Due Today",
            DeadlineBucket::Overdue => "Overdue",
            DeadlineBucket::NoDeadline => "No Deadline",
        }
    }
}

/// Ordering of the task list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum SortOrder {
    TitleAsc,
    TitleDesc,
    /// Deadline ascending, tasks without a deadline first.
    DateAsc,
    /// Deadline descending, tasks without a deadline last.
    DateDesc,
    StatusAsc,
    StatusDesc,
    /// Deadline ascending with absent deadlines first (same as `DateAsc`).
    #[default]
    Default,
}

impl SortOrder {
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "title_asc" => SortOrder::TitleAsc,
            "title_desc" => SortOrder::TitleDesc,
            "date_asc" => SortOrder::DateAsc,
            "date_desc" => SortOrder::DateDesc,
            "status_asc" => SortOrder::StatusAsc,
            "status_desc" => SortOrder::StatusDesc,
            _ => SortOrder::Default,
        }
    }

    pub fn as_param(&self) -> &'static str {
        match self {
            SortOrder::TitleAsc => "title_asc",
            SortOrder::TitleDesc => "title_desc",
            SortOrder::DateAsc => "date_asc",
            SortOrder::DateDesc => "date_desc",
            SortOrder::StatusAsc => "status_asc",
            SortOrder::StatusDesc => "status_desc",
            SortOrder::Default => "",
        }
    }

    /// ORDER BY clause. Each `_desc` ordering is the exact reverse of its `_asc`
    /// counterpart, tie-breaker included.
    ///
    /// SQLite would put NULL deadlines first on ASC and last on DESC anyway; the
    /// NULLS FIRST/LAST terms make that explicit.
    fn order_clause(&self) -> &'static str {
        match self {
            SortOrder::TitleAsc => " ORDER BY t.title ASC, t.id ASC",
            SortOrder::TitleDesc => " ORDER BY t.title DESC, t.id DESC",
            SortOrder::DateAsc | SortOrder::Default => {
                " ORDER BY t.deadline ASC NULLS FIRST, t.id ASC"
            }
            SortOrder::DateDesc => " ORDER BY t.deadline DESC NULLS LAST, t.id DESC",
            SortOrder::StatusAsc => " ORDER BY status_rank ASC, t.id ASC",
            SortOrder::StatusDesc => " ORDER BY status_rank DESC, t.id DESC",
        }
    }
}

/// Structured listing criteria.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskFilter {
    pub deadline: Option<DeadlineBucket>,
    pub status: Option<TaskStatus>,
    /// Assignee user id.
    pub assignee: Option<String>,
    pub priority: Option<Priority>,
    /// Substring matched against title OR description.
    pub search: Option<String>,
    pub sort: SortOrder,
}

/// Treat empty strings and the "All" sentinel as "no filter".
fn meaningful(value: Option<&str>) -> Option<&str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("all"))
}

impl TaskFilter {
    /// Build a filter from raw query-string values. Unrecognised values are ignored.
    pub fn from_params(
        deadline: Option<&str>,
        status: Option<&str>,
        assigned_to: Option<&str>,
        priority: Option<&str>,
        sort_order: Option<&str>,
        search: Option<&str>,
    ) -> Self {
        Self {
            deadline: meaningful(deadline).and_then(DeadlineBucket::parse),
            status: meaningful(status).and_then(|s| s.parse().ok()),
            assignee: meaningful(assigned_to).map(str::to_string),
            priority: meaningful(priority).and_then(|p| p.parse().ok()),
            search: search
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            sort: sort_order.map(SortOrder::parse).unwrap_or_default(),
        }
    }

    /// Page heading for the chosen deadline bucket.
    pub fn header_text(&self) -> &'static str {
        self.deadline.map(|b| b.label()).unwrap_or("All Tasks")
    }
}

/// Result of a listing query.
#[derive(Debug, Clone, Serialize)]
pub struct TaskListing {
    pub header: String,
    pub count: usize,
    pub tasks: Vec<TaskListItem>,
}

/// Escape LIKE wildcards so the search text matches literally.
fn like_pattern(search: &str) -> String {
    let mut escaped = String::with_capacity(search.len() + 2);
    escaped.push('%');
    for ch in search.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

impl Database {
    /// Run the listing query for `filter`, relative to `today`.
    pub fn query_tasks(&self, filter: &TaskFilter, today: NaiveDate) -> Result<TaskListing> {
        self.with_conn(|conn| {
            let mut sql = String::from(
                "SELECT t.id, t.title, t.description, t.assigned_to, u.full_name,
                        t.priority, t.deadline, t.status, t.created_at,
                        CASE t.status
                            WHEN 'Pending' THEN 0
                            WHEN 'In Progress' THEN 1
                            WHEN 'Completed' THEN 2
                        END AS status_rank
                 FROM tasks t
                 LEFT JOIN users u ON u.id = t.assigned_to
                 WHERE 1 = 1",
            );

            let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
            let mut param_idx = 1;

            match filter.deadline {
                Some(DeadlineBucket::DueToday) => {
                    sql.push_str(&format!(
                        " AND t.deadline IS NOT NULL AND t.deadline > ?{}",
                        param_idx
                    ));
                    params_vec.push(Box::new(today));
                    param_idx += 1;
                }
                Some(DeadlineBucket::Overdue) => {
                    sql.push_str(&format!(
                        " AND t.deadline IS NOT NULL AND t.deadline < ?{}",
                        param_idx
                    ));
                    params_vec.push(Box::new(today));
                    param_idx += 1;
                }
                Some(DeadlineBucket::NoDeadline) => {
                    sql.push_str(" AND t.deadline IS NULL");
                }
                None => {}
            }

            if let Some(status) = filter.status {
                sql.push_str(&format!(" AND t.status = ?{}", param_idx));
                params_vec.push(Box::new(status));
                param_idx += 1;
            }

            if let Some(ref assignee) = filter.assignee {
                sql.push_str(&format!(" AND t.assigned_to = ?{}", param_idx));
                params_vec.push(Box::new(assignee.clone()));
                param_idx += 1;
            }

            if let Some(priority) = filter.priority {
                sql.push_str(&format!(" AND t.priority = ?{}", param_idx));
                params_vec.push(Box::new(priority));
                param_idx += 1;
            }

            if let Some(ref search) = filter.search {
                sql.push_str(&format!(
                    " AND (t.title LIKE ?{idx} ESCAPE '\\' OR t.description LIKE ?{idx} ESCAPE '\\')",
                    idx = param_idx
                ));
                params_vec.push(Box::new(like_pattern(search)));
            }

            sql.push_str(filter.sort.order_clause());

            let params_refs: Vec<&dyn rusqlite::ToSql> =
                params_vec.iter().map(|b| b.as_ref()).collect();
            let mut stmt = conn.prepare(&sql)?;

            let tasks = stmt
                .query_map(params_refs.as_slice(), |row| {
                    let assignee_name: Option<String> = row.get(4)?;
                    Ok(TaskListItem {
                        id: row.get(0)?,
                        title: row.get(1)?,
                        description: row.get(2)?,
                        assigned_to: row.get(3)?,
                        assignee_name: assignee_name.unwrap_or_else(|| UNASSIGNED.to_string()),
                        priority: row.get(5)?,
                        deadline: row.get(6)?,
                        status: row.get(7)?,
                        created_at: row.get(8)?,
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            tracing::debug!(
                count = tasks.len(),
                bucket = ?filter.deadline,
                sort = ?filter.sort,
                "Task listing query"
            );

            Ok(TaskListing {
                header: filter.header_text().to_string(),
                count: tasks.len(),
                tasks,
            })
        })
    }
}
