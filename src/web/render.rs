//! Shared HTML rendering helpers.

use axum::response::{Html, Redirect};
use chrono::NaiveDate;

use super::templates;
use crate::error::AppError;
use crate::types::{Priority, Role, TaskStatus, User};

/// Escape HTML special characters.
///
/// Braces are escaped too, so escaped text can never form a `{{placeholder}}`
/// that a later template substitution would expand.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
        .replace('{', "&#123;")
        .replace('}', "&#125;")
}

/// Kind of flash notice carried in `?msg=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    Success,
    Error,
    Info,
}

impl Notice {
    fn prefix(&self) -> &'static str {
        match self {
            Notice::Success => "success",
            Notice::Error => "error",
            Notice::Info => "info",
        }
    }
}

/// Redirect to `path` with a flash notice.
pub fn redirect_with(path: &str, notice: Notice, text: &str) -> Redirect {
    let msg = format!("{}:{}", notice.prefix(), text);
    Redirect::to(&format!("{}?msg={}", path, urlencoding::encode(&msg)))
}

/// Render a flash notice (`success:...`, `error:...` or `info:...`).
pub fn flash_message(msg: Option<&str>) -> String {
    let Some(m) = msg.filter(|m| !m.is_empty()) else {
        return String::new();
    };
    let (class, text) = if let Some(stripped) = m.strip_prefix("success:") {
        ("message-success", stripped)
    } else if let Some(stripped) = m.strip_prefix("error:") {
        ("message-error", stripped)
    } else if let Some(stripped) = m.strip_prefix("info:") {
        ("message-info", stripped)
    } else {
        ("message-success", m)
    };
    format!(
        r#"<div class="message {}">{}</div>"#,
        class,
        html_escape(text)
    )
}

fn nav_links(role: Role) -> &'static str {
    match role {
        Role::Admin => {
            r#"<a href="/">Dashboard</a>
        <a href="/tasks">Tasks</a>
        <a href="/tasks/create">Create Task</a>
        <a href="/tasks/report">Report</a>
        <a href="/users">Users</a>"#
        }
        Role::User => {
            r#"<a href="/">Dashboard</a>
        <a href="/tasks/my-tasks">My Tasks</a>
        <a href="/tasks/overview">Overview</a>"#
        }
    }
}

/// Wrap page content in the layout.
pub fn page(title: &str, user: &User, message: &str, content: &str) -> Html<String> {
    let html = templates::BASE_TEMPLATE
        .replace("{{title}}", &html_escape(title))
        .replace("{{nav}}", nav_links(user.role))
        .replace("{{user_name}}", &html_escape(&user.full_name))
        .replace("{{user_role}}", user.role.as_str())
        .replace("{{message}}", message)
        .replace("{{content}}", content);
    Html(html)
}

/// Standalone error page.
pub fn error_page(err: &AppError) -> String {
    let status = err.status();
    let heading = format!(
        "{} {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Error")
    );
    let code = serde_json::to_value(err.code)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default();
    templates::ERROR_TEMPLATE
        .replace("{{status}}", &html_escape(&heading))
        .replace("{{message}}", &html_escape(&err.message))
        .replace("{{code}}", &code)
}

pub fn status_badge(status: TaskStatus) -> String {
    let class = match status {
        TaskStatus::Pending => "badge-pending",
        TaskStatus::InProgress => "badge-info",
        TaskStatus::Completed => "badge-success",
    };
    format!(r#"<span class="badge {}">{}</span>"#, class, status)
}

pub fn priority_badge(priority: Option<Priority>) -> String {
    match priority {
        Some(p) => {
            let class = match p {
                Priority::Critical => "badge-error",
                Priority::High => "badge-pending",
                Priority::Medium => "badge-info",
                Priority::Low => "badge-muted",
            };
            format!(r#"<span class="badge {}">{}</span>"#, class, p)
        }
        None => r#"<span class="muted">-</span>"#.to_string(),
    }
}

/// Deadline cell text; overdue open tasks are flagged.
pub fn deadline_cell(deadline: Option<NaiveDate>, status: TaskStatus, today: NaiveDate) -> String {
    match deadline {
        Some(d) if d < today && status != TaskStatus::Completed => {
            format!(
                r#"{} <span class="badge badge-error">Overdue</span>"#,
                d.format("%Y-%m-%d")
            )
        }
        Some(d) => d.format("%Y-%m-%d").to_string(),
        None => r#"<span class="muted">No deadline</span>"#.to_string(),
    }
}

pub fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// `<option>` list; `selected` is compared against each value.
pub fn select_options<'a>(
    options: impl IntoIterator<Item = (&'a str, &'a str)>,
    selected: Option<&str>,
) -> String {
    options
        .into_iter()
        .map(|(value, label)| {
            let sel = if selected == Some(value) {
                " selected"
            } else {
                ""
            };
            format!(
                r#"<option value="{}"{}>{}</option>"#,
                html_escape(value),
                sel,
                html_escape(label)
            )
        })
        .collect()
}

/// Field-level messages for one form field.
pub fn field_errors(errors: &[AppError], field: &str) -> String {
    errors
        .iter()
        .filter(|e| e.field.as_deref() == Some(field))
        .map(|e| {
            format!(
                r#"<span class="field-error">{}</span>"#,
                html_escape(&e.message)
            )
        })
        .collect()
}
