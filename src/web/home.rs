//! Dashboard, report, overview and user directory pages.

use axum::extract::{Query, State};
use axum::response::Html;

use super::auth::{AdminUser, CurrentUser, MemberUser};
use super::forms::{MessageParams, ReportParams};
use super::render::{flash_message, format_date, html_escape, page, select_options};
use super::server::AppState;
use super::templates;
use crate::db::dashboard::HomeDashboard;
use crate::db::report::TaskReport;
use crate::db::today_local;
use crate::error::AppResult;
use crate::types::User;

/// `GET /`
pub async fn dashboard(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<MessageParams>,
) -> AppResult<Html<String>> {
    let content = match state.db().home_dashboard(&user, today_local())? {
        HomeDashboard::Admin {
            total_tasks,
            total_users,
            due_today,
            overdue,
            no_deadline,
            pending,
            in_progress,
            completed,
        } => templates::DASHBOARD_ADMIN_TEMPLATE
            .replace("{{total_tasks}}", &total_tasks.to_string())
            .replace("{{total_users}}", &total_users.to_string())
            .replace("{{due_today}}", &due_today.to_string())
            .replace("{{overdue}}", &overdue.to_string())
            .replace("{{no_deadline}}", &no_deadline.to_string())
            .replace("{{pending}}", &pending.to_string())
            .replace("{{in_progress}}", &in_progress.to_string())
            .replace("{{completed}}", &completed.to_string()),
        HomeDashboard::User {
            my_tasks,
            overdue,
            no_deadline,
            pending,
            in_progress,
            completed,
        } => templates::DASHBOARD_USER_TEMPLATE
            .replace("{{my_tasks}}", &my_tasks.to_string())
            .replace("{{overdue}}", &overdue.to_string())
            .replace("{{no_deadline}}", &no_deadline.to_string())
            .replace("{{pending}}", &pending.to_string())
            .replace("{{in_progress}}", &in_progress.to_string())
            .replace("{{completed}}", &completed.to_string()),
    };

    Ok(page(
        "Dashboard",
        &user,
        &flash_message(params.msg.as_deref()),
        &content,
    ))
}

/// Horizontal bar chart as a table.
fn bar_chart<'a>(rows: impl IntoIterator<Item = (&'a str, i64)>) -> String {
    let rows: Vec<_> = rows.into_iter().collect();
    if rows.is_empty() {
        return r#"<div class="empty-state">Nothing to show.</div>"#.to_string();
    }
    let max = rows.iter().map(|(_, v)| *v).max().unwrap_or(0).max(1);

    let mut html = String::from("<table>");
    for (label, value) in rows {
        // Counts are non-negative, so this is already 0..=100.
        let width = (value * 100 / max).clamp(0, 100);
        html.push_str(&format!(
            r#"<tr><td class="bar-label">{}</td><td><div class="bar" style="width: {}%"></div></td><td class="bar-value">{}</td></tr>"#,
            html_escape(label),
            width,
            value
        ));
    }
    html.push_str("</table>");
    html
}

fn render_report(report: &TaskReport, heading: &str, filter_form: &str, show_per_user: bool) -> String {
    let status_chart = bar_chart(
        report
            .chart_labels
            .iter()
            .map(String::as_str)
            .zip(report.chart_data.iter().copied()),
    );
    let weekly_chart = bar_chart(
        report
            .weekly
            .iter()
            .map(|w| (w.label.as_str(), w.completed)),
    );
    let per_user_section = if show_per_user {
        format!(
            r#"<div class="card"><h2>Completed by User</h2>{}</div>"#,
            bar_chart(
                report
                    .per_user
                    .iter()
                    .map(|u| (u.full_name.as_str(), u.completed))
            )
        )
    } else {
        String::new()
    };

    templates::REPORT_TEMPLATE
        .replace("{{heading}}", &html_escape(heading))
        .replace("{{filter_form}}", filter_form)
        .replace("{{total}}", &report.total.to_string())
        .replace("{{pending}}", &report.pending.to_string())
        .replace("{{in_progress}}", &report.in_progress.to_string())
        .replace("{{completed}}", &report.completed.to_string())
        .replace("{{overdue}}", &report.overdue.to_string())
        .replace("{{completion_rate}}", &format!("{:.1}", report.completion_rate))
        .replace("{{status_chart}}", &status_chart)
        .replace("{{weekly_chart}}", &weekly_chart)
        .replace("{{per_user_section}}", &per_user_section)
}

fn report_filter_form(report: &TaskReport) -> String {
    let user_options = select_options(
        [("", "All Users")].into_iter().chain(
            report
                .users
                .iter()
                .map(|u| (u.id.as_str(), u.full_name.as_str())),
        ),
        Some(report.selected_user_id.as_deref().unwrap_or("")),
    );
    format!(
        r#"<div class="card"><form class="filters" method="get" action="/tasks/report">
<div><label for="userId">User</label><select id="userId" name="userId">{}</select></div>
<div><label for="startDate">Created From</label><input id="startDate" type="date" name="startDate" value="{}"></div>
<div><label for="endDate">Created To</label><input id="endDate" type="date" name="endDate" value="{}"></div>
<div><button class="btn" type="submit">Apply</button> <a class="btn btn-plain" href="/tasks/report">Reset</a></div>
</form></div>"#,
        user_options,
        format_date(report.start_date),
        format_date(report.end_date)
    )
}

/// `GET /tasks/report`
pub async fn report(
    State(state): State<AppState>,
    AdminUser(user): AdminUser,
    Query(params): Query<ReportParams>,
) -> AppResult<Html<String>> {
    let query = params.query()?;
    let report = state.db().task_report(&query, today_local())?;

    let heading = match report.full_name {
        Some(ref name) => format!("Task Report: {}", name),
        None => "Task Report".to_string(),
    };
    let content = render_report(&report, &heading, &report_filter_form(&report), true);
    Ok(page("Task Report", &user, "", &content))
}

/// `GET /tasks/overview`
pub async fn overview(
    State(state): State<AppState>,
    MemberUser(user): MemberUser,
) -> AppResult<Html<String>> {
    let report = state.db().employee_overview(&user.id, today_local())?;
    let heading = format!("Performance Overview: {}", user.full_name);
    let content = render_report(&report, &heading, "", false);
    Ok(page("Overview", &user, "", &content))
}

fn render_user_table(users: &[User]) -> String {
    if users.is_empty() {
        return r#"<div class="empty-state">No users yet.</div>"#.to_string();
    }
    let mut html = String::from(
        "<table><thead><tr><th>Name</th><th>Email</th><th>Role</th><th>Tasks</th><th>Added</th></tr></thead><tbody>",
    );
    for u in users {
        html.push_str(&format!(
            r#"<tr><td>{}</td><td>{}</td><td>{}</td><td><a href="/tasks?assignedTo={}">View</a></td><td>{}</td></tr>"#,
            html_escape(&u.full_name),
            html_escape(&u.email),
            u.role,
            urlencoding::encode(&u.id),
            u.created_at.format("%Y-%m-%d")
        ));
    }
    html.push_str("</tbody></table>");
    html
}

/// `GET /users`
pub async fn users_page(
    State(state): State<AppState>,
    AdminUser(user): AdminUser,
) -> AppResult<Html<String>> {
    let users = state.db().list_users()?;
    let content = templates::USERS_TEMPLATE
        .replace("{{count}}", &users.len().to_string())
        .replace("{{user_table}}", &render_user_table(&users));
    Ok(page("Users", &user, "", &content))
}
