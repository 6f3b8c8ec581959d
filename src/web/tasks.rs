//! Task pages: the admin list/create/edit/delete flow and the assignee's
//! My Tasks and status update.

use axum::extract::{Form, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use chrono::NaiveDate;

use super::auth::{AdminUser, MemberUser};
use super::forms::{IdForm, ListParams, MessageParams, StatusForm, TaskForm, parse_id};
use super::render::{
    Notice, deadline_cell, field_errors, flash_message, format_date, html_escape, page,
    priority_badge, redirect_with, select_options, status_badge,
};
use super::server::AppState;
use super::templates;
use crate::db::listing::{DeadlineBucket, SortOrder, TaskFilter, TaskListing};
use crate::db::{now_local, today_local};
use crate::error::{AppError, AppResult, ErrorCode};
use crate::types::{NewTask, Priority, Role, Task, TaskEdit, TaskStatus, UNASSIGNED, User};

const TASK_NOT_FOUND_NOTICE: &str = "Task not found.";

// ---------------------------------------------------------------------------
// Admin list
// ---------------------------------------------------------------------------

/// Query string for the list page with a different sort order.
fn list_href(filter: &TaskFilter, sort: SortOrder) -> String {
    let mut pairs: Vec<(&str, String)> = Vec::new();
    if let Some(bucket) = filter.deadline {
        pairs.push(("deadline", bucket.slug().to_string()));
    }
    if let Some(status) = filter.status {
        pairs.push(("status", status.to_string()));
    }
    if let Some(ref assignee) = filter.assignee {
        pairs.push(("assignedTo", assignee.clone()));
    }
    if let Some(priority) = filter.priority {
        pairs.push(("priority", priority.to_string()));
    }
    if let Some(ref search) = filter.search {
        pairs.push(("search", search.clone()));
    }
    if sort != SortOrder::Default {
        pairs.push(("sortOrder", sort.as_param().to_string()));
    }

    if pairs.is_empty() {
        return "/tasks".to_string();
    }
    let query: Vec<String> = pairs
        .iter()
        .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
        .collect();
    format!("/tasks?{}", query.join("&"))
}

/// Column header link that toggles between ascending and descending.
fn sort_header(filter: &TaskFilter, label: &str, asc: SortOrder, desc: SortOrder) -> String {
    let (next, arrow) = if filter.sort == asc {
        (desc, " &uarr;")
    } else if filter.sort == desc {
        (asc, " &darr;")
    } else {
        (asc, "")
    };
    format!(
        r#"<a href="{}">{}</a>{}"#,
        html_escape(&list_href(filter, next)),
        label,
        arrow
    )
}

fn render_listing_table(listing: &TaskListing, filter: &TaskFilter, today: NaiveDate) -> String {
    if listing.tasks.is_empty() {
        return r#"<div class="empty-state">No tasks match these filters.</div>"#.to_string();
    }

    let mut html = format!(
        "<table><thead><tr><th>{}</th><th>Assigned To</th><th>Priority</th><th>{}</th><th>{}</th><th></th></tr></thead><tbody>",
        sort_header(filter, "Task", SortOrder::TitleAsc, SortOrder::TitleDesc),
        sort_header(filter, "Deadline", SortOrder::DateAsc, SortOrder::DateDesc),
        sort_header(filter, "Status", SortOrder::StatusAsc, SortOrder::StatusDesc),
    );

    for task in &listing.tasks {
        let description = task
            .description
            .as_deref()
            .map(|d| format!(r#"<div class="muted">{}</div>"#, html_escape(d)))
            .unwrap_or_default();
        html.push_str(&format!(
            r#"<tr><td>{}{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td><a href="/tasks/edit/{}">Edit</a> | <a href="/tasks/delete/{}">Delete</a></td></tr>"#,
            html_escape(&task.title),
            description,
            html_escape(&task.assignee_name),
            priority_badge(task.priority),
            deadline_cell(task.deadline, task.status, today),
            status_badge(task.status),
            task.id,
            task.id
        ));
    }

    html.push_str("</tbody></table>");
    html
}

/// `GET /tasks`
pub async fn list_tasks(
    State(state): State<AppState>,
    AdminUser(user): AdminUser,
    Query(params): Query<ListParams>,
) -> AppResult<Html<String>> {
    let filter = params.filter();
    let today = today_local();
    let listing = state.db().query_tasks(&filter, today)?;
    let users = state.db().list_users()?;

    let deadline_options = select_options(
        [("", "All")].into_iter().chain(
            [
                DeadlineBucket::DueToday,
                DeadlineBucket::Overdue,
                DeadlineBucket::NoDeadline,
            ]
            .iter()
            .map(|b| (b.slug(), b.label())),
        ),
        Some(filter.deadline.map(|b| b.slug()).unwrap_or("")),
    );
    let status_options = select_options(
        [("", "All")]
            .into_iter()
            .chain(TaskStatus::ALL.iter().map(|s| (s.as_str(), s.as_str()))),
        Some(filter.status.map(|s| s.as_str()).unwrap_or("")),
    );
    let assignee_options = select_options(
        [("", "All")].into_iter().chain(
            users
                .iter()
                .map(|u| (u.id.as_str(), u.full_name.as_str())),
        ),
        Some(filter.assignee.as_deref().unwrap_or("")),
    );
    let priority_options = select_options(
        [("", "All")]
            .into_iter()
            .chain(Priority::ALL.iter().map(|p| (p.as_str(), p.as_str()))),
        Some(filter.priority.map(|p| p.as_str()).unwrap_or("")),
    );

    let content = templates::TASKS_TEMPLATE
        .replace("{{header}}", &html_escape(&listing.header))
        .replace("{{count}}", &listing.count.to_string())
        .replace("{{deadline_options}}", &deadline_options)
        .replace("{{status_options}}", &status_options)
        .replace("{{assignee_options}}", &assignee_options)
        .replace("{{priority_options}}", &priority_options)
        .replace(
            "{{search}}",
            &html_escape(filter.search.as_deref().unwrap_or_default()),
        )
        .replace("{{sort_order}}", filter.sort.as_param())
        .replace(
            "{{task_table}}",
            &render_listing_table(&listing, &filter, today),
        );

    Ok(page(
        &listing.header,
        &user,
        &flash_message(params.msg.as_deref()),
        &content,
    ))
}

// ---------------------------------------------------------------------------
// Create / edit
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FormMode {
    Create,
    Edit(i64),
}

fn render_task_form(
    user: &User,
    mode: FormMode,
    form: &TaskForm,
    errors: &[AppError],
    assignees: &[User],
    message: &str,
) -> Html<String> {
    let (heading, action, submit_label) = match mode {
        FormMode::Create => ("Create Task", "/tasks/create", "Create Task"),
        FormMode::Edit(_) => ("Edit Task", "/tasks/edit", "Save Changes"),
    };
    let id_field = match mode {
        FormMode::Create => String::new(),
        FormMode::Edit(id) => format!(r#"<input type="hidden" name="id" value="{}">"#, id),
    };
    let status_field = match mode {
        FormMode::Create => String::new(),
        FormMode::Edit(_) => format!(
            r#"<div class="form-row"><label for="status">Status</label><select id="status" name="status">{}</select>{}</div>"#,
            select_options(
                TaskStatus::ALL.iter().map(|s| (s.as_str(), s.as_str())),
                form.status.as_deref()
            ),
            field_errors(errors, "status")
        ),
    };

    let assignee_options = select_options(
        assignees
            .iter()
            .map(|u| (u.id.as_str(), u.full_name.as_str())),
        form.assigned_to.as_deref(),
    );
    let priority_options = select_options(
        Priority::ALL.iter().map(|p| (p.as_str(), p.as_str())),
        form.priority.as_deref(),
    );

    let content = templates::TASK_FORM_TEMPLATE
        .replace("{{heading}}", heading)
        .replace("{{action}}", action)
        .replace("{{id_field}}", &id_field)
        .replace(
            "{{title}}",
            &html_escape(form.title.as_deref().unwrap_or_default()),
        )
        .replace("{{title_error}}", &field_errors(errors, "title"))
        .replace(
            "{{description}}",
            &html_escape(form.description.as_deref().unwrap_or_default()),
        )
        .replace("{{assignee_options}}", &assignee_options)
        .replace("{{assigned_to_error}}", &field_errors(errors, "assigned_to"))
        .replace("{{priority_options}}", &priority_options)
        .replace("{{priority_error}}", &field_errors(errors, "priority"))
        .replace(
            "{{deadline}}",
            &html_escape(form.deadline.as_deref().unwrap_or_default()),
        )
        .replace("{{deadline_error}}", &field_errors(errors, "deadline"))
        .replace("{{status_field}}", &status_field)
        .replace("{{submit_label}}", submit_label);

    let message = if errors.is_empty() {
        message.to_string()
    } else {
        flash_message(Some("error:Please correct the errors below."))
    };

    page(heading, user, &message, &content)
}

/// Re-render a form with its input and field messages.
fn invalid_form(
    state: &AppState,
    user: &User,
    mode: FormMode,
    form: &TaskForm,
    errors: Vec<AppError>,
) -> AppResult<Response> {
    tracing::debug!(errors = errors.len(), mode = ?mode, "Task form rejected");
    let assignees = state.db().list_users_in_role(Role::User)?;
    let html = render_task_form(user, mode, form, &errors, &assignees, "");
    Ok((StatusCode::UNPROCESSABLE_ENTITY, html).into_response())
}

/// `GET /tasks/create`
pub async fn create_form(
    State(state): State<AppState>,
    AdminUser(user): AdminUser,
    Query(params): Query<MessageParams>,
) -> AppResult<Html<String>> {
    let assignees = state.db().list_users_in_role(Role::User)?;
    Ok(render_task_form(
        &user,
        FormMode::Create,
        &TaskForm::default(),
        &[],
        &assignees,
        &flash_message(params.msg.as_deref()),
    ))
}

/// `POST /tasks/create`
pub async fn create_task(
    State(state): State<AppState>,
    AdminUser(user): AdminUser,
    Form(form): Form<TaskForm>,
) -> AppResult<Response> {
    let input = match form.parse() {
        Ok(input) => input,
        Err(errors) => return invalid_form(&state, &user, FormMode::Create, &form, errors),
    };

    let new_task = NewTask {
        title: input.title,
        description: input.description,
        assigned_to: input.assigned_to,
        priority: input.priority,
        deadline: input.deadline,
    };

    match state.db().create_task(&new_task, now_local()) {
        Ok(_) => Ok(redirect_with(
            "/tasks/create",
            Notice::Success,
            "Task created successfully.",
        )
        .into_response()),
        Err(e) => {
            let err = AppError::from(e);
            if err.code.is_validation() {
                invalid_form(&state, &user, FormMode::Create, &form, vec![err])
            } else {
                Err(err)
            }
        }
    }
}

/// `GET /tasks/edit/{id}`
pub async fn edit_form(
    State(state): State<AppState>,
    AdminUser(user): AdminUser,
    Path(task_id): Path<i64>,
) -> AppResult<Html<String>> {
    let task = state
        .db()
        .get_task(task_id)?
        .ok_or_else(|| AppError::task_not_found(task_id))?;
    let assignees = state.db().list_users_in_role(Role::User)?;
    Ok(render_task_form(
        &user,
        FormMode::Edit(task.id),
        &TaskForm::from_task(&task),
        &[],
        &assignees,
        "",
    ))
}

/// `POST /tasks/edit`
pub async fn edit_task(
    State(state): State<AppState>,
    AdminUser(user): AdminUser,
    Form(form): Form<TaskForm>,
) -> AppResult<Response> {
    let not_found = || redirect_with("/tasks", Notice::Error, TASK_NOT_FOUND_NOTICE).into_response();

    let Some(task_id) = parse_id(&form.id) else {
        return Ok(not_found());
    };
    let Some(existing) = state.db().get_task(task_id)? else {
        return Ok(not_found());
    };

    let input = match form.parse() {
        Ok(input) => input,
        Err(errors) => return invalid_form(&state, &user, FormMode::Edit(task_id), &form, errors),
    };

    let edit = TaskEdit {
        title: input.title,
        description: input.description,
        assigned_to: input.assigned_to,
        priority: input.priority,
        deadline: input.deadline,
        status: input.status.unwrap_or(existing.status),
    };

    match state.db().update_task(task_id, &edit) {
        Ok(_) => Ok(
            redirect_with("/tasks", Notice::Success, "Task updated successfully!").into_response(),
        ),
        Err(e) => {
            let err = AppError::from(e);
            match err.code {
                ErrorCode::TaskNotFound => Ok(not_found()),
                code if code.is_validation() => {
                    invalid_form(&state, &user, FormMode::Edit(task_id), &form, vec![err])
                }
                _ => Err(err),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Delete
// ---------------------------------------------------------------------------

/// `GET /tasks/delete/{id}`
pub async fn delete_confirm(
    State(state): State<AppState>,
    AdminUser(user): AdminUser,
    Path(task_id): Path<i64>,
) -> AppResult<Html<String>> {
    let task = state
        .db()
        .get_task(task_id)?
        .ok_or_else(|| AppError::task_not_found(task_id))?;
    let assignee = match task.assigned_to {
        Some(ref id) => state.db().get_user(id)?.map(|u| u.full_name),
        None => None,
    };

    let content = templates::TASK_DELETE_TEMPLATE
        .replace("{{id}}", &task.id.to_string())
        .replace("{{title}}", &html_escape(&task.title))
        .replace(
            "{{description}}",
            &html_escape(task.description.as_deref().unwrap_or_default()),
        )
        .replace(
            "{{assignee}}",
            &html_escape(assignee.as_deref().unwrap_or(UNASSIGNED)),
        )
        .replace("{{priority}}", &priority_badge(task.priority))
        .replace("{{deadline}}", &format_date(task.deadline))
        .replace("{{status_badge}}", &status_badge(task.status));

    Ok(page("Delete Task", &user, "", &content))
}

/// `POST /tasks/delete`
pub async fn delete_task(
    State(state): State<AppState>,
    AdminUser(_user): AdminUser,
    Form(form): Form<IdForm>,
) -> AppResult<Response> {
    let Some(task_id) = parse_id(&form.id) else {
        return Ok(redirect_with("/tasks", Notice::Error, TASK_NOT_FOUND_NOTICE).into_response());
    };

    match state.db().delete_task(task_id) {
        Ok(()) => Ok(
            redirect_with("/tasks", Notice::Success, "Task deleted successfully.").into_response(),
        ),
        Err(e) => {
            let err = AppError::from(e);
            if err.code == ErrorCode::TaskNotFound {
                Ok(redirect_with("/tasks", Notice::Error, TASK_NOT_FOUND_NOTICE).into_response())
            } else {
                Err(err)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Assignee pages
// ---------------------------------------------------------------------------

fn render_my_tasks_table(tasks: &[Task], today: NaiveDate) -> String {
    let mut html = String::from(
        "<table><thead><tr><th>Task</th><th>Description</th><th>Priority</th><th>Deadline</th><th>Status</th><th></th></tr></thead><tbody>",
    );
    for task in tasks {
        html.push_str(&format!(
            r#"<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td><a href="/tasks/update/{}">Update</a></td></tr>"#,
            html_escape(&task.title),
            html_escape(task.description.as_deref().unwrap_or_default()),
            priority_badge(task.priority),
            deadline_cell(task.deadline, task.status, today),
            status_badge(task.status),
            task.id
        ));
    }
    html.push_str("</tbody></table>");
    html
}

/// `GET /tasks/my-tasks`
pub async fn my_tasks(
    State(state): State<AppState>,
    MemberUser(user): MemberUser,
    Query(params): Query<MessageParams>,
) -> AppResult<Html<String>> {
    let tasks = state.db().tasks_for_user(&user.id)?;

    let mut message = flash_message(params.msg.as_deref());
    let table = if tasks.is_empty() {
        message.push_str(&flash_message(Some(
            "info:You currently have no assigned tasks.",
        )));
        String::new()
    } else {
        render_my_tasks_table(&tasks, today_local())
    };

    let content = templates::MY_TASKS_TEMPLATE.replace("{{task_table}}", &table);
    Ok(page("My Tasks", &user, &message, &content))
}

/// Fetch a task the caller is assigned to.
fn owned_task(state: &AppState, user: &User, task_id: i64) -> AppResult<Task> {
    let task = state
        .db()
        .get_task(task_id)?
        .ok_or_else(|| AppError::task_not_found(task_id))?;
    if task.assigned_to.as_deref() != Some(user.id.as_str()) {
        return Err(AppError::not_owner(task_id, &user.id));
    }
    Ok(task)
}

fn render_update_form(
    user: &User,
    task: &Task,
    selected: Option<&str>,
    errors: &[AppError],
) -> Html<String> {
    let content = templates::TASK_UPDATE_TEMPLATE
        .replace("{{id}}", &task.id.to_string())
        .replace("{{title}}", &html_escape(&task.title))
        .replace(
            "{{description}}",
            &html_escape(task.description.as_deref().unwrap_or_default()),
        )
        .replace("{{priority}}", &priority_badge(task.priority))
        .replace("{{deadline}}", &format_date(task.deadline))
        .replace(
            "{{status_options}}",
            &select_options(
                TaskStatus::ALL.iter().map(|s| (s.as_str(), s.as_str())),
                selected,
            ),
        )
        .replace("{{status_error}}", &field_errors(errors, "status"));
    page("Update Task", user, "", &content)
}

/// `GET /tasks/update/{id}`
pub async fn update_form(
    State(state): State<AppState>,
    MemberUser(user): MemberUser,
    Path(task_id): Path<i64>,
) -> AppResult<Html<String>> {
    let task = owned_task(&state, &user, task_id)?;
    Ok(render_update_form(
        &user,
        &task,
        Some(task.status.as_str()),
        &[],
    ))
}

/// `POST /tasks/update`
pub async fn update_status(
    State(state): State<AppState>,
    MemberUser(user): MemberUser,
    Form(form): Form<StatusForm>,
) -> AppResult<Response> {
    let task_id = parse_id(&form.id)
        .ok_or_else(|| AppError::missing_field("id", "Task id is required"))?;
    let task = owned_task(&state, &user, task_id)?;

    let status = match form.parse_status() {
        Ok(status) => status,
        Err(err) => {
            let html = render_update_form(&user, &task, form.status.as_deref(), &[err]);
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, html).into_response());
        }
    };

    state.db().update_task_status(task_id, &user.id, status)?;
    Ok(redirect_with("/tasks/my-tasks", Notice::Success, "Task updated successfully!").into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_href_carries_filters() {
        let filter = TaskFilter {
            deadline: Some(DeadlineBucket::Overdue),
            status: Some(TaskStatus::InProgress),
            search: Some("a&b".into()),
            ..Default::default()
        };
        assert_eq!(
            list_href(&filter, SortOrder::TitleDesc),
            "/tasks?deadline=overdue&status=In%20Progress&search=a%26b&sortOrder=title_desc"
        );
        assert_eq!(list_href(&TaskFilter::default(), SortOrder::Default), "/tasks");
    }

    #[test]
    fn sort_header_toggles() {
        let filter = TaskFilter {
            sort: SortOrder::TitleAsc,
            ..Default::default()
        };
        let html = sort_header(&filter, "Task", SortOrder::TitleAsc, SortOrder::TitleDesc);
        assert!(html.contains("sortOrder=title_desc"));
        let html = sort_header(&filter, "Status", SortOrder::StatusAsc, SortOrder::StatusDesc);
        assert!(html.contains("sortOrder=status_asc"));
    }
}
