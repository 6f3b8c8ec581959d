//! HTML templates for the web UI.
//!
//! Templates are embedded at compile time using `include_str!` and filled in
//! with `{{placeholder}}` replacement.

/// Page layout: header, navigation, flash message and content slot.
pub const BASE_TEMPLATE: &str = include_str!("templates/base.html");

/// Standalone error page.
pub const ERROR_TEMPLATE: &str = include_str!("templates/error.html");

pub const DASHBOARD_ADMIN_TEMPLATE: &str = include_str!("templates/dashboard_admin.html");

pub const DASHBOARD_USER_TEMPLATE: &str = include_str!("templates/dashboard_user.html");

/// Admin task list with filter form.
pub const TASKS_TEMPLATE: &str = include_str!("templates/tasks.html");

/// Shared create/edit form.
pub const TASK_FORM_TEMPLATE: &str = include_str!("templates/task_form.html");

pub const TASK_DELETE_TEMPLATE: &str = include_str!("templates/task_delete.html");

pub const MY_TASKS_TEMPLATE: &str = include_str!("templates/my_tasks.html");

/// Status-only update form for the assignee.
pub const TASK_UPDATE_TEMPLATE: &str = include_str!("templates/task_update.html");

/// Admin report and user overview.
pub const REPORT_TEMPLATE: &str = include_str!("templates/report.html");

pub const USERS_TEMPLATE: &str = include_str!("templates/users.html");
