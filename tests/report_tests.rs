//! Integration tests for the aggregate reporter and the home dashboards.

use chrono::{Days, NaiveDate, NaiveDateTime};
use task_manager::db::Database;
use task_manager::db::dashboard::{HomeDashboard, Scope};
use task_manager::db::report::ReportQuery;
use task_manager::error::{AppError, ErrorCode};
use task_manager::types::{NewTask, Role, Task, TaskStatus};

fn setup_db() -> Database {
    let db = Database::open_in_memory().expect("Failed to create in-memory database");
    db.create_user(Some("admin".into()), "Alice Admin", "alice@example.com", Role::Admin)
        .unwrap();
    db.create_user(Some("user-a".into()), "Ann User", "ann@example.com", Role::User)
        .unwrap();
    db.create_user(Some("user-b".into()), "Bob User", "bob@example.com", Role::User)
        .unwrap();
    db
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn today() -> NaiveDate {
    date(2026, 10, 19)
}

fn days_ago(n: u64) -> NaiveDate {
    today().checked_sub_days(Days::new(n)).unwrap()
}

fn at(day: NaiveDate) -> NaiveDateTime {
    day.and_hms_opt(12, 0, 0).unwrap()
}

fn add_task(
    db: &Database,
    title: &str,
    assignee: &str,
    deadline: Option<NaiveDate>,
    status: TaskStatus,
) -> Task {
    add_task_created(db, title, assignee, deadline, status, date(2026, 10, 1))
}

fn add_task_created(
    db: &Database,
    title: &str,
    assignee: &str,
    deadline: Option<NaiveDate>,
    status: TaskStatus,
    created: NaiveDate,
) -> Task {
    let input = NewTask {
        title: title.to_string(),
        assigned_to: assignee.to_string(),
        deadline,
        ..Default::default()
    };
    let task = db.create_task(&input, at(created)).unwrap();
    if status != TaskStatus::Pending {
        db.update_task_status(task.id, assignee, status).unwrap()
    } else {
        task
    }
}

fn for_user(id: &str) -> ReportQuery {
    ReportQuery {
        user_id: Some(id.to_string()),
        ..Default::default()
    }
}

mod report_tests {
    use super::*;

    #[test]
    fn completion_rate_two_of_three() {
        let db = setup_db();
        add_task(&db, "One", "user-a", None, TaskStatus::Completed);
        add_task(&db, "Two", "user-a", None, TaskStatus::Completed);
        add_task(&db, "Three", "user-a", None, TaskStatus::Pending);
        add_task(&db, "Other", "user-b", None, TaskStatus::Pending);

        let report = db.task_report(&for_user("user-a"), today()).unwrap();
        assert_eq!(report.total, 3);
        assert_eq!(report.completed, 2);
        assert_eq!(report.pending, 1);
        assert_eq!(report.completion_rate, 66.7);
        assert_eq!(report.full_name.as_deref(), Some("Ann User"));
        assert_eq!(report.chart_labels, vec!["Pending", "In Progress", "Completed"]);
        assert_eq!(report.chart_data, vec![1, 0, 2]);
    }

    #[test]
    fn empty_report_has_zero_rate() {
        let db = setup_db();
        let report = db.task_report(&ReportQuery::default(), today()).unwrap();
        assert_eq!(report.total, 0);
        assert_eq!(report.completion_rate, 0.0);
        assert_eq!(report.full_name, None);
        assert_eq!(report.users.len(), 3);
    }

    #[test]
    fn overdue_clears_once_completed() {
        let db = setup_db();
        let task = add_task(
            &db,
            "Late",
            "user-a",
            Some(days_ago(1)),
            TaskStatus::InProgress,
        );

        let report = db.task_report(&ReportQuery::default(), today()).unwrap();
        assert_eq!(report.overdue, 1);
        let counts = db.status_breakdown(&Scope::All, today()).unwrap();
        assert_eq!(counts.overdue, 1);

        db.update_task_status(task.id, "user-a", TaskStatus::Completed)
            .unwrap();

        let report = db.task_report(&ReportQuery::default(), today()).unwrap();
        assert_eq!(report.overdue, 0);
        let counts = db.status_breakdown(&Scope::All, today()).unwrap();
        assert_eq!(counts.overdue, 0);
    }

    #[test]
    fn per_user_lists_everyone_and_ignores_user_filter() {
        let db = setup_db();
        add_task(&db, "A done", "user-a", None, TaskStatus::Completed);
        add_task(&db, "A done 2", "user-a", None, TaskStatus::Completed);
        add_task(&db, "B open", "user-b", None, TaskStatus::InProgress);

        let report = db.task_report(&for_user("user-b"), today()).unwrap();
        let per_user: Vec<_> = report
            .per_user
            .iter()
            .map(|u| (u.user_id.as_str(), u.completed))
            .collect();
        assert_eq!(per_user, vec![("admin", 0), ("user-a", 2), ("user-b", 0)]);
        assert_eq!(report.total, 1);
        assert_eq!(report.in_progress, 1);
    }

    #[test]
    fn weekly_buckets_count_completed_by_deadline() {
        let db = setup_db();
        add_task(&db, "This week", "user-a", Some(today()), TaskStatus::Completed);
        add_task(&db, "Last week", "user-a", Some(days_ago(8)), TaskStatus::Completed);
        add_task(&db, "Oldest bucket", "user-b", Some(days_ago(34)), TaskStatus::Completed);
        add_task(&db, "Too old", "user-a", Some(days_ago(35)), TaskStatus::Completed);
        add_task(&db, "Open", "user-a", Some(days_ago(2)), TaskStatus::InProgress);
        add_task(&db, "No deadline", "user-a", None, TaskStatus::Completed);

        let report = db.task_report(&ReportQuery::default(), today()).unwrap();
        let counts: Vec<_> = report.weekly.iter().map(|w| w.completed).collect();
        assert_eq!(counts, vec![1, 0, 0, 1, 1]);
        assert_eq!(report.weekly[4].end, today());
        assert_eq!(report.weekly[4].label, "Oct 13");

        let scoped = db.task_report(&for_user("user-b"), today()).unwrap();
        let counts: Vec<_> = scoped.weekly.iter().map(|w| w.completed).collect();
        assert_eq!(counts, vec![1, 0, 0, 0, 0]);
    }

    #[test]
    fn creation_date_range_is_inclusive() {
        let db = setup_db();
        add_task_created(&db, "Sept", "user-a", None, TaskStatus::Completed, date(2026, 9, 30));
        add_task_created(&db, "Oct 1", "user-a", None, TaskStatus::Completed, date(2026, 10, 1));
        add_task_created(&db, "Oct 10", "user-a", None, TaskStatus::Pending, date(2026, 10, 10));
        add_task_created(&db, "Oct 11", "user-b", None, TaskStatus::Completed, date(2026, 10, 11));

        let query = ReportQuery {
            user_id: None,
            start_date: Some(date(2026, 10, 1)),
            end_date: Some(date(2026, 10, 10)),
        };
        let report = db.task_report(&query, today()).unwrap();
        assert_eq!(report.total, 2);
        assert_eq!(report.completed, 1);
        assert_eq!(report.completion_rate, 50.0);

        let per_user: Vec<_> = report.per_user.iter().map(|u| u.completed).collect();
        assert_eq!(per_user, vec![0, 1, 0]);
    }

    #[test]
    fn unknown_user_is_not_found() {
        let db = setup_db();
        let err = db.task_report(&for_user("ghost"), today()).unwrap_err();
        assert_eq!(
            err.downcast_ref::<AppError>().unwrap().code,
            ErrorCode::UserNotFound
        );
        let err = db.employee_overview("ghost", today()).unwrap_err();
        assert_eq!(
            err.downcast_ref::<AppError>().unwrap().code,
            ErrorCode::UserNotFound
        );
    }

    #[test]
    fn employee_overview_is_scoped_to_the_user() {
        let db = setup_db();
        add_task(&db, "Mine", "user-a", None, TaskStatus::Completed);
        add_task(&db, "Theirs", "user-b", None, TaskStatus::Pending);

        let report = db.employee_overview("user-a", today()).unwrap();
        assert_eq!(report.full_name.as_deref(), Some("Ann User"));
        assert_eq!(report.total, 1);
        assert_eq!(report.completion_rate, 100.0);
    }
}

mod dashboard_tests {
    use super::*;

    #[test]
    fn admin_dashboard_counts_everything() {
        let db = setup_db();
        add_task(&db, "Due today", "user-a", Some(today()), TaskStatus::Pending);
        add_task(&db, "Tomorrow", "user-b", Some(date(2026, 10, 20)), TaskStatus::Pending);
        add_task(&db, "Late", "user-a", Some(days_ago(3)), TaskStatus::InProgress);
        add_task(&db, "Late but done", "user-b", Some(days_ago(3)), TaskStatus::Completed);
        add_task(&db, "Whenever", "user-a", None, TaskStatus::Pending);

        let admin = db.get_user("admin").unwrap().unwrap();
        let dashboard = db.home_dashboard(&admin, today()).unwrap();
        assert_eq!(
            dashboard,
            HomeDashboard::Admin {
                total_tasks: 5,
                total_users: 3,
                due_today: 1,
                overdue: 1,
                no_deadline: 1,
                pending: 3,
                in_progress: 1,
                completed: 1,
            }
        );
    }

    #[test]
    fn user_dashboard_is_scoped() {
        let db = setup_db();
        add_task(&db, "Mine late", "user-a", Some(days_ago(1)), TaskStatus::Pending);
        add_task(&db, "Mine done", "user-a", None, TaskStatus::Completed);
        add_task(&db, "Theirs", "user-b", None, TaskStatus::InProgress);

        let ann = db.get_user("user-a").unwrap().unwrap();
        let dashboard = db.home_dashboard(&ann, today()).unwrap();
        assert_eq!(
            dashboard,
            HomeDashboard::User {
                my_tasks: 2,
                overdue: 1,
                no_deadline: 1,
                pending: 1,
                in_progress: 0,
                completed: 1,
            }
        );
    }

    #[test]
    fn scope_for_user_follows_role() {
        let db = setup_db();
        let admin = db.get_user("admin").unwrap().unwrap();
        let ann = db.get_user("user-a").unwrap().unwrap();
        assert_eq!(Scope::for_user(&admin), Scope::All);
        assert_eq!(Scope::for_user(&ann), Scope::User("user-a".into()));
    }

    #[test]
    fn dashboard_serializes_with_role_tag() {
        let db = setup_db();
        let ann = db.get_user("user-a").unwrap().unwrap();
        let json = serde_json::to_value(db.home_dashboard(&ann, today()).unwrap()).unwrap();
        assert_eq!(json["role"], "User");
        assert_eq!(json["my_tasks"], 0);
    }
}
