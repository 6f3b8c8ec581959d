//! User directory queries.
//!
//! Identity and passwords are owned by the upstream authentication service; this
//! table only records who exists, their display name and their role.

use super::{Database, now_local};
use crate::error::AppError;
use crate::types::{Role, User};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};
use uuid::Uuid;

fn parse_user_row(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get("id")?,
        full_name: row.get("full_name")?,
        email: row.get("email")?,
        role: row.get("role")?,
        created_at: row.get("created_at")?,
    })
}

/// Look up a user using an existing connection.
pub(crate) fn get_user_internal(conn: &Connection, user_id: &str) -> Result<Option<User>> {
    let user = conn
        .query_row(
            "SELECT id, full_name, email, role, created_at FROM users WHERE id = ?1",
            params![user_id],
            parse_user_row,
        )
        .optional()?;
    Ok(user)
}

impl Database {
    /// Add a user to the directory. A UUID is generated when no id is given.
    pub fn create_user(
        &self,
        id: Option<String>,
        full_name: &str,
        email: &str,
        role: Role,
    ) -> Result<User> {
        let full_name = full_name.trim();
        let email = email.trim();
        if full_name.is_empty() {
            return Err(AppError::missing_field("full_name", "Name is required.").into());
        }
        if email.is_empty() {
            return Err(AppError::missing_field("email", "Email is required.").into());
        }
        if !email.contains('@') {
            return Err(AppError::invalid_value("email", "Email address is not valid.").into());
        }

        let id = id
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let created_at = now_local();

        self.with_conn(|conn| {
            if get_user_internal(conn, &id)?.is_some() {
                return Err(AppError::already_exists("User", &id).into());
            }
            let taken: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM users WHERE email = ?1 COLLATE NOCASE)",
                params![email],
                |row| row.get(0),
            )?;
            if taken {
                return Err(AppError::already_exists("User with email", email).into());
            }

            conn.execute(
                "INSERT INTO users (id, full_name, email, role, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![id, full_name, email, role, created_at],
            )?;

            tracing::info!(user_id = %id, role = %role, "Created user");

            Ok(User {
                id,
                full_name: full_name.to_string(),
                email: email.to_string(),
                role,
                created_at,
            })
        })
    }

    /// Get a user by id.
    pub fn get_user(&self, user_id: &str) -> Result<Option<User>> {
        self.with_conn(|conn| get_user_internal(conn, user_id))
    }

    /// Find a user by email (case-insensitive).
    pub fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.with_conn(|conn| {
            let user = conn
                .query_row(
                    "SELECT id, full_name, email, role, created_at
                     FROM users WHERE email = ?1 COLLATE NOCASE",
                    params![email.trim()],
                    parse_user_row,
                )
                .optional()?;
            Ok(user)
        })
    }

    /// All users ordered by name.
    pub fn list_users(&self) -> Result<Vec<User>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, full_name, email, role, created_at
                 FROM users ORDER BY full_name ASC, id ASC",
            )?;
            let users = stmt
                .query_map([], parse_user_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(users)
        })
    }

    /// Users holding the given role, ordered by name. Task assignment offers `Role::User`.
    pub fn list_users_in_role(&self, role: Role) -> Result<Vec<User>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, full_name, email, role, created_at
                 FROM users WHERE role = ?1 ORDER BY full_name ASC, id ASC",
            )?;
            let users = stmt
                .query_map(params![role], parse_user_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(users)
        })
    }

    pub fn count_users(&self) -> Result<i64> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
            Ok(count)
        })
    }

    /// Make sure an admin account with this email exists.
    ///
    /// Returns the account and whether it was created by this call.
    pub fn ensure_admin(&self, full_name: &str, email: &str) -> Result<(User, bool)> {
        if let Some(existing) = self.find_user_by_email(email)? {
            if existing.role != Role::Admin {
                tracing::warn!(
                    user_id = %existing.id,
                    "Seed admin email belongs to a non-admin account; leaving it unchanged"
                );
            }
            return Ok((existing, false));
        }
        let user = self.create_user(None, full_name, email, Role::Admin)?;
        Ok((user, true))
    }
}
