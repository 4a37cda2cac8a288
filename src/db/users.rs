use chrono::Utc;
use leptos::logging::log;
use rusqlite::{params, OptionalExtension, Row};

use super::Database;
use crate::error::AppError;
use crate::models::User;

const USER_COLUMNS: &str =
    "id, email, name, display_name, is_reviewer, is_admin, joined_at, password_hash, google_id";

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        name: row.get(2)?,
        display_name: row.get(3)?,
        is_reviewer: row.get(4)?,
        is_admin: row.get(5)?,
        joined_at: row.get(6)?,
        password_hash: row.get(7)?,
        google_id: row.get(8)?,
    })
}

impl Database {
    /// Creates an account with a generated `User{n}` display name.
    /// Admins are always created with reviewer rights.
    pub async fn create_user(
        &self,
        name: &str,
        email: &str,
        password_hash: Option<&str>,
        google_id: Option<&str>,
        is_admin: bool,
    ) -> Result<User, AppError> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;

        let exists: bool = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = ?1)",
            [email],
            |row| row.get(0),
        )?;
        if exists {
            return Err(AppError::Conflict("email already registered".to_string()));
        }

        let count: i64 = tx.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        let display_name = format!("User{}", count + 1);
        tx.execute(
            "INSERT INTO users (email, name, display_name, password_hash, google_id, is_reviewer, is_admin, joined_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![email, name, display_name, password_hash, google_id, is_admin, is_admin, Utc::now()],
        )?;
        let id = tx.last_insert_rowid();
        let user = tx.query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
            [id],
            user_from_row,
        )?;
        tx.commit()?;

        log!("[DB] Created user {} ({})", user.email, user.display_name);
        Ok(user)
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let conn = self.conn.lock().await;
        let user = conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
                [email],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    pub async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        let conn = self.conn.lock().await;
        let user = conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                [id],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    /// Finds the account for a Google identity, linking it to an existing
    /// email account or creating a new one.
    pub async fn find_or_create_google_user(
        &self,
        google_id: &str,
        email: &str,
        name: &str,
        is_admin: bool,
    ) -> Result<User, AppError> {
        {
            let conn = self.conn.lock().await;
            let by_google = conn
                .query_row(
                    &format!("SELECT {USER_COLUMNS} FROM users WHERE google_id = ?1"),
                    [google_id],
                    user_from_row,
                )
                .optional()?;
            if let Some(user) = by_google {
                return Ok(user);
            }

            let linked = conn.execute(
                "UPDATE users SET google_id = ?1 WHERE email = ?2",
                params![google_id, email],
            )?;
            if linked > 0 {
                log!("[DB] Linked Google account to {}", email);
                if is_admin {
                    conn.execute(
                        "UPDATE users SET is_admin = 1, is_reviewer = 1 WHERE email = ?1",
                        [email],
                    )?;
                }
                let user = conn.query_row(
                    &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
                    [email],
                    user_from_row,
                )?;
                return Ok(user);
            }
        }

        self.create_user(name, email, None, Some(google_id), is_admin)
            .await
    }

    pub async fn update_display_name(&self, user_id: i64, display_name: &str) -> Result<User, AppError> {
        let conn = self.conn.lock().await;
        let changed = conn.execute(
            "UPDATE users SET display_name = ?1 WHERE id = ?2",
            params![display_name, user_id],
        )?;
        if changed == 0 {
            return Err(AppError::not_found(format!("User {user_id}")));
        }
        log!("[DB] User {} is now '{}'", user_id, display_name);
        let user = conn.query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
            [user_id],
            user_from_row,
        )?;
        Ok(user)
    }

    /// Grants admin and reviewer rights to an existing account.
    pub async fn promote_admin(&self, email: &str) -> Result<bool, AppError> {
        let conn = self.conn.lock().await;
        let changed = conn.execute(
            "UPDATE users SET is_admin = 1, is_reviewer = 1 WHERE email = ?1 AND is_admin = 0",
            [email],
        )?;
        Ok(changed > 0)
    }
}
