mod moderation;
mod restaurants;
mod reviews;
mod users;

pub use moderation::CleanupReport;

use leptos::logging::log;
use rusqlite::types::Type;
use rusqlite::{Connection, Row};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::error::AppError;
use crate::models::RestaurantDraft;

/// Shared handle to the SQLite store. Every operation holds the connection
/// lock for its whole duration, so multi-step mutations never interleave.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn new(db_path: &str) -> Result<Self, AppError> {
        let conn = Connection::open(db_path)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        log!("[DB] Opened database at {}", db_path);
        Ok(Database {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub async fn create_schema(&self) -> Result<(), AppError> {
        let conn = self.conn.lock().await;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                display_name TEXT NOT NULL,
                password_hash TEXT,
                google_id TEXT UNIQUE,
                is_reviewer INTEGER NOT NULL DEFAULT 0,
                is_admin INTEGER NOT NULL DEFAULT 0,
                joined_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS restaurants (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                address TEXT NOT NULL,
                city TEXT NOT NULL,
                district TEXT NOT NULL,
                lat REAL,
                lng REAL,
                menu_price REAL NOT NULL,
                food_type TEXT NOT NULL,
                whats_included TEXT NOT NULL DEFAULT '[]',
                practical TEXT NOT NULL DEFAULT '{}',
                google_rating REAL,
                google_reviews INTEGER,
                description TEXT,
                dishes TEXT NOT NULL DEFAULT '[]',
                photos TEXT NOT NULL DEFAULT '[]',
                restaurant_photo TEXT,
                menu_photo TEXT,
                hours TEXT NOT NULL DEFAULT '{}',
                status TEXT NOT NULL DEFAULT 'approved',
                submitted_by TEXT,
                submitted_at TEXT,
                approved_by TEXT,
                approved_at TEXT,
                last_updated TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS reviews (
                id INTEGER PRIMARY KEY,
                restaurant_id INTEGER NOT NULL,
                user_id INTEGER NOT NULL,
                rating REAL NOT NULL,
                comment TEXT NOT NULL DEFAULT '',
                upvotes INTEGER NOT NULL DEFAULT 0,
                downvotes INTEGER NOT NULL DEFAULT 0,
                is_hidden INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                UNIQUE (restaurant_id, user_id),
                FOREIGN KEY (restaurant_id) REFERENCES restaurants(id) ON DELETE CASCADE,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS review_votes (
                review_id INTEGER NOT NULL,
                user_id INTEGER NOT NULL,
                direction TEXT NOT NULL,
                PRIMARY KEY (review_id, user_id),
                FOREIGN KEY (review_id) REFERENCES reviews(id) ON DELETE CASCADE,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS submissions (
                id INTEGER PRIMARY KEY,
                restaurant_name TEXT NOT NULL,
                submitted_by TEXT NOT NULL,
                submitted_at TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending',
                data TEXT NOT NULL,
                reviewer_comments TEXT NOT NULL DEFAULT '[]',
                reviewed_by TEXT,
                reviewed_at TEXT,
                restaurant_id INTEGER
            );

            CREATE TABLE IF NOT EXISTS edit_suggestions (
                id INTEGER PRIMARY KEY,
                restaurant_id INTEGER NOT NULL,
                user_id INTEGER NOT NULL,
                changes TEXT NOT NULL,
                reason TEXT NOT NULL DEFAULT '',
                status TEXT NOT NULL DEFAULT 'pending',
                upvotes INTEGER NOT NULL DEFAULT 0,
                downvotes INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                rejection_reason TEXT,
                reviewed_by TEXT,
                reviewed_at TEXT,
                FOREIGN KEY (restaurant_id) REFERENCES restaurants(id) ON DELETE CASCADE,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS suggestion_votes (
                suggestion_id INTEGER NOT NULL,
                user_id INTEGER NOT NULL,
                direction TEXT NOT NULL,
                PRIMARY KEY (suggestion_id, user_id),
                FOREIGN KEY (suggestion_id) REFERENCES edit_suggestions(id) ON DELETE CASCADE,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS reports (
                id INTEGER PRIMARY KEY,
                review_id INTEGER NOT NULL,
                restaurant_id INTEGER NOT NULL,
                reporter_id INTEGER NOT NULL,
                reason TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending',
                created_at TEXT NOT NULL,
                action TEXT,
                resolved_by TEXT,
                resolved_at TEXT,
                FOREIGN KEY (review_id) REFERENCES reviews(id) ON DELETE CASCADE,
                FOREIGN KEY (restaurant_id) REFERENCES restaurants(id) ON DELETE CASCADE,
                FOREIGN KEY (reporter_id) REFERENCES users(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS favorites (
                user_id INTEGER NOT NULL,
                restaurant_id INTEGER NOT NULL,
                PRIMARY KEY (user_id, restaurant_id),
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
                FOREIGN KEY (restaurant_id) REFERENCES restaurants(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS reviewer_applications (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL,
                motivation TEXT NOT NULL,
                experience TEXT,
                status TEXT NOT NULL DEFAULT 'pending',
                created_at TEXT NOT NULL,
                admin_notes TEXT,
                reviewed_by TEXT,
                reviewed_at TEXT,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
            );",
        )
        .map_err(|e| {
            leptos::logging::error!("[DB] Failed creating schema: {}", e);
            e
        })?;
        log!("[DB] Schema ready");
        Ok(())
    }

    pub async fn ping(&self) -> Result<(), AppError> {
        let conn = self.conn.lock().await;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(())
    }

    /// Loads the demo restaurants when the store has no listings yet.
    /// Returns how many were inserted.
    pub async fn seed_if_empty(&self, drafts: &[RestaurantDraft]) -> Result<usize, AppError> {
        let count: i64 = {
            let conn = self.conn.lock().await;
            conn.query_row("SELECT COUNT(*) FROM restaurants", [], |row| row.get(0))?
        };
        if count > 0 {
            log!("[DB] {} restaurants present, skipping demo seed", count);
            return Ok(0);
        }

        for draft in drafts {
            self.insert_restaurant_from_draft(draft, "demo@menudealmoco.pt").await?;
        }
        log!("[DB] Seeded {} demo restaurants", drafts.len());
        Ok(drafts.len())
    }
}

pub(crate) fn to_json<T: Serialize>(value: &T) -> Result<String, AppError> {
    Ok(serde_json::to_string(value)?)
}

/// Reads a JSON text column into `T`.
pub(crate) fn json_column<T: DeserializeOwned>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Reads a text column holding one of a fixed set of names.
pub(crate) fn parsed_column<T, F>(row: &Row<'_>, idx: usize, parse: F) -> rusqlite::Result<T>
where
    F: FnOnce(&str) -> Option<T>,
{
    let raw: String = row.get(idx)?;
    parse(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Text,
            format!("unexpected value '{raw}'").into(),
        )
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::User;

    pub async fn create_test_db() -> Database {
        let db = Database::new(":memory:").unwrap();
        db.create_schema().await.unwrap();
        db
    }

    pub async fn create_test_user(db: &Database, name: &str, email: &str) -> User {
        db.create_user(name, email, Some("$2b$04$hash"), None, false)
            .await
            .unwrap()
    }

    pub fn draft(name: &str, price: f64) -> RestaurantDraft {
        serde_json::from_value(serde_json::json!({
            "name": name,
            "address": "Rua das Flores, 10, Ribeira, Porto",
            "menuPrice": price,
            "foodType": "Traditional Portuguese",
            "whatsIncluded": ["soup", "main"],
            "googleRating": 4.3,
            "googleReviews": 120
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_schema_creation() {
        let db = create_test_db().await;
        let conn = db.conn.lock().await;
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table'")
            .unwrap();
        let tables: Vec<String> = stmt
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();

        for table in [
            "users",
            "restaurants",
            "reviews",
            "review_votes",
            "submissions",
            "edit_suggestions",
            "suggestion_votes",
            "reports",
            "favorites",
            "reviewer_applications",
        ] {
            assert!(tables.contains(&table.to_string()), "missing table {table}");
        }
    }

    #[tokio::test]
    async fn test_schema_is_idempotent() {
        let db = create_test_db().await;
        db.create_schema().await.unwrap();
    }

    #[tokio::test]
    async fn test_seed_only_when_empty() {
        let db = create_test_db().await;
        let drafts = vec![draft("Tasca A", 9.0), draft("Tasca B", 11.0)];
        assert_eq!(db.seed_if_empty(&drafts).await.unwrap(), 2);
        assert_eq!(db.seed_if_empty(&drafts).await.unwrap(), 0);
        assert_eq!(db.list_restaurants().await.unwrap().len(), 2);
    }
}
