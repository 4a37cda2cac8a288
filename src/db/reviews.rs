use chrono::Utc;
use leptos::logging::log;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::restaurants::load_restaurant;
use super::Database;
use crate::error::AppError;
use crate::models::{Review, User};
use crate::rating::normalize_rating;
use crate::validation;
use crate::voting::{VoteDirection, VoteTally};

// The last column is the viewer's vote, bound through ?1.
const REVIEW_SELECT: &str = "SELECT r.id, r.restaurant_id, u.email, u.display_name, r.rating,
        r.comment, r.upvotes, r.downvotes, r.created_at, r.is_hidden, v.direction
    FROM reviews r
    JOIN users u ON u.id = r.user_id
    LEFT JOIN review_votes v ON v.review_id = r.id AND v.user_id = ?1";

fn review_from_row(row: &Row<'_>) -> rusqlite::Result<Review> {
    let vote: Option<String> = row.get(10)?;
    Ok(Review {
        id: row.get(0)?,
        restaurant_id: row.get(1)?,
        user_id: row.get(2)?,
        display_name: row.get(3)?,
        rating: row.get(4)?,
        comment: row.get(5)?,
        upvotes: row.get(6)?,
        downvotes: row.get(7)?,
        created_at: row.get(8)?,
        is_hidden: row.get(9)?,
        current_user_vote: vote.as_deref().and_then(VoteDirection::parse),
    })
}

fn load_review(conn: &Connection, review_id: i64, viewer: Option<i64>) -> Result<Option<Review>, AppError> {
    let review = conn
        .query_row(
            &format!("{REVIEW_SELECT} WHERE r.id = ?2"),
            params![viewer, review_id],
            review_from_row,
        )
        .optional()?;
    Ok(review)
}

impl Database {
    /// Visible reviews of a restaurant, oldest first. Callers pick the order.
    pub async fn list_reviews(&self, restaurant_id: i64, viewer: Option<i64>) -> Result<Vec<Review>, AppError> {
        let conn = self.conn.lock().await;
        if load_restaurant(&conn, restaurant_id)?.is_none() {
            return Err(AppError::not_found(format!("Restaurant {restaurant_id}")));
        }
        let mut stmt = conn.prepare(&format!(
            "{REVIEW_SELECT} WHERE r.restaurant_id = ?2 AND r.is_hidden = 0 ORDER BY r.id"
        ))?;
        let rows = stmt.query_map(params![viewer, restaurant_id], review_from_row)?;

        let mut reviews = Vec::new();
        for row in rows {
            reviews.push(row?);
        }
        Ok(reviews)
    }

    pub async fn reviews_by_user(&self, user_id: i64) -> Result<Vec<Review>, AppError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(&format!(
            "{REVIEW_SELECT} WHERE r.user_id = ?1 ORDER BY r.created_at DESC"
        ))?;
        let rows = stmt.query_map([user_id], review_from_row)?;

        let mut reviews = Vec::new();
        for row in rows {
            reviews.push(row?);
        }
        Ok(reviews)
    }

    /// Adds a review. A user reviews each restaurant at most once.
    pub async fn create_review(
        &self,
        restaurant_id: i64,
        author: &User,
        rating: f64,
        comment: &str,
    ) -> Result<Review, AppError> {
        let rating = normalize_rating(rating)?;
        let comment = validation::review_comment(comment)?;

        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;
        if load_restaurant(&tx, restaurant_id)?.is_none() {
            return Err(AppError::not_found(format!("Restaurant {restaurant_id}")));
        }
        let already: bool = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM reviews WHERE restaurant_id = ?1 AND user_id = ?2)",
            params![restaurant_id, author.id],
            |row| row.get(0),
        )?;
        if already {
            return Err(AppError::Conflict(
                "you have already reviewed this restaurant".to_string(),
            ));
        }

        tx.execute(
            "INSERT INTO reviews (restaurant_id, user_id, rating, comment, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![restaurant_id, author.id, rating, comment, Utc::now()],
        )?;
        let id = tx.last_insert_rowid();
        let review = load_review(&tx, id, Some(author.id))?
            .ok_or_else(|| AppError::Internal(format!("review {id} vanished after insert")))?;
        tx.commit()?;

        log!("[DB] {} reviewed restaurant {} ({})", author.email, restaurant_id, rating);
        Ok(review)
    }

    /// Toggles the user's vote on a review and returns the updated review.
    pub async fn vote_review(
        &self,
        review_id: i64,
        user_id: i64,
        direction: VoteDirection,
    ) -> Result<Review, AppError> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;

        let counts = tx
            .query_row(
                "SELECT upvotes, downvotes FROM reviews WHERE id = ?1",
                [review_id],
                |row| Ok(VoteTally::new(row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        let Some(mut tally) = counts else {
            return Err(AppError::not_found(format!("Review {review_id}")));
        };

        let previous: Option<String> = tx
            .query_row(
                "SELECT direction FROM review_votes WHERE review_id = ?1 AND user_id = ?2",
                params![review_id, user_id],
                |row| row.get(0),
            )
            .optional()?;
        let previous = previous.as_deref().and_then(VoteDirection::parse);

        let outcome = tally.cast(previous, direction);
        tx.execute(
            "UPDATE reviews SET upvotes = ?1, downvotes = ?2 WHERE id = ?3",
            params![outcome.upvotes, outcome.downvotes, review_id],
        )?;
        match outcome.user_vote {
            Some(vote) => tx.execute(
                "INSERT INTO review_votes (review_id, user_id, direction) VALUES (?1, ?2, ?3)
                 ON CONFLICT (review_id, user_id) DO UPDATE SET direction = excluded.direction",
                params![review_id, user_id, vote.as_str()],
            )?,
            None => tx.execute(
                "DELETE FROM review_votes WHERE review_id = ?1 AND user_id = ?2",
                params![review_id, user_id],
            )?,
        };

        let review = load_review(&tx, review_id, Some(user_id))?
            .ok_or_else(|| AppError::not_found(format!("Review {review_id}")))?;
        tx.commit()?;

        log!(
            "[DB] Vote on review {} by user {}: {:?} -> {:?}",
            review_id,
            user_id,
            previous,
            outcome.user_vote
        );
        Ok(review)
    }
}
