// src/models/review.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::voting::VoteDirection;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: i64,
    pub restaurant_id: i64,
    pub user_id: String,        // author's email
    pub display_name: String,   // author's public name
    pub rating: f64,            // 1.0 - 5.0, one decimal
    pub comment: String,
    pub upvotes: i64,
    pub downvotes: i64,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub is_hidden: bool,
    /// How the requesting user voted, when the request was authenticated.
    #[serde(default)]
    pub current_user_vote: Option<VoteDirection>,
}

impl Review {
    pub fn net_score(&self) -> i64 {
        self.upvotes - self.downvotes
    }

    pub fn engagement(&self) -> i64 {
        self.upvotes + self.downvotes
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct NewReview {
    pub rating: f64,
    #[serde(default)]
    pub comment: String,
}
