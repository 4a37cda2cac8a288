use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::restaurant::{ListingStatus, RestaurantDraft};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ReviewerComment {
    pub comment: String,
    pub reviewer: String,
    pub timestamp: DateTime<Utc>,
}

/// A proposed restaurant waiting for a reviewer.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: i64,
    pub restaurant_name: String,
    pub submitted_by: String,
    pub submitted_at: DateTime<Utc>,
    pub status: ListingStatus,
    pub data: RestaurantDraft,
    #[serde(default)]
    pub reviewer_comments: Vec<ReviewerComment>,
    #[serde(default)]
    pub reviewed_by: Option<String>,
    #[serde(default)]
    pub reviewed_at: Option<DateTime<Utc>>,
    /// Set once approval has produced a restaurant listing.
    #[serde(default)]
    pub restaurant_id: Option<i64>,
}

/// What a reviewer decides about a submission.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionAction {
    #[serde(alias = "approve")]
    Approved,
    #[serde(alias = "reject")]
    Rejected,
    #[serde(alias = "request_changes")]
    NeedsChanges,
}

impl SubmissionAction {
    pub fn resulting_status(&self) -> ListingStatus {
        match self {
            SubmissionAction::Approved => ListingStatus::Approved,
            SubmissionAction::Rejected => ListingStatus::Rejected,
            SubmissionAction::NeedsChanges => ListingStatus::NeedsChanges,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SubmissionReview {
    pub action: SubmissionAction,
    #[serde(default)]
    pub comment: String,
}
