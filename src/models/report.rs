use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    #[default]
    Pending,
    Resolved,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Pending => "pending",
            ReportStatus::Resolved => "resolved",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ReportStatus::Pending),
            "resolved" => Some(ReportStatus::Resolved),
            _ => None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReportAction {
    Dismissed,
    ReviewHidden,
}

impl ReportAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportAction::Dismissed => "dismissed",
            ReportAction::ReviewHidden => "review_hidden",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "dismissed" => Some(ReportAction::Dismissed),
            "review_hidden" => Some(ReportAction::ReviewHidden),
            _ => None,
        }
    }
}

/// A user's flag against a review.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: i64,
    pub review_id: i64,
    pub restaurant_id: i64,
    pub reporter: String,
    pub reason: String,
    pub status: ReportStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub action: Option<ReportAction>,
    #[serde(default)]
    pub resolved_by: Option<String>,
    #[serde(default)]
    pub resolved_at: Option<DateTime<Utc>>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NewReport {
    pub review_id: i64,
    pub restaurant_id: i64,
    pub reason: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Resolution {
    pub action: ReportAction,
}
