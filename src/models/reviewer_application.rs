use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::edit_suggestion::DecisionStatus;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReviewerApplication {
    pub id: i64,
    pub user_email: String,
    pub user_name: String,
    pub motivation: String,
    #[serde(default)]
    pub experience: Option<String>,
    pub status: DecisionStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub admin_notes: Option<String>,
    #[serde(default)]
    pub reviewed_by: Option<String>,
    #[serde(default)]
    pub reviewed_at: Option<DateTime<Utc>>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct NewApplication {
    pub motivation: String,
    #[serde(default)]
    pub experience: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationDecision {
    #[serde(alias = "approved")]
    Approve,
    #[serde(alias = "rejected")]
    Reject,
}

impl ApplicationDecision {
    pub fn resulting_status(&self) -> DecisionStatus {
        match self {
            ApplicationDecision::Approve => DecisionStatus::Approved,
            ApplicationDecision::Reject => DecisionStatus::Rejected,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationReview {
    pub action: ApplicationDecision,
    #[serde(default)]
    pub admin_notes: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ApplicationStats {
    pub total: i64,
    pub pending: i64,
    pub approved: i64,
    pub rejected: i64,
}
