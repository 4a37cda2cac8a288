use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::voting::VoteDirection;

/// Outcome of a community proposal once a reviewer has looked at it.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DecisionStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl DecisionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionStatus::Pending => "pending",
            DecisionStatus::Approved => "approved",
            DecisionStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(DecisionStatus::Pending),
            "approved" => Some(DecisionStatus::Approved),
            "rejected" => Some(DecisionStatus::Rejected),
            _ => None,
        }
    }
}

/// One field of a diff. Older clients sent the bare new value instead of
/// the `{from, to}` pair, so both shapes are accepted.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum FieldChange {
    Diff {
        #[serde(default)]
        from: Value,
        to: Value,
    },
    Bare(Value),
}

impl FieldChange {
    pub fn new(from: Value, to: Value) -> Self {
        FieldChange::Diff { from, to }
    }

    pub fn target(&self) -> &Value {
        match self {
            FieldChange::Diff { to, .. } => to,
            FieldChange::Bare(v) => v,
        }
    }
}

pub type ChangeSet = BTreeMap<String, FieldChange>;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EditSuggestion {
    pub id: i64,
    pub restaurant_id: i64,
    pub restaurant_name: String,
    pub user_email: String,
    pub display_name: String,
    pub changes: ChangeSet,
    pub reason: String,
    pub status: DecisionStatus,
    pub upvotes: i64,
    pub downvotes: i64,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub rejection_reason: Option<String>,
    #[serde(default)]
    pub reviewed_by: Option<String>,
    #[serde(default)]
    pub reviewed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub current_user_vote: Option<VoteDirection>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct NewEditSuggestion {
    pub changes: ChangeSet,
    #[serde(default)]
    pub reason: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Rejection {
    #[serde(default)]
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_diff_and_bare_values() {
        let changes: ChangeSet = serde_json::from_value(json!({
            "menuPrice": {"from": 9.5, "to": 10.0},
            "name": "Tasca Nova"
        }))
        .unwrap();

        assert_eq!(changes["menuPrice"].target(), &json!(10.0));
        assert_eq!(changes["name"].target(), &json!("Tasca Nova"));
    }

    #[test]
    fn status_parse_matches_wire_names() {
        assert_eq!(DecisionStatus::parse("approved"), Some(DecisionStatus::Approved));
        assert_eq!(DecisionStatus::parse("all"), None);
        assert_eq!(
            serde_json::to_string(&DecisionStatus::Rejected).unwrap(),
            "\"rejected\""
        );
    }
}
