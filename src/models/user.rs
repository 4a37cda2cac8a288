use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub display_name: String,
    pub is_reviewer: bool,
    pub is_admin: bool,
    pub joined_at: DateTime<Utc>,
    #[serde(skip)]
    pub password_hash: Option<String>,
    #[serde(skip)]
    pub google_id: Option<String>,
}

impl User {
    /// Admins always carry reviewer rights.
    pub fn can_moderate(&self) -> bool {
        self.is_reviewer || self.is_admin
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct GoogleLoginRequest {
    pub token: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct DisplayNameUpdate {
    pub display_name: String,
}

/// Lifetime of an access token.
pub const ACCESS_TOKEN_SECONDS: i64 = 30 * 60;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub token_type: String,
    pub expires_in: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}

impl TokenResponse {
    pub fn bearer(access_token: String, refresh_token: Option<String>, user: Option<User>) -> Self {
        Self {
            access_token,
            refresh_token,
            token_type: "bearer".to_string(),
            expires_in: ACCESS_TOKEN_SECONDS,
            user,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secrets_are_never_serialized() {
        let user = User {
            id: 1,
            email: "ana@example.pt".into(),
            name: "Ana".into(),
            display_name: "User1".into(),
            is_reviewer: false,
            is_admin: true,
            joined_at: Utc::now(),
            password_hash: Some("$2b$12$hash".into()),
            google_id: Some("g-1".into()),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("googleId").is_none());
        assert_eq!(json["displayName"], "User1");
        assert!(user.can_moderate());
    }
}
