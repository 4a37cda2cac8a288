use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::user::ACCESS_TOKEN_SECONDS;
use crate::models::User;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

impl TokenType {
    pub fn lifetime(self) -> Duration {
        match self {
            TokenType::Access => Duration::seconds(ACCESS_TOKEN_SECONDS),
            TokenType::Refresh => Duration::days(7),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// The account email.
    pub sub: String,
    pub user_id: i64,
    pub r#type: TokenType,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

pub fn encode_token(secret: &str, token_type: TokenType, user: &User) -> Result<String, AppError> {
    let now = Utc::now();
    let claims = Claims {
        sub: user.email.clone(),
        user_id: user.id,
        r#type: token_type,
        iat: now.timestamp(),
        exp: (now + token_type.lifetime()).timestamp(),
        jti: Uuid::new_v4().to_string(),
    };
    let key = EncodingKey::from_secret(secret.as_bytes());
    Ok(encode(&Header::default(), &claims, &key)?)
}

/// Verifies signature and expiry and checks the token is of the expected type.
pub fn decode_token(secret: &str, token: &str, expected: TokenType) -> Result<Claims, AppError> {
    let key = DecodingKey::from_secret(secret.as_bytes());
    let data = decode::<Claims>(token, &key, &Validation::new(Algorithm::HS256))?;
    if data.claims.r#type != expected {
        return Err(AppError::Unauthorized("wrong token type".to_string()));
    }
    Ok(data.claims)
}

/// A fresh access and refresh token pair for the user.
pub fn issue_pair(secret: &str, user: &User) -> Result<(String, String), AppError> {
    Ok((
        encode_token(secret, TokenType::Access, user)?,
        encode_token(secret, TokenType::Refresh, user)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: 7,
            email: "ana@example.pt".into(),
            name: "Ana".into(),
            display_name: "User7".into(),
            is_reviewer: false,
            is_admin: false,
            joined_at: Utc::now(),
            password_hash: None,
            google_id: None,
        }
    }

    #[test]
    fn access_token_round_trip() {
        let token = encode_token("secret", TokenType::Access, &user()).unwrap();
        let claims = decode_token("secret", &token, TokenType::Access).unwrap();
        assert_eq!(claims.sub, "ana@example.pt");
        assert_eq!(claims.user_id, 7);
        assert_eq!(claims.exp - claims.iat, 30 * 60);
    }

    #[test]
    fn refresh_token_is_not_an_access_token() {
        let (_, refresh) = issue_pair("secret", &user()).unwrap();
        let err = decode_token("secret", &refresh, TokenType::Access).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
        assert!(decode_token("secret", &refresh, TokenType::Refresh).is_ok());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = encode_token("secret", TokenType::Access, &user()).unwrap();
        let err = decode_token("other", &token, TokenType::Access).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Unauthorized);
    }
}
