use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use leptos::logging::warn;
use serde::Deserialize;

use crate::error::AppError;

const GOOGLE_CERTS_URL: &str = "https://www.googleapis.com/oauth2/v3/certs";
const GOOGLE_ISSUERS: [&str; 2] = ["accounts.google.com", "https://accounts.google.com"];

/// The parts of a Google ID token the sign-in flow uses.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleIdentity {
    pub sub: String,
    pub email: String,
    #[serde(default)]
    pub email_verified: bool,
    #[serde(default)]
    pub name: Option<String>,
}

impl GoogleIdentity {
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| self.email.split('@').next().unwrap_or_default().to_string())
    }
}

/// Verifies an ID token against Google's published keys and the configured
/// client ids.
pub async fn verify_id_token(
    client: &reqwest::Client,
    token: &str,
    client_ids: &[String],
) -> Result<GoogleIdentity, AppError> {
    if client_ids.is_empty() {
        return Err(AppError::Internal("Google sign-in is not configured".to_string()));
    }

    let header = decode_header(token)?;
    let kid = header
        .kid
        .ok_or_else(|| AppError::Unauthorized("token has no key id".to_string()))?;

    let jwks: JwkSet = client
        .get(GOOGLE_CERTS_URL)
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| AppError::Network(format!("fetching Google keys: {e}")))?
        .json()
        .await
        .map_err(|e| AppError::Network(format!("reading Google keys: {e}")))?;

    let jwk = jwks
        .find(&kid)
        .ok_or_else(|| AppError::Unauthorized("unknown signing key".to_string()))?;
    let key = DecodingKey::from_jwk(jwk)?;

    let mut validation = Validation::new(Algorithm::RS256);
    validation.set_audience(client_ids);
    validation.set_issuer(&GOOGLE_ISSUERS);

    let identity = decode::<GoogleIdentity>(token, &key, &validation)?.claims;
    if !identity.email_verified {
        warn!("[AUTH] Google account {} has an unverified email", identity.email);
        return Err(AppError::Unauthorized("Google email is not verified".to_string()));
    }
    Ok(identity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_falls_back_to_email_user() {
        let identity = GoogleIdentity {
            sub: "1".into(),
            email: "ana.silva@gmail.com".into(),
            email_verified: true,
            name: None,
        };
        assert_eq!(identity.display_name(), "ana.silva");
    }

    #[tokio::test]
    async fn unconfigured_client_ids_fail_fast() {
        let client = reqwest::Client::new();
        let err = verify_id_token(&client, "x.y.z", &[]).await.unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }
}
