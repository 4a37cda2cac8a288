use actix_web::dev::Payload;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{web, FromRequest, HttpRequest};
use futures::future::LocalBoxFuture;
use futures::FutureExt;
use std::ops::Deref;

use super::tokens::{decode_token, TokenType};
use crate::api::AppState;
use crate::error::AppError;
use crate::models::User;

fn bearer_token(req: &HttpRequest) -> Option<String> {
    let value = req.headers().get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") || token.trim().is_empty() {
        return None;
    }
    Some(token.trim().to_string())
}

/// Resolves an access token to the account it was issued for.
pub async fn authenticate(state: &AppState, token: &str) -> Result<User, AppError> {
    let claims = decode_token(&state.settings.jwt_secret, token, TokenType::Access)?;
    state
        .db
        .find_user_by_id(claims.user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("account no longer exists".to_string()))
}

fn request_parts(req: &HttpRequest) -> (Option<web::Data<AppState>>, Option<String>) {
    (req.app_data::<web::Data<AppState>>().cloned(), bearer_token(req))
}

async fn required_user(
    state: Option<web::Data<AppState>>,
    token: Option<String>,
) -> Result<User, AppError> {
    let state = state.ok_or_else(|| AppError::Internal("application state missing".to_string()))?;
    let token = token.ok_or_else(|| AppError::Unauthorized("missing bearer token".to_string()))?;
    authenticate(&state, &token).await
}

/// Any signed-in user.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

/// The signed-in user if the request carries a valid token.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<User>);

/// A user with reviewer or admin rights.
#[derive(Debug, Clone)]
pub struct Reviewer(pub User);

#[derive(Debug, Clone)]
pub struct Admin(pub User);

impl FromRequest for AuthUser {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let (state, token) = request_parts(req);
        async move { required_user(state, token).await.map(AuthUser) }.boxed_local()
    }
}

impl FromRequest for MaybeUser {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let (state, token) = request_parts(req);
        async move {
            let (Some(state), Some(token)) = (state, token) else {
                return Ok(MaybeUser(None));
            };
            Ok(MaybeUser(authenticate(&state, &token).await.ok()))
        }
        .boxed_local()
    }
}

impl FromRequest for Reviewer {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let (state, token) = request_parts(req);
        async move {
            let user = required_user(state, token).await?;
            if !user.can_moderate() {
                return Err(AppError::Forbidden("reviewer rights required".to_string()));
            }
            Ok(Reviewer(user))
        }
        .boxed_local()
    }
}

impl FromRequest for Admin {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let (state, token) = request_parts(req);
        async move {
            let user = required_user(state, token).await?;
            if !user.is_admin {
                return Err(AppError::Forbidden("admin rights required".to_string()));
            }
            Ok(Admin(user))
        }
        .boxed_local()
    }
}

impl Deref for AuthUser {
    type Target = User;
    fn deref(&self) -> &User {
        &self.0
    }
}

impl Deref for Reviewer {
    type Target = User;
    fn deref(&self) -> &User {
        &self.0
    }
}

impl Deref for Admin {
    type Target = User;
    fn deref(&self) -> &User {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn reads_bearer_tokens_only() {
        let req = TestRequest::default()
            .insert_header((AUTHORIZATION, "Bearer abc.def"))
            .to_http_request();
        assert_eq!(bearer_token(&req).as_deref(), Some("abc.def"));

        let basic = TestRequest::default()
            .insert_header((AUTHORIZATION, "Basic dXNlcg=="))
            .to_http_request();
        assert_eq!(bearer_token(&basic), None);
        assert_eq!(bearer_token(&TestRequest::default().to_http_request()), None);
    }
}
