use actix_web::{web, HttpResponse};
use leptos::logging::log;

use super::AppState;
use crate::auth::google::verify_id_token;
use crate::auth::password::{hash_password, verify_password};
use crate::auth::tokens::{decode_token, encode_token, issue_pair, TokenType};
use crate::auth::AuthUser;
use crate::error::AppError;
use crate::models::user::{
    DisplayNameUpdate, GoogleLoginRequest, LoginRequest, RefreshRequest, SignupRequest,
    TokenResponse,
};
use crate::models::User;
use crate::validation;

fn signed_in(state: &AppState, user: User) -> Result<TokenResponse, AppError> {
    let (access, refresh) = issue_pair(&state.settings.jwt_secret, &user)?;
    Ok(TokenResponse::bearer(access, Some(refresh), Some(user)))
}

pub async fn signup(
    state: web::Data<AppState>,
    request: web::Json<SignupRequest>,
) -> Result<HttpResponse, AppError> {
    let request = request.into_inner();
    let name = validation::person_name(&request.name)?;
    let email = validation::email(&request.email)?;
    validation::password(&request.password)?;

    let hash = hash_password(&request.password, state.settings.password_cost)?;
    let is_admin = state.settings.is_admin_email(&email);
    let user = state
        .db
        .create_user(&name, &email, Some(&hash), None, is_admin)
        .await?;

    log!("[AUTH] Signed up {}", user.email);
    Ok(HttpResponse::Created().json(signed_in(&state, user)?))
}

pub async fn login(
    state: web::Data<AppState>,
    request: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    let invalid = || AppError::Unauthorized("invalid email or password".to_string());
    let email = validation::email(&request.email).map_err(|_| invalid())?;

    let user = state.db.find_user_by_email(&email).await?.ok_or_else(invalid)?;
    let matches = user
        .password_hash
        .as_deref()
        .map(|hash| verify_password(&request.password, hash))
        .unwrap_or(false);
    if !matches {
        log!("[AUTH] Failed login for {}", email);
        return Err(invalid());
    }

    log!("[AUTH] Logged in {}", user.email);
    Ok(HttpResponse::Ok().json(signed_in(&state, user)?))
}

/// Exchanges a refresh token for a new access token.
pub async fn refresh(
    state: web::Data<AppState>,
    request: web::Json<RefreshRequest>,
) -> Result<HttpResponse, AppError> {
    let claims = decode_token(&state.settings.jwt_secret, &request.refresh_token, TokenType::Refresh)
        .map_err(|_| AppError::Unauthorized("invalid refresh token".to_string()))?;
    let user = state
        .db
        .find_user_by_email(&claims.sub)
        .await?
        .ok_or_else(|| AppError::Unauthorized("user not found".to_string()))?;

    let access = encode_token(&state.settings.jwt_secret, TokenType::Access, &user)?;
    Ok(HttpResponse::Ok().json(TokenResponse::bearer(access, None, None)))
}

pub async fn google(
    state: web::Data<AppState>,
    request: web::Json<GoogleLoginRequest>,
) -> Result<HttpResponse, AppError> {
    let identity = verify_id_token(&state.http, &request.token, &state.settings.google_client_ids).await?;
    let email = validation::email(&identity.email)?;
    let user = state
        .db
        .find_or_create_google_user(
            &identity.sub,
            &email,
            &identity.display_name(),
            state.settings.is_admin_email(&email),
        )
        .await?;

    log!("[AUTH] Google sign-in for {}", user.email);
    Ok(HttpResponse::Ok().json(signed_in(&state, user)?))
}

pub async fn me(user: AuthUser) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(user.0))
}

pub async fn update_display_name(
    state: web::Data<AppState>,
    user: AuthUser,
    request: web::Json<DisplayNameUpdate>,
) -> Result<HttpResponse, AppError> {
    let display_name = validation::display_name(&request.display_name)?;
    let updated = state.db.update_display_name(user.id, &display_name).await?;
    Ok(HttpResponse::Ok().json(updated))
}
