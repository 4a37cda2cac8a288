use actix_web::{web, HttpResponse};
use chrono::Local;

use super::AppState;
use crate::auth::AuthUser;
use crate::error::AppError;
use crate::search::RestaurantHit;

pub async fn favorites(state: web::Data<AppState>, user: AuthUser) -> Result<HttpResponse, AppError> {
    let now = Local::now().naive_local();
    let hits: Vec<RestaurantHit> = state
        .db
        .list_favorites(user.id)
        .await?
        .into_iter()
        .map(|r| RestaurantHit::new(r, None, now))
        .collect();
    Ok(HttpResponse::Ok().json(hits))
}

pub async fn add_favorite(
    state: web::Data<AppState>,
    user: AuthUser,
    restaurant_id: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    state.db.add_favorite(user.id, restaurant_id.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn remove_favorite(
    state: web::Data<AppState>,
    user: AuthUser,
    restaurant_id: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let restaurant_id = restaurant_id.into_inner();
    if !state.db.remove_favorite(user.id, restaurant_id).await? {
        return Err(AppError::not_found(format!("Favorite {restaurant_id}")));
    }
    Ok(HttpResponse::NoContent().finish())
}
