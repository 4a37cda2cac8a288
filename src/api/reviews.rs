use actix_web::{web, HttpResponse};
use serde::Deserialize;

use super::AppState;
use crate::auth::{AuthUser, MaybeUser};
use crate::error::AppError;
use crate::models::NewReview;
use crate::review_sorting::{sort_reviews, ReviewSort};
use crate::voting::VoteDirection;

#[derive(Deserialize)]
pub struct SortQuery {
    sort: Option<String>,
}

#[derive(Deserialize)]
pub struct VoteRequest {
    #[serde(alias = "vote_type", alias = "voteType")]
    vote: VoteDirection,
}

pub async fn list(
    state: web::Data<AppState>,
    viewer: MaybeUser,
    restaurant_id: web::Path<i64>,
    query: web::Query<SortQuery>,
) -> Result<HttpResponse, AppError> {
    let viewer_id = viewer.0.as_ref().map(|u| u.id);
    let mut reviews = state.db.list_reviews(restaurant_id.into_inner(), viewer_id).await?;
    let sort = query.sort.as_deref().map(ReviewSort::from_param).unwrap_or_default();
    sort_reviews(&mut reviews, sort);
    Ok(HttpResponse::Ok().json(reviews))
}

pub async fn create(
    state: web::Data<AppState>,
    user: AuthUser,
    restaurant_id: web::Path<i64>,
    review: web::Json<NewReview>,
) -> Result<HttpResponse, AppError> {
    let review = state
        .db
        .create_review(restaurant_id.into_inner(), &user, review.rating, &review.comment)
        .await?;
    Ok(HttpResponse::Created().json(review))
}

/// Casting the same vote twice retracts it.
pub async fn vote(
    state: web::Data<AppState>,
    user: AuthUser,
    review_id: web::Path<i64>,
    request: web::Json<VoteRequest>,
) -> Result<HttpResponse, AppError> {
    let review = state
        .db
        .vote_review(review_id.into_inner(), user.id, request.vote)
        .await?;
    Ok(HttpResponse::Ok().json(review))
}

pub async fn mine(state: web::Data<AppState>, user: AuthUser) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(state.db.reviews_by_user(user.id).await?))
}
