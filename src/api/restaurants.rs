use actix_web::{web, HttpResponse};
use chrono::Local;
use leptos::logging::log;
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::auth::{AuthUser, Reviewer};
use crate::error::AppError;
use crate::models::submission::SubmissionReview;
use crate::models::{ListingStatus, RestaurantDraft};
use crate::search::{self, RestaurantHit, SearchParams, SearchQuery};

const SIMILAR_LIMIT: usize = 4;
const FEATURED_LIMIT: usize = 6;

#[derive(Deserialize)]
pub struct LimitQuery {
    limit: Option<usize>,
}

#[derive(Deserialize)]
pub struct StatusQuery {
    status: Option<String>,
}

#[derive(Serialize)]
struct RestaurantDetail {
    #[serde(flatten)]
    restaurant: RestaurantHit,
    similar: Vec<RestaurantHit>,
}

pub async fn search(
    state: web::Data<AppState>,
    query: web::Query<SearchQuery>,
) -> Result<HttpResponse, AppError> {
    let params = SearchParams::try_from(query.into_inner())?;
    let restaurants = state.db.list_restaurants().await?;
    let page = search::search(&restaurants, &params, &Local::now());
    log!(
        "[API] Search matched {} of {} restaurants",
        page.total,
        restaurants.len()
    );
    Ok(HttpResponse::Ok().json(page))
}

pub async fn featured(
    state: web::Data<AppState>,
    query: web::Query<LimitQuery>,
) -> Result<HttpResponse, AppError> {
    let restaurants = state.db.list_restaurants().await?;
    let now = Local::now().naive_local();
    let hits: Vec<RestaurantHit> = search::featured(&restaurants, query.limit.unwrap_or(FEATURED_LIMIT))
        .into_iter()
        .map(|r| RestaurantHit::new(r.clone(), None, now))
        .collect();
    Ok(HttpResponse::Ok().json(hits))
}

pub async fn facets(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let restaurants = state.db.list_restaurants().await?;
    Ok(HttpResponse::Ok().json(search::facets(&restaurants)))
}

pub async fn detail(
    state: web::Data<AppState>,
    id: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let restaurant = state.db.get_restaurant(id.into_inner()).await?;
    if restaurant.status != ListingStatus::Approved {
        return Err(AppError::not_found(format!("Restaurant {}", restaurant.id)));
    }
    let all = state.db.list_restaurants().await?;
    let now = Local::now().naive_local();

    let similar = search::similar(&all, &restaurant, SIMILAR_LIMIT)
        .into_iter()
        .map(|r| RestaurantHit::new(r.clone(), None, now))
        .collect();
    Ok(HttpResponse::Ok().json(RestaurantDetail {
        restaurant: RestaurantHit::new(restaurant, None, now),
        similar,
    }))
}

pub async fn delete(
    state: web::Data<AppState>,
    reviewer: Reviewer,
    id: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let id = id.into_inner();
    state.db.delete_restaurant(id).await?;
    log!("[API] Restaurant {} deleted by {}", id, reviewer.email);
    Ok(HttpResponse::NoContent().finish())
}

pub async fn submit(
    state: web::Data<AppState>,
    user: AuthUser,
    draft: web::Json<RestaurantDraft>,
) -> Result<HttpResponse, AppError> {
    let submission = state.db.create_submission(&user.email, draft.into_inner()).await?;
    Ok(HttpResponse::Created().json(submission))
}

pub async fn list_submissions(
    state: web::Data<AppState>,
    _reviewer: Reviewer,
    query: web::Query<StatusQuery>,
) -> Result<HttpResponse, AppError> {
    let status = match query.status.as_deref() {
        None | Some("") | Some("all") => None,
        Some(s) => Some(s.parse::<ListingStatus>()?),
    };
    Ok(HttpResponse::Ok().json(state.db.list_submissions(status).await?))
}

pub async fn my_submissions(
    state: web::Data<AppState>,
    user: AuthUser,
) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(state.db.submissions_by(&user.email).await?))
}

/// Visible to the submitter and to moderators.
pub async fn get_submission(
    state: web::Data<AppState>,
    user: AuthUser,
    id: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let submission = state.db.get_submission(id.into_inner()).await?;
    if submission.submitted_by != user.email && !user.can_moderate() {
        return Err(AppError::Forbidden("not your submission".to_string()));
    }
    Ok(HttpResponse::Ok().json(submission))
}

pub async fn resubmit(
    state: web::Data<AppState>,
    user: AuthUser,
    id: web::Path<i64>,
    draft: web::Json<RestaurantDraft>,
) -> Result<HttpResponse, AppError> {
    let submission = state
        .db
        .resubmit_submission(id.into_inner(), draft.into_inner(), &user.email)
        .await?;
    Ok(HttpResponse::Ok().json(submission))
}

pub async fn review_submission(
    state: web::Data<AppState>,
    reviewer: Reviewer,
    id: web::Path<i64>,
    review: web::Json<SubmissionReview>,
) -> Result<HttpResponse, AppError> {
    let review = review.into_inner();
    let submission = state
        .db
        .review_submission(id.into_inner(), review.action, &review.comment, &reviewer.email)
        .await?;
    Ok(HttpResponse::Ok().json(submission))
}
