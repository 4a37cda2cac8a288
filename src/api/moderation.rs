use actix_web::{web, HttpResponse};
use leptos::logging::log;
use serde::Deserialize;

use super::AppState;
use crate::auth::{Admin, AuthUser, MaybeUser, Reviewer};
use crate::error::AppError;
use crate::models::edit_suggestion::{NewEditSuggestion, Rejection};
use crate::models::report::{NewReport, Resolution};
use crate::models::reviewer_application::{ApplicationReview, NewApplication};
use crate::models::{DecisionStatus, ReportStatus};
use crate::voting::VoteDirection;

#[derive(Deserialize)]
pub struct StatusQuery {
    status: Option<String>,
}

#[derive(Deserialize)]
pub struct VoteRequest {
    #[serde(alias = "vote_type", alias = "voteType")]
    vote: VoteDirection,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupQuery {
    days: Option<i64>,
    dry_run: Option<bool>,
}

const DEFAULT_CLEANUP_DAYS: i64 = 30;

fn decision_status(query: &StatusQuery) -> Result<Option<DecisionStatus>, AppError> {
    match query.status.as_deref() {
        None | Some("") | Some("all") => Ok(None),
        Some(s) => DecisionStatus::parse(s)
            .map(Some)
            .ok_or_else(|| AppError::validation(format!("unknown status '{s}'"))),
    }
}

pub async fn restaurant_suggestions(
    state: web::Data<AppState>,
    viewer: MaybeUser,
    restaurant_id: web::Path<i64>,
    query: web::Query<StatusQuery>,
) -> Result<HttpResponse, AppError> {
    let restaurant_id = restaurant_id.into_inner();
    state.db.get_restaurant(restaurant_id).await?;
    let suggestions = state
        .db
        .list_edit_suggestions(
            Some(restaurant_id),
            decision_status(&query)?,
            viewer.0.as_ref().map(|u| u.id),
        )
        .await?;
    Ok(HttpResponse::Ok().json(suggestions))
}

pub async fn suggest_edit(
    state: web::Data<AppState>,
    user: AuthUser,
    restaurant_id: web::Path<i64>,
    suggestion: web::Json<NewEditSuggestion>,
) -> Result<HttpResponse, AppError> {
    let created = state
        .db
        .create_edit_suggestion(restaurant_id.into_inner(), &user, suggestion.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(created))
}

pub async fn all_suggestions(
    state: web::Data<AppState>,
    reviewer: Reviewer,
    query: web::Query<StatusQuery>,
) -> Result<HttpResponse, AppError> {
    let suggestions = state
        .db
        .list_edit_suggestions(None, decision_status(&query)?, Some(reviewer.id))
        .await?;
    Ok(HttpResponse::Ok().json(suggestions))
}

pub async fn vote_suggestion(
    state: web::Data<AppState>,
    user: AuthUser,
    id: web::Path<i64>,
    request: web::Json<VoteRequest>,
) -> Result<HttpResponse, AppError> {
    let suggestion = state
        .db
        .vote_edit_suggestion(id.into_inner(), user.id, request.vote)
        .await?;
    Ok(HttpResponse::Ok().json(suggestion))
}

pub async fn approve_suggestion(
    state: web::Data<AppState>,
    reviewer: Reviewer,
    id: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let suggestion = state
        .db
        .approve_edit_suggestion(id.into_inner(), &reviewer.email)
        .await?;
    Ok(HttpResponse::Ok().json(suggestion))
}

pub async fn reject_suggestion(
    state: web::Data<AppState>,
    reviewer: Reviewer,
    id: web::Path<i64>,
    rejection: web::Json<Rejection>,
) -> Result<HttpResponse, AppError> {
    let suggestion = state
        .db
        .reject_edit_suggestion(id.into_inner(), &rejection.reason, &reviewer.email)
        .await?;
    Ok(HttpResponse::Ok().json(suggestion))
}

pub async fn report_review(
    state: web::Data<AppState>,
    user: AuthUser,
    report: web::Json<NewReport>,
) -> Result<HttpResponse, AppError> {
    let report = state.db.create_report(&user, report.into_inner()).await?;
    Ok(HttpResponse::Created().json(report))
}

pub async fn list_reports(
    state: web::Data<AppState>,
    _reviewer: Reviewer,
    query: web::Query<StatusQuery>,
) -> Result<HttpResponse, AppError> {
    let status = match query.status.as_deref() {
        None | Some("") | Some("all") => None,
        Some(s) => Some(
            ReportStatus::parse(s)
                .ok_or_else(|| AppError::validation(format!("unknown status '{s}'")))?,
        ),
    };
    Ok(HttpResponse::Ok().json(state.db.list_reports(status).await?))
}

pub async fn resolve_report(
    state: web::Data<AppState>,
    reviewer: Reviewer,
    id: web::Path<i64>,
    resolution: web::Json<Resolution>,
) -> Result<HttpResponse, AppError> {
    let report = state
        .db
        .resolve_report(id.into_inner(), resolution.action, &reviewer.email)
        .await?;
    Ok(HttpResponse::Ok().json(report))
}

pub async fn apply(
    state: web::Data<AppState>,
    user: AuthUser,
    application: web::Json<NewApplication>,
) -> Result<HttpResponse, AppError> {
    let created = state
        .db
        .create_application(&user, application.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(created))
}

pub async fn list_applications(
    state: web::Data<AppState>,
    _admin: Admin,
    query: web::Query<StatusQuery>,
) -> Result<HttpResponse, AppError> {
    let applications = state.db.list_applications(decision_status(&query)?).await?;
    Ok(HttpResponse::Ok().json(applications))
}

pub async fn my_applications(
    state: web::Data<AppState>,
    user: AuthUser,
) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(state.db.applications_by(user.id).await?))
}

pub async fn application_stats(
    state: web::Data<AppState>,
    _admin: Admin,
) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(state.db.application_stats().await?))
}

pub async fn review_application(
    state: web::Data<AppState>,
    admin: Admin,
    id: web::Path<i64>,
    review: web::Json<ApplicationReview>,
) -> Result<HttpResponse, AppError> {
    let application = state
        .db
        .decide_application(id.into_inner(), review.into_inner(), &admin.email)
        .await?;
    Ok(HttpResponse::Ok().json(application))
}

pub async fn cleanup(
    state: web::Data<AppState>,
    admin: Admin,
    query: web::Query<CleanupQuery>,
) -> Result<HttpResponse, AppError> {
    let days = query.days.unwrap_or(DEFAULT_CLEANUP_DAYS);
    let dry_run = query.dry_run.unwrap_or(true);
    log!("[API] Cleanup requested by {} (days={}, dry_run={})", admin.email, days, dry_run);
    let report = state.db.cleanup_submissions(days, dry_run).await?;
    Ok(HttpResponse::Ok().json(report))
}
