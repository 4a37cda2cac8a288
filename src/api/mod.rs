//! JSON API served under `/api`.

mod auth;
mod moderation;
mod restaurants;
mod reviews;
mod users;

use actix_web::body::MessageBody;
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::middleware::{from_fn, Next};
use actix_web::{web, HttpResponse};
use leptos::logging::log;
use serde_json::json;
use std::sync::Arc;

use crate::config::Settings;
use crate::db::Database;
use crate::demo::DemoNetwork;
use crate::error::AppError;

/// Everything a handler needs, shared across workers.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub settings: Arc<Settings>,
    pub demo: DemoNetwork,
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(db: Database, settings: Settings) -> Self {
        let demo = DemoNetwork::new(settings.demo.clone());
        Self {
            db,
            settings: Arc::new(settings),
            demo,
            http: reqwest::Client::new(),
        }
    }
}

/// Delays and randomly fails API calls when the demo network is configured.
/// The health check is never slowed down.
async fn demo_network(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<impl MessageBody>, actix_web::Error> {
    let demo = req
        .app_data::<web::Data<AppState>>()
        .map(|state| state.demo.clone())
        .filter(|demo| demo.is_active() && !req.path().ends_with("/health"));
    if let Some(demo) = demo {
        if let Err(err) = demo.simulate().await {
            let (req, _) = req.into_parts();
            let response = HttpResponse::from_error(err);
            return Ok(ServiceResponse::new(req, response).map_into_right_body());
        }
    }
    next.call(req).await.map(ServiceResponse::map_into_left_body)
}

async fn health(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    state.db.ping().await?;
    Ok(HttpResponse::Ok().json(json!({
        "status": "ok",
        "database": "connected",
        "environment": format!("{:?}", state.settings.environment).to_lowercase(),
    })))
}

/// Registers the `/api` scope. Literal segments are registered before the
/// `{id}` routes that would otherwise capture them.
pub fn configure(cfg: &mut web::ServiceConfig) {
    log!("[API] Registering /api routes");
    cfg.service(
        web::scope("/api")
            .wrap(from_fn(demo_network))
            .route("/health", web::get().to(health))
            .service(
                web::scope("/auth")
                    .route("/signup", web::post().to(auth::signup))
                    .route("/login", web::post().to(auth::login))
                    .route("/refresh", web::post().to(auth::refresh))
                    .route("/google", web::post().to(auth::google))
                    .route("/me", web::get().to(auth::me))
                    .route("/update-display-name", web::put().to(auth::update_display_name)),
            )
            .service(
                web::scope("/restaurants")
                    .route("", web::get().to(restaurants::search))
                    .route("/featured", web::get().to(restaurants::featured))
                    .route("/facets", web::get().to(restaurants::facets))
                    .route("/submit", web::post().to(restaurants::submit))
                    .route("/submissions", web::get().to(restaurants::list_submissions))
                    .route("/submissions/my", web::get().to(restaurants::my_submissions))
                    .route("/submissions/{id}", web::get().to(restaurants::get_submission))
                    .route("/submissions/{id}", web::put().to(restaurants::resubmit))
                    .route("/submissions/{id}/review", web::post().to(restaurants::review_submission))
                    .route("/{id}", web::get().to(restaurants::detail))
                    .route("/{id}", web::delete().to(restaurants::delete))
                    .route("/{id}/reviews", web::get().to(reviews::list))
                    .route("/{id}/reviews", web::post().to(reviews::create))
                    .route("/{id}/edit-suggestions", web::get().to(moderation::restaurant_suggestions))
                    .route("/{id}/edit-suggestions", web::post().to(moderation::suggest_edit)),
            )
            .service(
                web::scope("/reviews")
                    .route("/my", web::get().to(reviews::mine))
                    .route("/{id}/vote", web::post().to(reviews::vote)),
            )
            .service(
                web::scope("/edit-suggestions")
                    .route("/all", web::get().to(moderation::all_suggestions))
                    .route("/{id}/vote", web::post().to(moderation::vote_suggestion))
                    .route("/{id}/approve", web::post().to(moderation::approve_suggestion))
                    .route("/{id}/reject", web::post().to(moderation::reject_suggestion)),
            )
            .service(
                web::scope("/reports")
                    .route("/reviews", web::post().to(moderation::report_review))
                    .route("/reviews", web::get().to(moderation::list_reports))
                    .route("/{id}/resolve", web::post().to(moderation::resolve_report)),
            )
            .service(
                web::scope("/favorites")
                    .route("", web::get().to(users::favorites))
                    .route("/{restaurant_id}", web::post().to(users::add_favorite))
                    .route("/{restaurant_id}", web::delete().to(users::remove_favorite)),
            )
            .service(
                web::scope("/reviewer-applications")
                    .route("", web::post().to(moderation::apply))
                    .route("", web::get().to(moderation::list_applications))
                    .route("/my", web::get().to(moderation::my_applications))
                    .route("/stats", web::get().to(moderation::application_stats))
                    .route("/{id}/review", web::post().to(moderation::review_application)),
            )
            .route("/admin/cleanup", web::post().to(moderation::cleanup)),
    );
}
