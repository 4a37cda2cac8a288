#![cfg(feature = "ssr")]

use actix_web::http::{header, StatusCode};
use actix_web::{test, web, App};
use serde_json::{json, Value};

use menudealmoco::api::{self, AppState};
use menudealmoco::config::{DemoSettings, Settings};
use menudealmoco::db::Database;
use menudealmoco::demo::demo_restaurants;
use menudealmoco::models::user::TokenResponse;

const ADMIN_EMAIL: &str = "boss@example.pt";

async fn app_state(demo: DemoSettings) -> AppState {
    let db = Database::new(":memory:").unwrap();
    db.create_schema().await.unwrap();
    db.seed_if_empty(&demo_restaurants().unwrap()).await.unwrap();
    let settings = Settings {
        password_cost: 4,
        admin_emails: [ADMIN_EMAIL.to_string()].into_iter().collect(),
        demo,
        ..Settings::default()
    };
    AppState::new(db, settings)
}

macro_rules! test_app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($state))
                .configure(api::configure),
        )
        .await
    };
}

macro_rules! signup {
    ($app:expr, $name:expr, $email:expr) => {{
        let req = test::TestRequest::post()
            .uri("/api/auth/signup")
            .set_json(json!({"name": $name, "email": $email, "password": "almoco2024"}))
            .to_request();
        let tokens: TokenResponse = test::call_and_read_body_json(&$app, req).await;
        format!("Bearer {}", tokens.access_token)
    }};
}

#[actix_web::test]
async fn test_health_and_search() {
    let app = test_app!(app_state(DemoSettings::default()).await);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/api/health").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri("/api/restaurants?priceRange=budget&sortBy=price&sortOrder=asc")
        .to_request();
    let page: Value = test::call_and_read_body_json(&app, req).await;
    let items = page["items"].as_array().unwrap();
    assert!(!items.is_empty());
    for item in items {
        let price = item["menuPrice"].as_f64().unwrap();
        assert!((6.0..=8.0).contains(&price), "price {price} outside budget");
    }

    let req = test::TestRequest::get().uri("/api/restaurants/featured").to_request();
    let featured: Value = test::call_and_read_body_json(&app, req).await;
    assert!(!featured.as_array().unwrap().is_empty());

    let req = test::TestRequest::get().uri("/api/restaurants/1").to_request();
    let detail: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(detail["name"], "Tasca do João");
    assert!(detail["similar"].as_array().unwrap().len() <= 4);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/api/restaurants/999").to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::get()
        .uri("/api/restaurants?lastUpdatedDays=9000000000000")
        .to_request();
    let page: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(page["total"], 6);

    let req = test::TestRequest::get()
        .uri("/api/restaurants?lastUpdatedDays=-3")
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[actix_web::test]
async fn test_signup_login_and_me() {
    let app = test_app!(app_state(DemoSettings::default()).await);
    let bearer = signup!(app, "Ana Silva", "ana@example.pt");

    let req = test::TestRequest::get()
        .uri("/api/auth/me")
        .insert_header((header::AUTHORIZATION, bearer))
        .to_request();
    let me: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(me["email"], "ana@example.pt");
    assert_eq!(me["displayName"], "User1");
    assert!(me.get("passwordHash").is_none());

    let duplicate = test::TestRequest::post()
        .uri("/api/auth/signup")
        .set_json(json!({"name": "Ana Silva", "email": "ana@example.pt", "password": "almoco2024"}))
        .to_request();
    assert_eq!(test::call_service(&app, duplicate).await.status(), StatusCode::CONFLICT);

    let wrong = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({"email": "ana@example.pt", "password": "errada2024"}))
        .to_request();
    let resp = test::call_service(&app, wrong).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(resp.headers().contains_key(header::WWW_AUTHENTICATE));

    let login = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({"email": "ANA@example.pt", "password": "almoco2024"}))
        .to_request();
    let tokens: TokenResponse = test::call_and_read_body_json(&app, login).await;
    let refresh_token = tokens.refresh_token.unwrap();

    let refresh = test::TestRequest::post()
        .uri("/api/auth/refresh")
        .set_json(json!({"refresh_token": refresh_token}))
        .to_request();
    let refreshed: TokenResponse = test::call_and_read_body_json(&app, refresh).await;
    assert_eq!(refreshed.token_type, "bearer");

    // A refresh token is not accepted as an access token.
    let misuse = test::TestRequest::get()
        .uri("/api/auth/me")
        .insert_header((header::AUTHORIZATION, format!("Bearer {refresh_token}")))
        .to_request();
    assert_eq!(test::call_service(&app, misuse).await.status(), StatusCode::UNAUTHORIZED);

    let anonymous = test::TestRequest::get().uri("/api/auth/me").to_request();
    assert_eq!(test::call_service(&app, anonymous).await.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_reviews_and_votes() {
    let app = test_app!(app_state(DemoSettings::default()).await);
    let ana = signup!(app, "Ana Silva", "ana@example.pt");
    let rui = signup!(app, "Rui Costa", "rui@example.pt");

    let req = test::TestRequest::post()
        .uri("/api/restaurants/1/reviews")
        .insert_header((header::AUTHORIZATION, ana.clone()))
        .set_json(json!({"rating": 4.0, "comment": "Sopa ótima"}))
        .to_request();
    let review: Value = test::call_and_read_body_json(&app, req).await;
    let review_id = review["id"].as_i64().unwrap();

    let again = test::TestRequest::post()
        .uri("/api/restaurants/1/reviews")
        .insert_header((header::AUTHORIZATION, ana))
        .set_json(json!({"rating": 2.0}))
        .to_request();
    assert_eq!(test::call_service(&app, again).await.status(), StatusCode::CONFLICT);

    let vote = |direction: &str| {
        test::TestRequest::post()
            .uri(&format!("/api/reviews/{review_id}/vote"))
            .insert_header((header::AUTHORIZATION, rui.clone()))
            .set_json(json!({"vote": direction}))
            .to_request()
    };
    let up: Value = test::call_and_read_body_json(&app, vote("up")).await;
    assert_eq!(up["upvotes"], 1);
    assert_eq!(up["currentUserVote"], "up");
    let cleared: Value = test::call_and_read_body_json(&app, vote("upvote")).await;
    assert_eq!(cleared["upvotes"], 0);
    assert!(cleared["currentUserVote"].is_null());

    let req = test::TestRequest::get()
        .uri("/api/restaurants/1/reviews?sort=upvotes")
        .to_request();
    let reviews: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(reviews.as_array().unwrap().len(), 1);

    let req = test::TestRequest::get().uri("/api/restaurants/1").to_request();
    let detail: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(detail["menuReviews"], 1);
    assert_eq!(detail["menuRating"], 4.0);
}

#[actix_web::test]
async fn test_submission_moderation_and_roles() {
    let app = test_app!(app_state(DemoSettings::default()).await);
    let ana = signup!(app, "Ana Silva", "ana@example.pt");
    let boss = signup!(app, "Chefe", ADMIN_EMAIL);

    let submit = test::TestRequest::post()
        .uri("/api/restaurants/submit")
        .insert_header((header::AUTHORIZATION, ana.clone()))
        .set_json(json!({
            "name": "Taberna Nova",
            "address": "Rua de Santa Catarina, 200, Bonfim, Porto",
            "menuPrice": 10.5,
            "foodType": "Traditional Portuguese",
            "whatsIncluded": ["soup", "main", "coffee"]
        }))
        .to_request();
    let submission: Value = test::call_and_read_body_json(&app, submit).await;
    assert_eq!(submission["status"], "pending");
    let submission_id = submission["id"].as_i64().unwrap();

    let forbidden = test::TestRequest::get()
        .uri("/api/restaurants/submissions?status=pending")
        .insert_header((header::AUTHORIZATION, ana.clone()))
        .to_request();
    assert_eq!(test::call_service(&app, forbidden).await.status(), StatusCode::FORBIDDEN);

    let queue = test::TestRequest::get()
        .uri("/api/restaurants/submissions?status=pending")
        .insert_header((header::AUTHORIZATION, boss.clone()))
        .to_request();
    let pending: Value = test::call_and_read_body_json(&app, queue).await;
    assert_eq!(pending.as_array().unwrap().len(), 1);

    let approve = test::TestRequest::post()
        .uri(&format!("/api/restaurants/submissions/{submission_id}/review"))
        .insert_header((header::AUTHORIZATION, boss.clone()))
        .set_json(json!({"action": "approve", "comment": "Bem-vinda"}))
        .to_request();
    let approved: Value = test::call_and_read_body_json(&app, approve).await;
    assert_eq!(approved["status"], "approved");
    let restaurant_id = approved["restaurantId"].as_i64().unwrap();

    let req = test::TestRequest::get()
        .uri(&format!("/api/restaurants/{restaurant_id}"))
        .to_request();
    let restaurant: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(restaurant["city"], "Porto");
    assert_eq!(restaurant["approvedBy"], ADMIN_EMAIL);

    let stats = test::TestRequest::get()
        .uri("/api/reviewer-applications/stats")
        .insert_header((header::AUTHORIZATION, ana))
        .to_request();
    assert_eq!(test::call_service(&app, stats).await.status(), StatusCode::FORBIDDEN);

    let out_of_range = test::TestRequest::post()
        .uri("/api/admin/cleanup?days=9000000000000")
        .insert_header((header::AUTHORIZATION, boss.clone()))
        .to_request();
    assert_eq!(
        test::call_service(&app, out_of_range).await.status(),
        StatusCode::UNPROCESSABLE_ENTITY
    );

    let cleanup = test::TestRequest::post()
        .uri("/api/admin/cleanup?days=30&dryRun=true")
        .insert_header((header::AUTHORIZATION, boss))
        .to_request();
    let report: Value = test::call_and_read_body_json(&app, cleanup).await;
    assert_eq!(report["dryRun"], true);
    assert!(report["submissionIds"].as_array().unwrap().is_empty());
}

#[actix_web::test]
async fn test_demo_failures_spare_the_health_check() {
    let demo = DemoSettings {
        latency_ms: None,
        failure_rate: 1.0,
    };
    let app = test_app!(app_state(demo).await);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/api/restaurants").to_request()).await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["type"], "network");

    let resp = test::call_service(&app, test::TestRequest::get().uri("/api/health").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
}
