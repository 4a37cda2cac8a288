#[cfg(feature = "ssr")]
fn startup_error(err: impl std::fmt::Display) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::Other, err.to_string())
}

#[cfg(feature = "ssr")]
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    use actix_files::Files;
    use actix_web::{web, App, HttpServer};
    use leptos::logging::{log, warn};
    use leptos::*;
    use leptos_actix::{generate_route_list, LeptosRoutes};
    use menudealmoco::api::{self, AppState};
    use menudealmoco::app::App as Site;
    use menudealmoco::config::Settings;
    use menudealmoco::db::Database;
    use menudealmoco::demo::demo_restaurants;

    // Load service settings
    let settings = Settings::from_env().map_err(startup_error)?;
    if settings.uses_dev_secret() {
        warn!("[SERVER] JWT_SECRET_KEY is not set, using the development secret");
    }

    // Initialize the database
    let db = Database::new(&settings.database_path).map_err(startup_error)?;
    db.create_schema().await.map_err(startup_error)?;
    if settings.seed_demo {
        let drafts = demo_restaurants().map_err(startup_error)?;
        let seeded = db.seed_if_empty(&drafts).await.map_err(startup_error)?;
        log!("[SERVER] Demo seed added {} restaurants", seeded);
    }
    for email in &settings.admin_emails {
        if db.promote_admin(email).await.map_err(startup_error)? {
            log!("[SERVER] Promoted {} to admin", email);
        }
    }
    let state = AppState::new(db, settings);

    // Load configuration
    let conf = get_configuration(None).await.map_err(startup_error)?;
    let addr = conf.leptos_options.site_addr;

    // Generate the list of routes in your Leptos App
    let routes = generate_route_list(Site);
    log!("[SERVER] listening on http://{}", &addr);

    // Start the Actix Web server
    HttpServer::new(move || {
        let leptos_options = &conf.leptos_options;
        let site_root = &leptos_options.site_root;
        let fn_state = state.clone();
        let page_state = state.clone();

        App::new()
            .app_data(web::Data::new(state.clone()))
            // JSON API
            .configure(api::configure)
            // Register server functions
            .route(
                "/sfn/{tail:.*}",
                leptos_actix::handle_server_fns_with_context(move || provide_context(fn_state.clone())),
            )
            // Serve JS/WASM/CSS from `pkg`
            .service(Files::new("/pkg", format!("{site_root}/pkg")))
            // Serve other assets from the `assets` directory
            .service(Files::new("/assets", site_root))
            // Serve the favicon from /favicon.ico
            .service(favicon)
            // Register Leptos routes
            .leptos_routes_with_context(
                leptos_options.to_owned(),
                routes.to_owned(),
                move || provide_context(page_state.clone()),
                Site,
            )
            // Pass Leptos options to the app
            .app_data(web::Data::new(leptos_options.to_owned()))
    })
    .bind(&addr)?
    .run()
    .await
}

#[cfg(feature = "ssr")]
#[actix_web::get("favicon.ico")]
async fn favicon(
    leptos_options: actix_web::web::Data<leptos::LeptosOptions>,
) -> actix_web::Result<actix_files::NamedFile> {
    let leptos_options = leptos_options.into_inner();
    let site_root = &leptos_options.site_root;
    Ok(actix_files::NamedFile::open(format!(
        "{site_root}/favicon.ico"
    ))?)
}

#[cfg(not(any(feature = "ssr", feature = "csr")))]
pub fn main() {
    // no client-side main function
    // see lib.rs for hydration function instead
}

#[cfg(all(not(feature = "ssr"), feature = "csr"))]
pub fn main() {
    // a client-side main function is required for using `trunk serve`
    // to run: `trunk serve --open --features csr`
    use menudealmoco::app::*;

    console_error_panic_hook::set_once();

    leptos::mount_to_body(App);
}
