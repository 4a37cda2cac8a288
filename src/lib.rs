pub mod app;
pub mod components;
pub mod config;
pub mod demo;
pub mod error;
pub mod models;
pub mod moderation;
pub mod rating;
pub mod review_sorting;
pub mod search;
pub mod validation;
pub mod voting;

#[cfg(feature = "ssr")]
pub mod api;
#[cfg(feature = "ssr")]
pub mod auth;
#[cfg(feature = "ssr")]
pub mod db;

#[cfg(feature = "hydrate")]
#[wasm_bindgen::prelude::wasm_bindgen]
pub fn hydrate() {
    use crate::app::*;

    console_error_panic_hook::set_once();

    leptos::mount_to_body(App);
}
