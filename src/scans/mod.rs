pub mod dto;
pub mod handlers;
pub mod repo;
pub mod service;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/scans", post(handlers::ingest_scan))
        .route("/scans/:id/rename", post(handlers::rename_scan))
        .route("/days/:date/scans", get(handlers::list_day_scans))
        .route("/days/calories", get(handlers::calorie_log))
        .route("/images/:id", get(handlers::get_image))
        .layer(DefaultBodyLimit::max(20 * 1024 * 1024)) // 20MB
}
