use crate::handlers::{history, meta, symbols};
use crate::state::AppState;
use axum::{Router, routing::get};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(meta::welcome))
        .route("/time", get(meta::server_time))
        .route("/config", get(meta::config))
        .route("/symbol_info", get(symbols::symbol_info))
        .route("/symbols", get(symbols::symbols))
        .route("/search", get(symbols::search))
        .route("/history", get(history::history))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
