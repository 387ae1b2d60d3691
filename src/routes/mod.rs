//! Route modules for the pagecut server

pub mod common;
pub mod health;
pub mod images;
pub mod pages;
pub mod regions;

use axum::{extract::DefaultBodyLimit, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the full application router
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .merge(pages::router())
        .merge(regions::router())
        .merge(images::router())
        // Base64 inflates uploads by a third
        .layer(DefaultBodyLimit::max(
            state.config().max_body_bytes.saturating_mul(4) / 3,
        ));

    Router::new()
        .merge(health::router())
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
