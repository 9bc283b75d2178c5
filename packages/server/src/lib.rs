pub mod config;
pub mod database;
pub mod entity;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod state;
pub mod store;
pub mod tls;

use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;
use utoipa_scalar::{Scalar, Servable as ScalarServable};

use crate::config::RedirectConfig;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Linkboard API",
        version = "1.0.0",
        description = "Anonymous link and notes board. Ownership is derived from a peppered hash of the caller's address. Every endpoint answers 200; failures carry a `null` body."
    ),
    tags(
        (name = "Links", description = "Post, list, edit and delete the caller's links"),
    ),
)]
struct ApiDoc;

/// Build the application router.
pub fn build_router(state: AppState) -> axum::Router {
    let body_limit = state.config.server.body_limit;

    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .nest("/api", routes::api_routes())
        .split_for_parts();

    router
        .route("/", get(handlers::assets::serve_index))
        .fallback(get(handlers::assets::serve_static))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
        .merge(Scalar::with_url("/scalar", api))
        .layer(TraceLayer::new_for_http())
}

/// Build the router for the plaintext listener.
pub fn build_redirect_router(config: RedirectConfig) -> axum::Router {
    axum::Router::new()
        .fallback(handlers::redirect::redirect_to_https)
        .with_state(config)
        .layer(TraceLayer::new_for_http())
}
