pub mod handlers;

use std::sync::Arc;
use tower_http::limit::RequestBodyLimitLayer;
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::app_state::AppState;

/// V1 API routes: the generate endpoint, the past-generations listing, and
/// the combined-video file.
pub fn api_router<S>(state: Arc<AppState>) -> OpenApiRouter<S> {
    OpenApiRouter::new()
        .routes(routes!(handlers::generate_video))
        .routes(routes!(handlers::list_generations))
        .routes(routes!(handlers::serve_video))
        .layer(RequestBodyLimitLayer::new(64 * 1024))
        .with_state(state)
}
