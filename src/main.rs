use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::response::Html;
use axum::{routing::get, Router};
use tower_http::cors::CorsLayer;
use tracing::instrument;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;
use utoipa_swagger_ui::SwaggerUi;

mod api;
mod app_state;
mod assets;
mod config;
mod consts;
mod error;
mod joiner;
mod narrative;
mod pipeline;
mod videogen;

use app_state::AppState;
use crate::config::AppConfig;

async fn main_impl() -> Result<()> {
    #[derive(OpenApi)]
    #[openapi(
        tags(
            (name = "TALEWEAVER", description = "TaleWeaver demo API"),
        )
    )]
    struct ApiDoc;

    let conf = AppConfig::load()?;
    let shared_state = Arc::new(AppState::new(conf.clone()));

    let router = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .nest("/api/v1", api::api_router(shared_state.clone()));

    let (router, api_docs) = router.split_for_parts();
    let router =
        router.merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api_docs));

    let app = Router::new()
        .route("/", get(index_handler))
        .route("/healthz", get(health_handler))
        .fallback_service(router)
        .layer(DefaultBodyLimit::max(64 * 1024))
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = conf.bind_address.parse()?;
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("listening on {addr}");
    axum::serve(listener, app).await?;

    Ok(())
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                // Default to info level, with warn for noisy crates
                format!(
                    "{}=info,tower_http=warn,axum::rejection=warn,hyper=warn,reqwest=warn",
                    env!("CARGO_CRATE_NAME")
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("tokio runtime to build")
        .block_on(async {
            if let Err(e) = main_impl().await {
                tracing::error!("fatal: {e:#}");
                std::process::exit(1);
            }
        });
}

/// The single-page form UI.
async fn index_handler() -> Html<&'static str> {
    Html(include_str!("../static/index.html"))
}

#[instrument]
async fn health_handler() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}
