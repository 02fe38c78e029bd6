mod config;
mod error;
mod mix;
mod palette;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::config::ServerConfig;
use crate::error::AppError;
use crate::mix::{MixRequest, MixResponse};
use crate::palette::{Catalog, InkCategory, InkEntry};

/// Application state shared across handlers
#[derive(Clone)]
struct AppState {
    catalog: Arc<Catalog>,
    config: Arc<ServerConfig>,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Ink Mixer API",
        description = "Find ink mixing weights that reproduce a target color",
        version = "0.1.0"
    ),
    tags(
        (name = "Palette", description = "Built-in ink catalog"),
        (name = "Mix", description = "Mixing solver")
    ),
    paths(health, get_palette, post_mix),
    components(schemas(InkCategory, InkEntry, MixRequest, MixResponse))
)]
struct ApiDoc;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = ServerConfig::from_env();
    let port = config.port;

    let state = AppState {
        catalog: Arc::new(Catalog::default()),
        config: Arc::new(config),
    };

    let app = router(state);

    let addr = format!("0.0.0.0:{}", port);
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/palette", get(get_palette))
        .route("/mix", post(post_mix))
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
        .route("/openapi.json", get(openapi_json))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = String)
    )
)]
async fn health() -> &'static str {
    "ok"
}

/// Get OpenAPI JSON specification
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// List built-in inks
#[utoipa::path(
    get,
    path = "/palette",
    tag = "Palette",
    responses(
        (status = 200, description = "Stock and brand inks", body = Vec<InkEntry>)
    )
)]
async fn get_palette(State(state): State<AppState>) -> Json<Vec<InkEntry>> {
    Json(state.catalog.entries().to_vec())
}

/// Solve for mixing weights
///
/// Without `max_inks` every ink may be used; with it, inks are picked greedily
/// up to that many. Weights are returned in request order.
#[utoipa::path(
    post,
    path = "/mix",
    tag = "Mix",
    request_body = MixRequest,
    responses(
        (status = 200, description = "Mixing weights and predicted color", body = MixResponse),
        (status = 400, description = "Invalid hex color, empty or oversized ink list, or zero ink limit"),
        (status = 503, description = "Computation exceeded the time budget")
    )
)]
async fn post_mix(
    State(state): State<AppState>,
    Json(request): Json<MixRequest>,
) -> Result<Json<MixResponse>, AppError> {
    let response = mix::run_mix(request, state.config.iterations, state.config.timeout).await?;

    tracing::info!(
        "Mix done: predicted={}, rmse={:.5}",
        response.predicted_hex,
        response.rmse
    );

    Ok(Json(response))
}
