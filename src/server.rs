use std::any::Any;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Serialize;
use serde_json::{Value, json};
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::client::EpsClient;
use crate::config::Settings;
use crate::error::TrackingError;

const SERVICE_NAME: &str = "EPS Proxy";

/// Application state shared across all requests
#[derive(Clone)]
struct AppState {
    client: EpsClient,
    settings: Arc<Settings>,
}

/// Build the axum application with routes and middleware
pub fn build_app(client: EpsClient, settings: Arc<Settings>) -> Router {
    let cors = cors_layer(&settings);
    let state = AppState { client, settings };

    Router::new()
        // Health checks
        .route("/", get(root))
        .route("/health", get(health))
        // Tracking lookup
        .route("/track/:awb", get(track))
        // Middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(CatchPanicLayer::custom(handle_panic)),
        )
        .with_state(state)
}

/// CORS layer restricted to the configured origin allow-list
///
/// A literal `*` entry allows any origin; `AllowOrigin::list` rejects
/// wildcards, so it must never reach the list.
fn cors_layer(settings: &Settings) -> CorsLayer {
    let allow_origin = if settings.cors_origins.iter().any(|origin| origin == "*") {
        AllowOrigin::any()
    } else {
        let origins: Vec<HeaderValue> = settings
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET])
}

/// Look up tracking details for an AWB number and relay the upstream payload
async fn track(
    State(state): State<AppState>,
    Path(awb): Path<String>,
) -> Result<Json<Value>, TrackingError> {
    tracing::info!("Tracking request for AWB={}", awb);
    let data = state.client.fetch_tracking(&awb).await?;
    Ok(Json(data))
}

/// Basic liveness endpoint
async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        status: "ok",
        service: SERVICE_NAME,
    })
}

#[derive(Serialize)]
struct RootResponse {
    status: &'static str,
    service: &'static str,
}

/// Detailed health check, reporting whether credentials are configured.
/// Performs no upstream call.
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
        env_configured: state.settings.missing_credentials().is_empty(),
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    version: &'static str,
    env_configured: bool,
}

/// Convert a panic escaping a handler into the generic 500 response.
///
/// The panic payload is logged server-side and never reaches the caller.
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s
    } else {
        "non-string panic payload"
    };
    tracing::error!("Unhandled panic while serving request: {}", detail);

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "detail": "Internal server error" })),
    )
        .into_response()
}
