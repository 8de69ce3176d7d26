use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use utoipa::ToSchema;

use crate::api::state::AppState;

#[allow(unused_imports)]
use serde_json::json; // Used in utoipa::path examples

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub backend: String,
    pub upstreams: HealthUpstreams,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct HealthUpstreams {
    pub ecos_key: String,
    pub openai_key: String,
}

fn key_status(present: bool) -> String {
    let status = if present { "configured" } else { "missing" };
    status.to_string()
}

/// Service health. Degraded (503) when the statistics key is missing.
#[utoipa::path(
    get,
    path = "/health",
    tag = "system",
    responses(
        (status = 200, description = "Health check passed", body = HealthResponse),
        (status = 503, description = "Service degraded", body = HealthResponse)
    )
)]
pub async fn health_handler(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let ecos_ready = state.secrets.has_bok_api_key() && !state.upstream.is_closed();
    let overall_status = if ecos_ready { "ok" } else { "degraded" };

    let response = HealthResponse {
        status: overall_status.to_string(),
        version: VERSION.to_string(),
        backend: "rust-axum".to_string(),
        upstreams: HealthUpstreams {
            ecos_key: key_status(state.secrets.has_bok_api_key()),
            openai_key: key_status(state.secrets.has_openai_api_key()),
        },
    };

    if ecos_ready {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}

#[utoipa::path(
    get,
    path = "/metrics",
    tag = "system",
    responses(
        (status = 200, description = "Prometheus metrics", content_type = "text/plain")
    )
)]
pub async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    state.metrics.render()
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct ConfigStatus {
    pub has_bok_key: bool,
    /// Always masked; `null` when no key is configured
    pub bok_api_key: Option<String>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct ConfigMessage {
    pub message: String,
}

/// Report whether the statistics key is configured, never the key itself.
#[utoipa::path(
    get,
    path = "/config",
    tag = "system",
    responses(
        (status = 200, description = "Key presence", body = ConfigStatus,
            example = json!({"has_bok_key": true, "bok_api_key": "***"})
        )
    )
)]
#[instrument(skip(state))]
pub async fn config_handler(State(state): State<AppState>) -> Json<ConfigStatus> {
    let has = state.secrets.has_bok_api_key();
    Json(ConfigStatus {
        has_bok_key: has,
        bok_api_key: has.then(|| "***".to_string()),
    })
}

/// Keys live in the deployment environment and cannot be changed at runtime.
#[utoipa::path(
    post,
    path = "/config",
    tag = "system",
    responses(
        (status = 405, description = "Runtime configuration is read-only", body = ConfigMessage)
    )
)]
pub async fn config_update_handler() -> (StatusCode, Json<ConfigMessage>) {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(ConfigMessage {
            message: "Environment variables cannot be saved from the UI in a deployed environment. Set BOK_API_KEY in the deployment environment instead.".to_string(),
        }),
    )
}
