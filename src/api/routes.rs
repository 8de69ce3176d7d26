use crate::api::ai_handlers::{chat_completions_handler, chat_diagnostic_handler, prompt_handler};
use crate::api::doc::ApiDoc;
use crate::api::ecos_handlers::{key_stats_handler, stat_search_handler};
use crate::api::handlers::{config_handler, config_update_handler, health_handler, metrics_handler};
use crate::api::market_handlers::{fdr_handler, yahoo_chart_handler};
use crate::api::state::AppState;
use axum::{
    extract::{MatchedPath, Request},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};

use std::time::{Duration, Instant};
use tower::ServiceBuilder;
use axum::http::HeaderValue;
use tower_http::cors::{Any, AllowOrigin, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Prefix the serverless deployment exposed its functions under.
pub const LEGACY_PREFIX: &str = "/.netlify/functions";

pub fn create_router(state: AppState, allowed_origins: String) -> Router {
    let cors = cors_layer(&allowed_origins);

    let layers = ServiceBuilder::new()
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    let request_id = request
                        .headers()
                        .get("x-request-id")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("-");
                    tracing::span!(
                        Level::INFO,
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                        request_id = %request_id
                    )
                })
                .on_response(|response: &axum::http::Response<_>, latency: Duration, _span: &tracing::Span| {
                    if latency.as_millis() > 1000 {
                        tracing::warn!(status = response.status().as_u16(), "Slow HTTP request: {}ms", latency.as_millis());
                    }
                }),
        )
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TimeoutLayer::with_status_code(
            axum::http::StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(60),
        ))
        // Security headers
        .layer(SetResponseHeaderLayer::overriding(
            axum::http::header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            axum::http::header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            axum::http::header::X_XSS_PROTECTION,
            HeaderValue::from_static("1; mode=block"),
        ))
        .layer(cors);

    // Function names kept for clients built against the serverless deployment.
    let legacy = Router::new()
        .route("/ecos-statsearch", get(stat_search_handler))
        .route("/ecos-keystats", get(key_stats_handler))
        .route("/config", get(config_handler).post(config_update_handler))
        .route("/openai-proxy", get(chat_diagnostic_handler).post(chat_completions_handler))
        .route("/gpt", post(prompt_handler))
        .route("/yahoo-finance", get(yahoo_chart_handler))
        .route("/fdr", get(fdr_handler));

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // System endpoints (no versioning)
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/config", get(config_handler).post(config_update_handler))
        // OpenAPI document (downloadable)
        .route("/v1/openapi.json", get(|| async { axum::Json(ApiDoc::openapi()) }))
        // ECOS
        .route("/v1/ecos/stat-search", get(stat_search_handler))
        .route("/v1/ecos/key-stats", get(key_stats_handler))
        // AI
        .route("/v1/ai/chat", get(chat_diagnostic_handler).post(chat_completions_handler))
        .route("/v1/ai/prompt", post(prompt_handler))
        // Market
        .route("/v1/market/yahoo-chart", get(yahoo_chart_handler))
        .route("/v1/market/fdr", get(fdr_handler))
        .nest(LEGACY_PREFIX, legacy)
        .route_layer(middleware::from_fn(track_metrics))
        .layer(layers)
        .with_state(state)
}

fn cors_layer(allowed_origins: &str) -> CorsLayer {
    if allowed_origins == "*" {
        return CorsLayer::permissive();
    }

    // Parse comma-separated origins, filter out invalid ones
    let origin_values: Vec<HeaderValue> = allowed_origins
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse::<HeaderValue>().ok())
        .collect();

    match origin_values.len() {
        0 => {
            tracing::warn!("No valid CORS origins found, falling back to permissive CORS");
            CorsLayer::permissive()
        }
        1 => CorsLayer::new()
            .allow_origin(AllowOrigin::exact(origin_values[0].clone()))
            .allow_methods(Any)
            .allow_headers(Any),
        _ => CorsLayer::new()
            .allow_origin(AllowOrigin::list(origin_values))
            .allow_methods(Any)
            .allow_headers(Any),
    }
}

/// Request count and latency per matched route.
async fn track_metrics(request: Request, next: Next) -> Response {
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_owned());
    let method = request.method().to_string();
    let start = Instant::now();

    let response = next.run(request).await;

    let status = response.status().as_u16();
    metrics::counter!(
        "http_requests_total",
        "method" => method.clone(),
        "path" => path.clone(),
        "status" => status.to_string(),
        "status_class" => format!("{}xx", status / 100)
    )
    .increment(1);
    metrics::histogram!(
        "http_request_duration_seconds",
        "method" => method,
        "path" => path,
        "status" => status.to_string()
    )
    .record(start.elapsed().as_secs_f64());

    response
}
