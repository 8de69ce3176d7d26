//! Chat completion proxy and the shared-key prompt endpoint.

use crate::api::state::AppState;
use crate::error::{ErrorResponse, ProxyError};
use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::instrument;
use utoipa::ToSchema;

#[allow(unused_imports)]
use serde_json::json; // Used in utoipa::path examples

pub const APP_KEY_HEADER: &str = "x-app-key";

#[derive(Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatDiagnostic {
    pub ok: bool,
    #[serde(rename = "where")]
    pub location: String,
    pub timestamp: String,
    pub has_api_key: bool,
    pub base_url: String,
    pub method: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PromptRequest {
    #[schema(example = "Summarise the latest base rate decision")]
    pub prompt: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PromptResponse {
    pub content: String,
}

/// Liveness probe for the chat proxy. Never calls the upstream.
#[utoipa::path(
    get,
    path = "/v1/ai/chat",
    tag = "AI",
    responses(
        (status = 200, description = "Proxy configuration summary", body = ChatDiagnostic)
    )
)]
pub async fn chat_diagnostic_handler(State(state): State<AppState>) -> Json<ChatDiagnostic> {
    Json(ChatDiagnostic {
        ok: true,
        location: "openai-proxy".to_string(),
        timestamp: Utc::now().to_rfc3339(),
        has_api_key: state.ai.has_api_key(),
        base_url: state.ai.base_url().to_string(),
        method: "GET".to_string(),
    })
}

/// Forward a chat completion request. `model` and `messages` are filled when absent.
#[utoipa::path(
    post,
    path = "/v1/ai/chat",
    tag = "AI",
    request_body(content = serde_json::Value, description = "Chat completion request; an empty body uses the defaults",
        example = json!({"messages": [{"role": "user", "content": "Hello"}]})
    ),
    responses(
        (status = 200, description = "Upstream response body", body = serde_json::Value),
        (status = 400, description = "Body is not a JSON object", body = ErrorResponse),
        (status = 500, description = "API key not configured", body = ErrorResponse),
        (status = 502, description = "Upstream failure", body = ErrorResponse)
    )
)]
#[instrument(skip(state, body))]
pub async fn chat_completions_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Value>, ProxyError> {
    let body = parse_body(&body)?;
    metrics::counter!("api_requests_total", "endpoint" => "ai_chat").increment(1);
    state.ai.complete(body).await.map(Json)
}

/// Single prompt for trusted callers. Requires the `X-App-Key` header.
#[utoipa::path(
    post,
    path = "/v1/ai/prompt",
    tag = "AI",
    params(
        ("X-App-Key" = String, Header, description = "Shared application key")
    ),
    request_body = PromptRequest,
    responses(
        (status = 200, description = "First choice text", body = PromptResponse),
        (status = 400, description = "Prompt missing", body = ErrorResponse),
        (status = 401, description = "Wrong or missing app key", body = ErrorResponse,
            example = json!({"error": "Unauthorized"})
        ),
        (status = 500, description = "Server key not configured", body = ErrorResponse),
        (status = 502, description = "Upstream failure", body = ErrorResponse)
    )
)]
#[instrument(skip(state, headers, body))]
pub async fn prompt_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<PromptResponse>, ProxyError> {
    let presented = headers.get(APP_KEY_HEADER).and_then(|v| v.to_str().ok());
    state.secrets.verify_app_key(presented)?;

    let request: PromptRequest = serde_json::from_value(parse_body(&body)?)
        .map_err(|e| ProxyError::invalid("body", e.to_string()))?;
    let prompt = request
        .prompt
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| ProxyError::MissingParameter(vec!["prompt".to_string()]))?;

    metrics::counter!("api_requests_total", "endpoint" => "ai_prompt").increment(1);
    let content = state.ai.prompt(&prompt).await?;
    Ok(Json(PromptResponse { content }))
}

/// An empty body is treated as `{}`.
fn parse_body(body: &[u8]) -> Result<Value, ProxyError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Default::default()));
    }
    serde_json::from_slice(body).map_err(|e| ProxyError::invalid("body", format!("invalid JSON: {}", e)))
}
