//! Client for OpenAI-compatible chat completion endpoints.

use crate::error::ProxyError;
use crate::infrastructure::http::{snippet, UpstreamHttp};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn};

const UPSTREAM: &str = "openai";

#[derive(Clone)]
pub struct OpenAiClient {
    http: Arc<UpstreamHttp>,
    base_url: String,
    api_key: Option<String>,
}

impl OpenAiClient {
    pub fn new(http: Arc<UpstreamHttp>, base_url: &str, api_key: Option<String>) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// POST {base}/chat/completions
    ///
    /// The body is forwarded as-is. A non-2xx answer keeps the upstream status
    /// and carries the upstream body as details.
    pub async fn chat_completions(&self, body: &Value) -> Result<Value, ProxyError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ProxyError::MissingSecret(crate::infrastructure::secrets::OPENAI_API_KEY))?;
        let url = format!("{}/chat/completions", self.base_url);

        info!(
            base_url = %self.base_url,
            model = body.get("model").and_then(serde_json::Value::as_str).unwrap_or("unknown"),
            messages = body.get("messages").and_then(serde_json::Value::as_array).map_or(0, Vec::len),
            "Calling chat completions"
        );

        let request = self
            .http
            .client()
            .post(&url)
            .bearer_auth(api_key)
            .json(body);
        let response = self.http.send(UPSTREAM, request).await?;
        let status = response.status();

        if !status.is_success() {
            // Upstream errors are not always JSON; fall back to an empty object
            let data = response
                .json::<Value>()
                .await
                .unwrap_or_else(|_| Value::Object(Default::default()));
            warn!("Chat completions answered {}: {}", status, data);
            return Err(ProxyError::UpstreamStatus {
                upstream: UPSTREAM,
                status: status.as_u16(),
                message: "Upstream API error".to_string(),
                details: Some(data),
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| self.http.classify(UPSTREAM, e))?;
        serde_json::from_str(&text).map_err(|_| ProxyError::InvalidPayload {
            upstream: UPSTREAM,
            message: format!("expected a JSON body (status {})", status.as_u16()),
            details: Some(json!({ "bodySnippet": snippet(&text, 200) })),
        })
    }
}
