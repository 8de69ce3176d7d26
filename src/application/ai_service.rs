//! Chat completion proxy logic: default filling and the single-prompt shortcut.

use crate::config::OpenAiConfig;
use crate::error::ProxyError;
use crate::infrastructure::OpenAiClient;
use serde_json::{json, Value};
use std::sync::Arc;

pub struct AiService {
    client: Arc<OpenAiClient>,
    defaults: OpenAiConfig,
}

impl AiService {
    pub fn new(client: Arc<OpenAiClient>, defaults: OpenAiConfig) -> Self {
        Self { client, defaults }
    }

    pub fn base_url(&self) -> &str {
        self.client.base_url()
    }

    pub fn has_api_key(&self) -> bool {
        self.client.has_api_key()
    }

    /// Forward a chat completion request after filling `model` and `messages`.
    pub async fn complete(&self, body: Value) -> Result<Value, ProxyError> {
        let body = self.with_defaults(body)?;
        self.client.chat_completions(&body).await
    }

    /// Single user prompt; returns the first choice's text or an empty string.
    pub async fn prompt(&self, prompt: &str) -> Result<String, ProxyError> {
        let body = json!({
            "model": self.defaults.default_model,
            "messages": [{ "role": "user", "content": prompt }],
            "max_tokens": self.defaults.max_tokens,
            "temperature": self.defaults.temperature,
        });
        let data = self.client.chat_completions(&body).await?;
        Ok(first_choice_content(&data))
    }

    fn with_defaults(&self, body: Value) -> Result<Value, ProxyError> {
        let Value::Object(mut map) = body else {
            return Err(ProxyError::invalid("body", "expected a JSON object"));
        };
        if map.get("model").map_or(true, is_blank) {
            map.insert("model".into(), json!(self.defaults.default_model));
        }
        if map.get("messages").map_or(true, is_blank) {
            map.insert(
                "messages".into(),
                json!([
                    { "role": "system", "content": "You are a helpful assistant." },
                    { "role": "user", "content": "Hello" }
                ]),
            );
        }
        Ok(Value::Object(map))
    }
}

fn is_blank(v: &Value) -> bool {
    match v {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

pub fn first_choice_content(data: &Value) -> String {
    data.pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
