//! Shared outbound HTTP client.
//!
//! One `UpstreamHttp` is built at start-up and handed to every upstream client,
//! so connection pools are reused across requests. `shutdown` is called from
//! the graceful-shutdown path; requests issued afterwards fail fast.

use crate::config::UpstreamConfig;
use crate::error::ProxyError;
use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Process-scoped HTTP client with a per-request timeout.
pub struct UpstreamHttp {
    client: Client,
    timeout: Duration,
    closed: AtomicBool,
}

impl UpstreamHttp {
    /// Build the client.
    ///
    /// Every request is aborted after `timeout_secs`; a connection attempt
    /// after `connect_timeout_secs`.
    pub fn new(config: &UpstreamConfig) -> reqwest::Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .user_agent(config.user_agent.clone())
            .build()?;

        info!(
            "Upstream HTTP client ready (timeout {}s, connect timeout {}s)",
            config.timeout_secs, config.connect_timeout_secs
        );

        Ok(Self {
            client,
            timeout: config.timeout(),
            closed: AtomicBool::new(false),
        })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Stop accepting new upstream requests.
    pub fn shutdown(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            info!("Upstream HTTP client shut down");
        }
    }

    /// Send a request, classifying transport failures.
    ///
    /// The response status is not checked here.
    pub async fn send(
        &self,
        upstream: &'static str,
        request: RequestBuilder,
    ) -> Result<Response, ProxyError> {
        if self.is_closed() {
            return Err(ProxyError::Transport {
                upstream,
                message: "server is shutting down".to_string(),
            });
        }

        match request.send().await {
            Ok(response) => {
                metrics::counter!("upstream_requests_total", "upstream" => upstream, "outcome" => "response")
                    .increment(1);
                Ok(response)
            }
            Err(e) => {
                let err = self.classify(upstream, e);
                let outcome = if matches!(err, ProxyError::UpstreamTimeout { .. }) {
                    "timeout"
                } else {
                    "error"
                };
                metrics::counter!("upstream_requests_total", "upstream" => upstream, "outcome" => outcome)
                    .increment(1);
                Err(err)
            }
        }
    }

    /// GET `url` and decode a JSON body, failing on any non-2xx status.
    ///
    /// `log_url` is what gets logged, so callers can redact secrets.
    pub async fn get_json(
        &self,
        upstream: &'static str,
        url: &str,
        log_url: &str,
    ) -> Result<Value, ProxyError> {
        debug!("Fetching from {}: {}", upstream, log_url);

        let request = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json");
        let response = self.send(upstream, request).await?;
        let response = error_for_status(upstream, response).await?;

        response
            .json::<Value>()
            .await
            .map_err(|e| self.classify(upstream, e))
    }

    /// Map a reqwest error to a timeout or transport error.
    pub fn classify(&self, upstream: &'static str, err: reqwest::Error) -> ProxyError {
        if err.is_timeout() {
            warn!("{} request timed out after {:?}", upstream, self.timeout);
            ProxyError::UpstreamTimeout {
                upstream,
                seconds: self.timeout.as_secs(),
            }
        } else {
            // Strip the URL: it may carry an access key in its path
            ProxyError::Transport {
                upstream,
                message: err.without_url().to_string(),
            }
        }
    }
}

/// Turn a non-2xx response into `UpstreamStatus`, keeping its body as details.
pub async fn error_for_status(
    upstream: &'static str,
    response: Response,
) -> Result<Response, ProxyError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let details = serde_json::from_str::<Value>(&body).ok();
    let message = if details.is_some() || body.is_empty() {
        format!("{} request failed (status: {})", upstream, status.as_u16())
    } else {
        snippet(&body, 200).to_string()
    };

    warn!("{} answered {}: {}", upstream, status, message);
    Err(ProxyError::UpstreamStatus {
        upstream,
        status: status.as_u16(),
        message,
        details,
    })
}

/// First `max` characters of `text`, cut on a char boundary.
pub fn snippet(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
