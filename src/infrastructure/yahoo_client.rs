//! Yahoo Finance chart API client (no key required).

use crate::error::ProxyError;
use crate::infrastructure::http::{snippet, UpstreamHttp};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info};

const UPSTREAM: &str = "yahoo";

#[derive(Clone)]
pub struct YahooClient {
    http: Arc<UpstreamHttp>,
    base_url: String,
}

impl YahooClient {
    pub fn new(http: Arc<UpstreamHttp>, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn chart_url(&self, symbol: &str, period1: i64, period2: i64) -> Result<reqwest::Url, ProxyError> {
        let invalid = |message: String| ProxyError::Transport {
            upstream: UPSTREAM,
            message,
        };
        let mut url = reqwest::Url::parse(&format!("{}/v8/finance/chart/", self.base_url))
            .map_err(|e| invalid(format!("invalid base URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| invalid("base URL cannot carry a path".to_string()))?
            .pop_if_empty()
            .push(symbol);
        url.query_pairs_mut()
            .append_pair("period1", &period1.to_string())
            .append_pair("period2", &period2.to_string())
            .append_pair("interval", "1d")
            .append_pair("includePrePost", "true")
            .append_pair("events", "div,split");
        Ok(url)
    }

    /// GET /v8/finance/chart/{symbol}?period1&period2&interval=1d
    ///
    /// Returns the payload unchanged once `chart.result[0]` with `timestamp`
    /// and `indicators.quote[0]` has been found in it.
    pub async fn fetch_chart(&self, symbol: &str, period1: i64, period2: i64) -> Result<Value, ProxyError> {
        let url = self.chart_url(symbol, period1, period2)?;
        info!("Fetching Yahoo chart: {}", url);

        let request = self
            .http
            .client()
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json");
        let response = self.http.send(UPSTREAM, request).await?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| self.http.classify(UPSTREAM, e))?;

        let payload: Value = match serde_json::from_str(&text) {
            Ok(v) => v,
            Err(_) => {
                error!("Yahoo returned a non-JSON body: {}", snippet(&text, 500));
                return Err(ProxyError::InvalidPayload {
                    upstream: UPSTREAM,
                    message: format!("unexpected response format (status {})", status.as_u16()),
                    details: Some(json!({
                        "status": status.as_u16(),
                        "bodySnippet": snippet(&text, 200),
                    })),
                });
            }
        };

        if !status.is_success() {
            return Err(ProxyError::UpstreamStatus {
                upstream: UPSTREAM,
                status: status.as_u16(),
                message: "Yahoo Finance API error".to_string(),
                details: Some(payload),
            });
        }

        validate_chart(&payload)?;
        Ok(payload)
    }
}

/// Check `chart.result[0]`, its `timestamp` and `indicators.quote[0]`.
pub fn validate_chart(payload: &Value) -> Result<(), ProxyError> {
    let Some(result) = payload.pointer("/chart/result/0").filter(|r| !r.is_null()) else {
        let keys: Vec<&String> = payload.as_object().map(|o| o.keys().collect()).unwrap_or_default();
        return Err(ProxyError::InvalidPayload {
            upstream: UPSTREAM,
            message: "chart.result is missing - check the symbol".to_string(),
            details: Some(json!({ "gotKeys": keys })),
        });
    };

    let has_timestamps = result.get("timestamp").is_some_and(|t| t.is_array());
    let has_quote = result
        .pointer("/indicators/quote/0")
        .is_some_and(|q| !q.is_null());
    if !has_timestamps || !has_quote {
        return Err(ProxyError::InvalidPayload {
            upstream: UPSTREAM,
            message: "chart data is incomplete - the symbol may have no data in this range"
                .to_string(),
            details: None,
        });
    }
    Ok(())
}
