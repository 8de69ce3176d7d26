//! HTTP client for the Bank of Korea ECOS open API.
//!
//! The access key is embedded as a path segment, so every URL is built twice:
//! once for the request and once, redacted, for the logs.

use crate::domain::{PageOutcome, PageRange, PageSource, SeriesQuery, StatisticSearchEnvelope};
use crate::error::ProxyError;
use crate::infrastructure::http::UpstreamHttp;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

const UPSTREAM: &str = "ecos";

/// ECOS API client
///
/// Holds the server-side key; callers never see it.
#[derive(Clone)]
pub struct EcosClient {
    http: Arc<UpstreamHttp>,
    base_url: String,
    api_key: Option<String>,
}

impl EcosClient {
    pub fn new(http: Arc<UpstreamHttp>, base_url: &str, api_key: Option<String>) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn key(&self) -> Result<&str, ProxyError> {
        self.api_key
            .as_deref()
            .ok_or(ProxyError::MissingSecret(crate::infrastructure::secrets::BOK_API_KEY))
    }

    /// `{base}/{service}/{key}/json/kr/{start}/{end}[/{tail}]`
    fn service_url(&self, service: &str, key: &str, range: PageRange, tail: Option<&str>) -> String {
        let mut url = format!(
            "{}/{}/{}/json/kr/{}/{}",
            self.base_url, service, key, range.start, range.end
        );
        if let Some(tail) = tail {
            url.push('/');
            url.push_str(tail);
        }
        url
    }

    /// GET a service URL, logging it with the key masked.
    async fn get(&self, service: &str, range: PageRange, tail: Option<&str>) -> Result<Value, ProxyError> {
        let key = self.key()?;
        let url = self.service_url(service, key, range, tail);
        let log_url = self.service_url(service, "***", range, tail);
        self.http.get_json(UPSTREAM, &url, &log_url).await
    }

    /// Fetch the "100 key statistics" list
    ///
    /// GET /KeyStatisticList/{key}/json/kr/1/{limit}
    pub async fn fetch_key_statistics(&self, limit: usize) -> Result<Value, ProxyError> {
        info!("Fetching ECOS key statistics (limit {})", limit);
        self.get(
            "KeyStatisticList",
            PageRange {
                start: 1,
                end: limit.max(1),
            },
            None,
        )
        .await
    }
}

#[async_trait]
impl PageSource for EcosClient {
    /// GET /StatisticSearch/{key}/json/kr/{start}/{end}/{statCode}/{cycle}/{from}/{to}[/{item}]
    async fn fetch_page(
        &self,
        query: &SeriesQuery,
        range: PageRange,
    ) -> Result<PageOutcome, ProxyError> {
        let path = query.path();
        info!(
            "Fetching ECOS StatisticSearch {} rows {}-{}",
            path, range.start, range.end
        );
        let json = self.get("StatisticSearch", range, Some(&path)).await?;

        let envelope: StatisticSearchEnvelope =
            serde_json::from_value(json).map_err(|e| ProxyError::UpstreamFormat {
                upstream: UPSTREAM,
                message: format!("unreadable StatisticSearch body: {}", e),
            })?;
        envelope.into_outcome()
    }
}
