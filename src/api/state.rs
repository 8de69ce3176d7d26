use crate::application::{AiService, MarketService, StatisticsService};
use crate::config::AppConfig;
use crate::infrastructure::{EcosClient, OpenAiClient, Secrets, UpstreamHttp, YahooClient};
use anyhow::Context;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub statistics: Arc<StatisticsService>,
    pub ai: Arc<AiService>,
    pub market: Arc<MarketService>,
    pub secrets: Arc<Secrets>,
    pub upstream: Arc<UpstreamHttp>,
    pub metrics: PrometheusHandle,
}

impl AppState {
    /// Wire every service around one shared upstream HTTP client.
    pub fn build(config: &AppConfig, secrets: Secrets, metrics: PrometheusHandle) -> anyhow::Result<Self> {
        let upstream = Arc::new(
            UpstreamHttp::new(&config.upstream).context("Failed to build upstream HTTP client")?,
        );

        let ecos_client = Arc::new(EcosClient::new(
            upstream.clone(),
            &config.ecos.base_url,
            secrets.bok_api_key().ok().map(str::to_string),
        ));
        let statistics = Arc::new(StatisticsService::new(
            ecos_client,
            config.ecos.page_size,
            config.ecos.max_in_flight,
            config.ecos.key_stats_limit,
        ));

        let openai_client = Arc::new(OpenAiClient::new(
            upstream.clone(),
            &config.openai.base_url,
            secrets.openai_api_key().ok().map(str::to_string),
        ));
        let ai = Arc::new(AiService::new(openai_client, config.openai.clone()));

        let yahoo_client = Arc::new(YahooClient::new(upstream.clone(), &config.yahoo.base_url));
        let market = Arc::new(MarketService::new(yahoo_client));

        Ok(Self {
            statistics,
            ai,
            market,
            secrets: Arc::new(secrets),
            upstream,
            metrics,
        })
    }

    /// Release process-scoped resources. Called once from graceful shutdown.
    pub fn shutdown(&self) {
        self.upstream.shutdown();
    }
}
