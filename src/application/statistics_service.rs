//! Bank of Korea statistics use cases.

use crate::application::series_fetcher::PagedSeriesFetcher;
use crate::domain::{Series, SeriesQuery};
use crate::error::ProxyError;
use crate::infrastructure::EcosClient;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

pub struct StatisticsService {
    fetcher: PagedSeriesFetcher,
    client: Arc<EcosClient>,
    page_size: usize,
    key_stats_limit: usize,
}

impl StatisticsService {
    pub fn new(client: Arc<EcosClient>, page_size: usize, max_in_flight: usize, key_stats_limit: usize) -> Self {
        info!(
            "Initialized StatisticsService (page_size={}, max_in_flight={})",
            page_size, max_in_flight
        );
        Self {
            fetcher: PagedSeriesFetcher::new(client.clone(), max_in_flight),
            client,
            page_size,
            key_stats_limit,
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Full series for `query`, every page merged and sorted.
    pub async fn stat_search(&self, query: &SeriesQuery) -> Result<Series, ProxyError> {
        let series = self.fetcher.fetch(query, self.page_size).await?;
        info!("{}: {} points", query.path(), series.len());
        Ok(series)
    }

    /// The key statistics list, unchanged.
    pub async fn key_statistics(&self) -> Result<Value, ProxyError> {
        self.client.fetch_key_statistics(self.key_stats_limit).await
    }
}
