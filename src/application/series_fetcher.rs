//! Paged series retrieval.
//!
//! A source reports its total row count on the first page; the remaining pages
//! are requested concurrently (bounded by `max_in_flight`), merged, sorted by
//! timestamp token and converted into a `Series`.
//!
//! The fetch is all-or-nothing: any failed page request fails the whole fetch
//! and no truncated series is ever returned.

use crate::domain::{page_count, PageOutcome, PageRange, PageSource, Row, Series, SeriesQuery};
use crate::error::ProxyError;
use futures::{stream, StreamExt, TryStreamExt};
use std::sync::Arc;
use tracing::{debug, info};

pub struct PagedSeriesFetcher {
    source: Arc<dyn PageSource>,
    max_in_flight: usize,
}

impl PagedSeriesFetcher {
    pub fn new(source: Arc<dyn PageSource>, max_in_flight: usize) -> Self {
        Self {
            source,
            max_in_flight: max_in_flight.max(1),
        }
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight
    }

    /// Fetch every page of `query` and merge them into one series.
    ///
    /// # Errors
    ///
    /// - `InvalidParameter` when `page_size` is zero
    /// - `UpstreamFormat` when the first page has no aggregate container
    /// - whatever transport error the first failing page produced
    pub async fn fetch(&self, query: &SeriesQuery, page_size: usize) -> Result<Series, ProxyError> {
        if page_size == 0 {
            return Err(ProxyError::invalid("pageSize", "must be greater than zero"));
        }

        let first = match self
            .source
            .fetch_page(query, PageRange::for_page(1, page_size))
            .await?
        {
            PageOutcome::Container(page) => page,
            PageOutcome::MissingContainer { reason } => {
                return Err(ProxyError::UpstreamFormat {
                    upstream: "statistics",
                    message: reason,
                });
            }
        };

        // Only the first page's count decides how many pages exist
        let pages = page_count(first.total_count, page_size);
        let mut rows = first.rows;
        info!(
            "{}: total_count={} pages={} page_size={}",
            query.path(),
            first.total_count,
            pages,
            page_size
        );

        if pages > 1 {
            let later: Vec<Vec<Row>> = stream::iter(2..=pages)
                .map(|page| self.fetch_rows(query, PageRange::for_page(page, page_size)))
                .buffer_unordered(self.max_in_flight)
                .try_collect()
                .await?;
            rows.extend(later.into_iter().flatten());
        }

        metrics::counter!("series_pages_fetched_total").increment(pages as u64);
        Ok(Series::from_rows(rows))
    }

    async fn fetch_rows(&self, query: &SeriesQuery, range: PageRange) -> Result<Vec<Row>, ProxyError> {
        let outcome = self.source.fetch_page(query, range).await?;
        if let PageOutcome::MissingContainer { reason } = &outcome {
            debug!("rows {}-{} empty: {}", range.start, range.end, reason);
        }
        Ok(outcome.into_rows())
    }
}
