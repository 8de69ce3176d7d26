//! HTTP handlers for the Bank of Korea ECOS endpoints.

use crate::api::state::AppState;
use crate::domain::{Cycle, Series, SeriesQuery};
use crate::error::{ErrorResponse, ProxyError};
use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::instrument;
use utoipa::IntoParams;
use validator::Validate;

#[allow(unused_imports)]
use serde_json::json; // Used in utoipa::path examples

/// Query parameters for the stat-search endpoint.
///
/// Everything is optional at the type level so that missing parameters are
/// reported together, by name.
#[derive(Debug, Clone, Default, Deserialize, IntoParams, Validate)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct StatSearchParams {
    /// Statistic table code (required)
    #[param(example = "722Y001")]
    #[validate(length(max = 32))]
    pub stat_code: Option<String>,
    /// Sampling cycle: D, M, Q or A (required)
    #[param(example = "D")]
    pub cycle: Option<String>,
    /// First period, e.g. YYYYMMDD for daily series (required)
    #[param(example = "20240101")]
    #[validate(length(max = 16))]
    pub start_date: Option<String>,
    /// Last period, inclusive (required)
    #[param(example = "20240105")]
    #[validate(length(max = 16))]
    pub end_date: Option<String>,
    /// Sub-item code
    #[param(example = "0101000")]
    #[validate(length(max = 32))]
    pub item_code1: Option<String>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl StatSearchParams {
    pub fn into_query(self) -> Result<SeriesQuery, ProxyError> {
        let required = [
            ("statCode", present(&self.stat_code)),
            ("cycle", present(&self.cycle)),
            ("startDate", present(&self.start_date)),
            ("endDate", present(&self.end_date)),
        ];
        let [(_, Some(stat_code)), (_, Some(cycle)), (_, Some(start)), (_, Some(end))] = required
        else {
            let missing = required
                .iter()
                .filter(|(_, value)| value.is_none())
                .map(|(name, _)| name.to_string())
                .collect();
            return Err(ProxyError::MissingParameter(missing));
        };

        self.validate()
            .map_err(|e| ProxyError::invalid("query", e.to_string()))?;
        let cycle: Cycle = cycle.parse()?;

        SeriesQuery::new(stat_code, cycle, start, end, present(&self.item_code1))
    }
}

/// Complete statistics series, every page merged and sorted by date.
#[utoipa::path(
    get,
    path = "/v1/ecos/stat-search",
    params(StatSearchParams),
    responses(
        (status = 200, description = "Index-aligned labels and values", body = Series,
            example = json!({"labels": ["2024-01-01", "2024-01-02", "2024-01-03"], "values": [3.25, null, 3.5]})
        ),
        (status = 400, description = "Missing or invalid parameter", body = ErrorResponse,
            example = json!({"error": "Missing required parameters: statCode, cycle"})
        ),
        (status = 500, description = "Upstream format error or key not configured", body = ErrorResponse),
        (status = 502, description = "A page request failed", body = ErrorResponse),
        (status = 504, description = "Upstream timeout", body = ErrorResponse)
    ),
    description = "Fetches every page of an ECOS StatisticSearch query and returns one chronologically ordered series. Unparsable values are returned as null; rows are never dropped.",
    tag = "ECOS"
)]
#[instrument(skip(state))]
pub async fn stat_search_handler(
    Query(params): Query<StatSearchParams>,
    State(state): State<AppState>,
) -> Result<Json<Series>, ProxyError> {
    let query = params.into_query()?;
    metrics::counter!("api_requests_total", "endpoint" => "stat_search").increment(1);
    state.statistics.stat_search(&query).await.map(Json)
}

/// ECOS "100 key statistics", passed through unchanged.
#[utoipa::path(
    get,
    path = "/v1/ecos/key-stats",
    responses(
        (status = 200, description = "KeyStatisticList payload", body = serde_json::Value),
        (status = 500, description = "Key not configured", body = ErrorResponse),
        (status = 502, description = "Upstream failure", body = ErrorResponse)
    ),
    tag = "ECOS"
)]
#[instrument(skip(state))]
pub async fn key_stats_handler(State(state): State<AppState>) -> Result<Json<Value>, ProxyError> {
    metrics::counter!("api_requests_total", "endpoint" => "key_stats").increment(1);
    state.statistics.key_statistics().await.map(Json)
}
