use crate::api::state::AppState;
use crate::domain::FdrResponse;
use crate::error::{ErrorResponse, ProxyError};
use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::instrument;
use utoipa::IntoParams;

#[allow(unused_imports)]
use serde_json::json; // Used in utoipa::path examples

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MarketParams {
    /// Ticker symbol (required)
    #[param(example = "^KS11")]
    pub symbol: Option<String>,
    /// First day, YYYY-MM-DD (required)
    #[param(example = "2024-01-01")]
    pub start: Option<String>,
    /// Last day, YYYY-MM-DD (required)
    #[param(example = "2024-01-31")]
    pub end: Option<String>,
}

impl MarketParams {
    fn required(&self) -> Result<(&str, &str, &str), ProxyError> {
        let fields = [
            ("symbol", self.symbol.as_deref()),
            ("start", self.start.as_deref()),
            ("end", self.end.as_deref()),
        ]
        .map(|(name, value)| (name, value.map(str::trim).filter(|s| !s.is_empty())));

        match fields {
            [(_, Some(symbol)), (_, Some(start)), (_, Some(end))] => Ok((symbol, start, end)),
            _ => Err(ProxyError::MissingParameter(
                fields
                    .iter()
                    .filter(|(_, value)| value.is_none())
                    .map(|(name, _)| name.to_string())
                    .collect(),
            )),
        }
    }
}

/// Yahoo chart payload, validated for shape and otherwise unchanged.
#[utoipa::path(
    get,
    path = "/v1/market/yahoo-chart",
    tag = "Market",
    params(MarketParams),
    responses(
        (status = 200, description = "Yahoo chart payload", body = serde_json::Value),
        (status = 400, description = "Missing or malformed parameter", body = ErrorResponse,
            example = json!({"error": "Missing required parameters: symbol"})
        ),
        (status = 502, description = "Upstream payload invalid", body = ErrorResponse),
        (status = 504, description = "Upstream timeout", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn yahoo_chart_handler(
    Query(params): Query<MarketParams>,
    State(state): State<AppState>,
) -> Result<Json<Value>, ProxyError> {
    let (symbol, start, end) = params.required()?;
    metrics::counter!("api_requests_total", "endpoint" => "yahoo_chart").increment(1);
    state.market.yahoo_chart(symbol, start, end).await.map(Json)
}

/// Daily closes for a catalogued symbol such as KOSPI or USD/KRW.
#[utoipa::path(
    get,
    path = "/v1/market/fdr",
    tag = "Market",
    params(MarketParams),
    responses(
        (status = 200, description = "Date and close pairs", body = FdrResponse,
            example = json!({"data": [{"date": "2024-01-02", "value": 2669.81}]})
        ),
        (status = 400, description = "Unknown symbol or missing parameter", body = ErrorResponse),
        (status = 502, description = "Upstream failure", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn fdr_handler(
    Query(params): Query<MarketParams>,
    State(state): State<AppState>,
) -> Result<Json<FdrResponse>, ProxyError> {
    let (symbol, start, end) = params.required()?;
    metrics::counter!("api_requests_total", "endpoint" => "fdr").increment(1);
    let data = state.market.fdr_series(symbol, start, end).await?;
    Ok(Json(FdrResponse { data }))
}
