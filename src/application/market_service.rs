//! Market data use cases backed by the Yahoo chart API.

use crate::domain::{yahoo_ticker_for, DataPoint, FDR_SYMBOLS};
use crate::error::ProxyError;
use crate::infrastructure::YahooClient;
use chrono::{DateTime, NaiveDate, NaiveTime};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

pub struct MarketService {
    client: Arc<YahooClient>,
}

impl MarketService {
    pub fn new(client: Arc<YahooClient>) -> Self {
        Self { client }
    }

    /// Raw chart payload for any Yahoo symbol between two `YYYY-MM-DD` dates.
    pub async fn yahoo_chart(&self, symbol: &str, start: &str, end: &str) -> Result<Value, ProxyError> {
        let period1 = unix_midnight("start", start)?;
        let period2 = unix_midnight("end", end)?;
        info!("Yahoo chart request: {} ({} ~ {})", symbol, start, end);
        self.client.fetch_chart(symbol, period1, period2).await
    }

    /// Daily closes for a catalogued symbol, null closes dropped.
    pub async fn fdr_series(&self, symbol: &str, start: &str, end: &str) -> Result<Vec<DataPoint>, ProxyError> {
        let ticker = yahoo_ticker_for(symbol).ok_or_else(|| {
            let known: Vec<&str> = FDR_SYMBOLS.iter().map(|(name, _)| *name).collect();
            ProxyError::invalid(
                "symbol",
                format!("unsupported symbol '{}' (supported: {})", symbol, known.join(", ")),
            )
        })?;
        let payload = self.yahoo_chart(ticker, start, end).await?;
        Ok(closes(&payload))
    }
}

/// Seconds since the epoch at 00:00 UTC of a `YYYY-MM-DD` date.
pub fn unix_midnight(name: &str, date: &str) -> Result<i64, ProxyError> {
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| ProxyError::invalid(name, format!("expected YYYY-MM-DD, got '{}'", date)))?;
    Ok(date.and_time(NaiveTime::MIN).and_utc().timestamp())
}

/// Pair `timestamp[i]` with `indicators.quote[0].close[i]`, skipping nulls.
pub fn closes(payload: &Value) -> Vec<DataPoint> {
    let Some(result) = payload.pointer("/chart/result/0") else {
        return Vec::new();
    };
    let timestamps = result
        .get("timestamp")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    let closes = result
        .pointer("/indicators/quote/0/close")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    timestamps
        .iter()
        .zip(closes)
        .filter_map(|(ts, close)| {
            let date = DateTime::from_timestamp(ts.as_i64()?, 0)?;
            Some(DataPoint {
                date: date.format("%Y-%m-%d").to_string(),
                value: close.as_f64()?,
            })
        })
        .collect()
}
