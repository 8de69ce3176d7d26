//! Models for the Yahoo chart proxy and the FinanceDataReader-style series.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One daily close
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DataPoint {
    /// `YYYY-MM-DD` (UTC)
    pub date: String,
    pub value: f64,
}

/// Response of `/v1/market/fdr`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FdrResponse {
    pub data: Vec<DataPoint>,
}

/// Symbols the FDR-compatible endpoint knows, with their Yahoo ticker.
pub const FDR_SYMBOLS: &[(&str, &str)] = &[
    ("KOSPI", "^KS11"),
    ("KOSDAQ", "^KQ11"),
    ("USD/KRW", "USDKRW=X"),
    ("KR10YT=RR", "KR10YT=RR"),
    ("US10YT=RR", "US10YT=RR"),
    ("GC=F", "GC=F"),
    ("CL=F", "CL=F"),
    ("BTC-USD", "BTC-USD"),
];

/// Yahoo ticker for an FDR symbol, if supported.
pub fn yahoo_ticker_for(symbol: &str) -> Option<&'static str> {
    FDR_SYMBOLS
        .iter()
        .find(|(name, _)| *name == symbol)
        .map(|(_, ticker)| *ticker)
}
