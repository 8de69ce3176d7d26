//! Wire models for the Bank of Korea ECOS open API.
//!
//! ECOS wraps every answer in a container named after the service
//! (`StatisticSearch`, `KeyStatisticList`). When there is no data, or the key
//! is rejected, the container is replaced by a `RESULT` object instead.

use crate::domain::{PageOutcome, PageResult, Row};
use crate::error::ProxyError;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Top-level body of `/StatisticSearch/...`
#[derive(Debug, Clone, Deserialize)]
pub struct StatisticSearchEnvelope {
    #[serde(rename = "StatisticSearch")]
    pub statistic_search: Option<StatisticSearchBody>,
    #[serde(rename = "RESULT")]
    pub result: Option<EcosResultInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatisticSearchBody {
    /// Reported as a number or a numeric string depending on the endpoint version
    #[serde(default)]
    pub list_total_count: Option<Value>,
    /// A list, a single object, or absent on an empty page
    #[serde(default)]
    pub row: Option<OneOrMany<EcosRow>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::Many(items) => items,
            Self::One(item) => vec![item],
        }
    }
}

/// One record of `StatisticSearch.row`
#[derive(Debug, Clone, Deserialize)]
pub struct EcosRow {
    #[serde(rename = "TIME", default, deserialize_with = "token")]
    pub time: String,
    #[serde(rename = "DATA_VALUE", default, deserialize_with = "token")]
    pub data_value: String,
    #[serde(rename = "STAT_CODE", default)]
    pub stat_code: Option<String>,
    #[serde(rename = "ITEM_NAME1", default)]
    pub item_name1: Option<String>,
    #[serde(rename = "UNIT_NAME", default)]
    pub unit_name: Option<String>,
}

/// ECOS status object (`INFO-200` for "no data", `ERROR-...` otherwise)
#[derive(Debug, Clone, Deserialize)]
pub struct EcosResultInfo {
    #[serde(rename = "CODE", default)]
    pub code: String,
    #[serde(rename = "MESSAGE", default)]
    pub message: String,
}

impl From<EcosRow> for Row {
    fn from(row: EcosRow) -> Self {
        Row::new(row.time, row.data_value)
    }
}

impl StatisticSearchEnvelope {
    /// Fails only when the reported row count does not fit in a `u64`.
    pub fn into_outcome(self) -> Result<PageOutcome, ProxyError> {
        Ok(match self.statistic_search {
            Some(body) => PageOutcome::Container(PageResult {
                total_count: coerce_total_count(body.list_total_count.as_ref())?,
                rows: body
                    .row
                    .map(OneOrMany::into_vec)
                    .unwrap_or_default()
                    .into_iter()
                    .map(Row::from)
                    .collect(),
            }),
            None => PageOutcome::MissingContainer {
                reason: match self.result {
                    Some(info) => format!("StatisticSearch missing ({}: {})", info.code, info.message),
                    None => "StatisticSearch missing".to_string(),
                },
            },
        })
    }
}

/// Non-negative integer count; absent or non-numeric values count as zero.
///
/// Strings are read like an integer prefix ("250", "250 rows"), floats are truncated.
/// A count too large for `u64` is an error rather than zero, which would end the
/// fetch after the first page.
pub fn coerce_total_count(value: Option<&Value>) -> Result<u64, ProxyError> {
    let overflow = |raw: String| ProxyError::UpstreamFormat {
        upstream: "ecos",
        message: format!("list_total_count {} is out of range", raw),
    };
    match value {
        Some(Value::Number(n)) => match n.as_u64() {
            Some(count) => Ok(count),
            None => match n.as_f64() {
                Some(f) if f >= u64::MAX as f64 => Err(overflow(n.to_string())),
                Some(f) if f > 0.0 => Ok(f as u64),
                _ => Ok(0),
            },
        },
        Some(Value::String(s)) => {
            let digits: String = s
                .trim_start()
                .chars()
                .take_while(|c| c.is_ascii_digit())
                .collect();
            if digits.is_empty() {
                return Ok(0);
            }
            digits.parse().map_err(|_| overflow(digits))
        }
        _ => Ok(0),
    }
}

/// Accept strings, numbers or null for a token field.
fn token<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => s,
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    })
}
