//! Domain layer - series model and the page source seam.
//!
//! This module defines the transient entities created while answering one
//! statistics request:
//! - `SeriesQuery`: what to fetch (statistic code, cycle, range, sub-item)
//! - `PageRange` / `PageResult` / `Row`: one fetched page and its records
//! - `Series`: the merged, sorted label/value output
//!
//! Nothing here is persisted or shared between requests.

pub mod ecos_models;
pub mod market_models;

pub use ecos_models::*;
pub use market_models::*;

use crate::error::ProxyError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

/// Sampling cycle of a statistic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum Cycle {
    #[serde(rename = "D")]
    Daily,
    #[serde(rename = "M")]
    Monthly,
    #[serde(rename = "Q")]
    Quarterly,
    #[serde(rename = "A")]
    Annual,
}

impl Cycle {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "D",
            Self::Monthly => "M",
            Self::Quarterly => "Q",
            Self::Annual => "A",
        }
    }
}

impl FromStr for Cycle {
    type Err = ProxyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "D" => Ok(Self::Daily),
            "M" => Ok(Self::Monthly),
            "Q" => Ok(Self::Quarterly),
            "A" => Ok(Self::Annual),
            other => Err(ProxyError::invalid(
                "cycle",
                format!("expected one of D, M, Q, A but got '{}'", other),
            )),
        }
    }
}

impl fmt::Display for Cycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies one statistics series.
///
/// Every component ends up as a URL path segment, so construction rejects
/// anything outside `[A-Za-z0-9_-]`.
///
/// # Examples
///
/// ```
/// use macro_data_gateway::domain::{Cycle, SeriesQuery};
///
/// let query = SeriesQuery::new("722Y001", Cycle::Daily, "20240101", "20240105", Some("0101000")).unwrap();
/// assert_eq!(query.path(), "722Y001/D/20240101/20240105/0101000");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesQuery {
    stat_code: String,
    cycle: Cycle,
    start: String,
    end: String,
    item_code1: Option<String>,
}

impl SeriesQuery {
    pub fn new(
        stat_code: &str,
        cycle: Cycle,
        start: &str,
        end: &str,
        item_code1: Option<&str>,
    ) -> Result<Self, ProxyError> {
        let item_code1 = item_code1.filter(|s| !s.is_empty());
        check_segment("statCode", stat_code)?;
        check_segment("startDate", start)?;
        check_segment("endDate", end)?;
        if let Some(item) = item_code1 {
            check_segment("itemCode1", item)?;
        }

        Ok(Self {
            stat_code: stat_code.to_string(),
            cycle,
            start: start.to_string(),
            end: end.to_string(),
            item_code1: item_code1.map(str::to_string),
        })
    }

    pub fn stat_code(&self) -> &str {
        &self.stat_code
    }

    pub fn cycle(&self) -> Cycle {
        self.cycle
    }

    pub fn start(&self) -> &str {
        &self.start
    }

    pub fn end(&self) -> &str {
        &self.end
    }

    pub fn item_code1(&self) -> Option<&str> {
        self.item_code1.as_deref()
    }

    /// `{statCode}/{cycle}/{start}/{end}[/{itemCode1}]`
    pub fn path(&self) -> String {
        let mut path = format!(
            "{}/{}/{}/{}",
            self.stat_code, self.cycle, self.start, self.end
        );
        if let Some(item) = &self.item_code1 {
            path.push('/');
            path.push_str(item);
        }
        path
    }
}

fn check_segment(name: &str, value: &str) -> Result<(), ProxyError> {
    if value.is_empty() {
        return Err(ProxyError::MissingParameter(vec![name.to_string()]));
    }
    if !value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(ProxyError::invalid(
            name,
            "only ASCII letters, digits, '_' and '-' are allowed",
        ));
    }
    Ok(())
}

/// Inclusive, 1-based row index range of one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRange {
    pub start: usize,
    pub end: usize,
}

impl PageRange {
    /// Range of the 1-based `page` for the given page size.
    pub fn for_page(page: usize, page_size: usize) -> Self {
        Self {
            start: (page - 1) * page_size + 1,
            end: page * page_size,
        }
    }
}

/// Number of pages needed to cover `total_count` rows, never less than one.
pub fn page_count(total_count: u64, page_size: usize) -> usize {
    let pages = total_count.div_ceil(page_size as u64);
    pages.max(1) as usize
}

/// One source record: a compact timestamp token and a raw value token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub time: String,
    pub value: String,
}

impl Row {
    pub fn new(time: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            time: time.into(),
            value: value.into(),
        }
    }

    /// `YYYYMMDD` becomes `YYYY-MM-DD`; any other token is kept verbatim.
    pub fn label(&self) -> String {
        let t = &self.time;
        if t.len() == 8 && t.is_char_boundary(4) && t.is_char_boundary(6) {
            format!("{}-{}-{}", &t[0..4], &t[4..6], &t[6..8])
        } else {
            t.clone()
        }
    }

    /// Parsed value, or `None` when the token is not a finite number.
    pub fn parsed_value(&self) -> Option<f64> {
        self.value
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
    }
}

/// One fetched page with the total count reported alongside it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageResult {
    pub rows: Vec<Row>,
    pub total_count: u64,
}

/// What a page request produced, checked once at the boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum PageOutcome {
    Container(PageResult),
    /// The aggregate container key was absent from the response.
    MissingContainer { reason: String },
}

impl PageOutcome {
    /// Rows of this page; a missing container counts as an empty page.
    pub fn into_rows(self) -> Vec<Row> {
        match self {
            Self::Container(page) => page.rows,
            Self::MissingContainer { .. } => Vec::new(),
        }
    }
}

/// Index-aligned labels and values, ascending by raw timestamp token.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Series {
    pub labels: Vec<String>,
    /// `null` marks a value that was present but could not be parsed.
    pub values: Vec<Option<f64>>,
}

impl Series {
    /// Sort rows by raw token (plain string order) and convert each one.
    ///
    /// Duplicates are kept; the sort is stable.
    pub fn from_rows(mut rows: Vec<Row>) -> Self {
        rows.sort_by(|a, b| a.time.cmp(&b.time));
        let (labels, values) = rows
            .iter()
            .map(|row| (row.label(), row.parsed_value()))
            .unzip();
        Self { labels, values }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// A paged source of time-indexed rows.
///
/// Implementations must be thread-safe (`Send + Sync`) since pages are
/// requested concurrently.
///
/// # Implementations
///
/// See `infrastructure::ecos_client::EcosClient` for the ECOS implementation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch the rows in `range` for `query`.
    ///
    /// # Errors
    ///
    /// - `ProxyError::Transport` / `UpstreamStatus` / `UpstreamTimeout` when the
    ///   request itself fails
    /// - Never errors on a missing aggregate container (returns
    ///   `PageOutcome::MissingContainer` instead)
    async fn fetch_page(
        &self,
        query: &SeriesQuery,
        range: PageRange,
    ) -> Result<PageOutcome, ProxyError>;
}
