//! Data models for the catalog aggregator.
//!
//! This module contains the upstream payload shapes (list page, detail
//! document), the normalized [`Summary`] produced for each entry, and the
//! [`PageRequest`] describing which page to aggregate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::fmt;

/// Largest page size accepted by the front end.
pub const MAX_LIMIT: u32 = 50;

/// Page size used when none is given.
pub const DEFAULT_LIMIT: u32 = 20;

/// A page of the upstream collection.
///
/// Arrives already clamped: `page >= 1` and `1 <= limit <= MAX_LIMIT`.
/// Use [`PageRequest::clamped`] to build one from raw user input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-indexed page number.
    pub page: u32,
    /// Number of entries per page.
    pub limit: u32,
}

impl PageRequest {
    /// Create a request from values that are already known to be in range.
    pub fn new(page: u32, limit: u32) -> Self {
        Self { page, limit }
    }

    /// Build a request from raw input.
    ///
    /// `page` defaults to 1 and is floored at 1; `limit` defaults to
    /// `default_limit` and is clamped to `[1, MAX_LIMIT]`.
    pub fn clamped(page: Option<i64>, limit: Option<i64>, default_limit: u32) -> Self {
        let page = page.unwrap_or(1).clamp(1, i64::from(u32::MAX));
        let limit = limit
            .unwrap_or(i64::from(default_limit))
            .clamp(1, i64::from(MAX_LIMIT));

        // Both values are within u32 range after clamping.
        Self::new(page as u32, limit as u32)
    }

    /// Number of entries to skip upstream: `(page - 1) * limit`.
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }
}

impl fmt::Display for PageRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "page {} (limit {}, offset {})",
            self.page,
            self.limit,
            self.offset()
        )
    }
}

/// Pointer to a detail resource, as listed by the collection endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListReference {
    /// Absolute URL of the detail resource, if upstream provided one.
    pub url: Option<String>,
}

// Any JSON value decodes; a reference without a string `url` keeps its slot
// with `url: None` so only that entry is lost.
impl<'de> Deserialize<'de> for ListReference {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(Self {
            url: value.get("url").and_then(Value::as_str).map(str::to_owned),
        })
    }
}

/// Decoded response of the collection endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListPage {
    /// Ordered references; absent or `null` upstream means an empty page.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub results: Vec<ListReference>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<ListReference>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<ListReference>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Raw detail payload for a single entry.
///
/// The upstream shape is not under our control, so the document is kept
/// loosely typed and every accessor returns `None` for anything absent or
/// of the wrong JSON type.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailDocument(Value);

impl DetailDocument {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// `name`
    pub fn name(&self) -> Option<&str> {
        self.0.get("name").and_then(Value::as_str)
    }

    /// `sprites.other."official-artwork".front_default`
    pub fn artwork(&self) -> Option<&str> {
        self.0
            .pointer("/sprites/other/official-artwork/front_default")
            .and_then(Value::as_str)
    }

    /// `types[].type.name`, in upstream order, skipping entries without a
    /// usable name.
    pub fn type_names(&self) -> Vec<&str> {
        self.0
            .get("types")
            .and_then(Value::as_array)
            .map(|types| {
                types
                    .iter()
                    .filter_map(|t| t.pointer("/type/name").and_then(Value::as_str))
                    .filter(|name| !name.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// `height`
    pub fn height(&self) -> Option<&Number> {
        self.number("height")
    }

    /// `weight`
    pub fn weight(&self) -> Option<&Number> {
        self.number("weight")
    }

    fn number(&self, key: &str) -> Option<&Number> {
        match self.0.get(key) {
            Some(Value::Number(n)) => Some(n),
            _ => None,
        }
    }
}

/// Normalized view of one catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    /// Entry name.
    pub name: Option<String>,
    /// Official artwork URL.
    pub image: Option<String>,
    /// Type names in upstream order. Never contains empty entries.
    pub types: Vec<String>,
    /// Height as reported upstream.
    pub height: Option<Number>,
    /// Weight as reported upstream.
    pub weight: Option<Number>,
}

impl Summary {
    /// Project a detail document into a summary. Never fails.
    pub fn from_detail(detail: &DetailDocument) -> Self {
        Self {
            name: detail.name().map(str::to_owned),
            image: detail.artwork().map(str::to_owned),
            types: detail.type_names().into_iter().map(str::to_owned).collect(),
            height: detail.height().cloned(),
            weight: detail.weight().cloned(),
        }
    }
}

/// Metadata describing how a page was produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Collection endpoint the page was read from.
    pub source: String,
    pub page: u32,
    pub limit: u32,
    pub offset: u64,
    /// When the aggregation finished.
    pub fetched_at: DateTime<Utc>,
    pub duration_seconds: f64,
}

/// A rendered page: metadata plus the summaries in list order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageReport {
    pub metadata: ReportMetadata,
    pub items: Vec<Summary>,
}

impl PageReport {
    /// Number of summaries on the page.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
