//! Error types for the aggregation pipeline.

use std::time::Duration;
use thiserror::Error;

/// The collection (list) request failed. Fatal to an aggregation call.
#[derive(Debug, Error)]
pub enum UpstreamListError {
    #[error("list endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("list request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("list response is not valid JSON: {0}")]
    Decode(#[source] serde_json::Error),
}

/// A single detail request failed. Absorbed by the aggregator.
#[derive(Debug, Error)]
pub enum DetailFetchError {
    #[error("list entry has no url")]
    MissingUrl,

    #[error("detail {url} returned {status}")]
    Status { url: String, status: u16 },

    #[error("detail {url} request failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("detail {url} is not valid JSON: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

/// The only error that escapes an aggregation call.
#[derive(Debug, Error)]
pub enum AggregateError {
    #[error(transparent)]
    List(#[from] UpstreamListError),

    #[error("aggregation did not finish within {0:?}")]
    DeadlineExceeded(Duration),

    #[error("aggregation was cancelled")]
    Cancelled,
}
