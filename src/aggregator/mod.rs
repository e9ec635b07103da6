//! Page aggregation.
//!
//! Turns one page of the upstream collection into an ordered list of
//! [`Summary`](crate::models::Summary) values.

pub mod pipeline;

pub use pipeline::{Aggregator, AggregatorOptions};
