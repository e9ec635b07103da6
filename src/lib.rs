//! Paginated, aggregated summaries over a catalog API.
//!
//! [`Aggregator`] is the in-process entry point: give it a [`Catalog`] and a
//! [`PageRequest`] and it returns the page's [`Summary`] values in list order.

pub mod aggregator;
pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod report;
pub mod upstream;

pub use aggregator::{Aggregator, AggregatorOptions};
pub use error::{AggregateError, DetailFetchError, UpstreamListError};
pub use models::{PageRequest, Summary};
pub use upstream::{Catalog, HttpCatalog};
