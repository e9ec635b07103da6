//! Upstream catalog access.
//!
//! The aggregator only talks to the upstream through the [`Catalog`] trait;
//! [`HttpCatalog`] is the production implementation.

pub mod client;

pub use client::{CatalogConfig, HttpCatalog};

use crate::error::{DetailFetchError, UpstreamListError};
use crate::models::{DetailDocument, ListPage};

/// Read-only access to a paginated catalog.
#[allow(async_fn_in_trait)]
pub trait Catalog {
    /// Fetch one page of references from the collection endpoint.
    async fn fetch_list(&self, limit: u32, offset: u64) -> Result<ListPage, UpstreamListError>;

    /// Fetch the detail resource a list reference points to.
    async fn fetch_detail(&self, url: &str) -> Result<DetailDocument, DetailFetchError>;
}
