//! HTTP client for the upstream catalog API.

use crate::error::{DetailFetchError, UpstreamListError};
use crate::models::{DetailDocument, ListPage};
use crate::upstream::Catalog;
use anyhow::{Context, Result};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Connection settings for [`HttpCatalog`].
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub base_url: String,
    /// Collection path segment appended to `base_url`.
    pub collection: String,
    /// Per-request timeout.
    pub timeout_seconds: u64,
    pub user_agent: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: "https://pokeapi.co/api/v2".to_string(),
            collection: "pokemon".to_string(),
            timeout_seconds: 30,
            user_agent: format!("dexfeed/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// [`Catalog`] backed by a JSON-over-HTTP API.
pub struct HttpCatalog {
    config: CatalogConfig,
    http_client: reqwest::Client,
}

impl HttpCatalog {
    /// Create a client for the given upstream.
    pub fn new(config: CatalogConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(config.user_agent.clone())
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            config,
            http_client,
        })
    }

    /// URL of the collection endpoint, without query.
    pub fn list_url(&self) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.collection.trim_matches('/')
        )
    }
}

impl Catalog for HttpCatalog {
    async fn fetch_list(&self, limit: u32, offset: u64) -> Result<ListPage, UpstreamListError> {
        let url = self.list_url();
        debug!("GET {} limit={} offset={}", url, limit, offset);

        let response = self
            .http_client
            .get(&url)
            .query(&[("limit", limit.to_string()), ("offset", offset.to_string())])
            .send()
            .await
            .map_err(UpstreamListError::Transport)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamListError::Status { status, body });
        }

        let body = response
            .text()
            .await
            .map_err(UpstreamListError::Transport)?;

        serde_json::from_str(&body).map_err(UpstreamListError::Decode)
    }

    async fn fetch_detail(&self, url: &str) -> Result<DetailDocument, DetailFetchError> {
        debug!("GET {}", url);

        let transport = |source: reqwest::Error| DetailFetchError::Transport {
            url: url.to_string(),
            source,
        };

        let response = self.http_client.get(url).send().await.map_err(transport)?;

        if !response.status().is_success() {
            return Err(DetailFetchError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let body = response.text().await.map_err(transport)?;

        serde_json::from_str::<Value>(&body)
            .map(DetailDocument::new)
            .map_err(|source| DetailFetchError::Decode {
                url: url.to_string(),
                source,
            })
    }
}
