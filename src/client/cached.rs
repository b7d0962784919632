use anyhow::{Context, Result};
use async_trait::async_trait;
use moka::future::Cache;
use std::time::Duration;
use tokio_retry::RetryIf;
use tokio_retry::strategy::ExponentialBackoff;
use tracing::debug;

use super::{FetchError, FetchResponse, Fetcher};
use crate::config::ClientConfig;
use crate::constants::{CLIENT_CACHE_CAPACITY, MAX_BACKOFF_DELAY_MS, STARTING_BACKOFF_DELAY_MS};

/// HTTP client with an in-memory response cache.
///
/// Successful (2xx) responses are kept for the configured lifetime and
/// shared by every page that requests the same URL. Expired entries are
/// evicted in the background whether or not their URL is requested again,
/// and the cache never holds more than [`CLIENT_CACHE_CAPACITY`] responses.
/// Transport failures are
/// retried with exponential backoff; error statuses are returned as-is and
/// never cached.
///
/// Cloning is cheap and clones share the cache.
#[derive(Debug, Clone)]
pub struct CachedClient {
    http: reqwest::Client,
    cache: Option<Cache<String, FetchResponse>>,
    max_retries: usize,
}

impl CachedClient {
    /// Create a client.
    ///
    /// A zero `ttl` disables caching.
    pub fn new(ttl: Duration, timeout: Duration, max_retries: usize) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        let cache = (!ttl.is_zero()).then(|| {
            Cache::builder().max_capacity(CLIENT_CACHE_CAPACITY).time_to_live(ttl).build()
        });

        Ok(Self {
            http,
            cache,
            max_retries,
        })
    }

    /// Create a client from the `[client]` configuration section.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Self::new(config.cache_ttl(), config.timeout(), config.max_retries())
    }

    /// Number of live cached responses.
    ///
    /// Runs the cache's pending maintenance first, so expired entries are
    /// already gone from the count.
    pub async fn cached_len(&self) -> u64 {
        match &self.cache {
            Some(cache) => {
                cache.run_pending_tasks().await;
                cache.entry_count()
            }
            None => 0,
        }
    }

    /// Drop every cached response.
    pub fn clear(&self) {
        if let Some(cache) = &self.cache {
            cache.invalidate_all();
        }
    }

    async fn cached(&self, url: &str) -> Option<FetchResponse> {
        self.cache.as_ref()?.get(url).await
    }

    async fn fetch_once(&self, url: &str) -> Result<FetchResponse, FetchError> {
        let response =
            self.http.get(url).send().await.map_err(|e| FetchError::from_reqwest(url, &e))?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(|e| FetchError::from_reqwest(url, &e))?;
        Ok(FetchResponse::new(status, body.to_vec()))
    }
}

#[async_trait]
impl Fetcher for CachedClient {
    async fn fetch(&self, url: &str) -> Result<FetchResponse, FetchError> {
        if let Some(hit) = self.cached(url).await {
            debug!(url, "Backend cache hit");
            return Ok(hit);
        }

        let strategy = ExponentialBackoff::from_millis(STARTING_BACKOFF_DELAY_MS)
            .max_delay(Duration::from_millis(MAX_BACKOFF_DELAY_MS))
            .take(self.max_retries);

        let response = RetryIf::start(
            strategy,
            || self.fetch_once(url),
            |e: &FetchError| {
                let retry = e.is_retryable();
                if retry {
                    debug!(url, error = %e, "Retrying backend request");
                }
                retry
            },
        )
        .await?;

        debug!(url, status = response.status, "Backend responded");
        if let Some(cache) = &self.cache {
            if response.is_success() {
                cache.insert(url.to_string(), response.clone()).await;
            }
        }
        Ok(response)
    }
}
