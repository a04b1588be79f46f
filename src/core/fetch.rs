//! Resource fetching and retry helpers
//!
//! Provides the shared HTTP client, the resource fetcher seam used by the grid
//! store and the static venue dataset, and linear-backoff retry logic for live
//! services.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use once_cell::sync::Lazy;
use reqwest::{Client, ClientBuilder};

use crate::core::error::{Error, Result};
use crate::core::source::ResourceLocation;

/// Global HTTP client with keep-alive
static GLOBAL_CLIENT: Lazy<Client> = Lazy::new(|| {
    ClientBuilder::new()
        .tcp_keepalive(Duration::from_secs(60))
        .pool_idle_timeout(Duration::from_secs(90))
        .connect_timeout(Duration::from_secs(10))
        .user_agent(format!("baryscore/{}", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_else(|e| {
            log::warn!("Falling back to default HTTP client: {e}");
            Client::new()
        })
});

/// Shared HTTP client for every collaborator
pub fn http_client() -> &'static Client {
    &GLOBAL_CLIENT
}

/// Retry progress callback receiving `(attempt, total_attempts)`
pub type RetryCallback = Arc<dyn Fn(u32, u32) + Send + Sync>;

/// Fetches raw resource bytes
pub trait ResourceFetcher: Send + Sync + 'static {
    fn fetch(&self, location: &ResourceLocation) -> impl Future<Output = Result<Bytes>> + Send;
}

/// Default fetcher: HTTP through the shared client, local files through tokio
#[derive(Debug, Clone, Default)]
pub struct ResourceLoader {
    timeout: Option<Duration>,
}

impl ResourceLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout: Some(timeout) }
    }
}

impl ResourceFetcher for ResourceLoader {
    async fn fetch(&self, location: &ResourceLocation) -> Result<Bytes> {
        match location {
            ResourceLocation::Http { url } => {
                log::debug!("Fetching {url}");
                let mut request = http_client().get(url);
                if let Some(timeout) = self.timeout {
                    request = request.timeout(timeout);
                }
                let response = request.send().await?;
                let status = response.status();
                if !status.is_success() {
                    return Err(Error::HttpError(format!("HTTP {status} for {url}")));
                }
                Ok(response.bytes().await?)
            }
            ResourceLocation::File { path } => {
                log::debug!("Reading {}", path.display());
                let data = tokio::fs::read(path).await?;
                Ok(Bytes::from(data))
            }
        }
    }
}

/// Bounded retry with linearly increasing backoff
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before retry `n` is `base_delay * n`
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(2000),
        }
    }
}

impl RetryPolicy {
    pub fn total_attempts(&self) -> u32 {
        self.max_retries + 1
    }

    pub fn delay_for(&self, retry: u32) -> Duration {
        self.base_delay * retry
    }
}

/// Execute an operation, retrying transient failures
///
/// Non-transient errors are returned immediately. When retries are exhausted
/// the last transient error is returned.
pub async fn retry_transient<F, Fut, T>(
    policy: &RetryPolicy,
    on_retry: Option<&RetryCallback>,
    operation: F,
) -> Result<T>
where
    F: Fn(u32) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;

    loop {
        match operation(attempt).await {
            Ok(result) => return Ok(result),
            Err(e) if e.is_transient() && attempt < policy.max_retries => {
                attempt += 1;
                let delay = policy.delay_for(attempt);
                log::warn!(
                    "Transient failure (attempt {attempt}/{}): {e}. Retrying in {delay:?}",
                    policy.total_attempts()
                );
                if let Some(callback) = on_retry {
                    callback(attempt, policy.total_attempts());
                }
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}
