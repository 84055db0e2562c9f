use crate::types::{FetchConfig, RelayError, Result};
use backoff::{backoff::Backoff, exponential::ExponentialBackoff};
use reqwest::{Client, Response};
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};

const BYTES_PER_MB: usize = 1024 * 1024;

pub struct Fetcher {
    client: Client,
    config: FetchConfig,
}

impl Fetcher {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()?;

        Ok(Self { client, config })
    }

    /// Download a feed document, retrying transient failures with exponential backoff
    pub async fn fetch_feed(&self, url: &str) -> Result<Vec<u8>> {
        let start_time = Instant::now();
        debug!("Fetching feed: {}", url);

        let mut backoff: ExponentialBackoff<backoff::SystemClock> = ExponentialBackoff {
            current_interval: Duration::from_secs(self.config.retry_delay_seconds),
            initial_interval: Duration::from_secs(self.config.retry_delay_seconds),
            max_interval: Duration::from_secs(self.config.retry_delay_seconds * 32),
            multiplier: 2.0,
            max_elapsed_time: Some(Duration::from_secs(self.config.retry_delay_seconds * 60)),
            ..Default::default()
        };

        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            match self.fetch_once(url).await {
                Ok(content) => {
                    debug!(
                        "Fetched feed: {} ({} bytes in {}ms)",
                        url,
                        content.len(),
                        start_time.elapsed().as_millis()
                    );
                    return Ok(content);
                }
                // Oversized feeds will not shrink on retry
                Err(e @ RelayError::FeedTooLarge { .. }) => return Err(e),
                Err(e) => {
                    last_error = Some(e);
                }
            }

            if attempt < self.config.max_retries {
                if let Some(delay) = backoff.next_backoff() {
                    warn!("Attempt {} failed for {}, retrying in {:?}", attempt + 1, url, delay);
                    tokio::time::sleep(delay).await;
                    continue;
                }
            }
            break;
        }

        error!("Failed to fetch feed after {} attempts: {}", self.config.max_retries + 1, url);
        Err(last_error.unwrap_or_else(|| RelayError::General("Unknown fetch error".to_string())))
    }

    async fn fetch_once(&self, url: &str) -> Result<Vec<u8>> {
        let mut response: Response = self.client.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(RelayError::General(format!(
                "HTTP {}: {}",
                status,
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }

        // Content-Length is optional, so the running total is what counts
        let limit = self.config.max_feed_size_mb.saturating_mul(BYTES_PER_MB);
        let mut content = Vec::new();

        while let Some(chunk) = response.chunk().await? {
            content.extend_from_slice(&chunk);
            if content.len() > limit {
                return Err(RelayError::FeedTooLarge {
                    size_mb: content.len().div_ceil(BYTES_PER_MB),
                });
            }
        }

        Ok(content)
    }
}
