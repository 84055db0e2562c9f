use std::time::Duration;

// Use the interfaces crate for the pipeline boundary
pub use interfaces::defs::{Digest, FeedItem, FeedSource, ParseMode};
pub use interfaces::defs::{FeedFetch, MessageSink, Summarizer, Translator};
pub use interfaces::defs::{FetchError, SendError, SummarizeError, TranslateError};

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_retries: u32,
    pub retry_delay_seconds: u64,
    pub max_feed_size_mb: usize,
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "RSS-Relay/1.0".to_string(),
            timeout_seconds: 30,
            max_retries: 3,
            retry_delay_seconds: 1,
            max_feed_size_mb: 10,
            max_redirects: 5,
        }
    }
}

/// Outcome of handing one digest to the rate-limited sink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryResult {
    Delivered,
    Throttled,
    Failed,
}

/// Recency settings for the freshness decision
#[derive(Debug, Clone, Copy)]
pub struct AgeWindow {
    pub max_article_age: Duration,
    pub freshness_window: Duration,
}

impl AgeWindow {
    /// Both limits apply, so the tighter one wins
    pub fn effective(&self) -> Duration {
        self.max_article_age.min(self.freshness_window)
    }

    /// How long a delivered identifier is remembered
    pub fn retention(&self) -> Duration {
        self.max_article_age.max(self.freshness_window) * 2
    }
}

impl Default for AgeWindow {
    fn default() -> Self {
        Self {
            max_article_age: Duration::from_secs(300 * 60),
            freshness_window: Duration::from_secs(5 * 60),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Feed parse error: {0}")]
    Parse(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Feed size exceeds limit: {size_mb}MB")]
    FeedTooLarge { size_mb: usize },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Translation error: {0}")]
    Translation(String),

    #[error("General error: {0}")]
    General(String),
}

impl From<RelayError> for FetchError {
    fn from(err: RelayError) -> Self {
        match err {
            RelayError::Parse(msg) => FetchError::Malformed(msg),
            other => FetchError::Request(other.to_string()),
        }
    }
}

impl From<RelayError> for TranslateError {
    fn from(err: RelayError) -> Self {
        TranslateError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RelayError>;
