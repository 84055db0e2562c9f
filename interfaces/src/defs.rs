use std::time::Duration;

use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedSource {
    pub name: String,
    pub url: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FeedItem {
    // feed-provided id when present, otherwise the link
    pub identifier: String,
    pub title: String,
    pub summary_text: String,
    // published, else updated; always UTC
    pub published_at: Option<DateTime<Utc>>,
    pub link: String,
    pub image_url: Option<String>,
}

// Plain text throughout; markup is applied when the message is composed
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Digest {
    pub header: String,
    pub body: String,
    // empty when the translation is unavailable
    pub translated_header: String,
    pub translated_body: String,
    pub link: String,
    pub image_url: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParseMode {
    Plain,
    Html,
}

impl ParseMode {
    // None means the transport default (no entity parsing)
    pub fn as_str(&self) -> Option<&'static str> {
        match self {
            ParseMode::Plain => None,
            ParseMode::Html => Some("HTML"),
        }
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("feed request failed: {0}")]
    Request(String),
    #[error("malformed feed: {0}")]
    Malformed(String),
}

#[derive(Debug, Error)]
#[error("translation failed: {0}")]
pub struct TranslateError(pub String);

#[derive(Debug, Error)]
#[error("summarization failed: {0}")]
pub struct SummarizeError(pub String);

#[derive(Debug, Error)]
pub enum SendError {
    #[error("throttled by transport (retry after {retry_after:?})")]
    Throttled { retry_after: Option<Duration> },
    #[error("send failed: {0}")]
    Failed(String),
}

impl SendError {
    pub fn is_throttle(&self) -> bool {
        matches!(self, SendError::Throttled { .. })
    }
}

// Collaborator note:
// Everything behind these traits is outside the relay pipeline proper.
// Implementations are expected to be cheap to share behind an Arc and to
// report failure through their error type rather than by panicking; the
// pipeline decides how each failure degrades.

#[async_trait]
pub trait FeedFetch: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<FeedItem>, FetchError>;
}

pub trait Summarizer: Send + Sync {
    fn summarize(&self, text: &str) -> Result<String, SummarizeError>;
}

#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str) -> Result<String, TranslateError>;
}

#[async_trait]
pub trait MessageSink: Send + Sync {
    async fn send_text(&self, destination: &str, body: &str, format: ParseMode, disable_link_preview: bool) -> Result<(), SendError>;
    async fn send_photo(&self, destination: &str, image_url: &str, caption: &str, format: ParseMode) -> Result<(), SendError>;
}
