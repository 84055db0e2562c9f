use crate::types::{FeedFetch, FeedItem, FetchConfig, FetchError, Result};
use crate::{FeedParser, Fetcher};
use async_trait::async_trait;
use tracing::{debug, warn};

/// Fetch collaborator backed by HTTP retrieval and feed-rs parsing
pub struct RssFeedSource {
    fetcher: Fetcher,
    parser: FeedParser,
}

impl RssFeedSource {
    pub fn new(fetch_config: FetchConfig) -> Result<Self> {
        Ok(Self::from_fetcher(Fetcher::new(fetch_config)?))
    }

    pub fn from_fetcher(fetcher: Fetcher) -> Self {
        Self {
            fetcher,
            parser: FeedParser::new(),
        }
    }
}

#[async_trait]
impl FeedFetch for RssFeedSource {
    async fn fetch(&self, url: &str) -> std::result::Result<Vec<FeedItem>, FetchError> {
        let content = self.fetcher.fetch_feed(url).await?;

        let items = self.parser.parse_items(&content).map_err(|e| {
            warn!("Malformed feed at {}: {}", url, e);
            FetchError::from(e)
        })?;

        debug!("Pulled {} items from {}", items.len(), url);
        Ok(items)
    }
}
