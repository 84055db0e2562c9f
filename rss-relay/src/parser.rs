use crate::text::clean_text;
use crate::types::{FeedItem, RelayError, Result};
use chrono::Utc;
use feed_rs::model::{Entry, Link, Text};
use feed_rs::parser::{Builder, Parser};
use std::collections::HashSet;
use tracing::debug;

#[derive(Debug, Default, Clone, Copy)]
pub struct FeedParser;

impl FeedParser {
    pub fn new() -> Self {
        Self
    }

    fn build_parser() -> Parser {
        // Entries without a guid are keyed by their link
        Builder::new()
            .id_generator(|links: &[Link], _title: &Option<Text>, _uri: Option<&str>| {
                links.first().map(|link| link.href.clone()).unwrap_or_default()
            })
            .build()
    }

    /// Parse an RSS/Atom document into items, dropping entries that repeat an identifier
    pub fn parse_items(&self, content: impl AsRef<[u8]>) -> Result<Vec<FeedItem>> {
        let content = content.as_ref();
        debug!("Parsing feed content ({} bytes)", content.len());

        let feed = Self::build_parser()
            .parse(content)
            .map_err(|e| RelayError::Parse(format!("Failed to parse feed: {}", e)))?;

        let mut seen = HashSet::new();
        let mut items = Vec::with_capacity(feed.entries.len());

        for entry in feed.entries {
            let Some(item) = Self::parse_entry(entry) else {
                continue;
            };
            if !seen.insert(item.identifier.clone()) {
                debug!("Skipping duplicate entry: {}", item.identifier);
                continue;
            }
            items.push(item);
        }

        debug!("Parsed feed with {} entries", items.len());
        Ok(items)
    }

    fn parse_entry(entry: Entry) -> Option<FeedItem> {
        let link = entry.links.first().map(|l| l.href.clone()).unwrap_or_default();

        let identifier = if entry.id.is_empty() { link.clone() } else { entry.id.clone() };
        if identifier.is_empty() {
            debug!("Skipping entry without id or link");
            return None;
        }

        let title = entry
            .title
            .map(|t| clean_text(&t.content))
            .unwrap_or_default();

        // Prefer the short description, fall back to full content
        let summary_text = entry
            .summary
            .map(|s| s.content)
            .or_else(|| entry.content.and_then(|c| c.body))
            .map(|raw| clean_text(&raw))
            .unwrap_or_default();

        let published_at = entry
            .published
            .or(entry.updated)
            .map(|dt| dt.with_timezone(&Utc));

        // media:content first, then media:thumbnail
        let image_url = entry
            .media
            .iter()
            .flat_map(|media| media.content.iter())
            .find_map(|content| content.url.as_ref().map(|url| url.to_string()))
            .or_else(|| {
                entry
                    .media
                    .iter()
                    .flat_map(|media| media.thumbnails.iter())
                    .map(|thumbnail| thumbnail.image.uri.clone())
                    .find(|uri| !uri.is_empty())
            });

        Some(FeedItem {
            identifier,
            title,
            summary_text,
            published_at,
            link,
            image_url,
        })
    }
}
