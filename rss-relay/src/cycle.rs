use crate::digest::DigestBuilder;
use crate::freshness::{Eligibility, FreshnessFilter};
use crate::sink::RateLimitedSink;
use crate::state::NoveltyStore;
use crate::types::{DeliveryResult, FeedFetch, FeedItem, FeedSource, Summarizer, Translator};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::fmt::Write as _;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Collaborators shared by every cycle, assembled once at startup
pub struct RelayContext {
    pub fetcher: Arc<dyn FeedFetch>,
    pub summarizer: Arc<dyn Summarizer>,
    pub translator: Arc<dyn Translator>,
    pub sink: Arc<RateLimitedSink>,
    pub destination: String,
}

/// Per-source outcome of one cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceTally {
    pub name: String,
    pub fetch_failed: bool,
    pub entries: usize,
    pub delivered: usize,
    pub throttled: usize,
    pub failed: usize,
}

impl SourceTally {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            fetch_failed: false,
            entries: 0,
            delivered: 0,
            throttled: 0,
            failed: 0,
        }
    }
}

/// Delivered counts for every configured source, in configuration order
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub started_at: DateTime<Utc>,
    pub tallies: Vec<SourceTally>,
}

impl CycleReport {
    pub fn count_for(&self, source_name: &str) -> Option<usize> {
        self.tallies
            .iter()
            .find(|tally| tally.name == source_name)
            .map(|tally| tally.delivered)
    }

    pub fn total_delivered(&self) -> usize {
        self.tallies.iter().map(|tally| tally.delivered).sum()
    }

    pub fn failed_sources(&self) -> Vec<&str> {
        self.tallies
            .iter()
            .filter(|tally| tally.fetch_failed)
            .map(|tally| tally.name.as_str())
            .collect()
    }

    /// Human readable summary, sent unformatted when announced
    pub fn summary_text(&self) -> String {
        let mut text = String::from("📊 Summary of fetched posts:\n");
        for tally in &self.tallies {
            let _ = write!(text, "- {}: {} new post(s)", tally.name, tally.delivered);
            if tally.fetch_failed {
                text.push_str(" (fetch failed)");
            }
            text.push('\n');
        }
        text
    }
}

pub struct PollCycle {
    context: RelayContext,
    sources: Vec<FeedSource>,
    filter: FreshnessFilter,
    builder: DigestBuilder,
    store: Mutex<NoveltyStore>,
    in_flight: Mutex<HashSet<String>>,
    concurrency: usize,
    announce_summary: bool,
}

impl PollCycle {
    pub fn new(
        context: RelayContext,
        sources: Vec<FeedSource>,
        filter: FreshnessFilter,
        builder: DigestBuilder,
        store: NoveltyStore,
    ) -> Self {
        Self {
            context,
            sources,
            filter,
            builder,
            store: Mutex::new(store),
            in_flight: Mutex::new(HashSet::new()),
            concurrency: 1,
            announce_summary: false,
        }
    }

    /// Process up to `concurrency` sources at once
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Also post the cycle summary to the destination
    pub fn with_summary_announcement(mut self, announce: bool) -> Self {
        self.announce_summary = announce;
        self
    }

    pub fn sources(&self) -> &[FeedSource] {
        &self.sources
    }

    /// One pass over the configured sources
    pub async fn run(&self, now: DateTime<Utc>) -> CycleReport {
        self.run_sources(&self.sources, now).await
    }

    pub async fn run_sources(&self, sources: &[FeedSource], now: DateTime<Utc>) -> CycleReport {
        let span = info_span!("poll_cycle", cycle_id = %Uuid::new_v4());
        self.run_inner(sources, now).instrument(span).await
    }

    async fn run_inner(&self, sources: &[FeedSource], now: DateTime<Utc>) -> CycleReport {
        info!("Checking {} RSS feeds...", sources.len());
        self.store.lock().await.sweep(now);

        let tallies: Vec<SourceTally> = stream::iter(sources)
            .map(|source| self.process_source(source, now))
            .buffered(self.concurrency)
            .collect()
            .await;

        let report = CycleReport {
            started_at: now,
            tallies,
        };

        info!("{}", report.summary_text());
        let failed = report.failed_sources();
        if !failed.is_empty() {
            warn!("Sources that could not be fetched this cycle: {}", failed.join(", "));
        }

        if self.announce_summary {
            let result = self
                .context
                .sink
                .announce(&report.summary_text(), &self.context.destination)
                .await;
            if result != DeliveryResult::Delivered {
                warn!("Cycle summary was not delivered: {:?}", result);
            }
        }

        report
    }

    async fn process_source(&self, source: &FeedSource, now: DateTime<Utc>) -> SourceTally {
        let mut tally = SourceTally::new(&source.name);
        debug!("Fetching feed: {} ({})", source.name, source.url);

        let items = match self.context.fetcher.fetch(&source.url).await {
            Ok(items) => items,
            Err(e) => {
                error!(source = %source.name, "Failed to fetch feed {}: {}", source.url, e);
                tally.fetch_failed = true;
                return tally;
            }
        };
        tally.entries = items.len();

        for item in items {
            if !self.claim(&item, now).await {
                continue;
            }

            let digest = self
                .builder
                .build(&item, self.context.summarizer.as_ref(), self.context.translator.as_ref())
                .await;
            let result = self.context.sink.deliver(&digest, &self.context.destination).await;
            self.settle(&item, result, now).await;

            match result {
                DeliveryResult::Delivered => {
                    info!(source = %source.name, "Posted: {}", item.title);
                    tally.delivered += 1;
                }
                DeliveryResult::Throttled => {
                    warn!(source = %source.name, "Skipped for this cycle after throttling: {}", item.title);
                    tally.throttled += 1;
                }
                DeliveryResult::Failed => {
                    error!(source = %source.name, "Could not deliver: {}", item.title);
                    tally.failed += 1;
                }
            }
        }

        tally
    }

    /// Reserve an eligible item so no other source path delivers it concurrently
    async fn claim(&self, item: &FeedItem, now: DateTime<Utc>) -> bool {
        let store = self.store.lock().await;
        let eligibility = self.filter.check(item, now, &store);
        if eligibility != Eligibility::Eligible {
            debug!("Skipping {} ({:?})", item.identifier, eligibility);
            return false;
        }

        let mut in_flight = self.in_flight.lock().await;
        in_flight.insert(item.identifier.clone())
    }

    /// Only a confirmed delivery marks an item as seen
    async fn settle(&self, item: &FeedItem, result: DeliveryResult, now: DateTime<Utc>) {
        let mut store = self.store.lock().await;
        if result == DeliveryResult::Delivered {
            store.mark_seen_at(item.identifier.clone(), now);
        }
        self.in_flight.lock().await.remove(&item.identifier);
    }

    pub async fn has_delivered(&self, identifier: &str) -> bool {
        self.store.lock().await.seen(identifier)
    }

    pub async fn delivered_count(&self) -> usize {
        self.store.lock().await.len()
    }
}
