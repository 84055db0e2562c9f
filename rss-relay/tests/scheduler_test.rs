mod common;

use async_trait::async_trait;
use common::{init_tracing, RecordingSleeper, ScriptedSink, StubFetcher, VerbatimSummarizer, EchoTranslator};
use rss_relay::{
    AgeWindow, DigestBuilder, FeedFetch, FeedItem, FeedSource, FetchError, FreshnessFilter, NoveltyStore, PollCycle,
    RateLimitedSink, RelayContext, Scheduler, SinkSettings, ThrottlePolicy,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

const FEED: &str = "https://a.example.com/rss";

fn minutes(n: u64) -> Duration {
    Duration::from_secs(n * 60)
}

/// Takes `delay` of (paused) time per fetch and tracks overlap
struct SlowFetcher {
    delay: Duration,
    active: AtomicUsize,
    max_active: AtomicUsize,
    completed: AtomicUsize,
}

impl SlowFetcher {
    fn new(delay: Duration) -> Self {
        Self {
            delay,
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl FeedFetch for SlowFetcher {
    async fn fetch(&self, _url: &str) -> Result<Vec<FeedItem>, FetchError> {
        let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now_active, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.active.fetch_sub(1, Ordering::SeqCst);
        self.completed.fetch_add(1, Ordering::SeqCst);
        Ok(Vec::new())
    }
}

fn cycle_with(fetcher: Arc<dyn FeedFetch>) -> Arc<PollCycle> {
    init_tracing();
    let sink = RateLimitedSink::with_sleeper(
        Arc::new(ScriptedSink::new()),
        Arc::new(RecordingSleeper::new()),
        ThrottlePolicy::default(),
        SinkSettings::default(),
    );
    let context = RelayContext {
        fetcher,
        summarizer: Arc::new(VerbatimSummarizer),
        translator: Arc::new(EchoTranslator),
        sink: Arc::new(sink),
        destination: "@channel".to_string(),
    };
    let window = AgeWindow::default();

    Arc::new(PollCycle::new(
        context,
        vec![FeedSource {
            name: "Feed A".to_string(),
            url: FEED.to_string(),
        }],
        FreshnessFilter::new(window.effective()),
        DigestBuilder::default(),
        NoveltyStore::new(window.retention()),
    ))
}

#[tokio::test(start_paused = true)]
async fn test_runs_immediately_then_on_every_tick() {
    let fetcher = Arc::new(StubFetcher::new());
    fetcher.set_items(FEED, Vec::new());
    let scheduler = Scheduler::new(cycle_with(fetcher.clone()), minutes(10));

    let completed = scheduler.run(tokio::time::sleep(minutes(25))).await;

    // t=0, t=10, t=20
    assert_eq!(completed, 3);
    assert_eq!(fetcher.calls().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_first_cycle_can_wait_for_the_first_tick() {
    let fetcher = Arc::new(StubFetcher::new());
    fetcher.set_items(FEED, Vec::new());
    let scheduler = Scheduler::new(cycle_with(fetcher.clone()), minutes(10)).with_run_immediately(false);

    let completed = scheduler.run(tokio::time::sleep(minutes(15))).await;

    assert_eq!(completed, 1);
    assert_eq!(fetcher.calls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_while_idle_stops_without_a_cycle() {
    let fetcher = Arc::new(StubFetcher::new());
    fetcher.set_items(FEED, Vec::new());
    let scheduler = Scheduler::new(cycle_with(fetcher.clone()), minutes(10)).with_run_immediately(false);

    let completed = scheduler.run(tokio::time::sleep(minutes(1))).await;

    assert_eq!(completed, 0);
    assert!(fetcher.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_during_a_cycle_lets_it_finish() {
    let fetcher = Arc::new(SlowFetcher::new(minutes(5)));
    let scheduler = Scheduler::new(cycle_with(fetcher.clone()), minutes(10));

    let started = tokio::time::Instant::now();
    let completed = scheduler.run(tokio::time::sleep(minutes(1))).await;

    assert_eq!(completed, 1);
    assert_eq!(fetcher.completed.load(Ordering::SeqCst), 1);
    assert!(started.elapsed() >= minutes(5));
}

#[tokio::test(start_paused = true)]
async fn test_slow_cycles_never_overlap() {
    let fetcher = Arc::new(SlowFetcher::new(minutes(25)));
    let scheduler = Scheduler::new(cycle_with(fetcher.clone()), minutes(10));

    let completed = scheduler.run(tokio::time::sleep(minutes(58))).await;

    assert_eq!(completed, 2);
    assert_eq!(fetcher.max_active.load(Ordering::SeqCst), 1);
    assert_eq!(fetcher.completed.load(Ordering::SeqCst), 2);
}
