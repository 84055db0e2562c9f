use anyhow::Context;
use clap::Parser;
use rss_relay::{
    Args, DigestBuilder, ExtractiveSummarizer, FetchConfig, FreshnessFilter, GoogleTranslator, NoveltyStore,
    PollCycle, RateLimitedSink, RelayContext, RssFeedSource, Scheduler, SinkSettings, TelegramClient,
    ThrottlePolicy,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting RSS relay");

    let config = Args::parse().validate().context("Invalid configuration")?;
    config.log_startup();

    let fetch_config = FetchConfig::default();
    let http = reqwest::Client::builder()
        .user_agent(fetch_config.user_agent.clone())
        .timeout(Duration::from_secs(fetch_config.timeout_seconds))
        .build()
        .context("Failed to build HTTP client")?;

    let fetcher = RssFeedSource::new(fetch_config).context("Failed to build feed fetcher")?;
    let translator = GoogleTranslator::new(http.clone(), config.translate_to.clone())
        .with_base_url(config.translate_api_url.clone());
    let telegram = TelegramClient::new(http, config.bot_token.clone()).with_api_url(config.telegram_api_url.clone());

    let sink = RateLimitedSink::new(
        Arc::new(telegram),
        ThrottlePolicy::new(config.throttle_backoff),
        SinkSettings {
            spacing: config.send_spacing,
            disable_link_preview: config.disable_link_preview,
            ..SinkSettings::default()
        },
    );

    let context = RelayContext {
        fetcher: Arc::new(fetcher),
        summarizer: Arc::new(ExtractiveSummarizer::new(config.summary_sentences, config.summary_sentences)),
        translator: Arc::new(translator),
        sink: Arc::new(sink),
        destination: config.destination.clone(),
    };

    let cycle = PollCycle::new(
        context,
        config.feeds.clone(),
        FreshnessFilter::new(config.age_window.effective()),
        DigestBuilder::default(),
        NoveltyStore::new(config.age_window.retention()),
    )
    .with_concurrency(config.source_concurrency)
    .with_summary_announcement(config.announce_summary);

    let completed = Scheduler::new(Arc::new(cycle), config.fetch_interval)
        .with_run_immediately(config.run_immediately)
        .run(rss_relay::shutdown_signal())
        .await;

    info!("RSS relay finished after {} cycle(s)", completed);
    Ok(())
}
