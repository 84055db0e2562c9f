use crate::telegram::DEFAULT_API_URL;
use crate::translator::DEFAULT_TRANSLATE_URL;
use crate::types::{AgeWindow, FeedSource, RelayError, Result};
use clap::{ArgAction, Parser};
use std::collections::HashSet;
use std::fmt;
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

/// Sources polled when `FEEDS` is not set
pub const DEFAULT_FEEDS: &[(&str, &str)] = &[
    ("La Vanguardia", "https://www.lavanguardia.com/rss/home.xml"),
    ("ABC España", "https://www.abc.es/rss/feeds/abc_espana.xml"),
    ("El Mundo", "https://e00-elmundo.uecdn.es/elmundo/rss/portada.xml"),
    ("El Confidencial", "https://rss.elconfidencial.com/espana/espana.xml"),
    ("Europa Press", "https://www.europapress.es/rss/rss.aspx"),
    ("20 Minutos", "https://rss.20minutos.es/rss/espana/"),
    ("Eldiario.es", "https://www.eldiario.es/rss"),
    ("La Razón", "https://www.larazon.es/rss"),
    ("El Periódico", "https://www.elperiodico.com/rss"),
    ("ARA", "https://www.ara.cat/rss"),
    ("TV3", "https://www.ccma.cat/tv3/rss/"),
    ("La Vanguardia Catalunya", "https://www.lavanguardia.com/rss/catalunya.xml"),
    ("El Punt Avui", "https://www.elpuntavui.cat/rss"),
    ("Catalunya Ràdio", "https://www.catradio.cat/feed/"),
];

/// Command line and environment options
#[derive(Parser)]
#[command(name = "rss-relay", version, about = "Relays fresh news feed items to a Telegram channel")]
pub struct Args {
    /// Telegram bot token
    #[arg(long, env = "BOT_TOKEN", hide_env_values = true)]
    pub bot_token: Option<String>,

    /// Destination channel, e.g. @my_channel
    #[arg(long = "channel", env = "CHANNEL_USERNAME")]
    pub channel_username: Option<String>,

    /// JSON array of {"name","url"} objects or comma separated Name=URL pairs
    #[arg(long, env = "FEEDS")]
    pub feeds: Option<String>,

    #[arg(long = "interval-minutes", env = "FETCH_INTERVAL_MINUTES", default_value_t = 10)]
    pub fetch_interval_minutes: u64,

    #[arg(long = "max-age-minutes", env = "MAX_ARTICLE_AGE_MINUTES", default_value_t = 300)]
    pub max_article_age_minutes: u64,

    #[arg(long = "freshness-minutes", env = "FRESHNESS_WINDOW_MINUTES", default_value_t = 5)]
    pub freshness_window_minutes: u64,

    /// Target language of the translated block
    #[arg(long, env = "TRANSLATE_TO", default_value = "ru")]
    pub translate_to: String,

    /// Sentence count above which descriptions are condensed
    #[arg(long, env = "SUMMARY_SENTENCES", default_value_t = 3)]
    pub summary_sentences: usize,

    #[arg(long, env = "RUN_IMMEDIATELY", default_value_t = true, action = ArgAction::Set)]
    pub run_immediately: bool,

    /// Post the per-cycle summary to the channel as well
    #[arg(long, env = "ANNOUNCE_SUMMARY", default_value_t = false, action = ArgAction::Set)]
    pub announce_summary: bool,

    #[arg(long, env = "DISABLE_LINK_PREVIEW", default_value_t = false, action = ArgAction::Set)]
    pub disable_link_preview: bool,

    #[arg(long, env = "SEND_SPACING_MS", default_value_t = 1500)]
    pub send_spacing_ms: u64,

    #[arg(long, env = "THROTTLE_BACKOFF_SECS", default_value_t = 30)]
    pub throttle_backoff_secs: u64,

    #[arg(long, env = "SOURCE_CONCURRENCY", default_value_t = 1)]
    pub source_concurrency: usize,

    #[arg(long, env = "TELEGRAM_API_URL", default_value = DEFAULT_API_URL)]
    pub telegram_api_url: String,

    #[arg(long, env = "TRANSLATE_API_URL", default_value = DEFAULT_TRANSLATE_URL)]
    pub translate_api_url: String,
}

/// Validated runtime configuration
#[derive(Clone)]
pub struct RelayConfig {
    pub bot_token: String,
    pub destination: String,
    pub feeds: Vec<FeedSource>,
    pub fetch_interval: Duration,
    pub age_window: AgeWindow,
    pub translate_to: String,
    pub summary_sentences: usize,
    pub run_immediately: bool,
    pub announce_summary: bool,
    pub disable_link_preview: bool,
    pub send_spacing: Duration,
    pub throttle_backoff: Duration,
    pub source_concurrency: usize,
    pub telegram_api_url: String,
    pub translate_api_url: String,
}

impl Args {
    pub fn validate(self) -> Result<RelayConfig> {
        let bot_token = required(self.bot_token, "BOT_TOKEN")?;
        let destination = normalize_destination(&required(self.channel_username, "CHANNEL_USERNAME")?);

        let feeds = match self.feeds.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => parse_feeds(raw)?,
            _ => default_feeds(),
        };

        if self.fetch_interval_minutes == 0 {
            return Err(RelayError::Config("FETCH_INTERVAL_MINUTES must be greater than zero".to_string()));
        }
        if self.max_article_age_minutes == 0 || self.freshness_window_minutes == 0 {
            return Err(RelayError::Config(
                "MAX_ARTICLE_AGE_MINUTES and FRESHNESS_WINDOW_MINUTES must be greater than zero".to_string(),
            ));
        }
        if self.source_concurrency == 0 {
            return Err(RelayError::Config("SOURCE_CONCURRENCY must be at least 1".to_string()));
        }
        if self.summary_sentences == 0 {
            return Err(RelayError::Config("SUMMARY_SENTENCES must be at least 1".to_string()));
        }
        if self.translate_to.trim().is_empty() {
            return Err(RelayError::Config("TRANSLATE_TO must not be empty".to_string()));
        }

        ensure_http(&self.telegram_api_url, "TELEGRAM_API_URL")?;
        ensure_http(&self.translate_api_url, "TRANSLATE_API_URL")?;

        Ok(RelayConfig {
            bot_token,
            destination,
            feeds,
            fetch_interval: minutes(self.fetch_interval_minutes),
            age_window: AgeWindow {
                max_article_age: minutes(self.max_article_age_minutes),
                freshness_window: minutes(self.freshness_window_minutes),
            },
            translate_to: self.translate_to.trim().to_string(),
            summary_sentences: self.summary_sentences,
            run_immediately: self.run_immediately,
            announce_summary: self.announce_summary,
            disable_link_preview: self.disable_link_preview,
            send_spacing: Duration::from_millis(self.send_spacing_ms),
            throttle_backoff: Duration::from_secs(self.throttle_backoff_secs),
            source_concurrency: self.source_concurrency,
            telegram_api_url: self.telegram_api_url,
            translate_api_url: self.translate_api_url,
        })
    }
}

impl RelayConfig {
    /// Startup banner; never includes the full token
    pub fn log_startup(&self) {
        info!(
            "Relaying {} feeds to {} every {:?} (age window {:?}, bot {})",
            self.feeds.len(),
            self.destination,
            self.fetch_interval,
            self.age_window.effective(),
            redact_token(&self.bot_token)
        );

        if self.age_window.freshness_window < self.fetch_interval {
            warn!(
                "Freshness window {:?} is shorter than the poll interval {:?}; items published between polls may age out unseen",
                self.age_window.freshness_window, self.fetch_interval
            );
        }
    }
}

impl fmt::Debug for RelayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayConfig")
            .field("bot_token", &redact_token(&self.bot_token))
            .field("destination", &self.destination)
            .field("feeds", &self.feeds)
            .field("fetch_interval", &self.fetch_interval)
            .field("age_window", &self.age_window)
            .field("translate_to", &self.translate_to)
            .field("summary_sentences", &self.summary_sentences)
            .field("run_immediately", &self.run_immediately)
            .field("announce_summary", &self.announce_summary)
            .field("disable_link_preview", &self.disable_link_preview)
            .field("send_spacing", &self.send_spacing)
            .field("throttle_backoff", &self.throttle_backoff)
            .field("source_concurrency", &self.source_concurrency)
            .field("telegram_api_url", &self.telegram_api_url)
            .field("translate_api_url", &self.translate_api_url)
            .finish()
    }
}

/// Parse a feed list given either as JSON or as `Name=URL,Name=URL`
pub fn parse_feeds(raw: &str) -> Result<Vec<FeedSource>> {
    let raw = raw.trim();

    let feeds: Vec<FeedSource> = if raw.starts_with('[') {
        serde_json::from_str(raw)?
    } else {
        raw.split(',')
            .map(str::trim)
            .filter(|pair| !pair.is_empty())
            .map(|pair| {
                let (name, url) = pair
                    .split_once('=')
                    .ok_or_else(|| RelayError::Config(format!("Feed entry '{}' is not in Name=URL form", pair)))?;
                Ok(FeedSource {
                    name: name.trim().to_string(),
                    url: url.trim().to_string(),
                })
            })
            .collect::<Result<_>>()?
    };

    if feeds.is_empty() {
        return Err(RelayError::Config("FEEDS does not list any feed".to_string()));
    }

    let mut names = HashSet::new();
    for feed in &feeds {
        if feed.name.trim().is_empty() {
            return Err(RelayError::Config(format!("Feed {} has an empty name", feed.url)));
        }
        ensure_http(&feed.url, &feed.name)?;
        if !names.insert(feed.name.as_str()) {
            warn!("Feed name '{}' appears more than once; report counts will be ambiguous", feed.name);
        }
    }

    Ok(feeds)
}

pub fn default_feeds() -> Vec<FeedSource> {
    DEFAULT_FEEDS
        .iter()
        .map(|(name, url)| FeedSource {
            name: name.to_string(),
            url: url.to_string(),
        })
        .collect()
}

/// Telegram accepts `@username` or a numeric chat id
pub fn normalize_destination(raw: &str) -> String {
    let raw = raw.trim();
    let numeric = raw.strip_prefix('-').unwrap_or(raw);
    if raw.starts_with('@') || (!numeric.is_empty() && numeric.chars().all(|c| c.is_ascii_digit())) {
        raw.to_string()
    } else {
        format!("@{}", raw)
    }
}

/// Keep the bot id, hide the secret half
pub fn redact_token(token: &str) -> String {
    match token.split_once(':') {
        Some((bot_id, _)) => format!("{}:***", bot_id),
        None => "***".to_string(),
    }
}

fn required(value: Option<String>, name: &str) -> Result<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| RelayError::Config(format!("{} is required", name)))
}

fn ensure_http(raw: &str, label: &str) -> Result<()> {
    let url = Url::parse(raw)?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(RelayError::Config(format!(
            "{} must use http or https, got '{}'",
            label, other
        ))),
    }
}

fn minutes(value: u64) -> Duration {
    Duration::from_secs(value.saturating_mul(60))
}
