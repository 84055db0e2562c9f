pub mod types;
pub mod text;
pub mod fetcher;
pub mod parser;
pub mod sources;
pub mod summarizer;
pub mod translator;
pub mod telegram;
pub mod state;
pub mod freshness;
pub mod digest;
pub mod sink;
pub mod cycle;
pub mod scheduler;
pub mod config;

pub use types::*;
pub use fetcher::Fetcher;
pub use parser::FeedParser;
pub use sources::RssFeedSource;
pub use summarizer::ExtractiveSummarizer;
pub use translator::GoogleTranslator;
pub use telegram::TelegramClient;
pub use state::NoveltyStore;
pub use freshness::{Eligibility, FreshnessFilter};
pub use digest::{compose_message, DigestBuilder};
pub use sink::{RateLimitedSink, SinkSettings, Sleeper, ThrottlePolicy, TokioSleeper};
pub use cycle::{CycleReport, PollCycle, RelayContext, SourceTally};
pub use scheduler::{shutdown_signal, Scheduler, SchedulerState};
pub use config::{Args, RelayConfig};
