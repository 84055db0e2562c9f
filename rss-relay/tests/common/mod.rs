#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use rss_relay::{
    FeedFetch, FeedItem, FetchError, MessageSink, ParseMode, SendError, Sleeper, SummarizeError, Summarizer,
    TranslateError, Translator,
};
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, Once};
use std::time::Duration;

static INIT: Once = Once::new();

pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init();
    });
}

/// Fixed reference instant so tests do not depend on the wall clock
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap()
}

pub fn item(identifier: &str, published_at: Option<DateTime<Utc>>) -> FeedItem {
    FeedItem {
        identifier: identifier.to_string(),
        title: format!("Title {}", identifier),
        summary_text: format!("Summary of {}.", identifier),
        published_at,
        link: format!("https://news.example.com/{}", identifier),
        image_url: None,
    }
}

pub fn item_aged(identifier: &str, now: DateTime<Utc>, minutes_ago: i64) -> FeedItem {
    item(identifier, Some(now - ChronoDuration::minutes(minutes_ago)))
}

/// Fetch collaborator answering from an in-memory table that tests can rewrite
#[derive(Default)]
pub struct StubFetcher {
    feeds: Mutex<HashMap<String, Result<Vec<FeedItem>, String>>>,
    calls: Mutex<Vec<String>>,
}

impl StubFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_items(&self, url: &str, items: Vec<FeedItem>) {
        self.feeds.lock().unwrap().insert(url.to_string(), Ok(items));
    }

    pub fn set_error(&self, url: &str, message: &str) {
        self.feeds.lock().unwrap().insert(url.to_string(), Err(message.to_string()));
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl FeedFetch for StubFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<FeedItem>, FetchError> {
        self.calls.lock().unwrap().push(url.to_string());
        match self.feeds.lock().unwrap().get(url) {
            Some(Ok(items)) => Ok(items.clone()),
            Some(Err(message)) => Err(FetchError::Request(message.clone())),
            None => Err(FetchError::Request(format!("no stub for {}", url))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendKind {
    Text,
    Photo,
}

#[derive(Debug, Clone)]
pub struct SentMessage {
    pub kind: SendKind,
    pub destination: String,
    pub body: String,
    pub image_url: Option<String>,
    pub format: ParseMode,
    pub disable_link_preview: bool,
}

#[derive(Debug, Clone, Copy)]
pub enum Outcome {
    Ok,
    Throttle(Option<Duration>),
    Fail,
}

impl Outcome {
    fn into_result(self) -> Result<(), SendError> {
        match self {
            Outcome::Ok => Ok(()),
            Outcome::Throttle(retry_after) => Err(SendError::Throttled { retry_after }),
            Outcome::Fail => Err(SendError::Failed("scripted failure".to_string())),
        }
    }
}

/// Transport that records every call and answers from a script, then `Ok`
#[derive(Default)]
pub struct ScriptedSink {
    script: Mutex<VecDeque<Outcome>>,
    sent: Mutex<Vec<SentMessage>>,
}

impl ScriptedSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_script(outcomes: Vec<Outcome>) -> Self {
        Self {
            script: Mutex::new(outcomes.into()),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn push(&self, outcome: Outcome) {
        self.script.lock().unwrap().push_back(outcome);
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    fn next(&self) -> Result<(), SendError> {
        self.script.lock().unwrap().pop_front().unwrap_or(Outcome::Ok).into_result()
    }
}

#[async_trait]
impl MessageSink for ScriptedSink {
    async fn send_text(
        &self,
        destination: &str,
        body: &str,
        format: ParseMode,
        disable_link_preview: bool,
    ) -> Result<(), SendError> {
        self.sent.lock().unwrap().push(SentMessage {
            kind: SendKind::Text,
            destination: destination.to_string(),
            body: body.to_string(),
            image_url: None,
            format,
            disable_link_preview,
        });
        self.next()
    }

    async fn send_photo(
        &self,
        destination: &str,
        image_url: &str,
        caption: &str,
        format: ParseMode,
    ) -> Result<(), SendError> {
        self.sent.lock().unwrap().push(SentMessage {
            kind: SendKind::Photo,
            destination: destination.to_string(),
            body: caption.to_string(),
            image_url: Some(image_url.to_string()),
            format,
            disable_link_preview: false,
        });
        self.next()
    }
}

/// Records requested waits and returns at once
#[derive(Default)]
pub struct RecordingSleeper {
    waits: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn waits(&self) -> Vec<Duration> {
        self.waits.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.waits.lock().unwrap().push(duration);
    }
}

pub struct EchoTranslator;

#[async_trait]
impl Translator for EchoTranslator {
    async fn translate(&self, text: &str) -> Result<String, TranslateError> {
        Ok(format!("RU:{}", text))
    }
}

pub struct FailingTranslator;

#[async_trait]
impl Translator for FailingTranslator {
    async fn translate(&self, _text: &str) -> Result<String, TranslateError> {
        Err(TranslateError("service unavailable".to_string()))
    }
}

pub struct VerbatimSummarizer;

impl Summarizer for VerbatimSummarizer {
    fn summarize(&self, text: &str) -> Result<String, SummarizeError> {
        Ok(text.to_string())
    }
}

pub struct FailingSummarizer;

impl Summarizer for FailingSummarizer {
    fn summarize(&self, _text: &str) -> Result<String, SummarizeError> {
        Err(SummarizeError("tokenizer crashed".to_string()))
    }
}
