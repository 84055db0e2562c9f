use crate::digest::compose_message;
use crate::text::truncate_chars;
use crate::types::{DeliveryResult, Digest, MessageSink, ParseMode, SendError};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, error, warn};

/// Time source for every wait the sink performs
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Real waits on the tokio timer
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// What to do when the transport signals flood control.
///
/// Each throttle signal is followed by exactly one wait. After the wait the
/// send is retried only while fewer than `max_attempts` attempts have been
/// throttled; otherwise the item is skipped for this cycle.
#[derive(Debug, Clone)]
pub struct ThrottlePolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
}

impl ThrottlePolicy {
    pub fn new(base_delay: Duration) -> Self {
        Self {
            base_delay,
            max_delay: base_delay * 2,
            ..Self::default()
        }
    }

    /// Wait after the `attempt`-th throttled send (1-based), honouring the
    /// server hint when it asks for longer, never exceeding `max_delay`
    pub fn delay_for(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16) as i32;
        let scaled = self.base_delay.mul_f64(self.multiplier.max(1.0).powi(exponent));
        let wanted = retry_after.map_or(scaled, |hint| hint.max(scaled));
        wanted.min(self.max_delay.max(self.base_delay))
    }

    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}

impl Default for ThrottlePolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::from_secs(30),
            max_delay: Duration::from_secs(60),
            multiplier: 2.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SinkSettings {
    pub spacing: Duration,
    pub format: ParseMode,
    pub disable_link_preview: bool,
    pub max_message_chars: usize,
}

impl Default for SinkSettings {
    fn default() -> Self {
        Self {
            spacing: Duration::from_millis(1500),
            format: ParseMode::Html,
            disable_link_preview: false,
            max_message_chars: crate::digest::DEFAULT_MESSAGE_CHARS,
        }
    }
}

/// Delivery front for the transport.
///
/// A single gate serializes every send the process makes, so the spacing
/// between messages and the throttle backoff hold across all feeds.
pub struct RateLimitedSink {
    transport: Arc<dyn MessageSink>,
    sleeper: Arc<dyn Sleeper>,
    policy: ThrottlePolicy,
    settings: SinkSettings,
    gate: Mutex<()>,
}

impl RateLimitedSink {
    pub fn new(transport: Arc<dyn MessageSink>, policy: ThrottlePolicy, settings: SinkSettings) -> Self {
        Self::with_sleeper(transport, Arc::new(TokioSleeper), policy, settings)
    }

    pub fn with_sleeper(
        transport: Arc<dyn MessageSink>,
        sleeper: Arc<dyn Sleeper>,
        policy: ThrottlePolicy,
        settings: SinkSettings,
    ) -> Self {
        Self {
            transport,
            sleeper,
            policy,
            settings,
            gate: Mutex::new(()),
        }
    }

    pub async fn deliver(&self, digest: &Digest, destination: &str) -> DeliveryResult {
        let message = compose_message(digest, self.settings.max_message_chars);
        self.deliver_message(digest.image_url.as_deref(), &message, destination, self.settings.format)
            .await
    }

    /// Send an unformatted text message through the same pacing
    pub async fn announce(&self, text: &str, destination: &str) -> DeliveryResult {
        let message = truncate_chars(text, self.settings.max_message_chars);
        self.deliver_message(None, &message, destination, ParseMode::Plain).await
    }

    async fn deliver_message(
        &self,
        image_url: Option<&str>,
        message: &str,
        destination: &str,
        format: ParseMode,
    ) -> DeliveryResult {
        let _gate = self.gate.lock().await;
        let mut attempt = 0;

        loop {
            attempt += 1;

            match self.send_once(image_url, message, destination, format).await {
                Ok(()) => return DeliveryResult::Delivered,
                Err(SendError::Throttled { retry_after }) => {
                    let delay = self.policy.delay_for(attempt, retry_after);
                    warn!("Flood control exceeded. Backing off for {:?}", delay);
                    self.sleeper.sleep(delay).await;

                    if !self.policy.should_retry(attempt) {
                        return DeliveryResult::Throttled;
                    }
                }
                Err(SendError::Failed(reason)) => {
                    error!("Delivery failed: {}", reason);
                    return DeliveryResult::Failed;
                }
            }
        }
    }

    /// One delivery attempt: photo first when there is one, then text
    async fn send_once(
        &self,
        image_url: Option<&str>,
        message: &str,
        destination: &str,
        format: ParseMode,
    ) -> Result<(), SendError> {
        if let Some(image_url) = image_url {
            let sent = self
                .paced(self.transport.send_photo(destination, image_url, message, format))
                .await;

            match sent {
                Ok(()) => return Ok(()),
                Err(e @ SendError::Throttled { .. }) => return Err(e),
                Err(SendError::Failed(reason)) => {
                    warn!("Failed to send photo, falling back to text message: {}", reason);
                }
            }
        }

        self.paced(self.transport.send_text(destination, message, format, self.settings.disable_link_preview))
            .await
    }

    /// Run one transport call, then hold the gate for the minimum spacing
    async fn paced<F>(&self, send: F) -> Result<(), SendError>
    where
        F: std::future::Future<Output = Result<(), SendError>>,
    {
        let result = send.await;
        debug!("Send attempt finished (ok: {}), pausing {:?}", result.is_ok(), self.settings.spacing);
        self.sleeper.sleep(self.settings.spacing).await;
        result
    }
}
