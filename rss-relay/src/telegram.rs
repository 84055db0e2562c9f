use crate::types::{MessageSink, ParseMode, SendError};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_API_URL: &str = "https://api.telegram.org";

/// Telegram Bot API client
pub struct TelegramClient {
    client: Client,
    bot_token: String,
    api_url: String,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    error_code: Option<u16>,
    description: Option<String>,
    parameters: Option<ResponseParameters>,
}

#[derive(Debug, Deserialize)]
struct ResponseParameters {
    retry_after: Option<u64>,
}

impl TelegramClient {
    pub fn new(client: Client, bot_token: impl Into<String>) -> Self {
        Self {
            client,
            bot_token: bot_token.into(),
            api_url: DEFAULT_API_URL.to_string(),
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn call(&self, method: &str, payload: Value) -> Result<(), SendError> {
        let url = format!("{}/bot{}/{}", self.api_url, self.bot_token, method);

        // reqwest errors can echo the URL, which carries the token
        let resp = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| SendError::Failed(e.without_url().to_string()))?;

        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        let parsed: Option<ApiResponse> = serde_json::from_str(&body).ok();

        if status.is_success() && parsed.as_ref().map_or(true, |r| r.ok) {
            debug!(method, "Telegram request succeeded");
            return Ok(());
        }

        let description = parsed
            .as_ref()
            .and_then(|r| r.description.clone())
            .unwrap_or_else(|| body.clone());

        if Self::is_throttle(status, parsed.as_ref(), &description) {
            let retry_after = parsed
                .as_ref()
                .and_then(|r| r.parameters.as_ref())
                .and_then(|p| p.retry_after)
                .map(Duration::from_secs);

            warn!(method, retry_after = ?retry_after, "Rate limited by Telegram");
            return Err(SendError::Throttled { retry_after });
        }

        warn!(method, status = %status, description = %description, "Telegram request failed");
        Err(SendError::Failed(format!("Telegram returned {}: {}", status, description)))
    }

    fn is_throttle(status: StatusCode, parsed: Option<&ApiResponse>, description: &str) -> bool {
        let lowered = description.to_lowercase();
        status == StatusCode::TOO_MANY_REQUESTS
            || parsed.and_then(|r| r.error_code) == Some(429)
            || lowered.contains("too many requests")
            || lowered.contains("flood control")
    }
}

#[async_trait]
impl MessageSink for TelegramClient {
    async fn send_text(&self, destination: &str, body: &str, format: ParseMode, disable_link_preview: bool) -> Result<(), SendError> {
        let payload = with_parse_mode(
            json!({
                "chat_id": destination,
                "text": body,
                "disable_web_page_preview": disable_link_preview
            }),
            format,
        );
        self.call("sendMessage", payload).await
    }

    async fn send_photo(&self, destination: &str, image_url: &str, caption: &str, format: ParseMode) -> Result<(), SendError> {
        let payload = with_parse_mode(
            json!({
                "chat_id": destination,
                "photo": image_url,
                "caption": caption
            }),
            format,
        );
        self.call("sendPhoto", payload).await
    }
}

/// Plain messages omit `parse_mode` so no entities are parsed
fn with_parse_mode(mut payload: Value, format: ParseMode) -> Value {
    if let (Some(mode), Some(fields)) = (format.as_str(), payload.as_object_mut()) {
        fields.insert("parse_mode".to_string(), Value::from(mode));
    }
    payload
}
