use crate::types::{RelayError, Result, TranslateError, Translator};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

pub const DEFAULT_TRANSLATE_URL: &str = "https://translate.googleapis.com";

/// Machine translation through the public Google Translate endpoint
pub struct GoogleTranslator {
    client: Client,
    base_url: String,
    target_lang: String,
}

impl GoogleTranslator {
    pub fn new(client: Client, target_lang: impl Into<String>) -> Self {
        Self {
            client,
            base_url: DEFAULT_TRANSLATE_URL.to_string(),
            target_lang: target_lang.into(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn target_lang(&self) -> &str {
        &self.target_lang
    }

    async fn request(&self, text: &str) -> Result<String> {
        let url = format!("{}/translate_a/single", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("client", "gtx"),
                ("sl", "auto"),
                ("tl", self.target_lang.as_str()),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RelayError::Translation(format!("HTTP {}", status)));
        }

        let body: Value = response.json().await?;
        Self::extract_translation(&body)
    }

    /// The payload is `[[["translated", "source", ...], ...], ...]`, one segment per sentence
    fn extract_translation(body: &Value) -> Result<String> {
        let segments = body
            .get(0)
            .and_then(Value::as_array)
            .ok_or_else(|| RelayError::Translation("unexpected response shape".to_string()))?;

        let translated: String = segments
            .iter()
            .filter_map(|segment| segment.get(0).and_then(Value::as_str))
            .collect();

        if translated.is_empty() {
            return Err(RelayError::Translation("empty translation".to_string()));
        }
        Ok(translated)
    }
}

#[async_trait]
impl Translator for GoogleTranslator {
    async fn translate(&self, text: &str) -> std::result::Result<String, TranslateError> {
        if text.trim().is_empty() {
            return Ok(String::new());
        }

        debug!("Translating {} chars to {}", text.chars().count(), self.target_lang);
        Ok(self.request(text).await?)
    }
}
