//! Text-to-speech converter client.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::json;
use std::time::Duration;
use tracing::info;

use crate::core::ports::SpeechSynthesizer;
use crate::errors::BotError;

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Calls `POST {base}/convert` with `{"text": ...}` and returns the OGG/Opus body.
pub struct SpeechClient {
    base_url: String,
    http: Client,
}

impl SpeechClient {
    #[must_use]
    pub fn new(base_url: String) -> Self {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        }
    }

    #[must_use]
    pub fn convert_url(&self) -> String {
        format!("{}/convert", self.base_url)
    }
}

#[async_trait]
impl SpeechSynthesizer for SpeechClient {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, BotError> {
        let resp = self
            .http
            .post(self.convert_url())
            .json(&json!({ "text": text }))
            .send()
            .await?;

        let status = resp.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(BotError::UpstreamRateLimited(
                "speech converter returned 429".to_string(),
            ));
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(BotError::UpstreamError(format!(
                "speech converter returned {status}: {}",
                body.chars().take(200).collect::<String>()
            )));
        }

        let audio = resp.bytes().await?;
        if audio.is_empty() {
            return Err(BotError::UpstreamError(
                "speech converter returned an empty body".to_string(),
            ));
        }
        info!(bytes = audio.len(), "Speech conversion complete");
        Ok(audio.to_vec())
    }
}
