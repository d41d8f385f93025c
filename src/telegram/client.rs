//! Telegram Bot API client module
//!
//! Encapsulates the Bot API calls the bot needs: resolving photo file handles
//! and delivering text, voice, and document messages. Every call is a single
//! attempt; callers decide what a failure means for the user.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};

use super::messages::{TEXT_LIMIT, split_message};
use crate::core::ports::{ImageSource, Notifier};
use crate::errors::BotError;

/// Per-request limit for every Bot API call.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

static HTTP_CLIENT: std::sync::LazyLock<Client> = std::sync::LazyLock::new(|| {
    Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .unwrap_or_else(|_| Client::new())
});

/// Envelope every Bot API method answers with.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct File {
    file_path: Option<String>,
}

pub struct TelegramClient {
    token: String,
    api_base: String,
}

impl TelegramClient {
    #[must_use]
    pub fn new(token: String, api_base: String) -> Self {
        Self {
            token,
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.token, method)
    }

    /// Public download URL for a `file_path` returned by `getFile`.
    #[must_use]
    pub fn file_url(&self, file_path: &str) -> String {
        format!("{}/file/bot{}/{}", self.api_base, self.token, file_path)
    }

    /// Calls `getFile` and returns the file's `file_path`.
    ///
    /// # Errors
    ///
    /// Returns `NetworkError` on transport failure and `ApiError` when Telegram
    /// answers with a non-2xx status, `ok: false`, or no `file_path`.
    pub async fn get_file_path(&self, file_id: &str) -> Result<String, BotError> {
        let resp = HTTP_CLIENT
            .get(self.method_url("getFile"))
            .query(&[("file_id", file_id)])
            .send()
            .await?;

        let file: File = Self::read_result(resp, "getFile").await?;
        file.file_path
            .filter(|p| !p.is_empty())
            .ok_or_else(|| BotError::ApiError("getFile returned no file_path".to_string()))
    }

    async fn read_result<T>(resp: reqwest::Response, method: &str) -> Result<T, BotError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let status = resp.status();
        let body = resp.text().await?;
        let parsed: ApiResponse<T> = serde_json::from_str(&body).map_err(|e| {
            BotError::ApiError(format!(
                "{method} returned unreadable body (status {status}): {e}"
            ))
        })?;

        if !status.is_success() || !parsed.ok {
            return Err(BotError::ApiError(format!(
                "{method} failed (status {status}): {}",
                parsed.description.as_deref().unwrap_or("no description")
            )));
        }

        parsed
            .result
            .ok_or_else(|| BotError::ApiError(format!("{method} returned no result")))
    }

    async fn send_multipart(
        &self,
        method: &str,
        field: &str,
        chat_id: i64,
        bytes: Vec<u8>,
        filename: &str,
        mime: &str,
    ) -> Result<(), BotError> {
        let part = Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str(mime)?;
        let form = Form::new()
            .text("chat_id", chat_id.to_string())
            .part(field.to_string(), part);

        let resp = HTTP_CLIENT
            .post(self.method_url(method))
            .multipart(form)
            .send()
            .await?;

        Self::read_result::<serde_json::Value>(resp, method)
            .await
            .map(|_| ())
    }
}

#[async_trait]
impl ImageSource for TelegramClient {
    async fn resolve_image_url(&self, file_id: &str) -> Result<String, BotError> {
        let file_path = self.get_file_path(file_id).await?;
        debug!(file_id = %file_id, "Resolved Telegram file path");
        Ok(self.file_url(&file_path))
    }
}

#[async_trait]
impl Notifier for TelegramClient {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), BotError> {
        for chunk in split_message(text, TEXT_LIMIT) {
            let resp = HTTP_CLIENT
                .post(self.method_url("sendMessage"))
                .json(&json!({ "chat_id": chat_id, "text": chunk }))
                .send()
                .await?;

            if let Err(e) = Self::read_result::<serde_json::Value>(resp, "sendMessage").await {
                warn!(chat_id, "sendMessage failed: {}", e);
                return Err(e);
            }
        }
        Ok(())
    }

    async fn send_audio(
        &self,
        chat_id: i64,
        audio: Vec<u8>,
        filename: &str,
    ) -> Result<(), BotError> {
        self.send_multipart("sendVoice", "voice", chat_id, audio, filename, "audio/ogg")
            .await
    }

    async fn send_file(
        &self,
        chat_id: i64,
        bytes: Vec<u8>,
        filename: &str,
    ) -> Result<(), BotError> {
        self.send_multipart(
            "sendDocument",
            "document",
            chat_id,
            bytes,
            filename,
            "text/plain; charset=utf-8",
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> TelegramClient {
        TelegramClient::new("123:abc".to_string(), "https://api.telegram.org/".to_string())
    }

    #[test]
    fn builds_method_and_file_urls() {
        let c = client();
        assert_eq!(
            c.method_url("getFile"),
            "https://api.telegram.org/bot123:abc/getFile"
        );
        assert_eq!(
            c.file_url("photos/file_7.jpg"),
            "https://api.telegram.org/file/bot123:abc/photos/file_7.jpg"
        );
    }

    #[test]
    fn parses_get_file_envelope() {
        let body = r#"{"ok":true,"result":{"file_id":"x","file_path":"photos/a.jpg"}}"#;
        let parsed: ApiResponse<File> = serde_json::from_str(body).unwrap();
        assert!(parsed.ok);
        assert_eq!(
            parsed.result.unwrap().file_path.as_deref(),
            Some("photos/a.jpg")
        );
    }

    #[test]
    fn parses_error_envelope() {
        let body = r#"{"ok":false,"error_code":400,"description":"Bad Request: invalid file_id"}"#;
        let parsed: ApiResponse<File> = serde_json::from_str(body).unwrap();
        assert!(!parsed.ok);
        assert!(parsed.result.is_none());
        assert_eq!(
            parsed.description.as_deref(),
            Some("Bad Request: invalid file_id")
        );
    }
}
