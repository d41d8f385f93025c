//! Collaborator seams.
//!
//! Each external service the pipeline talks to is reached through one of these
//! traits, so the orchestration logic can be driven by the real HTTP clients in
//! production and by fakes in tests. Implementations convert every failure into
//! a [`BotError`] at the boundary; nothing panics or retries.

use async_trait::async_trait;

use crate::errors::BotError;

/// Resolves an opaque platform file handle into a fetchable URL.
#[async_trait]
pub trait ImageSource: Send + Sync {
    async fn resolve_image_url(&self, file_id: &str) -> Result<String, BotError>;
}

/// Produces a natural-language description of the image behind a URL.
///
/// Failures are classified as `UpstreamRateLimited`, `UpstreamError`,
/// `NetworkError` or `ConfigurationMissing`.
#[async_trait]
pub trait Describer: Send + Sync {
    async fn describe(&self, image_url: &str) -> Result<String, BotError>;
}

/// Converts text into encoded (OGG/Opus) audio.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, BotError>;
}

/// Outbound delivery to the end user. One attempt per call.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), BotError>;

    async fn send_audio(&self, chat_id: i64, audio: Vec<u8>, filename: &str)
    -> Result<(), BotError>;

    async fn send_file(&self, chat_id: i64, bytes: Vec<u8>, filename: &str)
    -> Result<(), BotError>;
}
