use thiserror::Error;

use crate::telegram::messages;

#[derive(Debug, Error)]
pub enum BotError {
    #[error("Missing configuration: {0}")]
    ConfigurationMissing(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Upstream rate limited: {0}")]
    UpstreamRateLimited(String),

    #[error("Upstream service error: {0}")]
    UpstreamError(String),

    #[error("Failed to send HTTP request: {0}")]
    NetworkError(String),

    #[error("Lock store unavailable: {0}")]
    LockStoreUnavailable(String),

    #[error("Failed to parse payload: {0}")]
    ParseError(String),

    #[error("Failed to access Telegram API: {0}")]
    ApiError(String),
}

impl BotError {
    /// The single chat message a user sees when a job ends with this error.
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        match self {
            BotError::ConfigurationMissing(_) | BotError::InvalidConfiguration(_) => {
                messages::SYSTEM_ERROR
            }
            BotError::UpstreamRateLimited(_) => messages::RATE_LIMITED,
            BotError::LockStoreUnavailable(_) => messages::PLEASE_WAIT,
            BotError::UpstreamError(_)
            | BotError::NetworkError(_)
            | BotError::ParseError(_)
            | BotError::ApiError(_) => messages::GENERIC_FAILURE,
        }
    }
}

// Request URLs embed the bot token, so they are stripped before the error is kept.
impl From<reqwest::Error> for BotError {
    fn from(error: reqwest::Error) -> Self {
        BotError::NetworkError(error.without_url().to_string())
    }
}

impl From<sqlx::Error> for BotError {
    fn from(error: sqlx::Error) -> Self {
        BotError::LockStoreUnavailable(error.to_string())
    }
}

impl From<serde_json::Error> for BotError {
    fn from(error: serde_json::Error) -> Self {
        BotError::ParseError(error.to_string())
    }
}
