use std::env;
use std::time::Duration;

use url::Url;

use crate::ai::{speech, vision};
use crate::errors::BotError;
use crate::telegram::client as telegram;

pub const DEFAULT_TELEGRAM_API_BASE: &str = "https://api.telegram.org";
pub const DEFAULT_VISION_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const DEFAULT_VISION_MODEL: &str = "google/gemma-3-27b-it:free";
pub const DEFAULT_LOCK_STALE_SECS: u64 = 120;

/// Longest a photo job can take with every outbound call at its limit: one
/// description, one conversion and three Bot API sends. The lock must outlive it.
pub const JOB_TIME_BUDGET: Duration = Duration::from_secs(
    vision::REQUEST_TIMEOUT.as_secs()
        + speech::REQUEST_TIMEOUT.as_secs()
        + 3 * telegram::REQUEST_TIMEOUT.as_secs(),
);

/// Where lock-guarded processing runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelegationTopology {
    InProcess,
    Remote,
}

/// Whether the webhook continuation waits for the delegated job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelegationDiscipline {
    Awaited,
    Detached,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub telegram_bot_token: String,
    pub telegram_api_base: String,
    pub openrouter_api_key: Option<String>,
    pub vision_api_url: String,
    pub vision_model: String,
    pub database_url: Option<String>,
    pub worker_api_url: Option<String>,
    pub converter_api_url: Option<String>,
    pub topology: DelegationTopology,
    pub discipline: DelegationDiscipline,
    pub lock_stale_after: Duration,
}

impl AppConfig {
    /// Reads the process environment once at start-up.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationMissing` when `TELEGRAM_BOT_TOKEN` is unset and
    /// `InvalidConfiguration` for values that do not parse.
    pub fn from_env() -> Result<Self, BotError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup. Blank values count as unset.
    ///
    /// # Errors
    ///
    /// See [`AppConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, BotError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let telegram_bot_token = get("TELEGRAM_BOT_TOKEN")
            .ok_or_else(|| BotError::ConfigurationMissing("TELEGRAM_BOT_TOKEN".to_string()))?;

        let topology = match get("DELEGATION_TOPOLOGY").as_deref() {
            None | Some("in_process") => DelegationTopology::InProcess,
            Some("remote") => DelegationTopology::Remote,
            Some(other) => {
                return Err(BotError::InvalidConfiguration(format!(
                    "DELEGATION_TOPOLOGY: expected `in_process` or `remote`, got `{other}`"
                )));
            }
        };

        let discipline = match get("DELEGATION_DISCIPLINE").as_deref() {
            None | Some("awaited") => DelegationDiscipline::Awaited,
            Some("detached") => DelegationDiscipline::Detached,
            Some(other) => {
                return Err(BotError::InvalidConfiguration(format!(
                    "DELEGATION_DISCIPLINE: expected `awaited` or `detached`, got `{other}`"
                )));
            }
        };

        let lock_stale_secs = match get("LOCK_STALE_SECS") {
            Some(raw) => raw.parse::<u64>().map_err(|e| {
                BotError::InvalidConfiguration(format!("LOCK_STALE_SECS: {e}"))
            })?,
            None => DEFAULT_LOCK_STALE_SECS,
        };
        if lock_stale_secs < JOB_TIME_BUDGET.as_secs() {
            return Err(BotError::InvalidConfiguration(format!(
                "LOCK_STALE_SECS: {lock_stale_secs}s is shorter than the {}s a job may take",
                JOB_TIME_BUDGET.as_secs()
            )));
        }

        Ok(Self {
            telegram_bot_token,
            telegram_api_base: validated_url(
                "TELEGRAM_API_BASE",
                get("TELEGRAM_API_BASE").unwrap_or_else(|| DEFAULT_TELEGRAM_API_BASE.to_string()),
            )?,
            openrouter_api_key: get("OPENROUTER_API_KEY"),
            vision_api_url: validated_url(
                "VISION_API_URL",
                get("VISION_API_URL").unwrap_or_else(|| DEFAULT_VISION_API_URL.to_string()),
            )?,
            vision_model: get("VISION_MODEL").unwrap_or_else(|| DEFAULT_VISION_MODEL.to_string()),
            database_url: get("DATABASE_URL"),
            worker_api_url: get("WORKER_API_URL")
                .map(|u| validated_url("WORKER_API_URL", u))
                .transpose()?,
            converter_api_url: get("CONVERTER_API_URL")
                .map(|u| validated_url("CONVERTER_API_URL", u))
                .transpose()?,
            topology,
            discipline,
            lock_stale_after: Duration::from_secs(lock_stale_secs),
        })
    }
}

/// Checks that `value` is an absolute http(s) URL and drops any trailing slash.
fn validated_url(key: &str, value: String) -> Result<String, BotError> {
    let parsed = Url::parse(&value)
        .map_err(|e| BotError::InvalidConfiguration(format!("{key}: {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(BotError::InvalidConfiguration(format!(
            "{key}: unsupported scheme `{}`",
            parsed.scheme()
        )));
    }
    Ok(value.trim_end_matches('/').to_string())
}
