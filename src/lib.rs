/// Lookout - a Telegram bot that describes photos for blind and low-vision users.
///
/// This crate implements a two-Lambda architecture:
/// 1. A webhook Lambda that acknowledges Telegram updates at once, resolves the
///    photo URL, and delegates the job
/// 2. A worker Lambda (optional) that owns the per-user lock, asks a vision model
///    for a description, converts it to speech, and delivers both
///
/// # Architecture
///
/// The system uses:
/// - AWS Lambda function URLs for serverless execution
/// - Postgres (sqlx) for the one-job-per-user lock
/// - reqwest for the Telegram Bot API, the vision endpoint and the converter
/// - openai-api-rs message types for the chat-completions payload
/// - Tokio for async runtime
///
/// # Example
///
/// ```no_run
/// use lookout::core::config::AppConfig;
/// use lookout::api::Orchestrator;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     lookout::setup_logging();
///
///     let config = AppConfig::from_lookup(|key| match key {
///         "TELEGRAM_BOT_TOKEN" => Some("123:abc".to_string()),
///         "DELEGATION_TOPOLOGY" => Some("remote".to_string()),
///         "WORKER_API_URL" => Some("https://worker.example.com".to_string()),
///         _ => None,
///     })?;
///     let orchestrator = Orchestrator::from_config(&config)?;
///
///     let update = serde_json::from_str(
///         r#"{"update_id":1,"message":{"chat":{"id":42},"text":"hi"}}"#,
///     )?;
///     if let Some(continuation) = orchestrator.accept(&update) {
///         continuation.await?;
///     }
///     Ok(())
/// }
/// ```
// Module declarations
pub mod ai;
pub mod api;
pub mod core;
pub mod errors;
pub mod lock;
pub mod telegram;
pub mod worker;

/// Configure structured logging with JSON format for AWS Lambda environments.
///
/// Honors `RUST_LOG` and falls back to `info`. Safe to call more than once;
/// only the first call installs the subscriber.
///
/// # Example
///
/// ```
/// lookout::setup_logging();
/// ```
pub fn setup_logging() {
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = fmt::layer().json().with_target(true).with_current_span(true);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}
