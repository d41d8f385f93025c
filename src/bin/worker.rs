use std::sync::Arc;

use lambda_runtime::{Error, LambdaEvent, service_fn};
use lookout::core::config::AppConfig;
use lookout::telegram::TelegramClient;
use lookout::worker::{Processor, handler};
use serde_json::Value;
use tracing::error;

#[tokio::main]
async fn main() -> Result<(), Error> {
    lookout::setup_logging();

    let config = AppConfig::from_env().map_err(|e| {
        error!("Config error: {}", e);
        Error::from(e)
    })?;
    let telegram = Arc::new(TelegramClient::new(
        config.telegram_bot_token.clone(),
        config.telegram_api_base.clone(),
    ));
    let processor = Processor::from_config(&config, telegram)?;
    let processor = &processor;

    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| async move {
        handler(processor, event).await
    }))
    .await
}
