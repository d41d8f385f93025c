use lambda_runtime::{Error, LambdaEvent, service_fn};
use lookout::api::{Orchestrator, handler};
use lookout::core::config::AppConfig;
use serde_json::Value;
use tracing::error;

#[tokio::main]
async fn main() -> Result<(), Error> {
    lookout::setup_logging();

    let config = AppConfig::from_env().map_err(|e| {
        error!("Config error: {}", e);
        Error::from(e)
    })?;
    let orchestrator = Orchestrator::from_config(&config)?;
    let orchestrator = &orchestrator;

    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| async move {
        handler(orchestrator, event).await
    }))
    .await
}
