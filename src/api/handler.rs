//! Webhook Lambda handler.
//!
//! Validates the method and body, hands the update to the orchestrator, and
//! acknowledges with `200 "OK"` without waiting for any outbound call.

use lambda_runtime::{Error, LambdaEvent};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::helpers::{bad_request, method_not_allowed, ok_text};
use super::orchestrator::Orchestrator;
use super::parsing::{request_body, request_method};
use crate::core::models::Stage;
use crate::errors::BotError;
use crate::telegram::Update;

/// Lambda handler for the Telegram webhook.
///
/// # Errors
///
/// Never fails per request; every outcome is an HTTP response value.
#[tracing::instrument(level = "info", skip(orchestrator, event))]
pub async fn function_handler(
    orchestrator: &Orchestrator,
    event: LambdaEvent<Value>,
) -> Result<Value, Error> {
    let payload = &event.payload;

    if request_method(payload).as_deref() != Some("POST") {
        return Ok(method_not_allowed());
    }

    let update = match request_body(payload).and_then(|body| parse_update(&body)) {
        Ok(update) => update,
        Err(e) => {
            warn!("Rejected webhook body: {}", e);
            return Ok(bad_request());
        }
    };

    info!(update_id = ?update.update_id, stage = %Stage::Received, "Webhook update received");

    // The continuation keeps running after this returns.
    if orchestrator.accept(&update).is_none() {
        debug!("No work for update");
    }

    Ok(ok_text())
}

/// Updates are JSON objects; serde would otherwise accept an array as an
/// all-default `Update`.
fn parse_update(body: &str) -> Result<Update, BotError> {
    let value: Value = serde_json::from_str(body)?;
    if !value.is_object() {
        return Err(BotError::ParseError(
            "update body is not a JSON object".to_string(),
        ));
    }
    Ok(serde_json::from_value(value)?)
}

pub use self::function_handler as handler;
