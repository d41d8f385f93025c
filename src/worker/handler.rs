use lambda_runtime::{Error, LambdaEvent};
use serde_json::{Value, json};
use tracing::{error, info, warn};

use super::processor::{Admission, Processor};
use crate::api::helpers::{err_response, json_response, method_not_allowed};
use crate::api::parsing::{request_body, request_method, request_path};
use crate::core::models::ImageJob;
use crate::errors::BotError;

/// Lambda handler for the worker's `POST /process` endpoint.
///
/// Acquires the user's lock and runs the whole pipeline inside the invocation,
/// since the Lambda environment is frozen once the response is sent. Answers
/// `200` after the job has finished and its lock is released, `429` when the
/// user is busy and has already been told to wait.
#[tracing::instrument(level = "info", skip(processor, event))]
pub async fn function_handler(
    processor: &Processor,
    event: LambdaEvent<Value>,
) -> Result<Value, Error> {
    let payload = &event.payload;

    if !request_path(payload).is_some_and(|p| p.trim_end_matches('/').ends_with("/process")) {
        return Ok(err_response(404, "Not Found"));
    }
    if request_method(payload).as_deref() != Some("POST") {
        return Ok(method_not_allowed());
    }

    let job: ImageJob = match request_body(payload)
        .and_then(|body| serde_json::from_str::<ImageJob>(&body).map_err(BotError::from))
    {
        Ok(job) => job,
        Err(e) => {
            warn!("Rejected /process body: {}", e);
            return Ok(err_response(400, &e.to_string()));
        }
    };

    info!(chat_id = job.chat_id, "Worker received image job");

    match processor.admit(job.chat_id).await {
        Ok(Admission::Acquired(lease)) => {
            processor.run(lease, job).await;
            Ok(json_response(200, &json!({ "status": "done" })))
        }
        Ok(Admission::Busy) => Ok(json_response(429, &json!({ "status": "busy" }))),
        Err(e) => {
            error!(chat_id = job.chat_id, "Worker cannot take job: {}", e);
            Ok(err_response(500, &e.to_string()))
        }
    }
}

pub use self::function_handler as handler;
