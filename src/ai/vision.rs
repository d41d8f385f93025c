//! Vision description client (OpenRouter chat completions)
//!
//! Builds a single-turn prompt carrying the image URL and turns the provider's
//! answer, or its failure, into a typed result.

use async_trait::async_trait;
use openai_api_rs::v1::chat_completion::{
    ChatCompletionMessage, Content, ContentType, ImageUrl, ImageUrlType, MessageRole,
};
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{info, warn};

use crate::core::ports::Describer;
use crate::errors::BotError;

/// Longest slice of an error body kept in logs and error values.
const ERROR_BODY_PREVIEW: usize = 300;

/// Per-request limit for one description call.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(40);

const DESCRIPTION_PROMPT: &str = "Describe this image in as much detail as possible for a blind \
or low-vision person. Cover the setting and the spatial layout (what is in front, behind, left, \
right), people and their expressions, objects, colours, lighting, and any visible text. Be \
faithful: never invent details that are not in the image and do not leave out anything important.";

pub struct VisionClient {
    api_key: Option<String>,
    endpoint: String,
    model_name: String,
    http: Client,
}

impl VisionClient {
    #[must_use]
    pub fn new(api_key: Option<String>, endpoint: String, model_name: String) -> Self {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            api_key,
            endpoint,
            model_name,
            http,
        }
    }

    #[must_use]
    pub fn build_prompt(&self, image_url: &str) -> Vec<ChatCompletionMessage> {
        vec![ChatCompletionMessage {
            role: MessageRole::user,
            content: Content::ImageUrl(vec![
                ImageUrl {
                    r#type: ContentType::text,
                    text: Some(DESCRIPTION_PROMPT.to_string()),
                    image_url: None,
                },
                ImageUrl {
                    r#type: ContentType::image_url,
                    text: None,
                    image_url: Some(ImageUrlType {
                        url: image_url.to_string(),
                    }),
                },
            ]),
            name: None,
            tool_calls: None,
            tool_call_id: None,
        }]
    }
}

#[async_trait]
impl Describer for VisionClient {
    async fn describe(&self, image_url: &str) -> Result<String, BotError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(BotError::ConfigurationMissing(
                "OPENROUTER_API_KEY".to_string(),
            ));
        };

        let prompt = self.build_prompt(image_url);
        let request_body = build_chat_payload(&self.model_name, &prompt);

        #[cfg(feature = "debug-logs")]
        info!("Vision request body: {}", request_body);

        #[cfg(not(feature = "debug-logs"))]
        info!(model = %self.model_name, "Requesting image description");

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                BotError::NetworkError(format!("Vision API request failed: {}", e.without_url()))
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            BotError::NetworkError(format!(
                "Failed to read vision response (status {status}): {}",
                e.without_url()
            ))
        })?;

        if !status.is_success() {
            let err = classify_failure(status, &body);
            warn!("Vision API error: {}", err);
            return Err(err);
        }

        let parsed: Value = serde_json::from_str(&body).map_err(|e| {
            BotError::UpstreamError(format!("Vision API returned invalid JSON: {e}"))
        })?;
        extract_description(&parsed)
    }
}

/// Chat-completions request body for the given prompt.
pub(crate) fn build_chat_payload(model: &str, prompt: &[ChatCompletionMessage]) -> Value {
    let messages: Vec<Value> = prompt
        .iter()
        .map(|m| {
            let role = match m.role {
                MessageRole::system => "system",
                MessageRole::user | MessageRole::function | MessageRole::tool => "user",
                MessageRole::assistant => "assistant",
            };

            let content = match &m.content {
                Content::Text(t) => Value::String(t.clone()),
                Content::ImageUrl(parts) => Value::Array(
                    parts
                        .iter()
                        .filter_map(|part| {
                            if let Some(ref iu) = part.image_url {
                                Some(json!({ "type": "image_url", "image_url": { "url": iu.url } }))
                            } else {
                                part.text
                                    .as_ref()
                                    .map(|t| json!({ "type": "text", "text": t }))
                            }
                        })
                        .collect(),
                ),
            };

            json!({ "role": role, "content": content })
        })
        .collect();

    json!({ "model": model, "messages": messages })
}

/// Map a non-2xx vision response to the error taxonomy.
pub(crate) fn classify_failure(status: StatusCode, body: &str) -> BotError {
    let preview: String = body.chars().take(ERROR_BODY_PREVIEW).collect();
    if status == StatusCode::TOO_MANY_REQUESTS {
        BotError::UpstreamRateLimited(format!("status {status}: {preview}"))
    } else {
        BotError::UpstreamError(format!("status {status}: {preview}"))
    }
}

/// Pull `choices[0].message.content` out of a 2xx body.
///
/// OpenRouter sometimes answers 200 with an `error` object instead of choices;
/// an embedded 429 code is still a rate limit.
pub(crate) fn extract_description(body: &Value) -> Result<String, BotError> {
    if let Some(err) = body.get("error") {
        let message = err
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown error")
            .to_string();
        return Err(match err.get("code").and_then(Value::as_i64) {
            Some(429) => BotError::UpstreamRateLimited(message),
            _ => BotError::UpstreamError(message),
        });
    }

    body.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .ok_or_else(|| BotError::UpstreamError("Vision API returned no description".to_string()))
}
