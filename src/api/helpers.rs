//! Response builders shared by the webhook and worker handlers.

use serde_json::{Value, json};

/// Returns the `200 "OK"` acknowledgement the platform expects.
#[must_use]
pub fn ok_text() -> Value {
    text_response(200, "OK")
}

#[must_use]
pub fn method_not_allowed() -> Value {
    text_response(405, "Method Not Allowed")
}

#[must_use]
pub fn bad_request() -> Value {
    text_response(400, "Bad Request")
}

/// Returns a plain-text response with the given status code.
#[must_use]
pub fn text_response(status_code: u16, body: &str) -> Value {
    json!({
        "statusCode": status_code,
        "headers": { "Content-Type": "text/plain; charset=utf-8" },
        "body": body
    })
}

/// Returns a JSON response with the given status code.
#[must_use]
pub fn json_response(status_code: u16, body: &Value) -> Value {
    json!({
        "statusCode": status_code,
        "headers": { "Content-Type": "application/json" },
        "body": body.to_string()
    })
}

/// Returns an error response with the given status code and message.
#[must_use]
pub fn err_response(status_code: u16, message: &str) -> Value {
    json_response(status_code, &json!({ "error": message }))
}
