//! Accessors for Lambda function-URL (payload v2) and API Gateway (v1) events.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::Value;

use crate::errors::BotError;

pub fn v_path<'a>(root: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut cur = root;
    for key in path {
        cur = cur.get(*key)?;
    }
    Some(cur)
}

pub fn v_str<'a>(root: &'a Value, path: &[&str]) -> Option<&'a str> {
    v_path(root, path).and_then(|v| v.as_str())
}

/// HTTP method of the request, upper-cased.
pub fn request_method(payload: &Value) -> Option<String> {
    v_str(payload, &["requestContext", "http", "method"])
        .or_else(|| v_str(payload, &["httpMethod"]))
        .map(str::to_ascii_uppercase)
}

pub fn request_path(payload: &Value) -> Option<&str> {
    v_str(payload, &["rawPath"]).or_else(|| v_str(payload, &["path"]))
}

/// The request body as text, base64-decoded when the event says so.
///
/// # Errors
///
/// Returns `ParseError` if the body is missing, is not a string, or is not
/// valid base64 / UTF-8.
pub fn request_body(payload: &Value) -> Result<String, BotError> {
    let Some(body) = payload.get("body") else {
        return Err(BotError::ParseError("Missing body".to_string()));
    };
    let Some(body_str) = body.as_str() else {
        return Err(BotError::ParseError("Invalid body format".to_string()));
    };

    let encoded = payload
        .get("isBase64Encoded")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    if !encoded {
        return Ok(body_str.to_string());
    }

    let bytes = STANDARD
        .decode(body_str)
        .map_err(|e| BotError::ParseError(format!("Invalid base64 body: {e}")))?;
    String::from_utf8(bytes).map_err(|e| BotError::ParseError(format!("Body is not UTF-8: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn method_prefers_function_url_shape() {
        let v2 = json!({"requestContext": {"http": {"method": "post"}}, "httpMethod": "GET"});
        assert_eq!(request_method(&v2).as_deref(), Some("POST"));
        let v1 = json!({"httpMethod": "GET"});
        assert_eq!(request_method(&v1).as_deref(), Some("GET"));
        assert_eq!(request_method(&json!({})), None);
    }

    #[test]
    fn decodes_base64_bodies() {
        let payload = json!({"body": STANDARD.encode(r#"{"a":1}"#), "isBase64Encoded": true});
        assert_eq!(request_body(&payload).unwrap(), r#"{"a":1}"#);
    }

    #[test]
    fn rejects_missing_or_non_string_body() {
        assert!(request_body(&json!({})).is_err());
        assert!(request_body(&json!({"body": 5})).is_err());
    }

    #[test]
    fn path_falls_back_to_v1_field() {
        assert_eq!(request_path(&json!({"path": "/process"})), Some("/process"));
        assert_eq!(request_path(&json!({"rawPath": "/p", "path": "/q"})), Some("/p"));
    }
}
