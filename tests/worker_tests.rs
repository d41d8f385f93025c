mod common;

use lambda_runtime::{Context, LambdaEvent};
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use common::{MemoryLockStore, RecordingNotifier, ScriptedDescriber, processor};
use lookout::core::ports::Notifier;
use lookout::telegram::messages;
use lookout::worker::{Processor, handler};

fn request(method: &str, path: &str, body: &str) -> LambdaEvent<Value> {
    LambdaEvent::new(
        json!({
            "rawPath": path,
            "requestContext": { "http": { "method": method } },
            "body": body
        }),
        Context::default(),
    )
}

fn body_json(response: &Value) -> Value {
    serde_json::from_str(response["body"].as_str().unwrap()).unwrap()
}

const JOB: &str = r#"{"image_url":"https://files.example/b.jpg","chat_id":7}"#;

#[tokio::test]
async fn job_finishes_and_releases_before_the_response() {
    let store = Arc::new(MemoryLockStore::default());
    let notifier = Arc::new(RecordingNotifier::default());
    let processor = processor(&store, &notifier, Arc::new(ScriptedDescriber::ok()), None);

    let response = handler(&processor, request("POST", "/process", JOB))
        .await
        .unwrap();

    assert_eq!(response["statusCode"], 200);
    assert_eq!(body_json(&response), json!({ "status": "done" }));
    assert_eq!(store.releases.load(Ordering::SeqCst), 1);
    assert_eq!(notifier.count(), 3);
    assert_eq!(
        notifier.texts().first().map(String::as_str),
        Some(messages::PROCESSING_STARTED)
    );
    assert!(!store.holds(7));
}

#[tokio::test]
async fn busy_user_gets_429() {
    let store = Arc::new(MemoryLockStore::default());
    store.insert_at(7, chrono::Utc::now());
    let notifier = Arc::new(RecordingNotifier::default());
    let processor = processor(&store, &notifier, Arc::new(ScriptedDescriber::ok()), None);

    let response = handler(&processor, request("POST", "/process", JOB))
        .await
        .unwrap();

    assert_eq!(response["statusCode"], 429);
    assert_eq!(body_json(&response), json!({ "status": "busy" }));
    assert_eq!(notifier.texts(), vec![messages::PLEASE_WAIT.to_string()]);
}

#[tokio::test]
async fn missing_lock_store_is_a_server_error() {
    let notifier = Arc::new(RecordingNotifier::default());
    let processor = Processor::new(
        None,
        notifier.clone() as Arc<dyn Notifier>,
        Arc::new(ScriptedDescriber::ok()),
        None,
        Duration::from_secs(120),
    );

    let response = handler(&processor, request("POST", "/process", JOB))
        .await
        .unwrap();

    assert_eq!(response["statusCode"], 500);
    assert_eq!(notifier.count(), 0);
}

#[tokio::test]
async fn routing_and_validation() {
    let store = Arc::new(MemoryLockStore::default());
    let notifier = Arc::new(RecordingNotifier::default());
    let processor = processor(&store, &notifier, Arc::new(ScriptedDescriber::ok()), None);

    let not_found = handler(&processor, request("POST", "/other", JOB)).await.unwrap();
    assert_eq!(not_found["statusCode"], 404);

    let wrong_method = handler(&processor, request("GET", "/process", "")).await.unwrap();
    assert_eq!(wrong_method["statusCode"], 405);

    let bad_body = handler(&processor, request("POST", "/process", r#"{"chat_id":"x"}"#))
        .await
        .unwrap();
    assert_eq!(bad_body["statusCode"], 400);

    assert_eq!(store.schema_calls.load(Ordering::SeqCst), 0);
    assert_eq!(notifier.count(), 0);
}

#[tokio::test]
async fn stage_prefixed_path_is_routed() {
    let store = Arc::new(MemoryLockStore::default());
    let notifier = Arc::new(RecordingNotifier::default());
    let processor = processor(&store, &notifier, Arc::new(ScriptedDescriber::ok()), None);

    let response = handler(&processor, request("POST", "/prod/process/", JOB))
        .await
        .unwrap();

    assert_eq!(response["statusCode"], 200);
    assert_eq!(store.releases.load(Ordering::SeqCst), 1);
}
