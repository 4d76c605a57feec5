//! Model router integration tests.
//!
//! Run with: `cargo test -p vidchat-api --test models_test`

mod helpers;

use serde_json::{json, Value};
use vidchat_core::models::JobState;

use helpers::auth::{bearer, ALICE};
use helpers::setup_test_app;

fn hello_prompt() -> Value {
    json!({
        "prompt": [
            { "role": "user", "content": [{ "type": "text", "text": "hello video world" }] }
        ]
    })
}

#[tokio::test]
async fn test_list_models() {
    let app = setup_test_app(vec![JobState::Active]).await;
    let client = app.client();

    let response = client
        .get("/api/models")
        .add_header("Authorization", bearer(ALICE))
        .await;

    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["defaultModel"], "chat-model-small");
    assert_eq!(body["chatModels"][0]["id"], "video-model");
}

#[tokio::test]
async fn test_models_require_session() {
    let app = setup_test_app(vec![JobState::Active]).await;
    let client = app.client();

    let response = client.get("/api/models").await;

    assert_eq!(response.status_code(), 401);
}

#[tokio::test]
async fn test_unknown_model() {
    let app = setup_test_app(vec![JobState::Active]).await;
    let client = app.client();

    let response = client
        .post("/api/models/gpt-9/stream")
        .add_header("Authorization", bearer(ALICE))
        .json(&hello_prompt())
        .await;

    assert_eq!(response.status_code(), 404);
    let body: Value = response.json();
    assert_eq!(body["code"], "MODEL_NOT_FOUND");
    assert_eq!(body["error"], "Unknown model: gpt-9");
}

#[tokio::test]
async fn test_video_model_is_stream_only() {
    let app = setup_test_app(vec![JobState::Active]).await;
    let client = app.client();

    let response = client
        .post("/api/models/video-model/generate")
        .add_header("Authorization", bearer(ALICE))
        .json(&hello_prompt())
        .await;

    assert_eq!(response.status_code(), 501);
    let body: Value = response.json();
    assert_eq!(body["code"], "NOT_SUPPORTED");
}

#[tokio::test]
async fn test_generate() {
    let app = setup_test_app(vec![JobState::Active]).await;
    let client = app.client();

    let response = client
        .post("/api/models/chat-model-small/generate")
        .add_header("Authorization", bearer(ALICE))
        .json(&hello_prompt())
        .await;

    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["text"], "hello video world");
    assert_eq!(body["finishReason"], "stop");
}

#[tokio::test]
async fn test_stream_emits_deltas_then_finish() {
    let app = setup_test_app(vec![JobState::Active]).await;
    let client = app.client();

    let response = client
        .post("/api/models/chat-model-small/stream")
        .add_header("Authorization", bearer(ALICE))
        .json(&hello_prompt())
        .await;

    assert_eq!(response.status_code(), 200);
    let text = response.text();
    let events: Vec<Value> = text
        .lines()
        .filter_map(|line| line.strip_prefix("data: "))
        .map(|data| serde_json::from_str(data).expect("Invalid event payload"))
        .collect();

    assert_eq!(events.len(), 4);
    assert_eq!(events[0], json!({ "type": "text-delta", "textDelta": "hello " }));
    assert_eq!(events[2]["textDelta"], "world");
    assert_eq!(events[3]["type"], "finish");
    assert_eq!(events[3]["finishReason"], "stop");
}

#[tokio::test]
async fn test_malformed_call_options() {
    let app = setup_test_app(vec![JobState::Active]).await;
    let client = app.client();

    let response = client
        .post("/api/models/chat-model-small/generate")
        .add_header("Authorization", bearer(ALICE))
        .json(&json!({ "prompt": "not a list" }))
        .await;

    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(body["code"], "INVALID_INPUT");
}

#[tokio::test]
async fn test_image_count_is_bounded() {
    let app = setup_test_app(vec![JobState::Active]).await;
    let client = app.client();

    let response = client
        .post("/api/models/image-model/images")
        .add_header("Authorization", bearer(ALICE))
        .json(&json!({ "prompt": "a cat", "n": 9 }))
        .await;
    assert_eq!(response.status_code(), 400);

    let response = client
        .post("/api/models/image-model/images")
        .add_header("Authorization", bearer(ALICE))
        .json(&json!({ "prompt": "a cat" }))
        .await;
    assert_eq!(response.status_code(), 404);
}

#[tokio::test]
async fn test_public_routes() {
    let app = setup_test_app(vec![JobState::Active]).await;
    let client = app.client();

    let health = client.get("/health").await;
    assert_eq!(health.status_code(), 200);
    let body: Value = health.json();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["storage"], "healthy");

    let openapi = client.get("/api/openapi.json").await;
    assert_eq!(openapi.status_code(), 200);
    let doc: Value = openapi.json();
    assert!(doc["paths"]["/api/files/upload"].is_object());
}
