// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! VlmClient and VisionDescriber against a fake chat completions server

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use image::{DynamicImage, ImageBuffer, Rgb};
use serde_json::{json, Value};
use sightsync_node::vision::{
    DescribeError, Describer, DescriberConfig, VisionDescriber, VlmClient, VlmClientConfig,
    DEFAULT_DESCRIBE_PROMPT,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone, Default)]
struct Recorded {
    requests: Arc<Mutex<Vec<(Option<String>, Value)>>>,
}

async fn spawn_upstream(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn chat_ok(
    State(recorded): State<Recorded>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    recorded.requests.lock().unwrap().push((auth, body));
    Json(json!({
        "choices": [{"message": {"role": "assistant", "content": "  A red kite over a green field.  "}}],
        "usage": {"prompt_tokens": 850, "completion_tokens": 9, "total_tokens": 859}
    }))
}

fn client_for(endpoint: &str, timeout: Duration) -> VlmClient {
    VlmClient::new(VlmClientConfig {
        endpoint: endpoint.to_string(),
        model_name: "gpt-4o-mini".to_string(),
        api_key: "sk-test-key".to_string(),
        timeout,
    })
    .unwrap()
}

fn test_image() -> DynamicImage {
    DynamicImage::ImageRgb8(ImageBuffer::from_fn(24, 12, |x, _| {
        Rgb([(x * 10) as u8, 40, 200])
    }))
}

#[tokio::test]
async fn test_describe_sends_openai_chat_request() {
    let recorded = Recorded::default();
    let app = Router::new()
        .route("/v1/chat/completions", post(chat_ok))
        .with_state(recorded.clone());
    let base = spawn_upstream(app).await;

    let client = client_for(&base, Duration::from_secs(5));
    let result = client
        .describe("data:image/jpeg;base64,AAAA", "Describe this.", 75)
        .await
        .unwrap();

    assert_eq!(result.description, "A red kite over a green field.");
    assert_eq!(result.model, "gpt-4o-mini");
    assert_eq!(result.tokens_used, 859);

    let requests = recorded.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    let (auth, body) = &requests[0];
    assert_eq!(auth.as_deref(), Some("Bearer sk-test-key"));
    assert_eq!(body["model"], "gpt-4o-mini");
    assert_eq!(body["max_tokens"], 75);
    assert_eq!(body["messages"][0]["role"], "user");
    let content = &body["messages"][0]["content"];
    assert_eq!(content[0]["type"], "text");
    assert_eq!(content[0]["text"], "Describe this.");
    assert_eq!(content[1]["type"], "image_url");
    assert_eq!(content[1]["image_url"]["url"], "data:image/jpeg;base64,AAAA");
}

#[tokio::test]
async fn test_vision_describer_uploads_jpeg_data_url() {
    let recorded = Recorded::default();
    let app = Router::new()
        .route("/v1/chat/completions", post(chat_ok))
        .with_state(recorded.clone());
    let base = spawn_upstream(app).await;

    let describer = VisionDescriber::new(
        client_for(&base, Duration::from_secs(5)),
        DescriberConfig::default(),
    );
    let description = describer.describe(test_image()).await.unwrap();
    assert_eq!(description, "A red kite over a green field.");

    let requests = recorded.requests.lock().unwrap();
    let body = &requests[0].1;
    assert_eq!(body["max_tokens"], 75);
    assert_eq!(body["messages"][0]["content"][0]["text"], DEFAULT_DESCRIBE_PROMPT);
    let url = body["messages"][0]["content"][1]["image_url"]["url"]
        .as_str()
        .unwrap();
    assert!(url.starts_with("data:image/jpeg;base64,"));
    assert!(url.len() > "data:image/jpeg;base64,".len());
}

#[tokio::test]
async fn test_upstream_error_status_is_reported() {
    let app = Router::new().route(
        "/v1/chat/completions",
        post(|| async {
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({"error": {"message": "Incorrect API key provided"}})),
            )
        }),
    );
    let base = spawn_upstream(app).await;

    let err = client_for(&base, Duration::from_secs(5))
        .describe("data:image/jpeg;base64,AAAA", "Describe this.", 75)
        .await
        .unwrap_err();

    match err {
        DescribeError::Upstream { status, body } => {
            assert_eq!(status, 401);
            assert!(body.contains("Incorrect API key"));
        }
        other => panic!("expected upstream error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_null_content_is_empty_description() {
    let app = Router::new().route(
        "/v1/chat/completions",
        post(|| async {
            Json(json!({"choices": [{"message": {"role": "assistant", "content": null}}]}))
        }),
    );
    let base = spawn_upstream(app).await;

    let err = client_for(&base, Duration::from_secs(5))
        .describe("data:image/jpeg;base64,AAAA", "Describe this.", 75)
        .await
        .unwrap_err();
    assert!(matches!(err, DescribeError::EmptyDescription));
}

#[tokio::test]
async fn test_no_choices_is_reported() {
    let app = Router::new().route(
        "/v1/chat/completions",
        post(|| async { Json(json!({"choices": []})) }),
    );
    let base = spawn_upstream(app).await;

    let err = client_for(&base, Duration::from_secs(5))
        .describe("data:image/jpeg;base64,AAAA", "Describe this.", 75)
        .await
        .unwrap_err();
    assert!(matches!(err, DescribeError::NoChoices));
}

#[tokio::test]
async fn test_non_json_body_is_malformed() {
    let app = Router::new().route(
        "/v1/chat/completions",
        post(|| async { "<html>gateway</html>".into_response() }),
    );
    let base = spawn_upstream(app).await;

    let err = client_for(&base, Duration::from_secs(5))
        .describe("data:image/jpeg;base64,AAAA", "Describe this.", 75)
        .await
        .unwrap_err();
    assert!(matches!(err, DescribeError::MalformedResponse(_)));
}

#[tokio::test]
async fn test_slow_upstream_times_out() {
    let app = Router::new().route(
        "/v1/chat/completions",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!({"choices": []}))
        }),
    );
    let base = spawn_upstream(app).await;

    let err = client_for(&base, Duration::from_millis(200))
        .describe("data:image/jpeg;base64,AAAA", "Describe this.", 75)
        .await
        .unwrap_err();
    match err {
        DescribeError::Transport(e) => assert!(e.is_timeout()),
        other => panic!("expected timeout, got {:?}", other),
    }
}
