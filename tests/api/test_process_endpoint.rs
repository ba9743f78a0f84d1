// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! POST /process tests
//!
//! Drives the full router with in-process fakes for the vision and speech
//! services and checks status codes, headers and error bodies.

use axum::http::{header, Method, Request, StatusCode};
use axum::body::Body;
use sightsync_node::api::HttpOptions;
use std::sync::{atomic::Ordering, Arc};
use tower::util::ServiceExt;

use super::support::*;

#[tokio::test]
async fn test_valid_image_returns_mp3_attachment() {
    let describer = Arc::new(SizeDescriber::default());
    let narrator = Arc::new(EchoNarrator::default());
    let app = app_with(describer.clone(), narrator.clone());

    let response = app.oneshot(image_upload(&png_bytes(32, 16))).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "audio/mpeg");
    let disposition = response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.starts_with("attachment"));
    assert!(disposition.contains("description.mp3"));

    let audio = body_bytes(response).await;
    assert!(!audio.is_empty());
    assert_eq!(audio, EchoNarrator::audio_for("A picture 32 by 16 pixels."));
    assert_eq!(describer.calls.load(Ordering::SeqCst), 1);
    assert_eq!(narrator.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_missing_image_field_is_400() {
    let describer = Arc::new(SizeDescriber::default());
    let app = app_with(describer.clone(), Arc::new(EchoNarrator::default()));

    let body = multipart_body("file", "photo.png", &png_bytes(4, 4));
    let response = app.oneshot(process_request(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await,
        serde_json::json!({"error": "No image file provided"})
    );
    assert_eq!(describer.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_non_multipart_body_is_400() {
    let app = app_with(
        Arc::new(SizeDescriber::default()),
        Arc::new(EchoNarrator::default()),
    );

    let request = Request::builder()
        .method(Method::POST)
        .uri("/process")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"image": "nope"}"#))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await,
        serde_json::json!({"error": "No image file provided"})
    );
}

#[tokio::test]
async fn test_text_file_is_rejected_before_describing() {
    let describer = Arc::new(SizeDescriber::default());
    let app = app_with(describer.clone(), Arc::new(EchoNarrator::default()));

    let body = multipart_body("image", "notes.txt", b"just some plain text, not a picture");
    let response = app.oneshot(process_request(body)).await.unwrap();

    assert_ne!(response.status(), StatusCode::OK);
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await,
        serde_json::json!({"error": "Invalid image file"})
    );
    assert_eq!(describer.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_describer_failure_is_generic_500() {
    let narrator = Arc::new(EchoNarrator::default());
    let app = app_with(Arc::new(FailingDescriber), narrator.clone());

    let response = app.oneshot(image_upload(&png_bytes(8, 8))).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_bytes(response).await;
    let text = String::from_utf8(body.clone()).unwrap();
    assert!(!text.contains("sk-live-secret"));
    assert!(!text.contains("401"));
    assert_eq!(
        serde_json::from_slice::<serde_json::Value>(&body).unwrap(),
        serde_json::json!({"error": "An internal server error occurred"})
    );
    // Narration never starts when the description fails
    assert_eq!(narrator.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_narrator_failure_is_generic_500() {
    let app = app_with(Arc::new(SizeDescriber::default()), Arc::new(FailingNarrator));

    let response = app.oneshot(image_upload(&png_bytes(8, 8))).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(response).await,
        serde_json::json!({"error": "An internal server error occurred"})
    );
}

#[tokio::test]
async fn test_oversized_upload_is_413() {
    let options = HttpOptions {
        max_upload_bytes: 2 * 1024,
        ..HttpOptions::default()
    };
    let describer = Arc::new(SizeDescriber::default());
    let app = app_with_options(describer.clone(), Arc::new(EchoNarrator::default()), &options);

    // Larger than the image limit but inside the multipart allowance
    let mut data = png_bytes(4, 4);
    data.resize(8 * 1024, 0);
    let response = app.oneshot(image_upload(&data)).await.unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(
        body_json(response).await,
        serde_json::json!({"error": "Image file is too large"})
    );
    assert_eq!(describer.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_body_over_transport_limit_is_413() {
    let options = HttpOptions {
        max_upload_bytes: 2 * 1024,
        ..HttpOptions::default()
    };
    let describer = Arc::new(SizeDescriber::default());
    let app = app_with_options(describer.clone(), Arc::new(EchoNarrator::default()), &options);

    // Past the multipart allowance, so the body limit trips while streaming
    let data = vec![0x42u8; 200 * 1024];
    let response = app.oneshot(image_upload(&data)).await.unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(
        body_json(response).await,
        serde_json::json!({"error": "Image file is too large"})
    );
    assert_eq!(describer.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_huge_dimensions_are_rejected_without_describing() {
    let describer = Arc::new(SizeDescriber::default());
    let app = app_with(describer.clone(), Arc::new(EchoNarrator::default()));

    // Blank pixels compress to roughly a megabyte
    let data = blank_png(16_000, 16_000);
    assert!(data.len() < 10 * 1024 * 1024);
    let response = app.oneshot(image_upload(&data)).await.unwrap();

    assert!(response.status().is_client_error());
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(
        body_json(response).await,
        serde_json::json!({"error": "Image file is too large"})
    );
    assert_eq!(describer.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_cors_origin_list_is_enforced() {
    let options = HttpOptions {
        cors_allowed_origins: vec!["http://app.example".to_string()],
        ..HttpOptions::default()
    };
    let app = app_with_options(
        Arc::new(SizeDescriber::default()),
        Arc::new(EchoNarrator::default()),
        &options,
    );

    let preflight = |origin: &str| {
        Request::builder()
            .method(Method::OPTIONS)
            .uri("/process")
            .header("origin", origin)
            .header("access-control-request-method", "POST")
            .body(Body::empty())
            .unwrap()
    };

    let allowed = app
        .clone()
        .oneshot(preflight("http://app.example"))
        .await
        .unwrap();
    assert_eq!(
        allowed.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://app.example"
    );

    let denied = app.oneshot(preflight("http://evil.example")).await.unwrap();
    assert!(!denied
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
}

#[tokio::test]
async fn test_get_process_is_method_not_allowed() {
    let app = app_with(
        Arc::new(SizeDescriber::default()),
        Arc::new(EchoNarrator::default()),
    );

    let request = Request::builder()
        .method(Method::GET)
        .uri("/process")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_cors_preflight_is_permitted() {
    let app = app_with(
        Arc::new(SizeDescriber::default()),
        Arc::new(EchoNarrator::default()),
    );

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/process")
        .header("origin", "http://localhost:3000")
        .header("access-control-request-method", "POST")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert!(response.status().is_success());
    assert!(response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
}
