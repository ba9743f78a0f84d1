// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Concurrent uploads must each get the audio for their own image

use axum::http::StatusCode;
use futures_util::future::join_all;
use std::sync::{atomic::Ordering, Arc};
use tower::util::ServiceExt;

use super::support::*;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_uploads_are_paired_with_their_audio() {
    let describer = Arc::new(SizeDescriber::default());
    let narrator = Arc::new(EchoNarrator::default());
    let app = app_with(describer.clone(), narrator.clone());

    let sizes: Vec<(u32, u32)> = (1..=10).map(|i| (i * 3, i * 2 + 1)).collect();

    let requests = sizes.iter().map(|&(width, height)| {
        let app = app.clone();
        async move {
            let response = app
                .oneshot(image_upload(&png_bytes(width, height)))
                .await
                .unwrap();
            let status = response.status();
            (width, height, status, body_bytes(response).await)
        }
    });

    let results = join_all(requests).await;

    assert_eq!(results.len(), 10);
    for (width, height, status, audio) in results {
        assert_eq!(status, StatusCode::OK);
        let expected = format!("A picture {} by {} pixels.", width, height);
        assert_eq!(audio, EchoNarrator::audio_for(&expected));
    }
    assert_eq!(describer.calls.load(Ordering::SeqCst), 10);
    assert_eq!(narrator.calls.load(Ordering::SeqCst), 10);
}

#[tokio::test]
async fn test_failure_does_not_affect_other_requests() {
    let good = app_with(
        Arc::new(SizeDescriber::default()),
        Arc::new(EchoNarrator::default()),
    );
    let bad = app_with(Arc::new(FailingDescriber), Arc::new(EchoNarrator::default()));

    let (ok, failed) = tokio::join!(
        good.oneshot(image_upload(&png_bytes(5, 7))),
        bad.oneshot(image_upload(&png_bytes(5, 7))),
    );

    let ok = ok.unwrap();
    assert_eq!(ok.status(), StatusCode::OK);
    assert_eq!(
        body_bytes(ok).await,
        EchoNarrator::audio_for("A picture 5 by 7 pixels.")
    );
    assert_eq!(failed.unwrap().status(), StatusCode::INTERNAL_SERVER_ERROR);
}
