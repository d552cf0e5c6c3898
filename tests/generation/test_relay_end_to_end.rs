// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Full relay path: multipart request -> staging -> ReplicateClient -> stand-in API

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    routing::post,
    Json, Router,
};
use image_relay::{
    api::{create_app, AppState},
    generation::{GenerationService, ReplicateClient, ReplicateConfig, StagingArea},
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tower::util::ServiceExt;

const BOUNDARY: &str = "relay-e2e-boundary";
const OUTPUT_URL: &str = "https://replicate.delivery/xezq/e2e/output.png";

/// Stand-in API that records the `input` of each prediction and succeeds at once
async fn spawn_api(inputs: Arc<Mutex<Vec<Value>>>) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let app = Router::new().route(
        "/v1/models/:owner/:name/predictions",
        post(move |Json(body): Json<Value>| {
            let inputs = inputs.clone();
            async move {
                inputs.lock().unwrap().push(body["input"].clone());
                (
                    StatusCode::CREATED,
                    Json(json!({ "id": "e2e", "status": "succeeded", "output": OUTPUT_URL })),
                )
            }
        }),
    );

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}/v1", addr)
}

fn multipart_request(image: Option<&[u8]>) -> Request<Body> {
    let mut body = Vec::new();
    for (name, value) in [("prompt", "a red sports car on a beach"), ("aspect_ratio", "16:9")] {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }
    if let Some(bytes) = image {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"car.jpg\"\r\nContent-Type: image/jpeg\r\n\r\n",
                BOUNDARY
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method(Method::POST)
        .uri("/generate")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn relay_app(api_base: &str, staging_dir: &std::path::Path) -> Router {
    let config = ReplicateConfig::new("r8_e2e_token")
        .with_api_base(api_base)
        .with_timeout(Duration::from_secs(10))
        .with_poll_interval(Duration::from_millis(10));
    let client = ReplicateClient::new(config).unwrap();
    let service = GenerationService::new(
        Arc::new(client),
        StagingArea::new(Some(staging_dir.to_path_buf())),
    );
    create_app(AppState::new(service))
}

#[tokio::test]
async fn test_image_guided_request_relays_data_uri() {
    let inputs = Arc::new(Mutex::new(Vec::new()));
    let api_base = spawn_api(inputs.clone()).await;
    let staging = TempDir::new().unwrap();
    let app = relay_app(&api_base, staging.path()).await;

    let response = app
        .oneshot(multipart_request(Some(b"\xff\xd8\xff\xe0")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json, json!({ "generated_image_url": OUTPUT_URL }));

    let inputs = inputs.lock().unwrap().clone();
    assert_eq!(inputs.len(), 1);
    assert_eq!(inputs[0]["prompt"], "a red sports car on a beach");
    assert_eq!(inputs[0]["aspect_ratio"], "16:9");
    assert_eq!(inputs[0]["image_prompt"], "data:image/jpeg;base64,/9j/4A==");

    assert!(std::fs::read_dir(staging.path()).unwrap().next().is_none());
}

#[tokio::test]
async fn test_text_only_request_omits_image_prompt() {
    let inputs = Arc::new(Mutex::new(Vec::new()));
    let api_base = spawn_api(inputs.clone()).await;
    let staging = TempDir::new().unwrap();
    let app = relay_app(&api_base, staging.path()).await;

    let response = app.oneshot(multipart_request(None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let inputs = inputs.lock().unwrap().clone();
    assert!(inputs[0].get("image_prompt").is_none());
}
