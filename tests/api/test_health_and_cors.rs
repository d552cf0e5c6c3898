// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Tests for GET /health and the CORS policy

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
};
use image_relay::api::create_app;
use tempfile::TempDir;
use tower::util::ServiceExt;

use super::support::{json_body, state_with, MockProvider};

fn preflight(origin: &str) -> Request<Body> {
    Request::builder()
        .method(Method::OPTIONS)
        .uri("/generate")
        .header("origin", origin)
        .header("access-control-request-method", "POST")
        .header("access-control-request-headers", "content-type")
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_health_reports_provider() {
    let staging = TempDir::new().unwrap();
    let app = create_app(state_with(MockProvider::succeeding(), staging.path()));

    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["provider"], "mock");
    assert_eq!(json["version"], image_relay::version::VERSION_NUMBER);
}

#[tokio::test]
async fn test_preflight_from_default_origin_allowed() {
    let staging = TempDir::new().unwrap();
    let app = create_app(state_with(MockProvider::succeeding(), staging.path()));

    let response = app.oneshot(preflight("http://localhost:3000")).await.unwrap();

    assert!(response.status().is_success());
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .unwrap(),
        "http://localhost:3000"
    );
}

#[tokio::test]
async fn test_preflight_from_unlisted_origin_not_allowed() {
    let staging = TempDir::new().unwrap();
    let app = create_app(state_with(MockProvider::succeeding(), staging.path()));

    let response = app.oneshot(preflight("https://evil.example")).await.unwrap();

    assert!(response
        .headers()
        .get("access-control-allow-origin")
        .is_none());
}

#[tokio::test]
async fn test_configured_origins_allowed() {
    let staging = TempDir::new().unwrap();
    let state = state_with(MockProvider::succeeding(), staging.path()).with_cors_origins(vec![
        "https://app.example.com".to_string(),
        "https://admin.example.com".to_string(),
    ]);
    let app = create_app(state);

    let response = app
        .clone()
        .oneshot(preflight("https://admin.example.com"))
        .await
        .unwrap();
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .unwrap(),
        "https://admin.example.com"
    );

    let response = app.oneshot(preflight("http://localhost:3000")).await.unwrap();
    assert!(response
        .headers()
        .get("access-control-allow-origin")
        .is_none());
}

#[tokio::test]
async fn test_wildcard_origin_allows_any() {
    let staging = TempDir::new().unwrap();
    let state =
        state_with(MockProvider::succeeding(), staging.path()).with_cors_origins(vec!["*".into()]);
    let app = create_app(state);

    let response = app.oneshot(preflight("https://anywhere.example")).await.unwrap();
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .unwrap(),
        "*"
    );
}
