//! Integration tests for REST API endpoints
//!
//! These tests exercise a running server against the real upstreams.
//! Run with: `cargo test --test rest_api_test -- --ignored`
//!
//! Note: These tests require a running server with BOK_API_KEY set. Set TEST_BASE_URL
//! to point to your test server, or use the default http://localhost:3010.
//! The AI tests additionally need OPENAI_API_KEY on the server and TEST_APP_KEY here.

use serde_json::{json, Value};
use std::time::Duration;

/// Helper function to get base URL from environment or use default
fn get_base_url() -> String {
    std::env::var("TEST_BASE_URL").unwrap_or_else(|_| "http://localhost:3010".to_string())
}

/// Helper function to make a GET request
async fn get_request(path: &str) -> Result<reqwest::Response, reqwest::Error> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(60))
        .build()?;
    let url = format!("{}{}", get_base_url(), path);
    client.get(&url).send().await
}

#[tokio::test]
#[ignore] // Ignore by default - requires running server
async fn test_health_endpoint() {
    let response = get_request("/health").await.unwrap();
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert!(body.get("version").is_some());
}

#[tokio::test]
#[ignore]
async fn test_metrics_endpoint() {
    // Generate at least one request first
    let _ = get_request("/health").await.unwrap();

    let response = get_request("/metrics").await.unwrap();
    assert_eq!(response.status(), 200);

    let body = response.text().await.unwrap();
    assert!(body.contains("http_requests_total"));
}

#[tokio::test]
#[ignore]
async fn test_base_rate_series() {
    let response = get_request(
        "/v1/ecos/stat-search?statCode=722Y001&cycle=D&startDate=20240101&endDate=20240131&itemCode1=0101000",
    )
    .await
    .unwrap();
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.unwrap();
    let labels = body["labels"].as_array().unwrap();
    let values = body["values"].as_array().unwrap();
    assert!(!labels.is_empty());
    assert_eq!(labels.len(), values.len());
    assert_eq!(labels[0], "2024-01-01");
}

#[tokio::test]
#[ignore]
async fn test_long_series_spans_pages() {
    // Daily base rate over several years is well beyond one page
    let response = get_request(
        "/v1/ecos/stat-search?statCode=722Y001&cycle=D&startDate=20200101&endDate=20231231&itemCode1=0101000",
    )
    .await
    .unwrap();
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.unwrap();
    let labels: Vec<String> = serde_json::from_value(body["labels"].clone()).unwrap();
    assert!(labels.len() > 100);
    assert!(labels.windows(2).all(|w| w[0] <= w[1]));
}

#[tokio::test]
#[ignore]
async fn test_key_stats_endpoint() {
    let response = get_request("/v1/ecos/key-stats").await.unwrap();
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.unwrap();
    assert!(body.get("KeyStatisticList").is_some());
}

#[tokio::test]
#[ignore]
async fn test_yahoo_chart_endpoint() {
    let response = get_request("/v1/market/yahoo-chart?symbol=%5EKS11&start=2024-01-01&end=2024-01-31")
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.unwrap();
    assert!(body["chart"]["result"][0]["timestamp"].is_array());
}

#[tokio::test]
#[ignore]
async fn test_fdr_endpoint() {
    let response = get_request("/v1/market/fdr?symbol=KOSPI&start=2024-01-01&end=2024-01-31")
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.unwrap();
    let data = body["data"].as_array().unwrap();
    assert!(!data.is_empty());
    assert!(data[0]["value"].is_number());
}

#[tokio::test]
#[ignore]
async fn test_fdr_unknown_symbol() {
    let response = get_request("/v1/market/fdr?symbol=NOPE&start=2024-01-01&end=2024-01-31")
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
#[ignore]
async fn test_chat_diagnostic() {
    let response = get_request("/v1/ai/chat").await.unwrap();
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["ok"], true);
    assert_eq!(body["where"], "openai-proxy");
}

#[tokio::test]
#[ignore]
async fn test_prompt_requires_app_key() {
    let client = reqwest::Client::new();
    let response = client
        .post(format!("{}/v1/ai/prompt", get_base_url()))
        .header("X-App-Key", "definitely-wrong")
        .json(&json!({ "prompt": "Hello" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_prompt_roundtrip() {
    let app_key = std::env::var("TEST_APP_KEY").expect("TEST_APP_KEY must be set");
    let client = reqwest::Client::new();
    let response = client
        .post(format!("{}/v1/ai/prompt", get_base_url()))
        .header("X-App-Key", app_key)
        .json(&json!({ "prompt": "Reply with the single word: ready" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.unwrap();
    assert!(body["content"].is_string());
}
