//! End-to-end tests for the statistics endpoints
//!
//! A fake ECOS server runs on an ephemeral port and the real router is served
//! in front of it, so these tests need no network access or API key.
//! Run with: `cargo test --test stat_search_test`

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{Duration, NaiveDate};
use macro_data_gateway::api::routes::create_router;
use macro_data_gateway::api::state::AppState;
use macro_data_gateway::config::AppConfig;
use macro_data_gateway::infrastructure::Secrets;
use metrics_exporter_prometheus::PrometheusBuilder;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

const API_KEY: &str = "test-key";

type Calls = Arc<Mutex<Vec<(String, usize, usize)>>>;

/// Row `index` (1-based) of the 250-row series, served newest first.
fn multi_row(index: usize) -> Value {
    let base = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
    let date = base + Duration::days((250 - index) as i64);
    let value = if index % 50 == 0 {
        "-".to_string()
    } else {
        format!("{}.25", index)
    };
    json!({ "TIME": date.format("%Y%m%d").to_string(), "DATA_VALUE": value })
}

fn container(total: Value, rows: Vec<Value>) -> Value {
    json!({ "StatisticSearch": { "list_total_count": total, "row": rows } })
}

async fn statistic_search(
    Path((key, start, end, rest)): Path<(String, usize, usize, String)>,
    State(calls): State<Calls>,
) -> Response {
    if key != API_KEY {
        return (StatusCode::UNAUTHORIZED, "bad key").into_response();
    }
    let stat_code = rest.split('/').next().unwrap_or_default().to_string();
    calls.lock().unwrap().push((stat_code.clone(), start, end));

    match stat_code.as_str() {
        "722Y001" => {
            assert_eq!(rest, "722Y001/D/20240101/20240105/0101000");
            Json(container(
                json!(3),
                vec![
                    json!({"TIME": "20240103", "DATA_VALUE": "3.50"}),
                    json!({"TIME": "20240101", "DATA_VALUE": "3.25"}),
                    json!({"TIME": "20240102", "DATA_VALUE": "bad"}),
                ],
            ))
            .into_response()
        }
        "MULTI" => {
            let rows = (start..=end.min(250)).map(multi_row).collect();
            // Later pages report a different count; only page 1 is authoritative
            let total = if start == 1 { json!("250") } else { json!(9999) };
            Json(container(total, rows)).into_response()
        }
        "MONTHLY" => Json(container(
            json!(2),
            vec![
                json!({"TIME": "202402", "DATA_VALUE": "1.1"}),
                json!({"TIME": "202401", "DATA_VALUE": "1.0"}),
            ],
        ))
        .into_response(),
        "NOBOX" => Json(json!({
            "RESULT": { "CODE": "INFO-200", "MESSAGE": "No matching data" }
        }))
        .into_response(),
        "HUGE" => Json(container(json!("18446744073709551616"), vec![multi_row(1)])).into_response(),
        "SLOW" => {
            tokio::time::sleep(std::time::Duration::from_secs(3)).await;
            Json(container(json!(1), vec![multi_row(1)])).into_response()
        }
        "SLOWTAIL" if start > 1 => {
            tokio::time::sleep(std::time::Duration::from_secs(3)).await;
            Json(container(json!(150), vec![])).into_response()
        }
        "SLOWTAIL" => {
            let rows = (start..=end).map(multi_row).collect();
            Json(container(json!(150), rows)).into_response()
        }
        "BROKEN" if start > 1 => (StatusCode::SERVICE_UNAVAILABLE, "maintenance").into_response(),
        "BROKEN" => {
            let rows = (start..=end).map(multi_row).collect();
            Json(container(json!(150), rows)).into_response()
        }
        _ => (StatusCode::NOT_FOUND, "unknown table").into_response(),
    }
}

async fn key_statistic_list(Path((key, start, end)): Path<(String, usize, usize)>) -> Response {
    assert_eq!(key, API_KEY);
    assert_eq!((start, end), (1, 100));
    Json(json!({
        "KeyStatisticList": {
            "list_total_count": 1,
            "row": [{ "KEYSTAT_NAME": "Base rate", "DATA_VALUE": "3.5" }]
        }
    }))
    .into_response()
}

async fn serve(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

struct TestApp {
    base_url: String,
    calls: Calls,
    client: reqwest::Client,
}

impl TestApp {
    async fn spawn(bok_api_key: Option<&str>) -> Self {
        Self::spawn_with(bok_api_key, |_| {}).await
    }

    async fn spawn_with(bok_api_key: Option<&str>, configure: impl FnOnce(&mut AppConfig)) -> Self {
        let calls: Calls = Arc::default();
        let upstream = Router::new()
            .route(
                "/api/StatisticSearch/{key}/json/kr/{start}/{end}/{*rest}",
                get(statistic_search),
            )
            .route(
                "/api/KeyStatisticList/{key}/json/kr/{start}/{end}",
                get(key_statistic_list),
            )
            .with_state(calls.clone());
        let upstream_addr = serve(upstream).await;

        let mut config = AppConfig::default();
        config.ecos.base_url = format!("http://{}/api", upstream_addr);
        config.ecos.max_in_flight = 2;
        configure(&mut config);

        let secrets = Secrets::new(bok_api_key.map(str::to_string), None, None);
        let metrics = PrometheusBuilder::new().build_recorder().handle();
        let state = AppState::build(&config, secrets, metrics).unwrap();
        let addr = serve(create_router(state, "*".to_string())).await;

        Self {
            base_url: format!("http://{}", addr),
            calls,
            client: reqwest::Client::new(),
        }
    }

    async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await
            .unwrap()
    }

    fn ranges_for(&self, stat_code: &str) -> Vec<(usize, usize)> {
        let mut ranges: Vec<_> = self
            .calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(code, _, _)| code == stat_code)
            .map(|(_, start, end)| (*start, *end))
            .collect();
        ranges.sort();
        ranges
    }
}

const SCENARIO: &str =
    "statCode=722Y001&cycle=D&startDate=20240101&endDate=20240105&itemCode1=0101000";

#[tokio::test]
async fn test_stat_search_scenario() {
    let app = TestApp::spawn(Some(API_KEY)).await;

    let response = app.get(&format!("/v1/ecos/stat-search?{}", SCENARIO)).await;
    assert_eq!(response.status(), 200);
    assert!(response.headers().contains_key("x-request-id"));

    let body: Value = response.json().await.unwrap();
    assert_eq!(
        body,
        json!({
            "labels": ["2024-01-01", "2024-01-02", "2024-01-03"],
            "values": [3.25, null, 3.5]
        })
    );
    assert_eq!(app.ranges_for("722Y001"), vec![(1, 100)]);
}

#[tokio::test]
async fn test_stat_search_merges_all_pages() {
    let app = TestApp::spawn(Some(API_KEY)).await;

    let response = app
        .get("/v1/ecos/stat-search?statCode=MULTI&cycle=D&startDate=20230101&endDate=20230908")
        .await;
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.unwrap();
    let labels: Vec<String> = serde_json::from_value(body["labels"].clone()).unwrap();
    let values = body["values"].as_array().unwrap();

    assert_eq!(labels.len(), 250);
    assert_eq!(values.len(), 250);
    assert_eq!(labels.first().map(String::as_str), Some("2023-01-01"));
    let mut sorted = labels.clone();
    sorted.sort();
    assert_eq!(labels, sorted);
    assert_eq!(values.iter().filter(|v| v.is_null()).count(), 5);

    assert_eq!(
        app.ranges_for("MULTI"),
        vec![(1, 100), (101, 200), (201, 300)]
    );
}

#[tokio::test]
async fn test_non_daily_tokens_pass_through() {
    let app = TestApp::spawn(Some(API_KEY)).await;

    let response = app
        .get("/v1/ecos/stat-search?statCode=MONTHLY&cycle=M&startDate=202401&endDate=202402")
        .await;
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "labels": ["202401", "202402"], "values": [1.0, 1.1] }));
}

#[tokio::test]
async fn test_missing_parameters_rejected() {
    let app = TestApp::spawn(Some(API_KEY)).await;

    let response = app.get("/v1/ecos/stat-search?cycle=D&startDate=20240101").await;
    assert_eq!(response.status(), 400);

    let body: Value = response.json().await.unwrap();
    let error = body["error"].as_str().unwrap();
    assert!(error.contains("statCode"));
    assert!(error.contains("endDate"));
    assert!(app.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_invalid_cycle_rejected() {
    let app = TestApp::spawn(Some(API_KEY)).await;

    let response = app
        .get("/v1/ecos/stat-search?statCode=722Y001&cycle=W&startDate=20240101&endDate=20240105")
        .await;
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_missing_container_is_server_error() {
    let app = TestApp::spawn(Some(API_KEY)).await;

    let response = app
        .get("/v1/ecos/stat-search?statCode=NOBOX&cycle=D&startDate=20240101&endDate=20240105")
        .await;
    assert_eq!(response.status(), 500);

    let body: Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("INFO-200"));
    assert!(body.get("labels").is_none());
}

#[tokio::test]
async fn test_failed_later_page_aborts_fetch() {
    let app = TestApp::spawn(Some(API_KEY)).await;

    let response = app
        .get("/v1/ecos/stat-search?statCode=BROKEN&cycle=D&startDate=20230101&endDate=20230908")
        .await;
    assert_eq!(response.status(), 503);

    let body = response.text().await.unwrap();
    assert!(body.contains("maintenance"));
    assert!(!body.contains(API_KEY));
    assert!(!body.contains("labels"));
}

#[tokio::test]
async fn test_oversized_total_count_is_server_error() {
    let app = TestApp::spawn(Some(API_KEY)).await;

    let response = app
        .get("/v1/ecos/stat-search?statCode=HUGE&cycle=D&startDate=20230101&endDate=20230908")
        .await;
    assert_eq!(response.status(), 500);

    let body: Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("out of range"));
    assert_eq!(app.ranges_for("HUGE"), vec![(1, 100)]);
}

async fn short_timeout_app() -> TestApp {
    TestApp::spawn_with(Some(API_KEY), |config| config.upstream.timeout_secs = 1).await
}

#[tokio::test]
async fn test_slow_first_page_is_gateway_timeout() {
    let app = short_timeout_app().await;

    let response = app
        .get("/v1/ecos/stat-search?statCode=SLOW&cycle=D&startDate=20240101&endDate=20240105")
        .await;
    assert_eq!(response.status(), 504);

    let body: Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("did not answer within 1s"));
}

#[tokio::test]
async fn test_slow_later_page_fails_whole_series() {
    let app = short_timeout_app().await;

    let response = app
        .get("/v1/ecos/stat-search?statCode=SLOWTAIL&cycle=D&startDate=20230101&endDate=20230908")
        .await;
    assert_eq!(response.status(), 504);

    let body: Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("did not answer within 1s"));
    assert!(body.get("labels").is_none());
    assert_eq!(app.ranges_for("SLOWTAIL"), vec![(1, 100), (101, 200)]);
}

#[tokio::test]
async fn test_missing_key_is_server_error() {
    let app = TestApp::spawn(None).await;

    let response = app.get(&format!("/v1/ecos/stat-search?{}", SCENARIO)).await;
    assert_eq!(response.status(), 500);

    let body: Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("BOK_API_KEY"));
    assert!(app.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_legacy_function_path() {
    let app = TestApp::spawn(Some(API_KEY)).await;

    let response = app
        .get(&format!("/.netlify/functions/ecos-statsearch?{}", SCENARIO))
        .await;
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["labels"][0], "2024-01-01");
}

#[tokio::test]
async fn test_key_stats_passthrough() {
    let app = TestApp::spawn(Some(API_KEY)).await;

    let response = app.get("/v1/ecos/key-stats").await;
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["KeyStatisticList"]["row"][0]["KEYSTAT_NAME"], "Base rate");
}

#[tokio::test]
async fn test_config_status_masks_key() {
    let app = TestApp::spawn(Some(API_KEY)).await;

    let body: Value = app.get("/config").await.json().await.unwrap();
    assert_eq!(body, json!({ "has_bok_key": true, "bok_api_key": "***" }));

    let response = app
        .client
        .post(format!("{}/config", app.base_url))
        .json(&json!({ "bok_api_key": "new" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 405);

    let empty = TestApp::spawn(None).await;
    let body: Value = empty.get("/config").await.json().await.unwrap();
    assert_eq!(body, json!({ "has_bok_key": false, "bok_api_key": null }));
}

#[tokio::test]
async fn test_health_reflects_key() {
    let app = TestApp::spawn(Some(API_KEY)).await;
    let response = app.get("/health").await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["upstreams"]["ecos_key"], "configured");
    assert_eq!(body["upstreams"]["openai_key"], "missing");

    let degraded = TestApp::spawn(None).await;
    assert_eq!(degraded.get("/health").await.status(), 503);
}

#[tokio::test]
async fn test_openapi_document_lists_routes() {
    let app = TestApp::spawn(Some(API_KEY)).await;

    let body: Value = app.get("/v1/openapi.json").await.json().await.unwrap();
    let paths = body["paths"].as_object().unwrap();
    assert!(paths.contains_key("/v1/ecos/stat-search"));
    assert!(paths.contains_key("/v1/market/fdr"));
}
