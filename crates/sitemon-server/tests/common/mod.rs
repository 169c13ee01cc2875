#![allow(dead_code)]

use anyhow::Result;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use serde_json::Value;
use sitemon_common::clock::ManualClock;
use sitemon_server::app;
use sitemon_server::config::ServerConfig;
use sitemon_server::state::AppState;
use sitemon_storage::engine::SqliteStore;
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt;

pub const START_MILLIS: i64 = 1_700_000_000_000;

pub struct TestContext {
    pub temp_dir: TempDir,
    pub clock: Arc<ManualClock>,
    pub state: AppState,
    pub app: axum::Router,
}

pub fn build_test_context() -> Result<TestContext> {
    build_test_context_with(ServerConfig::default())
}

pub fn build_test_context_with(mut config: ServerConfig) -> Result<TestContext> {
    let temp_dir = tempfile::tempdir()?;
    let db_path = temp_dir.path().join("sitemon.db");
    config.database_path = db_path.to_string_lossy().to_string();

    let clock = Arc::new(ManualClock::new(START_MILLIS));
    let store = Arc::new(SqliteStore::open(&db_path, clock.clone())?);
    let state = AppState::new(store, clock.clone(), config);
    let app = app::build_http_app(state.clone());

    Ok(TestContext {
        temp_dir,
        clock,
        state,
        app,
    })
}

pub async fn request_json(
    app: &axum::Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value, Option<String>) {
    let req_body = body.map(|b| b.to_string()).unwrap_or_default();
    send(app, method, uri, req_body).await
}

pub async fn request_raw(
    app: &axum::Router,
    method: &str,
    uri: &str,
    body: &str,
) -> (StatusCode, Value, Option<String>) {
    send(app, method, uri, body.to_string()).await
}

async fn send(
    app: &axum::Router,
    method: &str,
    uri: &str,
    body: String,
) -> (StatusCode, Value, Option<String>) {
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body))
        .expect("request should build");

    let resp = app
        .clone()
        .oneshot(req)
        .await
        .expect("request should be handled");

    let status = resp.status();
    let trace_id = resp
        .headers()
        .get("x-trace-id")
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string());
    let bytes = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("body should read");
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice::<Value>(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).to_string()))
    };

    (status, json, trace_id)
}

pub fn assert_ok_envelope(body: &Value) {
    assert_eq!(body["err_code"], 0, "unexpected envelope: {body}");
    assert_eq!(body["err_msg"], "success");
}

pub fn assert_err_envelope(body: &Value, err_code: i64) {
    assert_eq!(body["err_code"], err_code, "unexpected envelope: {body}");
    assert!(body["data"].is_null());
}
