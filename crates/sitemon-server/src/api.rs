pub mod alerts;
pub mod check;
pub mod mutes;

use crate::logging::TraceId;
use crate::state::AppState;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;

/// Envelope wrapping every API response.
#[derive(Serialize)]
pub struct ApiResponse<T>
where
    T: Serialize,
{
    /// 0 on success.
    pub err_code: i32,
    pub err_msg: String,
    pub trace_id: String,
    pub data: Option<T>,
}

pub fn success_response<T>(status: StatusCode, trace_id: &str, data: T) -> Response
where
    T: Serialize,
{
    (
        status,
        Json(ApiResponse {
            err_code: 0,
            err_msg: "success".to_string(),
            trace_id: trace_id.to_string(),
            data: Some(data),
        }),
    )
        .into_response()
}

fn to_custom_error_code(code: &str) -> i32 {
    match code {
        "bad_request" => 1001,
        "not_found" => 1004,
        "payload_too_large" => 1413,
        "internal_error" => 1500,
        "storage_error" => 1501,
        _ => 1999,
    }
}

pub fn error_response(status: StatusCode, trace_id: &str, code: &str, msg: &str) -> Response {
    (
        status,
        Json(ApiResponse::<Value> {
            err_code: to_custom_error_code(code),
            err_msg: msg.to_string(),
            trace_id: trace_id.to_string(),
            data: None,
        }),
    )
        .into_response()
}

pub fn bad_request(trace_id: &str, msg: &str) -> Response {
    error_response(StatusCode::BAD_REQUEST, trace_id, "bad_request", msg)
}

pub fn storage_error(trace_id: &str) -> Response {
    error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        trace_id,
        "storage_error",
        "Database error",
    )
}

/// Extractor rejections are answered in the envelope format instead of
/// axum's plain-text default.
pub(crate) trait RejectionMessage {
    fn message(&self) -> String;
}

impl RejectionMessage for JsonRejection {
    fn message(&self) -> String {
        self.body_text()
    }
}

impl RejectionMessage for QueryRejection {
    fn message(&self) -> String {
        self.body_text()
    }
}

impl RejectionMessage for PathRejection {
    fn message(&self) -> String {
        self.body_text()
    }
}

pub(crate) fn rejection_response(trace_id: &str, rejection: &impl RejectionMessage) -> Response {
    bad_request(trace_id, &rejection.message())
}

#[derive(Serialize)]
struct HealthResponse {
    version: String,
    uptime_secs: i64,
    storage_status: String,
}

async fn health(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let uptime = (Utc::now() - state.start_time).num_seconds();
    let storage_status = match state.alerts.ping() {
        Ok(_) => "ok",
        Err(e) => {
            tracing::error!(error = %e, "Storage health probe failed");
            "error"
        }
    };
    success_response(
        StatusCode::OK,
        &trace_id,
        HealthResponse {
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_secs: uptime,
            storage_status: storage_status.to_string(),
        },
    )
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/health", get(health))
        .merge(check::routes())
        .merge(alerts::routes())
        .merge(mutes::routes())
}
