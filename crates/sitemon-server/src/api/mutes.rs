use crate::api::{bad_request, rejection_response, storage_error, success_response};
use crate::logging::TraceId;
use crate::state::AppState;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use sitemon_common::types::Mute;

#[derive(Debug, Deserialize)]
pub struct CreateMuteRequest {
    #[serde(alias = "site_id")]
    pub target_id: String,
    /// Epoch milliseconds; the target is muted while `now < until`.
    pub until: i64,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Serialize)]
struct MuteStatusResponse {
    target_id: String,
    muted: bool,
    mutes: Vec<Mute>,
}

async fn create_mute(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    payload: Result<Json<CreateMuteRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match payload {
        Ok(p) => p,
        Err(rejection) => return rejection_response(&trace_id, &rejection),
    };
    if req.target_id.trim().is_empty() {
        return bad_request(&trace_id, "target_id must not be empty");
    }

    match state
        .mutes
        .mute(&req.target_id, req.until, req.reason.as_deref())
    {
        Ok(mute) => success_response(StatusCode::CREATED, &trace_id, mute),
        Err(e) => {
            tracing::error!(error = %e, target_id = %req.target_id, "Failed to create mute");
            storage_error(&trace_id)
        }
    }
}

async fn mute_status(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    target_id: Result<Path<String>, PathRejection>,
) -> Response {
    let Path(target_id) = match target_id {
        Ok(p) => p,
        Err(rejection) => return rejection_response(&trace_id, &rejection),
    };
    let now = state.clock.now_millis();
    match state.mutes.active_mutes(&target_id, now) {
        Ok(mutes) => success_response(
            StatusCode::OK,
            &trace_id,
            MuteStatusResponse {
                target_id,
                muted: !mutes.is_empty(),
                mutes,
            },
        ),
        Err(e) => {
            tracing::error!(error = %e, target_id = %target_id, "Failed to read mute state");
            storage_error(&trace_id)
        }
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/mutes", post(create_mute))
        .route("/v1/targets/{target_id}/mute", get(mute_status))
}
