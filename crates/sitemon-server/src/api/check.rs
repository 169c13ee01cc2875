use crate::api::{
    bad_request, error_response, rejection_response, storage_error, success_response,
};
use crate::evaluator::EvaluateError;
use crate::logging::TraceId;
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use sitemon_alert::RuleOverrides;
use sitemon_common::types::Observation;

/// Observation batch for one target, as posted by the poller.
#[derive(Debug, Deserialize)]
pub struct CheckRequest {
    #[serde(alias = "site_id")]
    pub target_id: String,
    #[serde(default)]
    pub history: Vec<Observation>,
    #[serde(default)]
    pub rules: Option<RuleOverrides>,
}

async fn check(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    payload: Result<Json<CheckRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match payload {
        Ok(p) => p,
        Err(rejection) => return rejection_response(&trace_id, &rejection),
    };
    if req.target_id.trim().is_empty() {
        return bad_request(&trace_id, "target_id must not be empty");
    }

    match state
        .evaluator
        .process(&req.target_id, &req.history, req.rules.as_ref())
    {
        Ok(outcome) => success_response(StatusCode::OK, &trace_id, outcome),
        Err(e @ EvaluateError::MuteCheck { .. }) => {
            tracing::error!(error = %e, "Evaluation aborted");
            storage_error(&trace_id)
        }
        Err(EvaluateError::Persist {
            target_id,
            persisted,
            source,
        }) => {
            let ids: Vec<String> = persisted.iter().map(|a| a.id.to_string()).collect();
            tracing::error!(
                target_id = %target_id,
                persisted = ?ids,
                error = %source,
                "Evaluation partially persisted"
            );
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &trace_id,
                "storage_error",
                &format!(
                    "Database error; {} alert(s) stored before the failure: [{}]",
                    ids.len(),
                    ids.join(", ")
                ),
            )
        }
    }
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/check", post(check))
}
