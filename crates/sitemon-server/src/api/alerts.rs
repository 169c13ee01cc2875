use crate::api::{error_response, rejection_response, storage_error, success_response};
use crate::logging::TraceId;
use crate::state::AppState;
use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use sitemon_common::types::Alert;
use sitemon_storage::AlertQuery;

#[derive(Debug, Deserialize)]
pub struct ListAlertsParams {
    pub limit: Option<u64>,
    /// Inclusive lower bound on `raised_at` (epoch milliseconds).
    pub since_time: Option<i64>,
    #[serde(alias = "site_id")]
    pub target_id: Option<String>,
}

#[derive(Serialize)]
struct AlertListResponse {
    items: Vec<Alert>,
    limit: usize,
}

#[derive(Serialize)]
struct AcknowledgeResponse {
    id: i64,
    acknowledged: bool,
}

/// Lists alerts, most recent first.
async fn list_alerts(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    params: Result<Query<ListAlertsParams>, QueryRejection>,
) -> Response {
    let Query(params) = match params {
        Ok(p) => p,
        Err(rejection) => return rejection_response(&trace_id, &rejection),
    };

    let limit = state.config.resolve_limit(params.limit);
    let query = AlertQuery {
        limit,
        since_time: params.since_time,
        target_id: params.target_id,
    };

    match state.alerts.list_alerts(&query) {
        Ok(items) => success_response(StatusCode::OK, &trace_id, AlertListResponse { items, limit }),
        Err(e) => {
            tracing::error!(error = %e, "Failed to list alerts");
            storage_error(&trace_id)
        }
    }
}

async fn get_alert(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Response {
    let Path(id) = match id {
        Ok(p) => p,
        Err(rejection) => return rejection_response(&trace_id, &rejection),
    };

    match state.alerts.get_alert(id) {
        Ok(Some(alert)) => success_response(StatusCode::OK, &trace_id, alert),
        Ok(None) => error_response(StatusCode::NOT_FOUND, &trace_id, "not_found", "Alert not found"),
        Err(e) => {
            tracing::error!(error = %e, alert_id = id, "Failed to get alert");
            storage_error(&trace_id)
        }
    }
}

/// Acknowledges an alert. Repeating the call is harmless.
async fn acknowledge_alert(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Response {
    let Path(id) = match id {
        Ok(p) => p,
        Err(rejection) => return rejection_response(&trace_id, &rejection),
    };

    match state.alerts.acknowledge_alert(id) {
        Ok(true) => {
            tracing::info!(alert_id = id, "Alert acknowledged");
            success_response(
                StatusCode::OK,
                &trace_id,
                AcknowledgeResponse {
                    id,
                    acknowledged: true,
                },
            )
        }
        Ok(false) => error_response(StatusCode::NOT_FOUND, &trace_id, "not_found", "Alert not found"),
        Err(e) => {
            tracing::error!(error = %e, alert_id = id, "Failed to acknowledge alert");
            storage_error(&trace_id)
        }
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/alerts", get(list_alerts))
        .route("/v1/alerts/{id}", get(get_alert))
        .route("/v1/alerts/{id}/acknowledge", post(acknowledge_alert))
}
