use crate::state::AppState;
use crate::{api, logging};
use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::middleware;
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if allowed_origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}

pub fn build_http_app(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_allowed_origins);

    api::routes()
        .with_state(state)
        .layer(DefaultBodyLimit::max(logging::MAX_REQUEST_BODY_BYTES))
        .layer(cors)
        .layer(middleware::from_fn(logging::request_logging))
}
