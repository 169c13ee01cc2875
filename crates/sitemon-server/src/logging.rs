use axum::{
    body::Body,
    extract::Request,
    http::{header, HeaderValue, StatusCode},
    middleware::Next,
    response::Response,
};
use rand::Rng;
use std::fmt::Write;
use std::time::Instant;

/// Per-request trace id stored in request extensions and echoed back in the
/// `X-Trace-Id` response header.
#[derive(Clone)]
pub struct TraceId(pub String);

impl std::ops::Deref for TraceId {
    type Target = str;
    fn deref(&self) -> &str {
        &self.0
    }
}

/// Generate a 16-character hex trace ID (8 random bytes).
fn generate_trace_id() -> String {
    let bytes: [u8; 8] = rand::thread_rng().gen();
    let mut s = String::with_capacity(16);
    for b in bytes {
        let _ = write!(s, "{b:02x}");
    }
    s
}

/// Maximum number of bytes to log from a request or response body.
const MAX_BODY_LOG_BYTES: usize = 200;

/// Largest accepted request body. Also installed as the extractor limit in
/// [`crate::app::build_http_app`].
pub const MAX_REQUEST_BODY_BYTES: usize = 4 * 1024 * 1024;

fn truncate_body(bytes: &[u8], max: usize) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) if s.len() > max => {
            let mut end = max;
            while end > 0 && !s.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}...", &s[..end])
        }
        Ok(s) => s.to_string(),
        Err(_) => "<non-utf8 body>".to_string(),
    }
}

fn format_elapsed(elapsed_us: u128) -> String {
    if elapsed_us < 1000 {
        format!("{elapsed_us}µs")
    } else if elapsed_us < 1_000_000 {
        format!("{}ms", elapsed_us / 1000)
    } else {
        format!("{:.1}s", elapsed_us as f64 / 1_000_000.0)
    }
}

fn log_response(trace_id: &str, status: StatusCode, elapsed: &str, body: &str) {
    let code = status.as_u16();
    if status.is_server_error() {
        tracing::error!(trace_id, status = code, elapsed, body, "<-- response");
    } else if status.is_client_error() {
        tracing::warn!(trace_id, status = code, elapsed, body, "<-- response");
    } else {
        tracing::info!(trace_id, status = code, elapsed, "<-- response");
    }
}

/// Request/response logging middleware.
///
/// Request bodies of POST calls are logged truncated; response bodies are
/// only logged for error statuses.
pub async fn request_logging(mut req: Request, next: Next) -> Response {
    let trace_id = generate_trace_id();
    req.extensions_mut().insert(TraceId(trace_id.clone()));

    let method = req.method().clone();
    let url = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());

    let start = Instant::now();
    let response = if method == axum::http::Method::POST {
        let (parts, body) = req.into_parts();
        match axum::body::to_bytes(body, MAX_REQUEST_BODY_BYTES).await {
            Ok(body_bytes) => {
                let snippet = truncate_body(&body_bytes, MAX_BODY_LOG_BYTES);
                tracing::info!(trace_id = %trace_id, method = %method, path = %url, body = %snippet, "--> request");
                next.run(Request::from_parts(parts, Body::from(body_bytes))).await
            }
            Err(e) => {
                tracing::info!(trace_id = %trace_id, method = %method, path = %url, error = %e, "--> request (body unread)");
                crate::api::error_response(
                    StatusCode::PAYLOAD_TOO_LARGE,
                    &trace_id,
                    "payload_too_large",
                    &format!("Request body exceeds {MAX_REQUEST_BODY_BYTES} bytes"),
                )
            }
        }
    } else {
        tracing::info!(trace_id = %trace_id, method = %method, path = %url, "--> request");
        next.run(req).await
    };
    let elapsed = format_elapsed(start.elapsed().as_micros());
    let status = response.status();

    let (parts, body) = response.into_parts();
    let is_json = parts
        .headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.contains("application/json"));
    let body_bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .unwrap_or_default();

    let body_snippet = if is_json && !status.is_success() {
        truncate_body(&body_bytes, MAX_BODY_LOG_BYTES)
    } else {
        String::new()
    };
    log_response(&trace_id, status, &elapsed, &body_snippet);

    let mut response = Response::from_parts(parts, Body::from(body_bytes));
    if let Ok(val) = HeaderValue::from_str(&trace_id) {
        response.headers_mut().insert("X-Trace-Id", val);
    }
    response
}
