//! API middleware

use axum::{
    body::Body,
    http::{header, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use tracing::info;

/// Request logging middleware
///
/// Logs method, path, status and latency. Bodies are never logged since they
/// carry patient billing data.
pub async fn request_log_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let start = Utc::now();
    let response = next.run(request).await;
    let duration = Utc::now() - start;

    info!(
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        duration_ms = duration.num_milliseconds(),
        "API request"
    );

    response
}

/// Marks audit responses as not cacheable
pub async fn no_store_middleware(request: Request<Body>, next: Next) -> Response {
    let mut response = next.run(request).await;
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}
