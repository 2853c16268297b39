//! API middleware — per-request access logging.

use std::time::Instant;

use axum::{body::Body, extract::Request, middleware::Next, response::Response};
use tracing::info;

/// Request logging middleware.
pub async fn logging_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let response = next.run(request).await;

    info!(
        "{} {} → {} ({:.1}ms)",
        method,
        uri,
        response.status().as_u16(),
        start.elapsed().as_secs_f64() * 1000.0
    );

    response
}
