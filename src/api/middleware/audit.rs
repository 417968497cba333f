//! Access logging middleware.
//!
//! Logs every API request with actor, method, path, status and latency.
//! Runs innermost (after the auth layer has injected the actor).

use std::time::Instant;

use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;

use crate::booking::Actor;

pub async fn log_access(req: Request<axum::body::Body>, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let actor = req
        .extensions()
        .get::<Actor>()
        .map(|a| format!("{}:{}", a.role, a.user_id))
        .unwrap_or_else(|| "anonymous".into());
    let started = Instant::now();

    let response = next.run(req).await;

    let status = response.status().as_u16();
    let elapsed_ms = started.elapsed().as_millis() as u64;
    if response.status().is_server_error() {
        tracing::warn!(%method, path = %path, actor = %actor, status, elapsed_ms, "API access");
    } else {
        tracing::info!(%method, path = %path, actor = %actor, status, elapsed_ms, "API access");
    }

    response
}
