//! Actor extraction middleware.
//!
//! Session issuance lives in the upstream auth proxy, which forwards the
//! authenticated staff member as `X-Actor-Id` and `X-Actor-Role`. This layer
//! turns those headers into an [`Actor`] in request extensions. In demo mode
//! a request without headers runs as a demo administrator.

use std::str::FromStr;

use axum::http::{HeaderMap, HeaderValue, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::booking::Actor;
use crate::models::Role;

pub const ACTOR_ID_HEADER: &str = "X-Actor-Id";
pub const ACTOR_ROLE_HEADER: &str = "X-Actor-Role";

const DEMO_ACTOR_ID: &str = "demo-admin";

/// Require an identified actor on every protected route.
///
/// Accesses `ApiContext` from request extensions (injected by Extension layer).
pub async fn require_actor(req: Request<axum::body::Body>, next: Next) -> Response {
    match require_actor_inner(req, next).await {
        Ok(resp) => resp,
        Err(err) => err.into_response(),
    }
}

async fn require_actor_inner(
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let ctx: ApiContext = req
        .extensions()
        .get::<ApiContext>()
        .cloned()
        .ok_or(ApiError::Internal("missing API context".into()))?;

    let actor = match actor_from_headers(req.headers())? {
        Some(actor) => actor,
        None if ctx.core.settings().demo_mode => Actor::new(DEMO_ACTOR_ID, Role::Admin),
        None => return Err(ApiError::Unauthorized),
    };

    req.extensions_mut().insert(actor);

    let mut response = next.run(req).await;
    response
        .headers_mut()
        .insert("Cache-Control", HeaderValue::from_static("no-store"));
    Ok(response)
}

/// `Ok(None)` when neither header is present; an unknown role or a lone
/// header is rejected.
fn actor_from_headers(headers: &HeaderMap) -> Result<Option<Actor>, ApiError> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    match (header(ACTOR_ID_HEADER), header(ACTOR_ROLE_HEADER)) {
        (None, None) => Ok(None),
        (Some(id), Some(role)) => {
            let role = Role::from_str(role).map_err(|_| ApiError::Unauthorized)?;
            Ok(Some(Actor::new(id, role)))
        }
        _ => Err(ApiError::Unauthorized),
    }
}
