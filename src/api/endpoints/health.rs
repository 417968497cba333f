//! Health check endpoint.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::{ok, ApiContext, ApiResponse};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub database: bool,
}

/// `GET /api/health` — unauthenticated liveness check.
pub async fn check(
    State(ctx): State<ApiContext>,
) -> Result<Json<ApiResponse<HealthResponse>>, ApiError> {
    let database = ctx.with_db(|_, _| Ok(())).await.is_ok();

    Ok(ok(HealthResponse {
        status: if database { "ok" } else { "degraded" },
        version: crate::config::APP_VERSION,
        database,
    }))
}
