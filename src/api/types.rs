//! Shared types for the HTTP API layer.

use std::sync::Arc;

use axum::Json;
use rusqlite::Connection;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::core_state::CoreState;

// ═══════════════════════════════════════════════════════════
// API context — shared state for the router
// ═══════════════════════════════════════════════════════════

/// Shared context for all API routes and middleware.
#[derive(Clone)]
pub struct ApiContext {
    pub core: Arc<CoreState>,
}

impl ApiContext {
    pub fn new(core: Arc<CoreState>) -> Self {
        Self { core }
    }

    /// Runs `f` on a blocking thread with a fresh connection.
    ///
    /// Booking writes may wait on SQLite's busy timeout, which must not
    /// stall the async executor.
    pub async fn with_db<T, F>(&self, f: F) -> Result<T, ApiError>
    where
        F: FnOnce(&mut Connection, &CoreState) -> Result<T, ApiError> + Send + 'static,
        T: Send + 'static,
    {
        let core = self.core.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = core.open_db()?;
            f(&mut conn, &core)
        })
        .await
        .map_err(|e| ApiError::Internal(format!("database task failed: {e}")))?
    }
}

// ═══════════════════════════════════════════════════════════
// Response envelope
// ═══════════════════════════════════════════════════════════

/// Success envelope: `{ "ok": true, "data": ... }`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub data: T,
}

pub fn ok<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse { ok: true, data })
}
