//! Audit trail endpoint.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Extension;
use serde::Deserialize;

use crate::api::error::ApiError;
use crate::api::types::{ok, ApiContext};
use crate::booking::Actor;
use crate::catalog;
use crate::models::AuditFilter;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditQuery {
    pub entity_type: Option<String>,
    pub page: Option<u32>,
}

/// `GET /api/audit?entityType=&page=` — newest first, 30 per page.
pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(actor): Extension<Actor>,
    query: Result<Query<AuditQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(query) = query?;
    let filter = AuditFilter {
        entity_type: query.entity_type.filter(|t| !t.is_empty()),
        page: query.page.unwrap_or(1),
    };
    let page = ctx
        .with_db(move |conn, _| Ok(catalog::list_audit(conn, &actor, &filter)?))
        .await?;
    Ok(ok(page))
}
