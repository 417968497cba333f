//! Reference data for booking forms: active providers and locations.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Extension;

use crate::api::error::ApiError;
use crate::api::types::{ok, ApiContext};
use crate::booking::Actor;
use crate::catalog;

/// `GET /api/providers`
pub async fn providers(
    State(ctx): State<ApiContext>,
    Extension(actor): Extension<Actor>,
) -> Result<impl IntoResponse, ApiError> {
    let providers = ctx
        .with_db(move |conn, _| Ok(catalog::list_providers(conn, &actor)?))
        .await?;
    Ok(ok(providers))
}

/// `GET /api/locations`
pub async fn locations(
    State(ctx): State<ApiContext>,
    Extension(actor): Extension<Actor>,
) -> Result<impl IntoResponse, ApiError> {
    let locations = ctx
        .with_db(move |conn, _| Ok(catalog::list_locations(conn, &actor)?))
        .await?;
    Ok(ok(locations))
}
