//! Appointment type endpoints.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{ok, ApiContext};
use crate::booking::Actor;
use crate::catalog::{self, AppointmentTypePatch, NewAppointmentType};

/// `GET /api/appointment-types` — ordered by name.
pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(actor): Extension<Actor>,
) -> Result<impl IntoResponse, ApiError> {
    let types = ctx
        .with_db(move |conn, _| Ok(catalog::list_appointment_types(conn, &actor)?))
        .await?;
    Ok(ok(types))
}

/// `POST /api/appointment-types`
pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(actor): Extension<Actor>,
    body: Result<Json<NewAppointmentType>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(input) = body?;
    let ty = ctx
        .with_db(move |conn, _| Ok(catalog::create_appointment_type(conn, &actor, input)?))
        .await?;
    Ok((StatusCode::CREATED, ok(ty)))
}

/// `PATCH /api/appointment-types/:id`
pub async fn update(
    State(ctx): State<ApiContext>,
    Extension(actor): Extension<Actor>,
    path: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<AppointmentTypePatch>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(id) = path.map_err(|_| ApiError::BadRequest("Invalid appointment type ID".into()))?;
    let Json(patch) = body?;
    let ty = ctx
        .with_db(move |conn, _| Ok(catalog::update_appointment_type(conn, &actor, &id, patch)?))
        .await?;
    Ok(ok(ty))
}
