//! Appointment endpoints.
//!
//! - `GET /api/appointments` — list, filtered by window, provider, location, patient
//! - `POST /api/appointments` — book
//! - `POST /api/appointments/check` — dry-run conflict check
//! - `GET /api/appointments/:id` — detail
//! - `PATCH /api/appointments/:id` — partial update
//! - `POST /api/appointments/:id/cancel` — cancel
//! - `POST /api/appointments/:id/status` — status transition

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{ok, ApiContext};
use crate::booking::{self, Actor, AppointmentUpdate, BookingRequest};
use crate::models::{AppointmentFilter, AppointmentStatus};
use crate::scheduling::ScheduleInput;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub provider_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
    pub patient_id: Option<Uuid>,
}

impl From<ListQuery> for AppointmentFilter {
    fn from(q: ListQuery) -> Self {
        Self {
            start_from: q.start,
            end_until: q.end,
            provider_id: q.provider_id,
            location_id: q.location_id,
            patient_id: q.patient_id,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct StatusBody {
    pub status: AppointmentStatus,
}

fn path_id(path: Result<Path<Uuid>, PathRejection>) -> Result<Uuid, ApiError> {
    path.map(|Path(id)| id)
        .map_err(|_| ApiError::BadRequest("Invalid appointment ID".into()))
}

/// `GET /api/appointments`
pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(actor): Extension<Actor>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(query) = query?;
    let filter = AppointmentFilter::from(query);
    let appointments = ctx
        .with_db(move |conn, _| Ok(booking::list_appointments(conn, &actor, &filter)?))
        .await?;
    Ok(ok(appointments))
}

/// `GET /api/appointments/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Extension(actor): Extension<Actor>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = path_id(path)?;
    let appointment = ctx
        .with_db(move |conn, _| Ok(booking::get_appointment(conn, &actor, &id)?))
        .await?;
    Ok(ok(appointment))
}

/// `POST /api/appointments` — 201 with the stored appointment.
pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(actor): Extension<Actor>,
    body: Result<Json<BookingRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = body?;
    let appointment = ctx
        .with_db(move |conn, core| {
            Ok(booking::book_appointment(conn, core.feed(), &actor, request)?)
        })
        .await?;
    Ok((StatusCode::CREATED, ok(appointment)))
}

/// `POST /api/appointments/check`
pub async fn check(
    State(ctx): State<ApiContext>,
    Extension(actor): Extension<Actor>,
    body: Result<Json<ScheduleInput>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(input) = body?;
    let result = ctx
        .with_db(move |conn, _| Ok(booking::check_schedule(conn, &actor, &input)?))
        .await?;
    Ok(ok(result))
}

/// `PATCH /api/appointments/:id`
pub async fn update(
    State(ctx): State<ApiContext>,
    Extension(actor): Extension<Actor>,
    path: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<AppointmentUpdate>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = path_id(path)?;
    let Json(update) = body?;
    let appointment = ctx
        .with_db(move |conn, core| {
            Ok(booking::update_appointment(conn, core.feed(), &actor, &id, update)?)
        })
        .await?;
    Ok(ok(appointment))
}

/// `POST /api/appointments/:id/cancel`
pub async fn cancel(
    State(ctx): State<ApiContext>,
    Extension(actor): Extension<Actor>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = path_id(path)?;
    let appointment = ctx
        .with_db(move |conn, core| {
            Ok(booking::cancel_appointment(conn, core.feed(), &actor, &id)?)
        })
        .await?;
    Ok(ok(appointment))
}

/// `POST /api/appointments/:id/status`
pub async fn set_status(
    State(ctx): State<ApiContext>,
    Extension(actor): Extension<Actor>,
    path: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<StatusBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = path_id(path)?;
    let Json(StatusBody { status }) = body?;
    let appointment = ctx
        .with_db(move |conn, core| {
            Ok(booking::change_status(conn, core.feed(), &actor, &id, status)?)
        })
        .await?;
    Ok(ok(appointment))
}
