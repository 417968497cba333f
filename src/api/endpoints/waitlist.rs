//! Waitlist endpoints.
//!
//! - `GET /api/waitlist?status=` — newest first
//! - `POST /api/waitlist` — add a request
//! - `PATCH /api/waitlist/:id` — status, note, priority
//! - `POST /api/waitlist/:id/book` — book at the preferred time

use axum::body::Bytes;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{ok, ApiContext};
use crate::booking::Actor;
use crate::models::{WaitlistFilter, WaitlistStatus};
use crate::waitlist::{self, NewWaitlistRequest, WaitlistBooking, WaitlistUpdate};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<WaitlistStatus>,
}

fn path_id(path: Result<Path<Uuid>, PathRejection>) -> Result<Uuid, ApiError> {
    path.map(|Path(id)| id)
        .map_err(|_| ApiError::BadRequest("Invalid waitlist ID".into()))
}

/// `GET /api/waitlist`
pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(actor): Extension<Actor>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(query) = query?;
    let filter = WaitlistFilter { status: query.status };
    let requests = ctx
        .with_db(move |conn, _| Ok(waitlist::list_requests(conn, &actor, &filter)?))
        .await?;
    Ok(ok(requests))
}

/// `POST /api/waitlist`
pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(actor): Extension<Actor>,
    body: Result<Json<NewWaitlistRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(input) = body?;
    let request = ctx
        .with_db(move |conn, _| Ok(waitlist::create_request(conn, &actor, input)?))
        .await?;
    Ok((StatusCode::CREATED, ok(request)))
}

/// `PATCH /api/waitlist/:id`
pub async fn update(
    State(ctx): State<ApiContext>,
    Extension(actor): Extension<Actor>,
    path: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<WaitlistUpdate>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = path_id(path)?;
    let Json(update) = body?;
    let request = ctx
        .with_db(move |conn, _| Ok(waitlist::update_request(conn, &actor, &id, update)?))
        .await?;
    Ok(ok(request))
}

/// `POST /api/waitlist/:id/book` — body optional: `{ providerId?, locationId? }`.
pub async fn book(
    State(ctx): State<ApiContext>,
    Extension(actor): Extension<Actor>,
    path: Result<Path<Uuid>, PathRejection>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let id = path_id(path)?;
    let target: WaitlistBooking = if body.is_empty() {
        WaitlistBooking::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| ApiError::BadRequest(e.to_string()))?
    };
    let booked = ctx
        .with_db(move |conn, core| {
            Ok(waitlist::book_request(conn, core.feed(), &actor, &id, target)?)
        })
        .await?;
    Ok((StatusCode::CREATED, ok(booked)))
}
