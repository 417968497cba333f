//! Waitlist: patients waiting for a slot.
//!
//! Booking a waitlist request goes through the same resolver and conflict
//! policy as a direct booking, inside one transaction that also marks the
//! request `BOOKED`.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, TransactionBehavior};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::booking::{self, Actor, BookingError, BookingRequest};
use crate::db::repository;
use crate::db::DatabaseError;
use crate::models::*;
use crate::rbac::PermissionDenied;
use crate::realtime::{AppointmentChange, PracticeFeed};

const ENTITY_WAITLIST: &str = "WaitlistRequest";

#[derive(Debug, thiserror::Error)]
pub enum WaitlistError {
    #[error(transparent)]
    Forbidden(#[from] PermissionDenied),
    #[error("Waitlist request not found: {0}")]
    NotFound(Uuid),
    #[error("{0}")]
    Validation(String),
    #[error("No provider or location available")]
    NoResources,
    #[error(transparent)]
    Booking(#[from] BookingError),
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

impl From<rusqlite::Error> for WaitlistError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Database(err.into())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWaitlistRequest {
    pub patient_id: Uuid,
    pub appointment_type_id: Option<Uuid>,
    pub preferred_start_at: Option<DateTime<Utc>>,
    pub preferred_end_at: Option<DateTime<Utc>>,
    pub priority: i64,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitlistUpdate {
    pub status: Option<WaitlistStatus>,
    pub note: Option<String>,
    pub priority: Option<i64>,
}

/// Where to book a waitlist request. Absent fields fall back to the first
/// active provider or location by name.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitlistBooking {
    pub provider_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitlistBooked {
    pub appointment: Appointment,
    pub waitlist: WaitlistRequest,
}

fn validate_priority(priority: i64) -> Result<(), WaitlistError> {
    if !(1..=5).contains(&priority) {
        return Err(WaitlistError::Validation("Priority must be between 1 and 5".into()));
    }
    Ok(())
}

pub fn list_requests(
    conn: &Connection,
    actor: &Actor,
    filter: &WaitlistFilter,
) -> Result<Vec<WaitlistRequest>, WaitlistError> {
    actor.require(Permission::ManageAppointments)?;
    Ok(repository::list_waitlist_requests(conn, filter)?)
}

pub fn create_request(
    conn: &mut Connection,
    actor: &Actor,
    input: NewWaitlistRequest,
) -> Result<WaitlistRequest, WaitlistError> {
    actor.require(Permission::ManageAppointments)?;
    validate_priority(input.priority)?;
    if let (Some(start), Some(end)) = (input.preferred_start_at, input.preferred_end_at) {
        if end <= start {
            return Err(WaitlistError::Validation(
                "Preferred end must be after preferred start".into(),
            ));
        }
    }

    let now = Utc::now();
    let request = WaitlistRequest {
        id: Uuid::new_v4(),
        patient_id: input.patient_id,
        appointment_type_id: input.appointment_type_id,
        preferred_start_at: input.preferred_start_at,
        preferred_end_at: input.preferred_end_at,
        priority: input.priority,
        note: input.note,
        status: WaitlistStatus::Open,
        appointment_id: None,
        created_at: now,
        updated_at: now,
    };

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    repository::insert_waitlist_request(&tx, &request).map_err(|e| match e {
        DatabaseError::Sqlite(rusqlite::Error::SqliteFailure(code, _))
            if code.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            WaitlistError::Validation("Unknown appointment type".into())
        }
        other => WaitlistError::Database(other),
    })?;
    record_audit(&tx, actor, AuditAction::Create, &request.id, None, Some(&request))?;
    tx.commit()?;

    tracing::info!(waitlist_id = %request.id, priority = request.priority, "Waitlist request created");
    Ok(request)
}

/// Changes status, note or priority. `BOOKED` is only reachable by booking.
pub fn update_request(
    conn: &mut Connection,
    actor: &Actor,
    id: &Uuid,
    update: WaitlistUpdate,
) -> Result<WaitlistRequest, WaitlistError> {
    actor.require(Permission::ManageAppointments)?;
    if let Some(priority) = update.priority {
        validate_priority(priority)?;
    }
    if update.status == Some(WaitlistStatus::Booked) {
        return Err(WaitlistError::Validation(
            "Book the request to mark it BOOKED".into(),
        ));
    }

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let before = repository::get_waitlist_request(&tx, id)?.ok_or(WaitlistError::NotFound(*id))?;
    let after = WaitlistRequest {
        status: update.status.unwrap_or(before.status),
        note: update.note.or_else(|| before.note.clone()),
        priority: update.priority.unwrap_or(before.priority),
        updated_at: Utc::now(),
        ..before.clone()
    };
    repository::update_waitlist_request(&tx, &after)?;
    record_audit(&tx, actor, AuditAction::Update, id, Some(&before), Some(&after))?;
    tx.commit()?;

    Ok(after)
}

/// Books the request at its preferred time and marks it `BOOKED`.
///
/// The end time comes from the preferred end or the type's duration. A
/// conflict rejects the booking unless the actor may override.
pub fn book_request(
    conn: &mut Connection,
    feed: &PracticeFeed,
    actor: &Actor,
    id: &Uuid,
    target: WaitlistBooking,
) -> Result<WaitlistBooked, WaitlistError> {
    actor.require(Permission::ManageAppointments)?;

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let before = repository::get_waitlist_request(&tx, id)?.ok_or(WaitlistError::NotFound(*id))?;
    if matches!(before.status, WaitlistStatus::Booked | WaitlistStatus::Closed) {
        return Err(WaitlistError::Validation(format!(
            "Waitlist request is already {}",
            before.status
        )));
    }
    let (Some(start_at), Some(appointment_type_id)) =
        (before.preferred_start_at, before.appointment_type_id)
    else {
        return Err(WaitlistError::Validation(
            "Waitlist request is missing preferred time or appointment type".into(),
        ));
    };

    let provider_id = match target.provider_id {
        Some(id) => id,
        None => repository::list_active_providers(&tx)?
            .first()
            .map(|p| p.id)
            .ok_or(WaitlistError::NoResources)?,
    };
    let location_id = match target.location_id {
        Some(id) => id,
        None => repository::list_active_locations(&tx)?
            .first()
            .map(|l| l.id)
            .ok_or(WaitlistError::NoResources)?,
    };

    let appointment = booking::insert_booking(
        &tx,
        actor,
        BookingRequest {
            patient_id: Some(before.patient_id),
            provider_id,
            location_id: Some(location_id),
            appointment_type_id,
            start_at,
            end_at: before.preferred_end_at,
            reason: before.note.clone(),
            notes: None,
        },
    )?;

    let after = WaitlistRequest {
        status: WaitlistStatus::Booked,
        appointment_id: Some(appointment.id),
        updated_at: Utc::now(),
        ..before.clone()
    };
    repository::update_waitlist_request(&tx, &after)?;
    record_audit(&tx, actor, AuditAction::StatusChange, id, Some(&before), Some(&after))?;
    tx.commit()?;

    tracing::info!(
        waitlist_id = %id,
        appointment_id = %appointment.id,
        "Waitlist request booked"
    );
    feed.publish(AppointmentChange::Created { id: appointment.id });
    Ok(WaitlistBooked {
        appointment,
        waitlist: after,
    })
}

fn record_audit(
    conn: &Connection,
    actor: &Actor,
    action: AuditAction,
    id: &Uuid,
    before: Option<&WaitlistRequest>,
    after: Option<&WaitlistRequest>,
) -> Result<(), DatabaseError> {
    repository::insert_audit_entry(
        conn,
        &AuditEntry {
            id: Uuid::new_v4(),
            actor_user_id: Some(actor.user_id.clone()),
            action,
            entity_type: ENTITY_WAITLIST.into(),
            entity_id: id.to_string(),
            before: before.map(serde_json::to_value).transpose()?,
            after: after.map(serde_json::to_value).transpose()?,
            created_at: Utc::now(),
        },
    )
}
