//! Appointment booking service.
//!
//! Consumes the scheduling resolver and applies policy: a provider or
//! location conflict rejects the write unless the actor holds
//! `APPOINTMENT_OVERRIDE`. Conflict check and write share one
//! `BEGIN IMMEDIATE` transaction, so concurrent bookings of the same slot
//! are serialized by SQLite and the later one sees the earlier row.
//!
//! Every write records an audit entry in the same transaction and publishes
//! an `appointments.updated` event after commit.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use serde::Deserialize;
use uuid::Uuid;

use crate::db::repository;
use crate::db::DatabaseError;
use crate::models::*;
use crate::rbac::{self, PermissionDenied};
use crate::realtime::{AppointmentChange, PracticeFeed};
use crate::scheduling::{
    self, ConflictCheckRequest, ConflictReport, ScheduleCheck, ScheduleInput, SchedulingError,
    TimeWindow,
};

const ENTITY_APPOINTMENT: &str = "Appointment";

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

/// Authenticated staff member performing an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: String,
    pub role: Role,
}

impl Actor {
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            role,
        }
    }

    pub fn require(&self, permission: Permission) -> Result<(), PermissionDenied> {
        rbac::require(self.role, permission)
    }

    pub fn can(&self, permission: Permission) -> bool {
        rbac::has_permission(self.role, permission)
    }
}

/// New appointment as submitted by the booking form.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub patient_id: Option<Uuid>,
    pub provider_id: Uuid,
    pub location_id: Option<Uuid>,
    pub appointment_type_id: Uuid,
    pub start_at: DateTime<Utc>,
    pub end_at: Option<DateTime<Utc>>,
    pub reason: Option<String>,
    pub notes: Option<String>,
}

/// Partial update. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentUpdate {
    pub patient_id: Option<Uuid>,
    pub provider_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
    pub appointment_type_id: Option<Uuid>,
    pub start_at: Option<DateTime<Utc>>,
    pub end_at: Option<DateTime<Utc>>,
    pub reason: Option<String>,
    pub notes: Option<String>,
}

// ═══════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error(transparent)]
    Forbidden(#[from] PermissionDenied),
    #[error("End time {end} must be after start time {start}")]
    InvalidInterval {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    #[error("Appointment not found: {0}")]
    NotFound(Uuid),
    #[error("This time slot is already booked")]
    Conflict(ConflictReport),
    #[error("{0}")]
    Validation(String),
    #[error("Database error: {0}")]
    Database(DatabaseError),
}

impl From<DatabaseError> for BookingError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::Sqlite(rusqlite::Error::SqliteFailure(code, _))
                if code.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Self::Validation("Unknown provider or location".into())
            }
            other => Self::Database(other),
        }
    }
}

impl From<rusqlite::Error> for BookingError {
    fn from(err: rusqlite::Error) -> Self {
        Self::from(DatabaseError::from(err))
    }
}

impl From<SchedulingError> for BookingError {
    fn from(err: SchedulingError) -> Self {
        match err {
            SchedulingError::InvalidInterval { start, end } => Self::InvalidInterval { start, end },
            SchedulingError::EndOutOfRange => {
                Self::Validation("Appointment end time is out of range".into())
            }
            SchedulingError::Store(e) => Self::from(e),
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Reads
// ═══════════════════════════════════════════════════════════

pub fn list_appointments(
    conn: &Connection,
    actor: &Actor,
    filter: &AppointmentFilter,
) -> Result<Vec<Appointment>, BookingError> {
    actor.require(Permission::ManageAppointments)?;
    Ok(repository::list_appointments(conn, filter)?)
}

pub fn get_appointment(conn: &Connection, actor: &Actor, id: &Uuid) -> Result<Appointment, BookingError> {
    actor.require(Permission::ManageAppointments)?;
    repository::get_appointment(conn, id)?.ok_or(BookingError::NotFound(*id))
}

/// Dry-run of a booking: effective end time and conflict flags. Writes nothing.
pub fn check_schedule(
    conn: &Connection,
    actor: &Actor,
    input: &ScheduleInput,
) -> Result<ScheduleCheck, BookingError> {
    actor.require(Permission::ManageAppointments)?;
    let (window, report) = scheduling::evaluate(conn, input)?;
    Ok(scheduling::summarize(&window, &report))
}

// ═══════════════════════════════════════════════════════════
// Writes
// ═══════════════════════════════════════════════════════════

/// Creates an appointment in `SCHEDULED` state.
pub fn book_appointment(
    conn: &mut Connection,
    feed: &PracticeFeed,
    actor: &Actor,
    request: BookingRequest,
) -> Result<Appointment, BookingError> {
    actor.require(Permission::ManageAppointments)?;

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let appointment = insert_booking(&tx, actor, request)?;
    tx.commit()?;

    tracing::info!(
        appointment_id = %appointment.id,
        provider_id = %appointment.provider_id,
        start_at = %appointment.start_at,
        "Appointment booked"
    );
    feed.publish(AppointmentChange::Created { id: appointment.id });
    Ok(appointment)
}

/// Resolves, checks and inserts a booking inside the caller's transaction.
///
/// The caller commits and publishes. Permission checks are the caller's too.
pub(crate) fn insert_booking(
    tx: &Transaction<'_>,
    actor: &Actor,
    request: BookingRequest,
) -> Result<Appointment, BookingError> {
    let input = ScheduleInput {
        provider_id: request.provider_id,
        location_id: request.location_id,
        appointment_type_id: request.appointment_type_id,
        start_at: request.start_at,
        end_at: request.end_at,
        exclude_appointment_id: None,
    };
    let (window, report) = scheduling::evaluate(&**tx, &input)?;
    enforce_conflict_policy(actor, &report)?;

    let now = Utc::now();
    let appointment = Appointment {
        id: Uuid::new_v4(),
        patient_id: request.patient_id,
        provider_id: request.provider_id,
        location_id: request.location_id,
        appointment_type_id: request.appointment_type_id,
        start_at: window.start(),
        end_at: window.end(),
        status: AppointmentStatus::default(),
        reason: request.reason,
        notes: request.notes,
        created_by: actor.user_id.clone(),
        updated_by: None,
        created_at: now,
        updated_at: now,
    };
    repository::insert_appointment(tx, &appointment)?;
    record_audit(
        tx,
        actor,
        AuditAction::Create,
        &appointment.id,
        None,
        Some(serde_json::to_value(&appointment).map_err(DatabaseError::from)?),
    )?;
    Ok(appointment)
}

/// Applies a partial update.
///
/// End time: an explicit end wins; naming a type (even the current one)
/// recomputes the end from the type's duration at the effective start;
/// otherwise the stored end is kept. An absent location keeps the stored one,
/// so a location cannot be cleared here. Conflicts are re-checked only when
/// provider, location, start or end changed, excluding the appointment itself.
pub fn update_appointment(
    conn: &mut Connection,
    feed: &PracticeFeed,
    actor: &Actor,
    id: &Uuid,
    update: AppointmentUpdate,
) -> Result<Appointment, BookingError> {
    actor.require(Permission::ManageAppointments)?;

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let before = repository::get_appointment(&tx, id)?.ok_or(BookingError::NotFound(*id))?;

    let provider_id = update.provider_id.unwrap_or(before.provider_id);
    let location_id = update.location_id.or(before.location_id);
    let appointment_type_id = update.appointment_type_id.unwrap_or(before.appointment_type_id);
    let start_at = update.start_at.unwrap_or(before.start_at);

    let end_at = match update.end_at {
        Some(end_at) => end_at,
        None if update.appointment_type_id.is_some() => {
            scheduling::resolve_end_time(&*tx, &appointment_type_id, start_at, None)?
        }
        None => before.end_at,
    };
    let window = TimeWindow::new(start_at, end_at)?;

    let slot_changed = provider_id != before.provider_id
        || location_id != before.location_id
        || start_at != before.start_at
        || end_at != before.end_at;

    if slot_changed {
        let report = scheduling::check_conflicts(
            &*tx,
            &ConflictCheckRequest {
                provider_id,
                location_id,
                window,
                exclude_appointment_id: Some(*id),
            },
        )?;
        enforce_conflict_policy(actor, &report)?;
    }

    let after = Appointment {
        patient_id: update.patient_id.or(before.patient_id),
        provider_id,
        location_id,
        appointment_type_id,
        start_at,
        end_at,
        reason: update.reason.or_else(|| before.reason.clone()),
        notes: update.notes.or_else(|| before.notes.clone()),
        updated_by: Some(actor.user_id.clone()),
        updated_at: Utc::now(),
        ..before.clone()
    };
    repository::update_appointment(&tx, &after)?;
    record_audit(
        &tx,
        actor,
        AuditAction::Update,
        id,
        Some(serde_json::to_value(&before).map_err(DatabaseError::from)?),
        Some(serde_json::to_value(&after).map_err(DatabaseError::from)?),
    )?;
    tx.commit()?;

    tracing::info!(appointment_id = %id, rescheduled = slot_changed, "Appointment updated");
    feed.publish(AppointmentChange::Updated { id: *id });
    Ok(after)
}

/// Moves an appointment to `status`, recording before/after status in the audit log.
pub fn change_status(
    conn: &mut Connection,
    feed: &PracticeFeed,
    actor: &Actor,
    id: &Uuid,
    status: AppointmentStatus,
) -> Result<Appointment, BookingError> {
    let appointment = write_status(conn, actor, id, status)?;
    feed.publish(AppointmentChange::Status { id: *id, status });
    Ok(appointment)
}

/// Cancels an appointment. Rows are never deleted.
pub fn cancel_appointment(
    conn: &mut Connection,
    feed: &PracticeFeed,
    actor: &Actor,
    id: &Uuid,
) -> Result<Appointment, BookingError> {
    let appointment = write_status(conn, actor, id, AppointmentStatus::Canceled)?;
    feed.publish(AppointmentChange::Canceled { id: *id });
    Ok(appointment)
}

fn write_status(
    conn: &mut Connection,
    actor: &Actor,
    id: &Uuid,
    status: AppointmentStatus,
) -> Result<Appointment, BookingError> {
    actor.require(Permission::ManageAppointments)?;

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let before = repository::get_appointment(&tx, id)?.ok_or(BookingError::NotFound(*id))?;

    let now = Utc::now();
    repository::update_appointment_status(&tx, id, status, &actor.user_id, &now)?;
    record_audit(
        &tx,
        actor,
        AuditAction::StatusChange,
        id,
        Some(serde_json::json!({ "status": before.status })),
        Some(serde_json::json!({ "status": status })),
    )?;
    tx.commit()?;

    tracing::info!(appointment_id = %id, from = %before.status, to = %status, "Appointment status changed");
    Ok(Appointment {
        status,
        updated_by: Some(actor.user_id.clone()),
        updated_at: now,
        ..before
    })
}

// ═══════════════════════════════════════════════════════════
// Helpers
// ═══════════════════════════════════════════════════════════

fn enforce_conflict_policy(actor: &Actor, report: &ConflictReport) -> Result<(), BookingError> {
    if !report.has_conflict() {
        return Ok(());
    }
    if actor.can(Permission::AppointmentOverride) {
        tracing::warn!(
            actor = %actor.user_id,
            provider_conflict = ?report.provider_conflict.as_ref().map(|c| c.id),
            location_conflict = ?report.location_conflict.as_ref().map(|c| c.id),
            "Booking conflict overridden"
        );
        return Ok(());
    }
    Err(BookingError::Conflict(report.clone()))
}

fn record_audit(
    conn: &Connection,
    actor: &Actor,
    action: AuditAction,
    appointment_id: &Uuid,
    before: Option<serde_json::Value>,
    after: Option<serde_json::Value>,
) -> Result<(), DatabaseError> {
    repository::insert_audit_entry(
        conn,
        &AuditEntry {
            id: Uuid::new_v4(),
            actor_user_id: Some(actor.user_id.clone()),
            action,
            entity_type: ENTITY_APPOINTMENT.into(),
            entity_id: appointment_id.to_string(),
            before,
            after,
            created_at: Utc::now(),
        },
    )
}
