use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::{format_timestamp, parse_timestamp, parse_uuid, DatabaseError};
use crate::models::*;

const APPOINTMENT_COLUMNS: &str = "id, patient_id, provider_id, location_id, appointment_type_id,
     start_at, end_at, status, reason, notes, created_by, updated_by, created_at, updated_at";

pub fn insert_appointment(conn: &Connection, appt: &Appointment) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO appointments (id, patient_id, provider_id, location_id, appointment_type_id,
         start_at, end_at, status, reason, notes, created_by, updated_by, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
        params![
            appt.id.to_string(),
            appt.patient_id.map(|id| id.to_string()),
            appt.provider_id.to_string(),
            appt.location_id.map(|id| id.to_string()),
            appt.appointment_type_id.to_string(),
            format_timestamp(&appt.start_at),
            format_timestamp(&appt.end_at),
            appt.status.as_str(),
            appt.reason,
            appt.notes,
            appt.created_by,
            appt.updated_by,
            format_timestamp(&appt.created_at),
            format_timestamp(&appt.updated_at),
        ],
    )?;
    Ok(())
}

pub fn get_appointment(conn: &Connection, id: &Uuid) -> Result<Option<Appointment>, DatabaseError> {
    let row = conn
        .query_row(
            &format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE id = ?1"),
            params![id.to_string()],
            AppointmentRow::read,
        )
        .optional()?;

    row.map(appointment_from_row).transpose()
}

/// Overwrites every mutable column of an existing appointment.
pub fn update_appointment(conn: &Connection, appt: &Appointment) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE appointments SET
            patient_id = ?2, provider_id = ?3, location_id = ?4, appointment_type_id = ?5,
            start_at = ?6, end_at = ?7, status = ?8, reason = ?9, notes = ?10,
            updated_by = ?11, updated_at = ?12
         WHERE id = ?1",
        params![
            appt.id.to_string(),
            appt.patient_id.map(|id| id.to_string()),
            appt.provider_id.to_string(),
            appt.location_id.map(|id| id.to_string()),
            appt.appointment_type_id.to_string(),
            format_timestamp(&appt.start_at),
            format_timestamp(&appt.end_at),
            appt.status.as_str(),
            appt.reason,
            appt.notes,
            appt.updated_by,
            format_timestamp(&appt.updated_at),
        ],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Appointment".into(),
            id: appt.id.to_string(),
        });
    }
    Ok(())
}

pub fn update_appointment_status(
    conn: &Connection,
    id: &Uuid,
    status: AppointmentStatus,
    updated_by: &str,
    updated_at: &DateTime<Utc>,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE appointments SET status = ?2, updated_by = ?3, updated_at = ?4 WHERE id = ?1",
        params![
            id.to_string(),
            status.as_str(),
            updated_by,
            format_timestamp(updated_at),
        ],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Appointment".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

/// Lists appointments matching the filter, earliest start first.
pub fn list_appointments(
    conn: &Connection,
    filter: &AppointmentFilter,
) -> Result<Vec<Appointment>, DatabaseError> {
    let mut sql = format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE 1=1");
    let mut params_vec: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

    if let Some(start) = &filter.start_from {
        params_vec.push(Box::new(format_timestamp(start)));
        sql.push_str(&format!(" AND start_at >= ?{}", params_vec.len()));
    }
    if let Some(end) = &filter.end_until {
        params_vec.push(Box::new(format_timestamp(end)));
        sql.push_str(&format!(" AND end_at <= ?{}", params_vec.len()));
    }
    if let Some(provider_id) = &filter.provider_id {
        params_vec.push(Box::new(provider_id.to_string()));
        sql.push_str(&format!(" AND provider_id = ?{}", params_vec.len()));
    }
    if let Some(location_id) = &filter.location_id {
        params_vec.push(Box::new(location_id.to_string()));
        sql.push_str(&format!(" AND location_id = ?{}", params_vec.len()));
    }
    if let Some(patient_id) = &filter.patient_id {
        params_vec.push(Box::new(patient_id.to_string()));
        sql.push_str(&format!(" AND patient_id = ?{}", params_vec.len()));
    }

    sql.push_str(" ORDER BY start_at ASC");

    let param_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(param_refs.as_slice(), AppointmentRow::read)?
        .collect::<Result<Vec<_>, _>>()?;

    rows.into_iter().map(appointment_from_row).collect()
}

/// Column an overlap query is scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlapScope {
    Provider,
    Location,
}

impl OverlapScope {
    fn column(self) -> &'static str {
        match self {
            Self::Provider => "provider_id",
            Self::Location => "location_id",
        }
    }
}

/// Returns one appointment in `scope` whose window overlaps `[start_at, end_at)`.
///
/// Half-open: `existing.start_at < end_at AND existing.end_at > start_at`,
/// so an appointment ending exactly at `start_at` does not match.
pub fn find_overlapping_appointment(
    conn: &Connection,
    scope: OverlapScope,
    scope_id: &Uuid,
    start_at: &DateTime<Utc>,
    end_at: &DateTime<Utc>,
    exclude_id: Option<&Uuid>,
) -> Result<Option<ConflictMatch>, DatabaseError> {
    let sql = format!(
        "SELECT id, start_at, end_at FROM appointments
         WHERE {} = ?1
           AND start_at < ?2
           AND end_at > ?3
           AND (?4 IS NULL OR id <> ?4)
         LIMIT 1",
        scope.column()
    );

    let row: Option<(String, String, String)> = conn
        .query_row(
            &sql,
            params![
                scope_id.to_string(),
                format_timestamp(end_at),
                format_timestamp(start_at),
                exclude_id.map(|id| id.to_string()),
            ],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .optional()?;

    row.map(|(id, start, end)| {
        Ok(ConflictMatch {
            id: parse_uuid("id", &id)?,
            start_at: parse_timestamp("start_at", &start)?,
            end_at: parse_timestamp("end_at", &end)?,
        })
    })
    .transpose()
}

// Internal row type for Appointment mapping
struct AppointmentRow {
    id: String,
    patient_id: Option<String>,
    provider_id: String,
    location_id: Option<String>,
    appointment_type_id: String,
    start_at: String,
    end_at: String,
    status: String,
    reason: Option<String>,
    notes: Option<String>,
    created_by: String,
    updated_by: Option<String>,
    created_at: String,
    updated_at: String,
}

impl AppointmentRow {
    fn read(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            patient_id: row.get(1)?,
            provider_id: row.get(2)?,
            location_id: row.get(3)?,
            appointment_type_id: row.get(4)?,
            start_at: row.get(5)?,
            end_at: row.get(6)?,
            status: row.get(7)?,
            reason: row.get(8)?,
            notes: row.get(9)?,
            created_by: row.get(10)?,
            updated_by: row.get(11)?,
            created_at: row.get(12)?,
            updated_at: row.get(13)?,
        })
    }
}

fn appointment_from_row(row: AppointmentRow) -> Result<Appointment, DatabaseError> {
    Ok(Appointment {
        id: parse_uuid("id", &row.id)?,
        patient_id: row
            .patient_id
            .as_deref()
            .map(|s| parse_uuid("patient_id", s))
            .transpose()?,
        provider_id: parse_uuid("provider_id", &row.provider_id)?,
        location_id: row
            .location_id
            .as_deref()
            .map(|s| parse_uuid("location_id", s))
            .transpose()?,
        appointment_type_id: parse_uuid("appointment_type_id", &row.appointment_type_id)?,
        start_at: parse_timestamp("start_at", &row.start_at)?,
        end_at: parse_timestamp("end_at", &row.end_at)?,
        status: AppointmentStatus::from_str(&row.status)?,
        reason: row.reason,
        notes: row.notes,
        created_by: row.created_by,
        updated_by: row.updated_by,
        created_at: parse_timestamp("created_at", &row.created_at)?,
        updated_at: parse_timestamp("updated_at", &row.updated_at)?,
    })
}
