use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::{format_timestamp, parse_timestamp, parse_uuid, DatabaseError};
use crate::models::*;

const WAITLIST_COLUMNS: &str = "id, patient_id, appointment_type_id, preferred_start_at,
     preferred_end_at, priority, note, status, appointment_id, created_at, updated_at";

pub fn insert_waitlist_request(conn: &Connection, request: &WaitlistRequest) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO waitlist_requests (id, patient_id, appointment_type_id, preferred_start_at,
         preferred_end_at, priority, note, status, appointment_id, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            request.id.to_string(),
            request.patient_id.to_string(),
            request.appointment_type_id.map(|id| id.to_string()),
            request.preferred_start_at.as_ref().map(format_timestamp),
            request.preferred_end_at.as_ref().map(format_timestamp),
            request.priority,
            request.note,
            request.status.as_str(),
            request.appointment_id.map(|id| id.to_string()),
            format_timestamp(&request.created_at),
            format_timestamp(&request.updated_at),
        ],
    )?;
    Ok(())
}

pub fn get_waitlist_request(conn: &Connection, id: &Uuid) -> Result<Option<WaitlistRequest>, DatabaseError> {
    let row = conn
        .query_row(
            &format!("SELECT {WAITLIST_COLUMNS} FROM waitlist_requests WHERE id = ?1"),
            params![id.to_string()],
            WaitlistRow::read,
        )
        .optional()?;

    row.map(waitlist_from_row).transpose()
}

/// Overwrites the mutable columns: priority, note, status and the booked appointment.
pub fn update_waitlist_request(conn: &Connection, request: &WaitlistRequest) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE waitlist_requests SET
            priority = ?2, note = ?3, status = ?4, appointment_id = ?5, updated_at = ?6
         WHERE id = ?1",
        params![
            request.id.to_string(),
            request.priority,
            request.note,
            request.status.as_str(),
            request.appointment_id.map(|id| id.to_string()),
            format_timestamp(&request.updated_at),
        ],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "WaitlistRequest".into(),
            id: request.id.to_string(),
        });
    }
    Ok(())
}

/// Lists waitlist requests, newest first.
pub fn list_waitlist_requests(
    conn: &Connection,
    filter: &WaitlistFilter,
) -> Result<Vec<WaitlistRequest>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {WAITLIST_COLUMNS} FROM waitlist_requests
         WHERE (?1 IS NULL OR status = ?1)
         ORDER BY created_at DESC"
    ))?;
    let rows = stmt
        .query_map(params![filter.status.map(|s| s.as_str())], WaitlistRow::read)?
        .collect::<Result<Vec<_>, _>>()?;

    rows.into_iter().map(waitlist_from_row).collect()
}

struct WaitlistRow {
    id: String,
    patient_id: String,
    appointment_type_id: Option<String>,
    preferred_start_at: Option<String>,
    preferred_end_at: Option<String>,
    priority: i64,
    note: Option<String>,
    status: String,
    appointment_id: Option<String>,
    created_at: String,
    updated_at: String,
}

impl WaitlistRow {
    fn read(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            patient_id: row.get(1)?,
            appointment_type_id: row.get(2)?,
            preferred_start_at: row.get(3)?,
            preferred_end_at: row.get(4)?,
            priority: row.get(5)?,
            note: row.get(6)?,
            status: row.get(7)?,
            appointment_id: row.get(8)?,
            created_at: row.get(9)?,
            updated_at: row.get(10)?,
        })
    }
}

fn waitlist_from_row(row: WaitlistRow) -> Result<WaitlistRequest, DatabaseError> {
    Ok(WaitlistRequest {
        id: parse_uuid("id", &row.id)?,
        patient_id: parse_uuid("patient_id", &row.patient_id)?,
        appointment_type_id: row
            .appointment_type_id
            .as_deref()
            .map(|s| parse_uuid("appointment_type_id", s))
            .transpose()?,
        preferred_start_at: row
            .preferred_start_at
            .as_deref()
            .map(|s| parse_timestamp("preferred_start_at", s))
            .transpose()?,
        preferred_end_at: row
            .preferred_end_at
            .as_deref()
            .map(|s| parse_timestamp("preferred_end_at", s))
            .transpose()?,
        priority: row.priority,
        note: row.note,
        status: WaitlistStatus::from_str(&row.status)?,
        appointment_id: row
            .appointment_id
            .as_deref()
            .map(|s| parse_uuid("appointment_id", s))
            .transpose()?,
        created_at: parse_timestamp("created_at", &row.created_at)?,
        updated_at: parse_timestamp("updated_at", &row.updated_at)?,
    })
}
