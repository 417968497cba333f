use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::{parse_uuid, DatabaseError};
use crate::models::*;

pub fn insert_appointment_type(conn: &Connection, ty: &AppointmentType) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO appointment_types (id, name, default_duration_min, color,
         buffer_before_min, buffer_after_min, is_active)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            ty.id.to_string(),
            ty.name,
            ty.default_duration_min,
            ty.color,
            ty.buffer_before_min,
            ty.buffer_after_min,
            ty.is_active as i32,
        ],
    )?;
    Ok(())
}

pub fn get_appointment_type(
    conn: &Connection,
    id: &Uuid,
) -> Result<Option<AppointmentType>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT id, name, default_duration_min, color, buffer_before_min,
                    buffer_after_min, is_active
             FROM appointment_types WHERE id = ?1",
            params![id.to_string()],
            read_type_row,
        )
        .optional()?;

    row.map(type_from_row).transpose()
}

pub fn update_appointment_type(conn: &Connection, ty: &AppointmentType) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE appointment_types SET name = ?2, default_duration_min = ?3, color = ?4,
            buffer_before_min = ?5, buffer_after_min = ?6, is_active = ?7
         WHERE id = ?1",
        params![
            ty.id.to_string(),
            ty.name,
            ty.default_duration_min,
            ty.color,
            ty.buffer_before_min,
            ty.buffer_after_min,
            ty.is_active as i32,
        ],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "AppointmentType".into(),
            id: ty.id.to_string(),
        });
    }
    Ok(())
}

/// All appointment types ordered by name, inactive ones included.
pub fn list_appointment_types(conn: &Connection) -> Result<Vec<AppointmentType>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, name, default_duration_min, color, buffer_before_min,
                buffer_after_min, is_active
         FROM appointment_types ORDER BY name ASC",
    )?;
    let rows = stmt
        .query_map([], read_type_row)?
        .collect::<Result<Vec<_>, _>>()?;

    rows.into_iter().map(type_from_row).collect()
}

/// Default duration in minutes, or `None` when the type does not exist.
pub fn get_default_duration(conn: &Connection, id: &Uuid) -> Result<Option<i64>, DatabaseError> {
    let minutes = conn
        .query_row(
            "SELECT default_duration_min FROM appointment_types WHERE id = ?1",
            params![id.to_string()],
            |row| row.get::<_, i64>(0),
        )
        .optional()?;
    Ok(minutes)
}

type TypeRow = (String, String, i64, String, i64, i64, i32);

fn read_type_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<TypeRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
    ))
}

fn type_from_row(row: TypeRow) -> Result<AppointmentType, DatabaseError> {
    let (id, name, default_duration_min, color, buffer_before_min, buffer_after_min, is_active) = row;
    Ok(AppointmentType {
        id: parse_uuid("id", &id)?,
        name,
        default_duration_min,
        color,
        buffer_before_min,
        buffer_after_min,
        is_active: is_active != 0,
    })
}
