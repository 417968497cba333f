//! Providers and locations: reference data for booking forms.

use rusqlite::{params, Connection};

use crate::db::{parse_uuid, DatabaseError};
use crate::models::*;

pub fn insert_provider(conn: &Connection, provider: &Provider) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO providers (id, name, specialty, color, is_active)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            provider.id.to_string(),
            provider.name,
            provider.specialty,
            provider.color,
            provider.is_active as i32,
        ],
    )?;
    Ok(())
}

/// Active providers, by name.
pub fn list_active_providers(conn: &Connection) -> Result<Vec<Provider>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, name, specialty, color FROM providers
         WHERE is_active = 1 ORDER BY name ASC",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, Option<String>>(3)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(|(id, name, specialty, color)| {
            Ok(Provider {
                id: parse_uuid("id", &id)?,
                name,
                specialty,
                color,
                is_active: true,
            })
        })
        .collect()
}

pub fn insert_location(conn: &Connection, location: &Location) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO locations (id, name, timezone, is_active) VALUES (?1, ?2, ?3, ?4)",
        params![
            location.id.to_string(),
            location.name,
            location.timezone,
            location.is_active as i32,
        ],
    )?;
    Ok(())
}

/// Active locations, by name.
pub fn list_active_locations(conn: &Connection) -> Result<Vec<Location>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, name, timezone FROM locations WHERE is_active = 1 ORDER BY name ASC",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(|(id, name, timezone)| {
            Ok(Location {
                id: parse_uuid("id", &id)?,
                name,
                timezone,
                is_active: true,
            })
        })
        .collect()
}
