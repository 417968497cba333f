//! Shared test fixtures: a seeded provider, location and appointment type.

use chrono::{DateTime, TimeZone, Utc};
use rusqlite::Connection;
use uuid::Uuid;

use super::{insert_appointment_type, insert_location, insert_provider};
use crate::models::*;

/// Duration of the seeded appointment type, distinct from the 30 minute fallback.
pub const SEEDED_TYPE_MINUTES: i64 = 45;

#[derive(Debug, Clone, Copy)]
pub struct DirectoryIds {
    pub provider_id: Uuid,
    pub location_id: Uuid,
    pub type_id: Uuid,
}

/// 2026-03-02 at the given UTC wall-clock time.
pub fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, hour, minute, 0).unwrap()
}

pub fn seed_provider(conn: &Connection, name: &str) -> Uuid {
    let id = Uuid::new_v4();
    insert_provider(
        conn,
        &Provider {
            id,
            name: name.into(),
            specialty: Some("General Dentistry".into()),
            color: Some("#0ea5a0".into()),
            is_active: true,
        },
    )
    .unwrap();
    id
}

pub fn seed_location(conn: &Connection, name: &str) -> Uuid {
    let id = Uuid::new_v4();
    insert_location(
        conn,
        &Location {
            id,
            name: name.into(),
            timezone: "America/Los_Angeles".into(),
            is_active: true,
        },
    )
    .unwrap();
    id
}

pub fn make_type(name: &str, minutes: i64) -> AppointmentType {
    AppointmentType {
        id: Uuid::new_v4(),
        name: name.into(),
        default_duration_min: minutes,
        color: "#14b8a6".into(),
        buffer_before_min: 0,
        buffer_after_min: 0,
        is_active: true,
    }
}

pub fn seed_directory(conn: &Connection) -> DirectoryIds {
    let provider_id = seed_provider(conn, "Dr. Chen");
    let location_id = seed_location(conn, "Harbor Clinic");
    let ty = make_type("Hygiene Cleaning", SEEDED_TYPE_MINUTES);
    insert_appointment_type(conn, &ty).unwrap();
    DirectoryIds {
        provider_id,
        location_id,
        type_id: ty.id,
    }
}

/// A scheduled appointment for a fresh patient at the seeded provider and location.
pub fn make_appointment(ids: &DirectoryIds, start_at: DateTime<Utc>, end_at: DateTime<Utc>) -> Appointment {
    let now = at(7, 0);
    Appointment {
        id: Uuid::new_v4(),
        patient_id: Some(Uuid::new_v4()),
        provider_id: ids.provider_id,
        location_id: Some(ids.location_id),
        appointment_type_id: ids.type_id,
        start_at,
        end_at,
        status: AppointmentStatus::Scheduled,
        reason: Some("Routine appointment".into()),
        notes: None,
        created_by: "user-1".into(),
        updated_by: None,
        created_at: now,
        updated_at: now,
    }
}
