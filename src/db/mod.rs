pub mod repository;
pub mod sqlite;

pub use repository::*;
pub use sqlite::*;

use chrono::{DateTime, SecondsFormat, Utc};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Invalid enum value for {field}: {value}")]
    InvalidEnum { field: String, value: String },

    #[error("Invalid timestamp in column {column}: {value}")]
    InvalidTimestamp { column: String, value: String },

    #[error("Migration failed at version {version}: {reason}")]
    MigrationFailed { version: i64, reason: String },

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Constraint violated: {0}")]
    ConstraintViolation(String),
}

/// Fixed-width storage form: `2026-03-02T09:00:00.000000000Z`.
///
/// Every timestamp column uses this form so that `<`/`>` on TEXT in SQL
/// agrees with chronological order down to the nanosecond.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Parses a stored timestamp back into UTC.
pub fn parse_timestamp(column: &str, value: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| DatabaseError::InvalidTimestamp {
            column: column.into(),
            value: value.into(),
        })
}

/// Parses a stored identifier column.
pub fn parse_uuid(column: &str, value: &str) -> Result<uuid::Uuid, DatabaseError> {
    uuid::Uuid::parse_str(value)
        .map_err(|e| DatabaseError::ConstraintViolation(format!("{column}: {e}")))
}
